use thiserror::Error;

#[derive(Error, Debug)]
pub enum WikibaseError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Data corruption: {message}")]
    DataCorruption { message: String },
    #[error("Unknown datatype: {0}")]
    UnknownDatatype(String),
    #[error("Unknown mapping: {0}")]
    UnknownMapping(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: &'static str, message: String },
    #[error("Type mismatch: {property} expects {expected}, got {found}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Rank out of range: {0} (expected -1, 0 or 1)")]
    RankOutOfRange(i64),
    #[error("Protected reference: {0}")]
    ProtectedReference(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Wire format error: {0}")]
    Wire(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl WikibaseError {
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
    /// True for every failure that signals invalid input rather than a storage fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidField { .. } | Self::RankOutOfRange(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WikibaseError>;

// Helper conversions
impl From<rusqlite::Error> for WikibaseError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for WikibaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Wire(e.to_string())
    }
}

impl From<config::ConfigError> for WikibaseError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for WikibaseError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Lock(e.to_string())
    }
}
