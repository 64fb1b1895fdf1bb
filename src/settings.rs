use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

/// Runtime configuration, layered from defaults, an optional `wikibase.toml`
/// (or the file named by `WIKIBASE_CONFIG`) and `WIKIBASE_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// `":memory:"` or the path of the SQLite file.
    pub database: String,
    pub log_filter: String,
    /// Register `is_a`, `earth` and `gregorian` on open.
    pub bootstrap: bool,
    pub busy_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database: ":memory:".to_string(),
            log_filter: "info".to_string(),
            bootstrap: true,
            busy_timeout_ms: 5000,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings> {
        let file = std::env::var("WIKIBASE_CONFIG").unwrap_or_else(|_| "wikibase".to_string());
        Self::load_from(&file)
    }
    /// Loads `name` (with or without its extension) when present.
    pub fn load_from(name: &str) -> Result<Settings> {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("database", defaults.database)?
            .set_default("log_filter", defaults.log_filter)?
            .set_default("bootstrap", defaults.bootstrap)?
            .set_default("busy_timeout_ms", defaults.busy_timeout_ms)?
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("WIKIBASE"))
            .build()?;
        Ok(settings.try_deserialize::<Settings>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::load_from("no_such_wikibase_config").unwrap();
        assert_eq!(settings.log_filter, "info");
        assert!(settings.busy_timeout_ms > 0);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join("wikibase_settings_test.toml");
        std::fs::write(&path, "database = \"store.db\"\nbootstrap = false\n").unwrap();
        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.database, "store.db");
        assert!(!settings.bootstrap);
        let _ = std::fs::remove_file(&path);
    }
}
