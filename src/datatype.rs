// used for persistence
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

// used when building time values from calendar dates
use chrono::{Datelike, NaiveDate};
// used for decimal coordinates
use bigdecimal::BigDecimal;
// used to validate language codes, urls and time strings
use lazy_static::lazy_static;
use regex::Regex;

// used when parsing a string to a BigDecimal
use std::str::FromStr;
// used to print out readable forms of a data type
use std::fmt;
use std::collections::HashMap;
use std::ops;

use crate::construct::{Identity, Item, OtherHasher};
use crate::error::{Result, WikibaseError};

lazy_static! {
    static ref LANGUAGE_CODE: Regex = Regex::new(r"^[a-z]{2,3}(-[a-z0-9]{2,8})*$").unwrap();
    static ref URL: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://\S+$").unwrap();
    // +YYYY-MM-DDThh:mm:ssZ with an arbitrary number of year digits
    static ref TIME: Regex =
        Regex::new(r"^[+-]\d{1,16}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").unwrap();
}

pub trait DataType {
    // static stuff which needs to be implemented downstream
    const UID: u8;
    const DATA_TYPE: &'static str;
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn identifier(&self) -> u8 {
        Self::UID
    }
}

/// Checks a language code the way labels, descriptions, aliases and monolingual
/// texts expect it (`fr`, `en`, `grc`, `en-gb`).
pub fn validate_language(language: &str) -> Result<()> {
    if LANGUAGE_CODE.is_match(language) {
        Ok(())
    } else {
        Err(WikibaseError::invalid_field(
            "language",
            format!("'{}' is not a language code", language),
        ))
    }
}

// ------------- Value kinds --------------
/// The stored discriminator of every value row, entities included.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Item,
    Property,
    String,
    Url,
    Quantity,
    Time,
    GlobeCoordinates,
    MonolingualText,
}

impl ValueKind {
    pub const ALL: [ValueKind; 8] = [
        ValueKind::Item,
        ValueKind::Property,
        ValueKind::String,
        ValueKind::Url,
        ValueKind::Quantity,
        ValueKind::Time,
        ValueKind::GlobeCoordinates,
        ValueKind::MonolingualText,
    ];
    pub fn uid(self) -> u8 {
        match self {
            ValueKind::Item => Item::UID,
            ValueKind::Property => crate::construct::Property::UID,
            ValueKind::String => StringValue::UID,
            ValueKind::Url => UrlValue::UID,
            ValueKind::Quantity => QuantityValue::UID,
            ValueKind::Time => TimeValue::UID,
            ValueKind::GlobeCoordinates => GlobeCoordinatesValue::UID,
            ValueKind::MonolingualText => MonolingualTextValue::UID,
        }
    }
    pub fn class_name(self) -> &'static str {
        match self {
            ValueKind::Item => Item::DATA_TYPE,
            ValueKind::Property => crate::construct::Property::DATA_TYPE,
            ValueKind::String => StringValue::DATA_TYPE,
            ValueKind::Url => UrlValue::DATA_TYPE,
            ValueKind::Quantity => QuantityValue::DATA_TYPE,
            ValueKind::Time => TimeValue::DATA_TYPE,
            ValueKind::GlobeCoordinates => GlobeCoordinatesValue::DATA_TYPE,
            ValueKind::MonolingualText => MonolingualTextValue::DATA_TYPE,
        }
    }
    /// Name used for the `datatype` field of serialized snaks.
    pub fn wire_name(self) -> &'static str {
        match self {
            ValueKind::Item => "item",
            ValueKind::Property => "property",
            ValueKind::String => "string",
            ValueKind::Url => "url",
            ValueKind::Quantity => "quantity",
            ValueKind::Time => "time",
            ValueKind::GlobeCoordinates => "globecoordinate",
            ValueKind::MonolingualText => "monolingualtext",
        }
    }
    pub fn from_uid(uid: u8) -> Option<ValueKind> {
        ValueKind::ALL.into_iter().find(|kind| kind.uid() == uid)
    }
    /// Entities are shared nouns: snaks point at them but never own them.
    pub fn is_entity(self) -> bool {
        matches!(self, ValueKind::Item | ValueKind::Property)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

// ------------- Datatype Registry --------------
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VariantDescriptor {
    pub kind: ValueKind,
    pub class_name: &'static str,
    pub wire_name: &'static str,
}

/// Static dispatch table from symbolic class names to value variants.
/// Built once when a database is opened and handed to every unit of work.
#[derive(Debug, Clone)]
pub struct DatatypeRegistry {
    variants: HashMap<&'static str, VariantDescriptor, OtherHasher>,
}

impl DatatypeRegistry {
    pub fn standard() -> Self {
        let mut variants = HashMap::default();
        for kind in ValueKind::ALL {
            variants.insert(
                kind.class_name(),
                VariantDescriptor {
                    kind,
                    class_name: kind.class_name(),
                    wire_name: kind.wire_name(),
                },
            );
        }
        Self { variants }
    }
    pub fn resolve(&self, class_name: &str) -> Result<VariantDescriptor> {
        self.variants
            .get(class_name)
            .copied()
            .ok_or_else(|| WikibaseError::UnknownDatatype(class_name.to_string()))
    }
    pub fn contains(&self, class_name: &str) -> bool {
        self.variants.contains_key(class_name)
    }
    pub fn descriptors(&self) -> Vec<VariantDescriptor> {
        let mut descriptors: Vec<VariantDescriptor> = self.variants.values().copied().collect();
        descriptors.sort_by_key(|d| d.kind);
        descriptors
    }
    pub fn len(&self) -> usize {
        self.variants.len()
    }
}

// ------------- Data Types --------------
impl DataType for StringValue {
    const UID: u8 = 3;
    const DATA_TYPE: &'static str = "StringValue";
}
impl DataType for UrlValue {
    const UID: u8 = 4;
    const DATA_TYPE: &'static str = "UrlValue";
}
impl DataType for QuantityValue {
    const UID: u8 = 5;
    const DATA_TYPE: &'static str = "QuantityValue";
}
impl DataType for TimeValue {
    const UID: u8 = 6;
    const DATA_TYPE: &'static str = "TimeValue";
}
impl DataType for GlobeCoordinatesValue {
    const UID: u8 = 7;
    const DATA_TYPE: &'static str = "GlobeCoordinatesValue";
}
impl DataType for MonolingualTextValue {
    const UID: u8 = 8;
    const DATA_TYPE: &'static str = "MonolingualTextValue";
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StringValue {
    pub text: String,
}
impl StringValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UrlValue {
    pub text: String,
}
impl UrlValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuantityValue {
    pub number: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub unit: Option<Identity>,
}
impl QuantityValue {
    pub fn new(number: f64) -> Self {
        Self {
            number,
            lower: None,
            upper: None,
            unit: None,
        }
    }
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = Some(lower);
        self.upper = Some(upper);
        self
    }
    pub fn with_unit(mut self, unit: &Item) -> Self {
        self.unit = Some(unit.identity());
        self
    }
}

/// Precision of a time value, from billion years (0) to day (11).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimePrecision {
    BillionYears = 0,
    HundredMillionYears = 1,
    TenMillionYears = 2,
    MillionYears = 3,
    HundredThousandYears = 4,
    TenThousandYears = 5,
    ThousandYears = 6,
    Century = 7,
    Decade = 8,
    Year = 9,
    Month = 10,
    Day = 11,
}
impl TimePrecision {
    pub fn from_code(code: i64) -> Result<Self> {
        use TimePrecision::*;
        Ok(match code {
            0 => BillionYears,
            1 => HundredMillionYears,
            2 => TenMillionYears,
            3 => MillionYears,
            4 => HundredThousandYears,
            5 => TenThousandYears,
            6 => ThousandYears,
            7 => Century,
            8 => Decade,
            9 => Year,
            10 => Month,
            11 => Day,
            _ => {
                return Err(WikibaseError::invalid_field(
                    "precision",
                    format!("{} is not a time precision (0..=11)", code),
                ));
            }
        })
    }
    pub fn code(self) -> i64 {
        self as i64
    }
}
impl ToSql for TimePrecision {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}
impl FromSql for TimePrecision {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_i64()?;
        TimePrecision::from_code(code).map_err(|_| FromSqlError::OutOfRange(code))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeValue {
    pub time: String,
    /// Offset from UTC in minutes.
    pub timezone: i32,
    pub precision: Option<TimePrecision>,
    pub after: Option<i64>,
    pub before: Option<i64>,
    pub calendar_model: Identity,
}
impl TimeValue {
    pub fn new(time: impl Into<String>, precision: TimePrecision, calendar_model: &Item) -> Self {
        Self {
            time: time.into(),
            timezone: 0,
            precision: Some(precision),
            after: None,
            before: None,
            calendar_model: calendar_model.identity(),
        }
    }
    pub fn from_date(date: NaiveDate, calendar_model: &Item) -> Self {
        let time = format!(
            "{}{:04}-{:02}-{:02}T00:00:00Z",
            if date.year() < 0 { '-' } else { '+' },
            date.year().abs(),
            date.month(),
            date.day()
        );
        Self::new(time, TimePrecision::Day, calendar_model)
    }
}

// Special types below
#[derive(Eq, PartialEq, Hash, PartialOrd, Ord, Clone, Debug)]
pub struct Decimal(BigDecimal);

impl Decimal {
    pub fn from_str(s: &str) -> Option<Decimal> {
        match BigDecimal::from_str(s) {
            Ok(decimal) => Some(Decimal(decimal)),
            _ => None,
        }
    }
    pub fn parse(field: &'static str, s: &str) -> Result<Decimal> {
        Decimal::from_str(s)
            .ok_or_else(|| WikibaseError::invalid_field(field, format!("'{}' is not a decimal", s)))
    }
}
impl From<BigDecimal> for Decimal {
    fn from(decimal: BigDecimal) -> Self {
        Decimal(decimal)
    }
}
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl FromSql for Decimal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        BigDecimal::from_str(text)
            .map(Decimal)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
impl ToSql for Decimal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}
impl ops::Deref for Decimal {
    type Target = BigDecimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobeCoordinatesValue {
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub precision: Decimal,
    pub globe: Identity,
}
impl GlobeCoordinatesValue {
    pub fn new(latitude: Decimal, longitude: Decimal, precision: Decimal, globe: &Item) -> Self {
        Self {
            latitude,
            longitude,
            precision,
            globe: globe.identity(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MonolingualTextValue {
    pub language: String,
    pub text: String,
}
impl MonolingualTextValue {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

// ------------- Data values --------------
/// Every non-entity value a snak can carry.
#[derive(Clone, Debug, PartialEq)]
pub enum DataValue {
    String(StringValue),
    Url(UrlValue),
    Quantity(QuantityValue),
    Time(TimeValue),
    GlobeCoordinates(GlobeCoordinatesValue),
    MonolingualText(MonolingualTextValue),
}

impl DataValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            DataValue::String(_) => ValueKind::String,
            DataValue::Url(_) => ValueKind::Url,
            DataValue::Quantity(_) => ValueKind::Quantity,
            DataValue::Time(_) => ValueKind::Time,
            DataValue::GlobeCoordinates(_) => ValueKind::GlobeCoordinates,
            DataValue::MonolingualText(_) => ValueKind::MonolingualText,
        }
    }
    /// Items this value points at (units, calendar models, globes).
    pub fn referenced_items(&self) -> Vec<Identity> {
        match self {
            DataValue::Quantity(q) => q.unit.into_iter().collect(),
            DataValue::Time(t) => vec![t.calendar_model],
            DataValue::GlobeCoordinates(g) => vec![g.globe],
            _ => Vec::new(),
        }
    }
    /// Field-level checks, run right before the value is written.
    pub fn validate(&self) -> Result<()> {
        match self {
            DataValue::String(_) => Ok(()),
            DataValue::Url(u) => {
                if URL.is_match(&u.text) {
                    Ok(())
                } else {
                    Err(WikibaseError::invalid_field(
                        "value",
                        format!("'{}' is not an absolute url", u.text),
                    ))
                }
            }
            DataValue::Quantity(q) => {
                if !q.number.is_finite() {
                    return Err(WikibaseError::invalid_field("number", "must be finite"));
                }
                if let Some(lower) = q.lower {
                    if lower > q.number {
                        return Err(WikibaseError::invalid_field(
                            "lower",
                            format!("{} is above the number {}", lower, q.number),
                        ));
                    }
                }
                if let Some(upper) = q.upper {
                    if upper < q.number {
                        return Err(WikibaseError::invalid_field(
                            "upper",
                            format!("{} is below the number {}", upper, q.number),
                        ));
                    }
                }
                Ok(())
            }
            DataValue::Time(t) => {
                if !TIME.is_match(&t.time) {
                    return Err(WikibaseError::invalid_field(
                        "time",
                        format!("'{}' is not of the form +YYYY-MM-DDThh:mm:ssZ", t.time),
                    ));
                }
                if t.after.is_some_and(|a| a < 0) || t.before.is_some_and(|b| b < 0) {
                    return Err(WikibaseError::invalid_field(
                        "after",
                        "before/after must not be negative",
                    ));
                }
                Ok(())
            }
            DataValue::GlobeCoordinates(g) => {
                let zero = BigDecimal::from(0);
                if *g.precision <= zero {
                    return Err(WikibaseError::invalid_field(
                        "precision",
                        format!("expected a positive precision, got {}", g.precision),
                    ));
                }
                if g.latitude.abs() > BigDecimal::from(90) {
                    return Err(WikibaseError::invalid_field(
                        "latitude",
                        format!("{} is outside [-90, 90]", g.latitude),
                    ));
                }
                if g.longitude.abs() > BigDecimal::from(360) {
                    return Err(WikibaseError::invalid_field(
                        "longitude",
                        format!("{} is outside [-360, 360]", g.longitude),
                    ));
                }
                Ok(())
            }
            DataValue::MonolingualText(m) => validate_language(&m.language),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s.text),
            DataValue::Url(u) => write!(f, "{}", u.text),
            DataValue::Quantity(q) => write!(f, "{}", q.number),
            DataValue::Time(t) => write!(f, "{}", t.time),
            DataValue::GlobeCoordinates(g) => write!(f, "{}, {}", g.latitude, g.longitude),
            DataValue::MonolingualText(m) => write!(f, "({}) {}", m.language, m.text),
        }
    }
}

impl From<StringValue> for DataValue {
    fn from(v: StringValue) -> Self {
        DataValue::String(v)
    }
}
impl From<UrlValue> for DataValue {
    fn from(v: UrlValue) -> Self {
        DataValue::Url(v)
    }
}
impl From<QuantityValue> for DataValue {
    fn from(v: QuantityValue) -> Self {
        DataValue::Quantity(v)
    }
}
impl From<TimeValue> for DataValue {
    fn from(v: TimeValue) -> Self {
        DataValue::Time(v)
    }
}
impl From<GlobeCoordinatesValue> for DataValue {
    fn from(v: GlobeCoordinatesValue) -> Self {
        DataValue::GlobeCoordinates(v)
    }
}
impl From<MonolingualTextValue> for DataValue {
    fn from(v: MonolingualTextValue) -> Self {
        DataValue::MonolingualText(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item::new(42, 1)
    }

    #[test]
    fn registry_resolves_known_variants() {
        let registry = DatatypeRegistry::standard();
        assert_eq!(registry.len(), 8);
        let descriptor = registry.resolve("QuantityValue").unwrap();
        assert_eq!(descriptor.kind, ValueKind::Quantity);
        assert_eq!(descriptor.wire_name, "quantity");
        assert!(registry.resolve("Item").unwrap().kind.is_entity());
    }

    #[test]
    fn registry_rejects_unknown_variants() {
        let registry = DatatypeRegistry::standard();
        let err = registry.resolve("UserValue").unwrap_err();
        assert!(matches!(err, WikibaseError::UnknownDatatype(name) if name == "UserValue"));
        assert!(!registry.contains("quantityvalue"));
    }

    #[test]
    fn uids_are_unique_and_round_trip() {
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::from_uid(kind.uid()), Some(kind));
        }
        assert_eq!(ValueKind::from_uid(99), None);
    }

    #[test]
    fn coordinates_need_positive_precision() {
        let zero = GlobeCoordinatesValue::new(
            Decimal::from_str("48.85").unwrap(),
            Decimal::from_str("2.35").unwrap(),
            Decimal::from_str("0").unwrap(),
            &item(),
        );
        let err = DataValue::from(zero).validate().unwrap_err();
        assert!(matches!(err, WikibaseError::InvalidField { field: "precision", .. }));

        let fine = GlobeCoordinatesValue::new(
            Decimal::from_str("48.85").unwrap(),
            Decimal::from_str("2.35").unwrap(),
            Decimal::from_str("0.0000001").unwrap(),
            &item(),
        );
        assert!(DataValue::from(fine).validate().is_ok());
    }

    #[test]
    fn quantity_bounds_must_enclose_number() {
        let q = QuantityValue::new(7.0).with_bounds(8.0, 9.0);
        assert!(DataValue::from(q).validate().is_err());
        let q = QuantityValue::new(7.0).with_bounds(6.5, 7.5);
        assert!(DataValue::from(q).validate().is_ok());
        assert!(DataValue::from(QuantityValue::new(f64::NAN)).validate().is_err());
    }

    #[test]
    fn time_from_date_uses_day_precision() {
        let date = NaiveDate::from_ymd_opt(2012, 12, 12).unwrap();
        let t = TimeValue::from_date(date, &item());
        assert_eq!(t.time, "+2012-12-12T00:00:00Z");
        assert_eq!(t.precision, Some(TimePrecision::Day));
        assert!(DataValue::from(t).validate().is_ok());

        let bad = TimeValue::new("12/12/2012", TimePrecision::Day, &item());
        assert!(DataValue::from(bad).validate().is_err());
    }

    #[test]
    fn time_precision_codes() {
        assert_eq!(TimePrecision::from_code(9).unwrap(), TimePrecision::Year);
        assert_eq!(TimePrecision::Day.code(), 11);
        assert!(TimePrecision::from_code(12).is_err());
    }

    #[test]
    fn language_codes_and_urls() {
        assert!(validate_language("fr").is_ok());
        assert!(validate_language("grc").is_ok());
        assert!(validate_language("en-gb").is_ok());
        assert!(validate_language("French").is_err());
        assert!(DataValue::from(UrlValue::new("https://pleiades.stoa.org/places/423025")).validate().is_ok());
        assert!(DataValue::from(UrlValue::new("not a url")).validate().is_err());
    }
}
