//! JSON payloads exchanged with request handlers and importers.
//!
//! Entities are referenced either by display id (`12`) or by mapping key
//! (`"earth"`). Values are objects keyed by variant specific field names:
//!
//! | datatype                | fields                                                      |
//! |-------------------------|-------------------------------------------------------------|
//! | `Item`                  | `item`                                                      |
//! | `Property`              | `property`                                                  |
//! | `StringValue`/`UrlValue`| `value`                                                     |
//! | `QuantityValue`         | `number`, `lower`, `upper`, `unit`                          |
//! | `TimeValue`             | `time`, `timezone`, `precision`, `after`, `before`, `calendarmodel` |
//! | `GlobeCoordinatesValue` | `latitude`, `longitude`, `precision`, `globe`               |
//! | `MonolingualTextValue`  | `language`, `value`                                         |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

use crate::construct::{
    Datatype, DisplayId, Entity, Identity, Item, Property, Rank, Snak, SnakKind, SnakValue,
    Statement, Value,
};
use crate::database::{Database, Work};
use crate::datatype::{
    DataValue, Decimal, GlobeCoordinatesValue, MonolingualTextValue, QuantityValue, StringValue,
    TimePrecision, TimeValue, UrlValue, ValueKind,
};
use crate::error::{Result, WikibaseError};
use crate::mapping::{EARTH, GREGORIAN};

/// Precision given to coordinates that arrive without one.
pub const DEFAULT_GLOBE_PRECISION: &str = "0.0000001";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    DisplayId(DisplayId),
    Key(String),
}

/// Presence kind as `"value"`, `"somevalue"`, `"novalue"` or `0`, `1`, `2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Presence {
    Code(i64),
    Name(String),
}
impl Presence {
    pub fn kind(&self) -> Result<SnakKind> {
        match self {
            Presence::Code(code) => SnakKind::from_code(*code),
            Presence::Name(name) => SnakKind::from_wire_name(name),
        }
    }
}
impl Default for Presence {
    fn default() -> Self {
        Presence::Name(SnakKind::Value.wire_name().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakPayload {
    pub property: EntityRef,
    #[serde(default, alias = "snak_type")]
    pub snaktype: Presence,
    #[serde(default)]
    pub value: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPayload {
    #[serde(flatten)]
    pub mainsnak: SnakPayload,
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub qualifiers: Vec<SnakPayload>,
    #[serde(default)]
    pub references: Vec<Vec<SnakPayload>>,
}

/// New mainsnak and rank for an existing statement; the property stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementUpdate {
    #[serde(default, alias = "snak_type")]
    pub snaktype: Presence,
    #[serde(default)]
    pub value: Option<JsonValue>,
    #[serde(default)]
    pub rank: i64,
}

// ------------- Field access -------------
fn field<'a>(json: &'a JsonValue, name: &str) -> Option<&'a JsonValue> {
    json.get(name).filter(|v| !v.is_null())
}
fn required<'a>(json: &'a JsonValue, name: &'static str) -> Result<&'a JsonValue> {
    field(json, name).ok_or_else(|| WikibaseError::invalid_field(name, "missing"))
}
fn as_text(name: &'static str, json: &JsonValue) -> Result<String> {
    json.as_str()
        .map(str::to_string)
        .ok_or_else(|| WikibaseError::invalid_field(name, format!("expected a string, got {}", json)))
}
fn as_f64(name: &'static str, json: &JsonValue) -> Result<f64> {
    let parsed = match json {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| WikibaseError::invalid_field(name, format!("expected a number, got {}", json)))
}
fn as_i64(name: &'static str, json: &JsonValue) -> Result<i64> {
    let parsed = match json {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| WikibaseError::invalid_field(name, format!("expected an integer, got {}", json)))
}
fn as_decimal(name: &'static str, json: &JsonValue) -> Result<Decimal> {
    match json {
        JsonValue::Number(n) => Decimal::parse(name, &n.to_string()),
        JsonValue::String(s) => Decimal::parse(name, s.trim()),
        _ => Err(WikibaseError::invalid_field(
            name,
            format!("expected a decimal, got {}", json),
        )),
    }
}
fn as_entity_ref(name: &'static str, json: &JsonValue) -> Result<EntityRef> {
    serde_json::from_value(json.clone())
        .map_err(|_| WikibaseError::invalid_field(name, format!("{} is not an entity reference", json)))
}
/// A value given either as `{"<name>": x}` or as the bare `x`.
fn unwrap_field<'a>(json: &'a JsonValue, name: &'static str) -> Result<&'a JsonValue> {
    if json.is_object() {
        required(json, name)
    } else {
        Ok(json)
    }
}

impl<'db> Work<'db> {
    pub fn resolve_item(&self, reference: &EntityRef) -> Result<Item> {
        match reference {
            EntityRef::DisplayId(display_id) => self
                .get_item(*display_id)?
                .ok_or_else(|| WikibaseError::NotFound(format!("Q{}", display_id))),
            EntityRef::Key(key) => self.mapped::<Item>(key),
        }
    }
    pub fn resolve_property(&self, reference: &EntityRef) -> Result<Property> {
        match reference {
            EntityRef::DisplayId(display_id) => self
                .get_property(*display_id)?
                .ok_or_else(|| WikibaseError::NotFound(format!("P{}", display_id))),
            EntityRef::Key(key) => self.mapped::<Property>(key),
        }
    }
    fn item_field(&self, json: &JsonValue, name: &'static str) -> Result<Option<Item>> {
        match field(json, name) {
            Some(reference) => Ok(Some(self.resolve_item(&as_entity_ref(name, reference)?)?)),
            None => Ok(None),
        }
    }
    /// Reads the data value of a non-entity datatype without storing it.
    pub fn data_value_from_json(&self, kind: ValueKind, json: &JsonValue) -> Result<DataValue> {
        let data = match kind {
            ValueKind::String => {
                DataValue::from(StringValue::new(as_text("value", unwrap_field(json, "value")?)?))
            }
            ValueKind::Url => {
                DataValue::from(UrlValue::new(as_text("value", unwrap_field(json, "value")?)?))
            }
            ValueKind::Quantity => {
                let number = as_f64("number", unwrap_field(json, "number")?)?;
                let mut quantity = QuantityValue::new(number);
                quantity.lower = field(json, "lower").map(|v| as_f64("lower", v)).transpose()?;
                quantity.upper = field(json, "upper").map(|v| as_f64("upper", v)).transpose()?;
                if let Some(unit) = self.item_field(json, "unit")? {
                    quantity = quantity.with_unit(&unit);
                }
                DataValue::from(quantity)
            }
            ValueKind::Time => {
                let calendar_model = match self.item_field(json, "calendarmodel")? {
                    Some(item) => item,
                    None => self.mapped::<Item>(GREGORIAN)?,
                };
                let precision = match field(json, "precision") {
                    Some(p) => TimePrecision::from_code(as_i64("precision", p)?)?,
                    None => TimePrecision::Day,
                };
                let mut time = TimeValue::new(
                    as_text("time", required(json, "time")?)?,
                    precision,
                    &calendar_model,
                );
                if let Some(timezone) = field(json, "timezone") {
                    time.timezone = i32::try_from(as_i64("timezone", timezone)?)
                        .map_err(|_| WikibaseError::invalid_field("timezone", "out of range"))?;
                }
                time.after = field(json, "after").map(|v| as_i64("after", v)).transpose()?;
                time.before = field(json, "before").map(|v| as_i64("before", v)).transpose()?;
                DataValue::from(time)
            }
            ValueKind::GlobeCoordinates => {
                let globe = match self.item_field(json, "globe")? {
                    Some(item) => item,
                    None => self.mapped::<Item>(EARTH)?,
                };
                let precision = match field(json, "precision") {
                    Some(p) => as_decimal("precision", p)?,
                    None => Decimal::parse("precision", DEFAULT_GLOBE_PRECISION)?,
                };
                DataValue::from(GlobeCoordinatesValue::new(
                    as_decimal("latitude", required(json, "latitude")?)?,
                    as_decimal("longitude", required(json, "longitude")?)?,
                    precision,
                    &globe,
                ))
            }
            ValueKind::MonolingualText => DataValue::from(MonolingualTextValue::new(
                as_text("language", required(json, "language")?)?,
                as_text("value", required(json, "value")?)?,
            )),
            ValueKind::Item | ValueKind::Property => {
                return Err(WikibaseError::Validation(format!(
                    "{} is an entity datatype",
                    kind
                )));
            }
        };
        Ok(data)
    }
    /// Turns a JSON value into a stored value of the given datatype. Entity
    /// datatypes resolve an existing entity; other datatypes store a new value.
    pub fn value_from_json(&mut self, datatype: &Datatype, json: &JsonValue) -> Result<Value> {
        match datatype.kind() {
            ValueKind::Item => {
                let reference = as_entity_ref("item", unwrap_field(json, "item")?)?;
                Ok(self.resolve_item(&reference)?.value())
            }
            ValueKind::Property => {
                let reference = as_entity_ref("property", unwrap_field(json, "property")?)?;
                Ok(self.resolve_property(&reference)?.value())
            }
            kind => {
                let data = self.data_value_from_json(kind, json)?;
                Ok(self.create_value(datatype.class_name(), data)?.value())
            }
        }
    }
    fn snak_body(
        &mut self,
        property: &Property,
        presence: &Presence,
        value: Option<&JsonValue>,
    ) -> Result<SnakValue> {
        let kind = presence.kind()?;
        let value = match (kind, value.filter(|v| !v.is_null())) {
            (SnakKind::Value, Some(json)) => Some(self.value_from_json(&property.datatype(), json)?),
            (SnakKind::Value, None) => {
                return Err(WikibaseError::invalid_field("value", "a value snak needs a value"));
            }
            (_, Some(_)) => {
                return Err(WikibaseError::Validation(format!(
                    "a {} snak cannot carry a value",
                    kind.wire_name()
                )));
            }
            (_, None) => None,
        };
        SnakValue::from_parts(kind, value)
    }
    pub fn snak_from_json(&mut self, payload: &SnakPayload) -> Result<(Property, SnakValue)> {
        let property = self.resolve_property(&payload.property)?;
        let body = self.snak_body(&property, &payload.snaktype, payload.value.as_ref())?;
        Ok((property, body))
    }
    /// Creates a statement with its qualifiers and references from one payload.
    pub fn add_statement_from_json(
        &mut self,
        subject: &Entity,
        payload: &StatementPayload,
    ) -> Result<Statement> {
        let rank = Rank::try_from(payload.rank)?;
        let (property, body) = self.snak_from_json(&payload.mainsnak)?;
        let statement = match &body {
            SnakValue::Value(value) => self.add_value(subject, &property, value, rank)?,
            _ => self.add_statement(subject, &property, body, rank)?,
        };
        for qualifier in &payload.qualifiers {
            let (property, body) = self.snak_from_json(qualifier)?;
            self.add_qualifier(&statement, &property, body)?;
        }
        for reference in &payload.references {
            let mut snaks = Vec::with_capacity(reference.len());
            for snak in reference {
                snaks.push(self.snak_from_json(snak)?);
            }
            self.add_reference(&statement, &snaks)?;
        }
        Ok(statement)
    }
    pub fn update_statement_from_json(
        &mut self,
        statement: &Statement,
        update: &StatementUpdate,
    ) -> Result<Statement> {
        let rank = Rank::try_from(update.rank)?;
        let property = statement.property().clone();
        let body = self.snak_body(&property, &update.snaktype, update.value.as_ref())?;
        self.update_statement(statement, body, rank)
    }

    // ------------- Serialization -------------
    fn display_id_of(&self, identity: Identity) -> Result<DisplayId> {
        Ok(self.require_entity(identity)?.display_id())
    }
    pub fn value_to_json(&self, value: &Value) -> Result<JsonValue> {
        let json = match value {
            Value::Entity(Entity::Item(item)) => json!({ "item": item.display_id() }),
            Value::Entity(Entity::Property(property)) => {
                json!({ "property": property.display_id() })
            }
            Value::Data(stored) => match stored.data() {
                DataValue::String(s) => json!({ "value": s.text }),
                DataValue::Url(u) => json!({ "value": u.text }),
                DataValue::Quantity(q) => json!({
                    "number": q.number,
                    "lower": q.lower,
                    "upper": q.upper,
                    "unit": q.unit.map(|u| self.display_id_of(u)).transpose()?,
                }),
                DataValue::Time(t) => json!({
                    "time": t.time,
                    "timezone": t.timezone,
                    "precision": t.precision.map(TimePrecision::code),
                    "after": t.after,
                    "before": t.before,
                    "calendarmodel": self.display_id_of(t.calendar_model)?,
                }),
                DataValue::GlobeCoordinates(g) => json!({
                    "latitude": g.latitude.to_string(),
                    "longitude": g.longitude.to_string(),
                    "precision": g.precision.to_string(),
                    "globe": self.display_id_of(g.globe)?,
                }),
                DataValue::MonolingualText(m) => json!({
                    "language": m.language,
                    "value": m.text,
                }),
            },
        };
        Ok(json)
    }
    pub fn snak_to_json(&self, snak: &Snak) -> Result<JsonValue> {
        let mut object = Map::new();
        object.insert("property".to_string(), json!(snak.property().display_id()));
        object.insert(
            "datatype".to_string(),
            json!(snak.property().datatype().kind().wire_name()),
        );
        object.insert("snaktype".to_string(), json!(snak.kind().wire_name()));
        if let Some(value) = snak.value() {
            object.insert("value".to_string(), self.value_to_json(value)?);
        }
        Ok(JsonValue::Object(object))
    }
    pub fn statement_to_json(&self, statement: &Statement) -> Result<JsonValue> {
        let qualifiers = self
            .qualifiers(statement)?
            .iter()
            .map(|q| self.snak_to_json(q.snak()))
            .collect::<Result<Vec<JsonValue>>>()?;
        let mut references = Vec::new();
        for record in self.references(statement)? {
            let snaks = record
                .snaks()
                .iter()
                .map(|r| self.snak_to_json(r.snak()))
                .collect::<Result<Vec<JsonValue>>>()?;
            references.push(JsonValue::Array(snaks));
        }
        Ok(json!({
            "id": statement.identity(),
            "subject": statement.subject().to_string(),
            "rank": statement.rank().code(),
            "mainsnak": self.snak_to_json(statement.mainsnak())?,
            "qualifiers": qualifiers,
            "references": references,
        }))
    }
}

impl Database {
    delegate! {
        write fn value_from_json(&self, datatype: &Datatype, json: &JsonValue) -> Value;
        write fn add_statement_from_json(&self, subject: &Entity, payload: &StatementPayload) -> Statement;
        write fn update_statement_from_json(&self, statement: &Statement, update: &StatementUpdate) -> Statement;
        read fn value_to_json(&self, value: &Value) -> JsonValue;
        read fn statement_to_json(&self, statement: &Statement) -> JsonValue;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_accepts_names_and_codes() {
        let by_name: Presence = serde_json::from_str("\"somevalue\"").unwrap();
        let by_code: Presence = serde_json::from_str("2").unwrap();
        assert_eq!(by_name.kind().unwrap(), SnakKind::SomeValue);
        assert_eq!(by_code.kind().unwrap(), SnakKind::NoValue);
        assert!(Presence::Code(7).kind().is_err());
        assert_eq!(Presence::default().kind().unwrap(), SnakKind::Value);
    }

    #[test]
    fn entity_refs_are_ids_or_keys() {
        let id: EntityRef = serde_json::from_str("12").unwrap();
        let key: EntityRef = serde_json::from_str("\"earth\"").unwrap();
        assert_eq!(id, EntityRef::DisplayId(12));
        assert_eq!(key, EntityRef::Key("earth".to_string()));
    }

    #[test]
    fn statement_payload_flattens_its_mainsnak() {
        let payload: StatementPayload = serde_json::from_str(
            r#"{"property": 3, "snaktype": 0, "value": {"number": 7}, "rank": 1,
                "qualifiers": [{"property": "is_a", "snaktype": "novalue"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.mainsnak.property, EntityRef::DisplayId(3));
        assert_eq!(payload.mainsnak.snaktype.kind().unwrap(), SnakKind::Value);
        assert_eq!(payload.rank, 1);
        assert_eq!(payload.qualifiers.len(), 1);
        assert!(payload.references.is_empty());
    }

    #[test]
    fn numbers_may_arrive_as_strings() {
        assert_eq!(as_f64("number", &json!("7.5")).unwrap(), 7.5);
        assert_eq!(as_decimal("latitude", &json!(48.85)).unwrap().to_string(), "48.85");
        assert!(as_i64("precision", &json!("day")).is_err());
    }
}
