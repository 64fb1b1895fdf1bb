use tracing::{debug, warn};

use crate::construct::{EntityKind, Identity, StoredValue, Value};
use crate::database::{Database, Work};
use crate::datatype::{DataValue, ValueKind};
use crate::error::{Result, WikibaseError};

impl<'db> Work<'db> {
    /// Validates and stores a data value declared as the given variant.
    pub fn create_value(&mut self, class_name: &str, data: DataValue) -> Result<StoredValue> {
        let descriptor = self.registry().resolve(class_name)?;
        if descriptor.kind.is_entity() {
            return Err(WikibaseError::Validation(format!(
                "{} values are entities, create them as items or properties",
                class_name
            )));
        }
        if descriptor.kind != data.kind() {
            return Err(WikibaseError::Validation(format!(
                "fields of a {} cannot be stored as {}",
                data.kind(),
                class_name
            )));
        }
        self.check_data_value(&data)?;
        let identity = self.persistor().persist_data_value(&data)?;
        Ok(StoredValue::new(identity, data))
    }
    /// Stores a data value under its own variant.
    pub fn store_value(&mut self, data: DataValue) -> Result<StoredValue> {
        let class_name = data.kind().class_name();
        self.create_value(class_name, data)
    }
    fn check_data_value(&self, data: &DataValue) -> Result<()> {
        data.validate()?;
        let persistor = self.persistor();
        for identity in data.referenced_items() {
            match persistor.restore_entity(identity)? {
                Some(entity) if entity.kind() == EntityKind::Item => (),
                _ => {
                    return Err(WikibaseError::invalid_field(
                        "item",
                        format!("{} references {} which is not an item", data.kind(), identity),
                    ));
                }
            }
        }
        Ok(())
    }
    /// Restores any stored value, entities included.
    pub fn value(&self, identity: Identity) -> Result<Option<Value>> {
        let persistor = self.persistor();
        let kind = match persistor.value_kind(identity)? {
            Some(kind) => kind,
            None => return Ok(None),
        };
        if kind.is_entity() {
            return Ok(persistor.restore_entity(identity)?.map(Value::Entity));
        }
        match persistor.restore_data_value(identity, kind)? {
            Some(data) => Ok(Some(Value::Data(StoredValue::new(identity, data)))),
            None => Err(WikibaseError::DataCorruption {
                message: format!("value {} has no {} row", identity, kind),
            }),
        }
    }
    pub(crate) fn require_value(&self, identity: Identity) -> Result<Value> {
        self.value(identity)?
            .ok_or_else(|| WikibaseError::NotFound(format!("value {}", identity)))
    }
    /// The variant a value was stored as.
    pub(crate) fn stored_kind(&self, identity: Identity) -> Result<ValueKind> {
        self.persistor()
            .value_kind(identity)?
            .ok_or_else(|| WikibaseError::NotFound(format!("value {}", identity)))
    }
    /// Corrects the fields of a stored value in place. The variant is fixed.
    pub fn update_value(&mut self, value: &StoredValue, data: DataValue) -> Result<StoredValue> {
        let stored = self.stored_kind(value.identity())?;
        if stored != data.kind() {
            return Err(WikibaseError::Validation(format!(
                "a {} cannot become a {}",
                stored,
                data.kind()
            )));
        }
        self.check_data_value(&data)?;
        self.persistor().update_data_value(value.identity(), &data)?;
        debug!(value = value.identity(), "updated value");
        Ok(StoredValue::new(value.identity(), data))
    }
    /// Deletes a data value no snak uses any more.
    pub fn delete_value(&mut self, value: &StoredValue) -> Result<()> {
        let stored = self.stored_kind(value.identity())?;
        if stored.is_entity() {
            return Err(WikibaseError::Validation(format!(
                "value {} is an entity, delete it as one",
                value.identity()
            )));
        }
        let persistor = self.persistor();
        let usage = persistor.value_usage(value.identity())?;
        if usage > 0 {
            warn!(value = value.identity(), snaks = usage, "delete refused");
            return Err(WikibaseError::ProtectedReference(format!(
                "value {} is used by {} snak(s)",
                value.identity(),
                usage
            )));
        }
        persistor.delete_value(value.identity())?;
        debug!(value = value.identity(), "deleted value");
        Ok(())
    }
    pub fn count_values(&self, class_name: &str) -> Result<usize> {
        let descriptor = self.registry().resolve(class_name)?;
        self.persistor().count_values(descriptor.kind)
    }
    /// Releases a value whose last snak is gone. Entities are shared and never released.
    pub(crate) fn release_value(&mut self, identity: Identity) -> Result<()> {
        let persistor = self.persistor();
        match persistor.value_kind(identity)? {
            Some(kind) if !kind.is_entity() => {
                if persistor.value_usage(identity)? == 0 {
                    persistor.delete_value(identity)?;
                    debug!(value = identity, kind = %kind, "released value");
                }
            }
            _ => (),
        }
        Ok(())
    }
}

impl Database {
    delegate! {
        write fn create_value(&self, class_name: &str, data: DataValue) -> StoredValue;
        write fn store_value(&self, data: DataValue) -> StoredValue;
        read fn value(&self, identity: Identity) -> Option<Value>;
        write fn update_value(&self, value: &StoredValue, data: DataValue) -> StoredValue;
        write fn delete_value(&self, value: &StoredValue) -> ();
        read fn count_values(&self, class_name: &str) -> usize;
    }
    pub fn count_kind(&self, kind: ValueKind) -> Result<usize> {
        self.count_values(kind.class_name())
    }
}
