//! Symbolic keys for well-known items and properties.
//!
//! Application code never hard-codes display ids. It asks for `is_a` or
//! `earth` instead, and the mapping tables resolve those keys. Both tables are
//! bijective: one key per entity and one entity per key.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use bimap::BiMap;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::construct::{Entity, Identity, Item, Property};
use crate::database::{Database, Work};
use crate::datatype::ValueKind;
use crate::error::{Result, WikibaseError};
use crate::persist::{MappingTable, Persistor};

/// The property stating what type an item is an instance of.
pub const IS_A: &str = "is_a";
/// Default globe of coordinates.
pub const EARTH: &str = "earth";
/// Default calendar model of time values.
pub const GREGORIAN: &str = "gregorian";

// ------------- Keeper -------------
/// Holds the committed key to entity mappings of one table.
#[derive(Debug)]
pub struct MappingKeeper<E: Eq + Hash> {
    kept: BiMap<String, E>,
}
impl<E: Eq + Hash + Clone> MappingKeeper<E> {
    pub fn new() -> Self {
        Self { kept: BiMap::new() }
    }
    pub fn keep(&mut self, key: String, entity: E) {
        self.kept.insert(key, entity);
    }
    pub fn get(&self, key: &str) -> Option<&E> {
        self.kept.get_by_left(key)
    }
    pub fn has(&self, key: &str) -> bool {
        self.kept.contains_left(key)
    }
    pub fn key_of(&self, entity: &E) -> Option<&String> {
        self.kept.get_by_right(entity)
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
impl<E: Eq + Hash + Clone> Default for MappingKeeper<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// An entity kind that has its own mapping table.
pub trait MappedEntity: Clone + Eq + Hash + fmt::Display {
    const TABLE: MappingTable;
    const NAME: &'static str;
    fn identity(&self) -> Identity;
    fn from_entity(entity: Entity) -> Option<Self>;
    fn keeper(database: &Database) -> Arc<Mutex<MappingKeeper<Self>>>;
}

impl MappedEntity for Item {
    const TABLE: MappingTable = MappingTable {
        table: "ItemMapping",
        column: "Item_Identity",
    };
    const NAME: &'static str = "item";
    fn identity(&self) -> Identity {
        Item::identity(self)
    }
    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Item(item) => Some(item),
            Entity::Property(_) => None,
        }
    }
    fn keeper(database: &Database) -> Arc<Mutex<MappingKeeper<Self>>> {
        database.item_mapping_keeper()
    }
}

impl MappedEntity for Property {
    const TABLE: MappingTable = MappingTable {
        table: "PropertyMapping",
        column: "Property_Identity",
    };
    const NAME: &'static str = "property";
    fn identity(&self) -> Identity {
        Property::identity(self)
    }
    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Property(property) => Some(property),
            Entity::Item(_) => None,
        }
    }
    fn keeper(database: &Database) -> Arc<Mutex<MappingKeeper<Self>>> {
        database.property_mapping_keeper()
    }
}

fn restore_keeper<E: MappedEntity>(persistor: &Persistor) -> Result<MappingKeeper<E>> {
    let mut keeper = MappingKeeper::new();
    for (key, identity) in persistor.all_mappings(E::TABLE)? {
        let entity = persistor
            .restore_entity(identity)?
            .and_then(E::from_entity)
            .ok_or_else(|| WikibaseError::DataCorruption {
                message: format!("mapping '{}' points at a missing {}", key, E::NAME),
            })?;
        keeper.keep(key, entity);
    }
    Ok(keeper)
}

impl Database {
    pub(crate) fn restore_mappings(&self, connection: &Connection) -> Result<()> {
        let persistor = Persistor::new(connection);
        let items = restore_keeper::<Item>(&persistor)?;
        let properties = restore_keeper::<Property>(&persistor)?;
        *self.item_mapping_keeper.lock()? = items;
        *self.property_mapping_keeper.lock()? = properties;
        Ok(())
    }
    pub fn item_mapping(&self) -> ItemMapping<'_> {
        Mapping::new(self)
    }
    pub fn property_mapping(&self) -> PropertyMapping<'_> {
        Mapping::new(self)
    }
    delegate! {
        /// Creates the `is_a` property and the `earth` and `gregorian` items,
        /// skipping whatever is already mapped.
        write fn bootstrap(&self) -> ();
    }
}

// ------------- Registry -------------
/// Key lookups against the committed state, registrations in their own transaction.
pub struct Mapping<'db, E: MappedEntity> {
    database: &'db Database,
    entity: PhantomData<E>,
}
pub type ItemMapping<'db> = Mapping<'db, Item>;
pub type PropertyMapping<'db> = Mapping<'db, Property>;

impl<'db, E: MappedEntity> Mapping<'db, E> {
    pub fn new(database: &'db Database) -> Self {
        Self {
            database,
            entity: PhantomData,
        }
    }
    pub fn get(&self, key: &str) -> Result<E> {
        let keeper = E::keeper(self.database);
        let keeper = keeper.lock()?;
        keeper
            .get(key)
            .cloned()
            .ok_or_else(|| WikibaseError::UnknownMapping(key.to_string()))
    }
    pub fn has(&self, key: &str) -> bool {
        let keeper = E::keeper(self.database);
        let found = keeper.lock().map(|k| k.has(key)).unwrap_or(false);
        found
    }
    pub fn key_of(&self, entity: &E) -> Option<String> {
        let keeper = E::keeper(self.database);
        let key = keeper.lock().ok().and_then(|k| k.key_of(entity).cloned());
        key
    }
    pub fn register(&self, key: &str, entity: &E) -> Result<()> {
        self.database.transact(|work| work.register(key, entity))
    }
    pub fn unregister(&self, key: &str) -> Result<()> {
        self.database.transact(|work| work.unregister::<E>(key))
    }
}

impl<'db> Work<'db> {
    /// Resolves a key inside the current transaction, seeing uncommitted registrations.
    pub fn mapped<E: MappedEntity>(&self, key: &str) -> Result<E> {
        let persistor = self.persistor();
        let identity = persistor
            .mapping_by_key(E::TABLE, key)?
            .ok_or_else(|| WikibaseError::UnknownMapping(key.to_string()))?;
        persistor
            .restore_entity(identity)?
            .and_then(E::from_entity)
            .ok_or_else(|| WikibaseError::DataCorruption {
                message: format!("mapping '{}' points at a missing {}", key, E::NAME),
            })
    }
    pub fn has_mapping<E: MappedEntity>(&self, key: &str) -> Result<bool> {
        Ok(self.persistor().mapping_by_key(E::TABLE, key)?.is_some())
    }
    pub fn register<E: MappedEntity>(&mut self, key: &str, entity: &E) -> Result<()> {
        let persistor = self.persistor();
        match persistor.mapping_by_key(E::TABLE, key)? {
            Some(identity) if identity == entity.identity() => return Ok(()),
            Some(_) => {
                return Err(WikibaseError::Validation(format!(
                    "key '{}' is already mapped to another {}",
                    key,
                    E::NAME
                )));
            }
            None => (),
        }
        if let Some(existing) = persistor.mapping_by_entity(E::TABLE, entity.identity())? {
            return Err(WikibaseError::Validation(format!(
                "{} {} is already mapped under '{}'",
                E::NAME,
                entity,
                existing
            )));
        }
        if persistor
            .restore_entity(entity.identity())?
            .and_then(E::from_entity)
            .is_none()
        {
            return Err(WikibaseError::NotFound(format!("{} {}", E::NAME, entity)));
        }
        persistor.persist_mapping(E::TABLE, key, entity.identity())?;
        debug!(key, entity = %entity, "registered mapping");
        self.mappings_changed();
        Ok(())
    }
    pub fn unregister<E: MappedEntity>(&mut self, key: &str) -> Result<()> {
        if self.persistor().delete_mapping(E::TABLE, key)? == 0 {
            return Err(WikibaseError::UnknownMapping(key.to_string()));
        }
        debug!(key, "unregistered mapping");
        self.mappings_changed();
        Ok(())
    }
    pub fn bootstrap(&mut self) -> Result<()> {
        if !self.has_mapping::<Property>(IS_A)? {
            let datatype = self.datatype(ValueKind::Item.class_name())?;
            let is_a = self.create_property(&datatype)?;
            self.set_label(&is_a.entity(), "en", "is a")?;
            self.register(IS_A, &is_a)?;
            info!(property = %is_a, "bootstrapped is_a");
        }
        for (key, label) in [(EARTH, "Earth"), (GREGORIAN, "proleptic Gregorian calendar")] {
            if !self.has_mapping::<Item>(key)? {
                let item = self.create_item()?;
                self.set_label(&item.entity(), "en", label)?;
                self.register(key, &item)?;
                info!(item = %item, key, "bootstrapped item");
            }
        }
        Ok(())
    }
}
