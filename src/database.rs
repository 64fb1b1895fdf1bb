use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::construct::{Item, Property};
use crate::datatype::DatatypeRegistry;
use crate::error::Result;
use crate::mapping::MappingKeeper;
use crate::persist::Persistor;
use crate::settings::Settings;

/// Generates `Database` methods that run one `Work` operation in its own
/// transaction. Mutators go through `transact`, readers through `read`.
macro_rules! delegate {
    (@call write $db:ident $name:ident $($arg:ident)*) => {
        $db.transact(|work| work.$name($($arg),*))
    };
    (@call read $db:ident $name:ident $($arg:ident)*) => {
        $db.read(|work| work.$name($($arg),*))
    };
    ($(
        $(#[$meta:meta])*
        $kind:ident fn $name:ident(&self $(, $arg:ident: $ty:ty)* $(,)?) -> $ret:ty;
    )*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self $(, $arg: $ty)*) -> $crate::error::Result<$ret> {
                delegate!(@call $kind self $name $($arg)*)
            }
        )*
    };
}

pub enum PersistenceMode {
    InMemory,
    File(String),
}

impl PersistenceMode {
    /// `":memory:"` (or an empty string) selects an in-memory store, anything else is a path.
    pub fn from_location(location: &str) -> Self {
        match location.trim() {
            "" | ":memory:" => PersistenceMode::InMemory,
            path => PersistenceMode::File(path.to_string()),
        }
    }
}

// ------------- Database -------------
// This sets up the database with the necessary structures
pub struct Database {
    // the single connection, every unit of work holds this lock for its duration
    connection: Mutex<Connection>,
    // built once and handed to every unit of work
    registry: DatatypeRegistry,
    // committed mappings, reloaded after every transaction that changed them
    pub item_mapping_keeper: Arc<Mutex<MappingKeeper<Item>>>,
    pub property_mapping_keeper: Arc<Mutex<MappingKeeper<Property>>>,
}

impl Database {
    pub fn new(mode: PersistenceMode) -> Result<Database> {
        let connection = match &mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        Self::open(connection, None)
    }
    pub fn from_settings(settings: &Settings) -> Result<Database> {
        let connection = match PersistenceMode::from_location(&settings.database) {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        let database = Self::open(connection, Some(settings.busy_timeout_ms))?;
        if settings.bootstrap {
            database.transact(|work| work.bootstrap())?;
        }
        Ok(database)
    }
    fn open(connection: Connection, busy_timeout_ms: Option<u64>) -> Result<Database> {
        if let Some(ms) = busy_timeout_ms {
            connection.busy_timeout(Duration::from_millis(ms))?;
        }
        Persistor::ensure_schema(&connection)?;
        info!("schema ensured");
        let database = Database {
            connection: Mutex::new(connection),
            registry: DatatypeRegistry::standard(),
            item_mapping_keeper: Arc::new(Mutex::new(MappingKeeper::new())),
            property_mapping_keeper: Arc::new(Mutex::new(MappingKeeper::new())),
        };
        // Every registry variant gets its datatype row
        database.transact(|work| work.seed_datatypes())?;
        {
            let connection = database.connection.lock()?;
            database.restore_mappings(&connection)?;
        }
        info!(
            items = database.item_mapping_keeper.lock()?.len(),
            properties = database.property_mapping_keeper.lock()?.len(),
            "database opened"
        );
        Ok(database)
    }
    // functions to access the owned keepers
    pub fn item_mapping_keeper(&self) -> Arc<Mutex<MappingKeeper<Item>>> {
        Arc::clone(&self.item_mapping_keeper)
    }
    pub fn property_mapping_keeper(&self) -> Arc<Mutex<MappingKeeper<Property>>> {
        Arc::clone(&self.property_mapping_keeper)
    }
    pub fn registry(&self) -> &DatatypeRegistry {
        &self.registry
    }
    /// Runs `work` inside one `BEGIN IMMEDIATE` transaction. Any error rolls
    /// everything back. Units of work must not call back into the database.
    pub fn transact<T>(&self, work: impl FnOnce(&mut Work<'_>) -> Result<T>) -> Result<T> {
        let mut connection = self.connection.lock()?;
        let (result, mappings_changed) = {
            let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut unit = Work {
                tx,
                registry: &self.registry,
                mappings_changed: false,
            };
            match work(&mut unit) {
                Ok(result) => {
                    let mappings_changed = unit.mappings_changed;
                    unit.tx.commit()?;
                    (result, mappings_changed)
                }
                Err(e) => {
                    warn!(error = %e, "transaction rolled back");
                    return Err(e);
                }
            }
        };
        if mappings_changed {
            self.restore_mappings(&connection)?;
        }
        Ok(result)
    }
    /// Runs a read-only `work` against a consistent snapshot.
    pub fn read<T>(&self, work: impl FnOnce(&Work<'_>) -> Result<T>) -> Result<T> {
        let mut connection = self.connection.lock()?;
        let tx = connection.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let unit = Work {
            tx,
            registry: &self.registry,
            mappings_changed: false,
        };
        work(&unit)
    }
}

// ------------- Unit of work -------------
/// One open transaction plus what the operations running in it need.
pub struct Work<'db> {
    tx: Transaction<'db>,
    registry: &'db DatatypeRegistry,
    mappings_changed: bool,
}

impl<'db> Work<'db> {
    pub fn persistor(&self) -> Persistor<'_> {
        Persistor::new(&self.tx)
    }
    pub fn registry(&self) -> &DatatypeRegistry {
        self.registry
    }
    pub(crate) fn mappings_changed(&mut self) {
        self.mappings_changed = true;
    }
    fn seed_datatypes(&mut self) -> Result<()> {
        let persistor = self.persistor();
        for descriptor in self.registry.descriptors() {
            if persistor.persist_datatype(descriptor.kind)? {
                debug!(datatype = descriptor.class_name, "seeded datatype");
            }
        }
        Ok(())
    }
}
