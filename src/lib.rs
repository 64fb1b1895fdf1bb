//! Wikibase – a structured-knowledge store over SQLite.
//!
//! The store describes the world with *entities* carrying *statements*:
//! * An [`construct::Item`] denotes a thing, a [`construct::Property`] a typed
//!   relation. Both have labels, descriptions and aliases per language, an
//!   internal identity and a human-facing display id (`Q5`, `P5`) counted per kind.
//! * A [`construct::Snak`] is the atomic claim `(property, presence, value?)`,
//!   where presence is a value, an unknown value or no value at all.
//! * A [`construct::Statement`] attaches a main snak to a subject with a rank,
//!   and may carry [`construct::Qualifier`]s and [`construct::ReferenceRecord`]s.
//! * Values are items, properties or one of the data variants of
//!   [`datatype::DataValue`] (string, url, quantity, time, coordinates,
//!   monolingual text). A property's datatype decides which variant its
//!   statements accept.
//!
//! Deleting a statement removes its snaks, and deleting a snak removes the data
//! value only it used. Entities are shared and survive; deleting one that is
//! still referenced is refused.
//!
//! ## Modules
//! * [`datatype`] – value variants and the [`datatype::DatatypeRegistry`].
//! * [`construct`] – handles for entities, snaks, statements and terms.
//! * [`persist`] – SQLite schema and row-level persistence.
//! * [`database`] – the [`database::Database`] and its unit of work.
//! * [`entity`], [`value`], [`statement`] – the store operations.
//! * [`mapping`] – symbolic keys (`is_a`, `earth`) for well-known entities.
//! * [`ordering`] – display order of statement groups.
//! * [`wire`] and [`import`] – JSON payloads and bulk import.
//!
//! ## Transactions
//! Every operation on [`database::Database`] runs in its own `BEGIN IMMEDIATE`
//! transaction. Multi-step work goes through [`database::Database::transact`],
//! which hands out a [`database::Work`] exposing the same operations and rolls
//! everything back when the closure returns an error.
//!
//! ## Quick Start
//! ```
//! use wikibase::construct::Rank;
//! use wikibase::database::{Database, PersistenceMode};
//! let db = Database::new(PersistenceMode::InMemory).unwrap();
//! let item = db.datatype("Item").unwrap();
//! let is_a = db.create_property(&item).unwrap();
//! let athens = db.create_item().unwrap();
//! let city = db.create_item().unwrap();
//! db.set_label(&athens.entity(), "en", "Athens").unwrap();
//! let statement = db
//!     .add_value(&athens.entity(), &is_a, &city.value(), Rank::Normal)
//!     .unwrap();
//! assert_eq!(statement.mainsnak().value(), Some(&city.value()));
//! ```

pub mod error;
pub mod datatype;
pub mod construct;
pub mod persist;
#[macro_use]
pub mod database;
pub mod settings;
pub mod value;
pub mod entity;
pub mod statement;
pub mod mapping;
pub mod ordering;
pub mod wire;
pub mod import;
