//! Bulk import of annotated entities.
//!
//! A document describes one item with its terms and nested statements. Each
//! call imports its documents in a single transaction, so a failing statement
//! leaves no trace of the item, its labels or its earlier statements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::construct::{DisplayId, Item};
use crate::database::{Database, Work};
use crate::error::{Result, WikibaseError};
use crate::wire::StatementPayload;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    /// Display id of an existing item to extend; a new item is created when absent.
    #[serde(default)]
    pub id: Option<DisplayId>,
    /// Mapping key to register for the item.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub statements: Vec<StatementPayload>,
}

impl EntityDocument {
    /// Parses either one document or an array of documents.
    pub fn parse_all(json: &str) -> Result<Vec<EntityDocument>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.is_array() {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(vec![serde_json::from_value(value)?])
        }
    }
}

impl<'db> Work<'db> {
    pub fn import_entity(&mut self, document: &EntityDocument) -> Result<Item> {
        let item = match document.id {
            Some(display_id) => self
                .get_item(display_id)?
                .ok_or_else(|| WikibaseError::NotFound(format!("Q{}", display_id)))?,
            None => self.create_item()?,
        };
        let entity = item.entity();
        for (language, text) in &document.labels {
            self.set_label(&entity, language, text)?;
        }
        for (language, text) in &document.descriptions {
            self.set_description(&entity, language, text)?;
        }
        for (language, aliases) in &document.aliases {
            for alias in aliases {
                self.add_alias(&entity, language, alias)?;
            }
        }
        for statement in &document.statements {
            self.add_statement_from_json(&entity, statement)?;
        }
        if let Some(key) = &document.key {
            self.register(key, &item)?;
        }
        info!(item = %item, statements = document.statements.len(), "imported entity");
        Ok(item)
    }
}

/// Imports one document in its own transaction.
pub fn import_entity(database: &Database, document: &EntityDocument) -> Result<Item> {
    database.transact(|work| work.import_entity(document))
}

/// Imports all documents in one transaction: either every item lands or none does.
pub fn import_entities(database: &Database, documents: &[EntityDocument]) -> Result<Vec<Item>> {
    database.transact(|work| {
        documents
            .iter()
            .map(|document| work.import_entity(document))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_documents_and_arrays_parse() {
        let one = EntityDocument::parse_all(r#"{"labels": {"fr": "Athènes"}}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].labels.get("fr").map(String::as_str), Some("Athènes"));
        let many = EntityDocument::parse_all(r#"[{"id": 4}, {"key": "earth"}]"#).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[0].id, Some(4));
        assert_eq!(many[1].key.as_deref(), Some("earth"));
        assert!(EntityDocument::parse_all("[1, 2]").is_err());
    }
}
