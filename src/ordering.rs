//! Display order of an item's statements.
//!
//! Every type item may carry an ordered list of properties. An item's
//! statement groups follow the lists of the types it `is_a` instance of: the
//! `is_a` group first, then the explicitly ordered properties, then the rest
//! by display id.

use std::collections::HashMap;

use tracing::debug;

use crate::construct::{Entity, Identity, Item, OtherHasher, Property, Statement};
use crate::database::{Database, Work};
use crate::error::{Result, WikibaseError};
use crate::mapping::IS_A;

/// Position of the `is_a` group, ahead of every explicit ordering.
pub const IS_A_POSITION: i64 = -1;

/// Statements of one subject sharing a property.
#[derive(Clone, Debug, PartialEq)]
pub struct StatementGroup {
    pub property: Property,
    pub position: i64,
    pub statements: Vec<Statement>,
}

impl<'db> Work<'db> {
    /// Replaces the whole ordering list of a type item.
    pub fn set_order(&mut self, type_item: &Item, properties: &[Property]) -> Result<()> {
        match self.entity(type_item.identity())? {
            Some(Entity::Item(_)) => (),
            Some(other) => {
                return Err(WikibaseError::Validation(format!("{} is not an item", other)));
            }
            None => return Err(WikibaseError::NotFound(format!("{}", type_item))),
        }
        let mut identities: Vec<Identity> = Vec::with_capacity(properties.len());
        for property in properties {
            identities.push(self.stored_property(property)?.identity());
        }
        self.persistor().replace_order(type_item.identity(), &identities)?;
        debug!(item = %type_item, properties = identities.len(), "replaced property order");
        Ok(())
    }
    pub fn get_order(&self, type_item: &Item) -> Result<Vec<Property>> {
        self.persistor()
            .restore_order(type_item.identity())?
            .into_iter()
            .map(|(property, _)| self.require_property(property))
            .collect()
    }
    fn is_a(&self) -> Result<Option<Property>> {
        if self.has_mapping::<Property>(IS_A)? {
            Ok(Some(self.mapped::<Property>(IS_A)?))
        } else {
            Ok(None)
        }
    }
    fn items_of(&self, identities: Vec<Identity>) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        for identity in identities {
            if let Some(Entity::Item(item)) = self.entity(identity)? {
                items.push(item);
            }
        }
        Ok(items)
    }
    /// Items whose statements, qualifiers or references point at `item`.
    pub fn linked_items(&self, item: &Item) -> Result<Vec<Item>> {
        let subjects = self
            .persistor()
            .subjects_using_value(item.identity())?
            .into_iter()
            .filter(|subject| *subject != item.identity())
            .collect();
        self.items_of(subjects)
    }
    /// Items stated to be `is_a` instances of `type_item`.
    pub fn instances_of(&self, type_item: &Item) -> Result<Vec<Item>> {
        match self.is_a()? {
            Some(is_a) => {
                let subjects = self
                    .persistor()
                    .subjects_with(is_a.identity(), type_item.identity())?;
                self.items_of(subjects)
            }
            None => Ok(Vec::new()),
        }
    }
    /// Types `item` is stated to be an instance of.
    pub fn types_of(&self, item: &Item) -> Result<Vec<Item>> {
        match self.is_a()? {
            Some(is_a) => {
                let values = self
                    .persistor()
                    .mainsnak_values(item.identity(), is_a.identity())?;
                self.items_of(values)
            }
            None => Ok(Vec::new()),
        }
    }
    /// Groups an item's statements by property in display order.
    pub fn ordered_statement_groups(&self, item: &Item) -> Result<Vec<StatementGroup>> {
        let is_a = self.is_a()?;
        let mut positions: HashMap<Identity, i64, OtherHasher> = HashMap::default();
        for type_item in self.types_of(item)? {
            // the first type to order a property decides its position
            for (property, ordering) in self.persistor().restore_order(type_item.identity())? {
                positions.entry(property).or_insert(ordering);
            }
        }
        if let Some(is_a) = &is_a {
            positions.insert(is_a.identity(), IS_A_POSITION);
        }
        let unordered = positions.values().copied().max().unwrap_or(IS_A_POSITION) + 1;

        let mut groups: Vec<StatementGroup> = Vec::new();
        for statement in self.statements_of(&item.entity())? {
            let property = statement.property().clone();
            match groups.iter_mut().find(|g| g.property == property) {
                Some(group) => group.statements.push(statement),
                None => groups.push(StatementGroup {
                    position: positions
                        .get(&property.identity())
                        .copied()
                        .unwrap_or(unordered),
                    property,
                    statements: vec![statement],
                }),
            }
        }
        groups.sort_by_key(|g| (g.position, g.property.display_id()));
        Ok(groups)
    }
}

impl Database {
    delegate! {
        write fn set_order(&self, type_item: &Item, properties: &[Property]) -> ();
        read fn get_order(&self, type_item: &Item) -> Vec<Property>;
        read fn linked_items(&self, item: &Item) -> Vec<Item>;
        read fn instances_of(&self, type_item: &Item) -> Vec<Item>;
        read fn types_of(&self, item: &Item) -> Vec<Item>;
        read fn ordered_statement_groups(&self, item: &Item) -> Vec<StatementGroup>;
    }
}
