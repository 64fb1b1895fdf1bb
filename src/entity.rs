use tracing::{debug, warn};

use crate::construct::{
    Datatype, DisplayId, Entity, EntityKind, Identity, Item, Property, Term, TermKind,
};
use crate::database::{Database, Work};
use crate::datatype::validate_language;
use crate::error::{Result, WikibaseError};

impl<'db> Work<'db> {
    // ------------- Datatypes -------------
    /// Resolves a class name to its persisted datatype row.
    pub fn datatype(&self, class_name: &str) -> Result<Datatype> {
        let descriptor = self.registry().resolve(class_name)?;
        if self.persistor().datatype_exists(descriptor.kind)? {
            Ok(Datatype::new(descriptor.kind))
        } else {
            Err(WikibaseError::UnknownDatatype(class_name.to_string()))
        }
    }
    /// Persists the datatype row of a known variant, if missing.
    pub fn create_datatype(&mut self, class_name: &str) -> Result<Datatype> {
        let descriptor = self.registry().resolve(class_name)?;
        if self.persistor().persist_datatype(descriptor.kind)? {
            debug!(datatype = class_name, "created datatype");
        }
        Ok(Datatype::new(descriptor.kind))
    }
    /// Refused while a property or value still uses the datatype.
    pub fn delete_datatype(&mut self, datatype: &Datatype) -> Result<()> {
        let references = self.persistor().datatype_references(datatype.kind())?;
        if !references.is_empty() {
            warn!(datatype = datatype.class_name(), references = ?references, "delete refused");
            return Err(WikibaseError::ProtectedReference(format!(
                "{} is used by {}",
                datatype.class_name(),
                references.join(", ")
            )));
        }
        if self.persistor().delete_datatype(datatype.kind())? == 0 {
            return Err(WikibaseError::UnknownDatatype(datatype.class_name().to_string()));
        }
        debug!(datatype = datatype.class_name(), "deleted datatype");
        Ok(())
    }

    // ------------- Entities -------------
    fn create_entity(&mut self, kind: EntityKind, datatype: Option<Datatype>) -> Result<(Identity, DisplayId)> {
        let persistor = self.persistor();
        // read and insert happen in the same immediate transaction
        let display_id = persistor.next_display_id(kind)?;
        let identity = persistor.persist_entity(kind, display_id, datatype)?;
        debug!(identity, display_id, kind = ?kind, "created entity");
        Ok((identity, display_id))
    }
    pub fn create_item(&mut self) -> Result<Item> {
        let (identity, display_id) = self.create_entity(EntityKind::Item, None)?;
        Ok(Item::new(identity, display_id))
    }
    pub fn create_property(&mut self, datatype: &Datatype) -> Result<Property> {
        if !self.persistor().datatype_exists(datatype.kind())? {
            return Err(WikibaseError::UnknownDatatype(datatype.class_name().to_string()));
        }
        let (identity, display_id) = self.create_entity(EntityKind::Property, Some(*datatype))?;
        Ok(Property::new(identity, display_id, *datatype))
    }
    pub fn entity(&self, identity: Identity) -> Result<Option<Entity>> {
        self.persistor().restore_entity(identity)
    }
    pub(crate) fn require_entity(&self, identity: Identity) -> Result<Entity> {
        self.entity(identity)?
            .ok_or_else(|| WikibaseError::NotFound(format!("entity {}", identity)))
    }
    pub(crate) fn require_property(&self, identity: Identity) -> Result<Property> {
        match self.require_entity(identity)? {
            Entity::Property(property) => Ok(property),
            Entity::Item(item) => Err(WikibaseError::DataCorruption {
                message: format!("{} is used as a property", item),
            }),
        }
    }
    /// The stored row behind a property handle, refusing handles that name an item.
    pub(crate) fn stored_property(&self, property: &Property) -> Result<Property> {
        match self.entity(property.identity())? {
            Some(Entity::Property(stored)) => Ok(stored),
            Some(Entity::Item(item)) => Err(WikibaseError::Validation(format!(
                "{} is an item, not a property",
                item
            ))),
            None => Err(WikibaseError::NotFound(format!("{}", property))),
        }
    }
    pub fn get_item(&self, display_id: DisplayId) -> Result<Option<Item>> {
        Ok(self
            .persistor()
            .entity_by_display_id(EntityKind::Item, display_id)?
            .and_then(|e| e.as_item().cloned()))
    }
    pub fn get_property(&self, display_id: DisplayId) -> Result<Option<Property>> {
        Ok(self
            .persistor()
            .entity_by_display_id(EntityKind::Property, display_id)?
            .and_then(|e| e.as_property().cloned()))
    }
    pub fn items(&self) -> Result<Vec<Item>> {
        Ok(self
            .persistor()
            .all_entities(EntityKind::Item)?
            .iter()
            .filter_map(|e| e.as_item().cloned())
            .collect())
    }
    pub fn properties(&self) -> Result<Vec<Property>> {
        Ok(self
            .persistor()
            .all_entities(EntityKind::Property)?
            .iter()
            .filter_map(|e| e.as_property().cloned())
            .collect())
    }
    pub fn search_items(&self, fragment: &str) -> Result<Vec<Item>> {
        Ok(self
            .persistor()
            .search_entities(EntityKind::Item, fragment)?
            .iter()
            .filter_map(|e| e.as_item().cloned())
            .collect())
    }
    pub fn search_properties(&self, fragment: &str) -> Result<Vec<Property>> {
        Ok(self
            .persistor()
            .search_entities(EntityKind::Property, fragment)?
            .iter()
            .filter_map(|e| e.as_property().cloned())
            .collect())
    }
    /// Deletes an entity with its terms and its own statements. Refused while
    /// any snak, value or mapping still references it.
    pub fn delete_entity(&mut self, entity: &Entity) -> Result<()> {
        self.require_entity(entity.identity())?;
        for statement in self.persistor().statements_of(entity.identity())? {
            self.release_statement(statement)?;
        }
        let references = self.persistor().entity_references(entity.identity())?;
        if !references.is_empty() {
            warn!(entity = %entity, references = ?references, "refused to delete referenced entity");
            return Err(WikibaseError::ProtectedReference(format!(
                "{} is still referenced by {}",
                entity,
                references.join(", ")
            )));
        }
        if self.persistor().delete_value(entity.identity())? == 0 {
            return Err(WikibaseError::NotFound(format!("{}", entity)));
        }
        debug!(entity = %entity, "deleted entity");
        Ok(())
    }

    // ------------- Terms -------------
    fn check_term(&self, entity: &Entity, language: &str) -> Result<()> {
        validate_language(language)?;
        if self.entity(entity.identity())?.is_none() {
            return Err(WikibaseError::NotFound(format!("{}", entity)));
        }
        Ok(())
    }
    /// Inserts a new term, refusing a second label or description in the same language.
    fn create_term(&mut self, kind: TermKind, entity: &Entity, language: &str, text: &str) -> Result<Term> {
        self.check_term(entity, language)?;
        let persistor = self.persistor();
        if kind.unique_per_language()
            && !persistor.find_terms(kind, entity.identity(), language)?.is_empty()
        {
            return Err(WikibaseError::Validation(format!(
                "{} already has a {} in '{}'",
                entity,
                kind.table().to_lowercase(),
                language
            )));
        }
        let identity = persistor.persist_term(kind, entity.identity(), language, text)?;
        Ok(Term::new(
            identity,
            entity.identity(),
            language.to_string(),
            text.to_string(),
        ))
    }
    /// Replaces the text of the term in that language, or inserts it.
    fn set_term(&mut self, kind: TermKind, entity: &Entity, language: &str, text: &str) -> Result<Term> {
        self.check_term(entity, language)?;
        let persistor = self.persistor();
        match persistor.find_terms(kind, entity.identity(), language)?.into_iter().next() {
            Some(existing) => {
                persistor.update_term(kind, existing.identity(), text)?;
                Ok(Term::new(
                    existing.identity(),
                    entity.identity(),
                    language.to_string(),
                    text.to_string(),
                ))
            }
            None => self.create_term(kind, entity, language, text),
        }
    }
    fn get_term(&self, kind: TermKind, entity: &Entity, language: &str) -> Result<Option<String>> {
        Ok(self
            .persistor()
            .find_terms(kind, entity.identity(), language)?
            .into_iter()
            .next()
            .map(|term| term.text().to_string()))
    }
    pub fn set_label(&mut self, entity: &Entity, language: &str, text: &str) -> Result<Term> {
        self.set_term(TermKind::Label, entity, language, text)
    }
    pub fn create_label(&mut self, entity: &Entity, language: &str, text: &str) -> Result<Term> {
        self.create_term(TermKind::Label, entity, language, text)
    }
    pub fn get_label(&self, entity: &Entity, language: &str) -> Result<Option<String>> {
        self.get_term(TermKind::Label, entity, language)
    }
    pub fn get_labels(&self, entity: &Entity) -> Result<Vec<Term>> {
        self.persistor().restore_terms(TermKind::Label, entity.identity())
    }
    pub fn set_description(&mut self, entity: &Entity, language: &str, text: &str) -> Result<Term> {
        self.set_term(TermKind::Description, entity, language, text)
    }
    pub fn create_description(&mut self, entity: &Entity, language: &str, text: &str) -> Result<Term> {
        self.create_term(TermKind::Description, entity, language, text)
    }
    pub fn get_description(&self, entity: &Entity, language: &str) -> Result<Option<String>> {
        self.get_term(TermKind::Description, entity, language)
    }
    pub fn get_descriptions(&self, entity: &Entity) -> Result<Vec<Term>> {
        self.persistor().restore_terms(TermKind::Description, entity.identity())
    }
    pub fn add_alias(&mut self, entity: &Entity, language: &str, text: &str) -> Result<Term> {
        self.create_term(TermKind::Alias, entity, language, text)
    }
    pub fn get_aliases(&self, entity: &Entity) -> Result<Vec<Term>> {
        self.persistor().restore_terms(TermKind::Alias, entity.identity())
    }
}

impl Database {
    delegate! {
        read fn datatype(&self, class_name: &str) -> Datatype;
        write fn create_datatype(&self, class_name: &str) -> Datatype;
        write fn delete_datatype(&self, datatype: &Datatype) -> ();
        /// Display ids continue from the largest one of the same kind.
        write fn create_item(&self) -> Item;
        write fn create_property(&self, datatype: &Datatype) -> Property;
        read fn entity(&self, identity: Identity) -> Option<Entity>;
        read fn get_item(&self, display_id: DisplayId) -> Option<Item>;
        read fn get_property(&self, display_id: DisplayId) -> Option<Property>;
        read fn items(&self) -> Vec<Item>;
        read fn properties(&self) -> Vec<Property>;
        read fn search_items(&self, fragment: &str) -> Vec<Item>;
        read fn search_properties(&self, fragment: &str) -> Vec<Property>;
        write fn delete_entity(&self, entity: &Entity) -> ();
        write fn set_label(&self, entity: &Entity, language: &str, text: &str) -> Term;
        write fn create_label(&self, entity: &Entity, language: &str, text: &str) -> Term;
        read fn get_label(&self, entity: &Entity, language: &str) -> Option<String>;
        read fn get_labels(&self, entity: &Entity) -> Vec<Term>;
        write fn set_description(&self, entity: &Entity, language: &str, text: &str) -> Term;
        write fn create_description(&self, entity: &Entity, language: &str, text: &str) -> Term;
        read fn get_description(&self, entity: &Entity, language: &str) -> Option<String>;
        read fn get_descriptions(&self, entity: &Entity) -> Vec<Term>;
        write fn add_alias(&self, entity: &Entity, language: &str, text: &str) -> Term;
        read fn get_aliases(&self, entity: &Entity) -> Vec<Term>;
    }
}
