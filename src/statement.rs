use tracing::{debug, warn};

use crate::construct::{
    Entity, Identity, Property, Qualifier, Rank, ReferenceRecord, ReferenceSnak, Snak, SnakKind,
    SnakValue, Statement, Value,
};
use crate::database::{Database, Work};
use crate::error::{Result, WikibaseError};

impl<'db> Work<'db> {
    // ------------- Snaks -------------
    /// Restores the property and value a VALUE snak would hold. Both come from
    /// their stored rows, so a handle naming the wrong row cannot slip through.
    fn stored_pair(&self, property: &Property, value: &Value) -> Result<(Property, Value)> {
        let property = self.stored_property(property)?;
        let value = self.require_value(value.identity())?;
        Ok((property, value))
    }
    fn type_mismatch(property: &Property, value: &Value) -> WikibaseError {
        warn!(property = %property, found = %value.kind(), "type mismatch");
        WikibaseError::TypeMismatch {
            property: property.to_string(),
            expected: property.datatype().class_name(),
            found: value.kind().class_name(),
        }
    }
    /// Stores a snak after checking the presence invariant and the value type.
    pub fn create_snak(&mut self, property: &Property, body: SnakValue) -> Result<Snak> {
        let (property, body) = match body {
            SnakValue::Value(value) => {
                let (property, value) = self.stored_pair(property, &value)?;
                if value.kind() != property.datatype().kind() {
                    return Err(WikibaseError::Validation(format!(
                        "{} expects a {}, got a {}",
                        property,
                        property.datatype().class_name(),
                        value.kind()
                    )));
                }
                (property, SnakValue::Value(value))
            }
            body => (self.stored_property(property)?, body),
        };
        let identity = self.persistor().persist_snak(
            property.identity(),
            body.kind(),
            body.value().map(Value::identity),
        )?;
        debug!(snak = identity, property = %property, kind = body.kind().wire_name(), "created snak");
        Ok(Snak::new(identity, property, body))
    }
    pub fn snak(&self, identity: Identity) -> Result<Option<Snak>> {
        let (property, kind, value) = match self.persistor().snak_row(identity)? {
            Some(row) => row,
            None => return Ok(None),
        };
        let property = self.require_property(property)?;
        let value = match value {
            Some(value) => Some(self.require_value(value)?),
            None => None,
        };
        Ok(Some(Snak::new(
            identity,
            property,
            SnakValue::from_parts(kind, value)?,
        )))
    }
    fn require_snak(&self, identity: Identity) -> Result<Snak> {
        self.snak(identity)?
            .ok_or_else(|| WikibaseError::NotFound(format!("snak {}", identity)))
    }
    /// Deletes a snak and the data value only it used. Entities survive.
    /// Refused while a statement, qualifier or reference still holds the snak.
    pub fn delete_snak(&mut self, snak: &Snak) -> Result<()> {
        if self.persistor().snak_usage(snak.identity())? > 0 {
            return Err(WikibaseError::ProtectedReference(format!(
                "snak {} is still in use",
                snak.identity()
            )));
        }
        self.release_snak(snak.identity())
    }
    /// Deletes a snak nothing holds any more, with its value.
    pub(crate) fn release_snak(&mut self, identity: Identity) -> Result<()> {
        let value = match self.persistor().snak_row(identity)? {
            Some((_, _, value)) => value,
            None => return Err(WikibaseError::NotFound(format!("snak {}", identity))),
        };
        if self.persistor().snak_usage(identity)? > 0 {
            return Ok(());
        }
        self.persistor().delete_snak(identity)?;
        if let Some(value) = value {
            self.release_value(value)?;
        }
        debug!(snak = identity, "deleted snak");
        Ok(())
    }
    pub fn count_snaks(&self) -> Result<usize> {
        self.persistor().count_snaks()
    }

    // ------------- Statements -------------
    fn check_subject(&self, subject: &Entity) -> Result<()> {
        if self.entity(subject.identity())?.is_none() {
            return Err(WikibaseError::NotFound(format!("subject {}", subject)));
        }
        Ok(())
    }
    /// Attaches a value to a subject. A value of the wrong variant is a caller bug
    /// and fails with `TypeMismatch`.
    pub fn add_value(
        &mut self,
        subject: &Entity,
        property: &Property,
        value: &Value,
        rank: Rank,
    ) -> Result<Statement> {
        let (property, value) = self.stored_pair(property, value)?;
        if value.kind() != property.datatype().kind() {
            return Err(Self::type_mismatch(&property, &value));
        }
        self.add_statement(subject, &property, SnakValue::Value(value), rank)
    }
    /// Creates a statement for any snak body, including unknown or no value.
    pub fn add_statement(
        &mut self,
        subject: &Entity,
        property: &Property,
        body: SnakValue,
        rank: Rank,
    ) -> Result<Statement> {
        self.check_subject(subject)?;
        let mainsnak = self.create_snak(property, body)?;
        let identity = self
            .persistor()
            .persist_statement(subject.identity(), mainsnak.identity(), rank)?;
        debug!(statement = identity, subject = %subject, rank = rank.code(), "created statement");
        Ok(Statement::new(identity, subject.clone(), mainsnak, rank))
    }
    pub fn statement(&self, identity: Identity) -> Result<Option<Statement>> {
        let (subject, mainsnak, rank) = match self.persistor().statement_row(identity)? {
            Some(row) => row,
            None => return Ok(None),
        };
        Ok(Some(Statement::new(
            identity,
            self.require_entity(subject)?,
            self.require_snak(mainsnak)?,
            rank,
        )))
    }
    fn require_statement(&self, identity: Identity) -> Result<Statement> {
        self.statement(identity)?
            .ok_or_else(|| WikibaseError::NotFound(format!("statement {}", identity)))
    }
    pub fn statements_of(&self, subject: &Entity) -> Result<Vec<Statement>> {
        self.persistor()
            .statements_of(subject.identity())?
            .into_iter()
            .map(|identity| self.require_statement(identity))
            .collect()
    }
    /// Statements of a subject for one property, lowest identity first.
    pub fn statements_for(&self, subject: &Entity, property: &Property) -> Result<Vec<Statement>> {
        self.persistor()
            .statements_for(subject.identity(), property.identity())?
            .into_iter()
            .map(|identity| self.require_statement(identity))
            .collect()
    }
    fn first_statement(&self, subject: &Entity, property: &Property) -> Result<Option<Statement>> {
        match self
            .persistor()
            .statements_for(subject.identity(), property.identity())?
            .first()
        {
            Some(identity) => self.statement(*identity),
            None => Ok(None),
        }
    }
    /// Value of the first statement (lowest identity) for the property.
    pub fn get_value(&self, subject: &Entity, property: &Property) -> Result<Option<Value>> {
        Ok(self
            .first_statement(subject, property)?
            .and_then(|statement| statement.mainsnak().value().cloned()))
    }
    /// Replaces the value of the first statement (lowest identity) for the property.
    /// Returns `None` when the subject has no such statement.
    pub fn set_value(
        &mut self,
        subject: &Entity,
        property: &Property,
        value: &Value,
    ) -> Result<Option<Statement>> {
        let (property, value) = self.stored_pair(property, value)?;
        if value.kind() != property.datatype().kind() {
            return Err(Self::type_mismatch(&property, &value));
        }
        let statement = match self.first_statement(subject, &property)? {
            Some(statement) => statement,
            None => return Ok(None),
        };
        let mainsnak = statement.mainsnak();
        if mainsnak.kind() != SnakKind::Value {
            // presence changes replace the snak
            let rank = statement.rank();
            return self
                .update_statement(&statement, SnakValue::Value(value.clone()), rank)
                .map(Some);
        }
        let previous = mainsnak.value().map(Value::identity);
        self.persistor()
            .set_snak_value(mainsnak.identity(), value.identity())?;
        if let Some(previous) = previous.filter(|p| *p != value.identity()) {
            self.release_value(previous)?;
        }
        debug!(statement = statement.identity(), value = value.identity(), "set value");
        let snak = Snak::new(mainsnak.identity(), property, SnakValue::Value(value));
        Ok(Some(Statement::new(
            statement.identity(),
            subject.clone(),
            snak,
            statement.rank(),
        )))
    }
    /// `set_value` when the subject already has a statement for the property, else `add_value`.
    pub fn add_or_set_value(
        &mut self,
        subject: &Entity,
        property: &Property,
        value: &Value,
    ) -> Result<Statement> {
        match self.set_value(subject, property, value)? {
            Some(statement) => Ok(statement),
            None => self.add_value(subject, property, value, Rank::Normal),
        }
    }
    /// Swaps the mainsnak for a new one built from `body`, then deletes the old snak.
    pub fn update_statement(
        &mut self,
        statement: &Statement,
        body: SnakValue,
        rank: Rank,
    ) -> Result<Statement> {
        let current = self.require_statement(statement.identity())?;
        let property = current.property().clone();
        let mainsnak = self.create_snak(&property, body)?;
        let persistor = self.persistor();
        persistor.set_mainsnak(current.identity(), mainsnak.identity())?;
        persistor.set_rank(current.identity(), rank)?;
        self.release_snak(current.mainsnak().identity())?;
        debug!(statement = current.identity(), snak = mainsnak.identity(), "updated statement");
        Ok(Statement::new(
            current.identity(),
            current.subject().clone(),
            mainsnak,
            rank,
        ))
    }
    pub fn set_rank(&mut self, statement: &Statement, rank: Rank) -> Result<Statement> {
        let current = self.require_statement(statement.identity())?;
        self.persistor().set_rank(current.identity(), rank)?;
        Ok(Statement::new(
            current.identity(),
            current.subject().clone(),
            current.mainsnak().clone(),
            rank,
        ))
    }
    /// Deletes a statement with its mainsnak, qualifiers and references.
    pub fn delete_statement(&mut self, statement: &Statement) -> Result<()> {
        self.release_statement(statement.identity())
    }
    pub(crate) fn release_statement(&mut self, identity: Identity) -> Result<()> {
        let (_, mainsnak, _) = self
            .persistor()
            .statement_row(identity)?
            .ok_or_else(|| WikibaseError::NotFound(format!("statement {}", identity)))?;
        let persistor = self.persistor();
        let mut snaks = vec![mainsnak];
        snaks.extend(persistor.qualifier_rows(identity)?.into_iter().map(|(_, snak)| snak));
        for record in persistor.reference_records(identity)? {
            snaks.extend(persistor.reference_snak_rows(record)?.into_iter().map(|(_, snak)| snak));
        }
        // qualifier and reference rows go with the statement
        persistor.delete_statement(identity)?;
        for snak in snaks {
            self.release_snak(snak)?;
        }
        debug!(statement = identity, "deleted statement");
        Ok(())
    }
    pub fn count_statements(&self) -> Result<usize> {
        self.persistor().count_statements()
    }

    // ------------- Qualifiers -------------
    pub fn add_qualifier(
        &mut self,
        statement: &Statement,
        property: &Property,
        body: SnakValue,
    ) -> Result<Qualifier> {
        self.require_statement(statement.identity())?;
        let snak = self.create_snak(property, body)?;
        let identity = self
            .persistor()
            .persist_qualifier(statement.identity(), snak.identity())?;
        debug!(qualifier = identity, statement = statement.identity(), "added qualifier");
        Ok(Qualifier::new(identity, statement.identity(), snak))
    }
    pub fn qualifiers(&self, statement: &Statement) -> Result<Vec<Qualifier>> {
        self.persistor()
            .qualifier_rows(statement.identity())?
            .into_iter()
            .map(|(identity, snak)| {
                Ok(Qualifier::new(identity, statement.identity(), self.require_snak(snak)?))
            })
            .collect()
    }
    pub fn delete_qualifier(&mut self, qualifier: &Qualifier) -> Result<()> {
        if self.persistor().delete_qualifier(qualifier.identity())? == 0 {
            return Err(WikibaseError::NotFound(format!("qualifier {}", qualifier.identity())));
        }
        self.release_snak(qualifier.snak().identity())
    }

    // ------------- References -------------
    /// Adds one citation made of at least one snak.
    pub fn add_reference(
        &mut self,
        statement: &Statement,
        snaks: &[(Property, SnakValue)],
    ) -> Result<ReferenceRecord> {
        if snaks.is_empty() {
            return Err(WikibaseError::Validation(
                "a reference needs at least one snak".to_string(),
            ));
        }
        self.require_statement(statement.identity())?;
        let record = self.persistor().persist_reference_record(statement.identity())?;
        let mut reference_snaks = Vec::with_capacity(snaks.len());
        for (property, body) in snaks {
            let snak = self.create_snak(property, body.clone())?;
            let identity = self.persistor().persist_reference_snak(record, snak.identity())?;
            reference_snaks.push(ReferenceSnak::new(identity, snak));
        }
        debug!(reference = record, statement = statement.identity(), "added reference");
        Ok(ReferenceRecord::new(record, statement.identity(), reference_snaks))
    }
    pub fn references(&self, statement: &Statement) -> Result<Vec<ReferenceRecord>> {
        let persistor = self.persistor();
        let mut records = Vec::new();
        for record in persistor.reference_records(statement.identity())? {
            let snaks = persistor
                .reference_snak_rows(record)?
                .into_iter()
                .map(|(identity, snak)| Ok(ReferenceSnak::new(identity, self.require_snak(snak)?)))
                .collect::<Result<Vec<ReferenceSnak>>>()?;
            records.push(ReferenceRecord::new(record, statement.identity(), snaks));
        }
        Ok(records)
    }
    pub fn delete_reference(&mut self, reference: &ReferenceRecord) -> Result<()> {
        let persistor = self.persistor();
        let snaks: Vec<Identity> = persistor
            .reference_snak_rows(reference.identity())?
            .into_iter()
            .map(|(_, snak)| snak)
            .collect();
        if persistor.delete_reference_record(reference.identity())? == 0 {
            return Err(WikibaseError::NotFound(format!("reference {}", reference.identity())));
        }
        for snak in snaks {
            self.release_snak(snak)?;
        }
        Ok(())
    }
}

impl Database {
    delegate! {
        write fn create_snak(&self, property: &Property, body: SnakValue) -> Snak;
        read fn snak(&self, identity: Identity) -> Option<Snak>;
        write fn delete_snak(&self, snak: &Snak) -> ();
        read fn count_snaks(&self) -> usize;
        write fn add_value(&self, subject: &Entity, property: &Property, value: &Value, rank: Rank) -> Statement;
        write fn add_statement(&self, subject: &Entity, property: &Property, body: SnakValue, rank: Rank) -> Statement;
        read fn statement(&self, identity: Identity) -> Option<Statement>;
        read fn statements_of(&self, subject: &Entity) -> Vec<Statement>;
        read fn statements_for(&self, subject: &Entity, property: &Property) -> Vec<Statement>;
        read fn get_value(&self, subject: &Entity, property: &Property) -> Option<Value>;
        write fn set_value(&self, subject: &Entity, property: &Property, value: &Value) -> Option<Statement>;
        write fn add_or_set_value(&self, subject: &Entity, property: &Property, value: &Value) -> Statement;
        write fn update_statement(&self, statement: &Statement, body: SnakValue, rank: Rank) -> Statement;
        write fn set_rank(&self, statement: &Statement, rank: Rank) -> Statement;
        write fn delete_statement(&self, statement: &Statement) -> ();
        read fn count_statements(&self) -> usize;
        write fn add_qualifier(&self, statement: &Statement, property: &Property, body: SnakValue) -> Qualifier;
        read fn qualifiers(&self, statement: &Statement) -> Vec<Qualifier>;
        write fn delete_qualifier(&self, qualifier: &Qualifier) -> ();
        write fn add_reference(&self, statement: &Statement, snaks: &[(Property, SnakValue)]) -> ReferenceRecord;
        read fn references(&self, statement: &Statement) -> Vec<ReferenceRecord>;
        write fn delete_reference(&self, reference: &ReferenceRecord) -> ();
    }
    /// Adds a statement with an integer rank as it arrives from callers.
    pub fn add_value_ranked(
        &self,
        subject: &Entity,
        property: &Property,
        value: &Value,
        rank: i64,
    ) -> Result<Statement> {
        let rank = Rank::try_from(rank)?;
        self.add_value(subject, property, value, rank)
    }
}
