// used for persistence
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::construct::{
    Datatype, DisplayId, Entity, EntityKind, Identity, Item, Property, Rank, SnakKind, Term,
    TermKind,
};
use crate::datatype::{
    DataValue, Decimal, GlobeCoordinatesValue, MonolingualTextValue, QuantityValue, StringValue,
    TimePrecision, TimeValue, UrlValue, ValueKind,
};
use crate::error::{Result, WikibaseError};

fn corruption(message: String) -> WikibaseError {
    WikibaseError::DataCorruption { message }
}

/// Names the table and entity column of one of the two mapping tables.
#[derive(Copy, Clone, Debug)]
pub struct MappingTable {
    pub table: &'static str,
    pub column: &'static str,
}

// ------------- Persistence -------------
/// Row-level access to the SQLite schema. A persistor borrows the connection
/// (normally the open transaction of a unit of work) and never commits itself.
pub struct Persistor<'db> {
    pub db: &'db Connection,
}

impl<'db> Persistor<'db> {
    pub fn new(connection: &'db Connection) -> Persistor<'db> {
        Persistor { db: connection }
    }
    pub fn ensure_schema(connection: &Connection) -> Result<()> {
        connection.execute_batch(
            "
            pragma foreign_keys = on;
            create table if not exists Datatype (
                Datatype_Identity integer not null,
                ClassName text not null,
                constraint referenceable_Datatype_Identity primary key (
                    Datatype_Identity
                ),
                constraint unique_ClassName unique (
                    ClassName
                )
            );
            create table if not exists Value (
                Value_Identity integer primary key autoincrement,
                ValueType_Identity integer not null,
                constraint ValueType_is_Datatype foreign key (
                    ValueType_Identity
                ) references Datatype(Datatype_Identity) on delete restrict
            );
            create table if not exists Entity (
                Entity_Identity integer not null,
                Kind integer not null,
                DisplayId integer not null,
                Datatype_Identity integer null,
                constraint Entity_is_Value foreign key (
                    Entity_Identity
                ) references Value(Value_Identity) on delete cascade,
                constraint Property_has_Datatype foreign key (
                    Datatype_Identity
                ) references Datatype(Datatype_Identity) on delete restrict,
                constraint referenceable_Entity_Identity primary key (
                    Entity_Identity
                ),
                constraint unique_DisplayId_per_Kind unique (
                    Kind,
                    DisplayId
                ),
                constraint only_Properties_have_Datatype check (
                    (Kind = 1) = (Datatype_Identity is not null)
                )
            );
            create table if not exists StringValue (
                Value_Identity integer not null primary key
                    references Value(Value_Identity) on delete cascade,
                Text text not null
            );
            create table if not exists UrlValue (
                Value_Identity integer not null primary key
                    references Value(Value_Identity) on delete cascade,
                Text text not null
            );
            create table if not exists QuantityValue (
                Value_Identity integer not null primary key
                    references Value(Value_Identity) on delete cascade,
                Number real not null,
                LowerBound real null,
                UpperBound real null,
                Unit_Identity integer null
                    references Entity(Entity_Identity) on delete restrict
            );
            create table if not exists TimeValue (
                Value_Identity integer not null primary key
                    references Value(Value_Identity) on delete cascade,
                Time text not null,
                Timezone integer not null,
                Precision integer null,
                After integer null,
                Before integer null,
                CalendarModel_Identity integer not null
                    references Entity(Entity_Identity) on delete restrict
            );
            create table if not exists GlobeCoordinatesValue (
                Value_Identity integer not null primary key
                    references Value(Value_Identity) on delete cascade,
                Latitude text not null,
                Longitude text not null,
                Precision text not null,
                Globe_Identity integer not null
                    references Entity(Entity_Identity) on delete restrict
            );
            create table if not exists MonolingualTextValue (
                Value_Identity integer not null primary key
                    references Value(Value_Identity) on delete cascade,
                Language text not null,
                Text text not null
            );
            create table if not exists Label (
                Label_Identity integer primary key autoincrement,
                Entity_Identity integer not null
                    references Entity(Entity_Identity) on delete cascade,
                Language text not null,
                Text text not null,
                constraint unique_Label_Language unique (
                    Entity_Identity,
                    Language
                )
            );
            create table if not exists Description (
                Description_Identity integer primary key autoincrement,
                Entity_Identity integer not null
                    references Entity(Entity_Identity) on delete cascade,
                Language text not null,
                Text text not null,
                constraint unique_Description_Language unique (
                    Entity_Identity,
                    Language
                )
            );
            create table if not exists Alias (
                Alias_Identity integer primary key autoincrement,
                Entity_Identity integer not null
                    references Entity(Entity_Identity) on delete cascade,
                Language text not null,
                Text text not null
            );
            create table if not exists Snak (
                Snak_Identity integer primary key autoincrement,
                Property_Identity integer not null
                    references Entity(Entity_Identity) on delete restrict,
                Presence integer not null,
                Value_Identity integer null
                    references Value(Value_Identity) on delete restrict,
                constraint known_Presence check (
                    Presence in (0, 1, 2)
                ),
                constraint Value_iff_Presence_is_Value check (
                    (Presence = 0) = (Value_Identity is not null)
                )
            );
            create table if not exists Statement (
                Statement_Identity integer primary key autoincrement,
                Subject_Identity integer not null
                    references Entity(Entity_Identity) on delete cascade,
                MainSnak_Identity integer not null
                    references Snak(Snak_Identity) on delete restrict,
                Rank integer not null,
                constraint one_owner_per_MainSnak unique (
                    MainSnak_Identity
                ),
                constraint known_Rank check (
                    Rank between -1 and 1
                )
            );
            create table if not exists Qualifier (
                Qualifier_Identity integer primary key autoincrement,
                Statement_Identity integer not null
                    references Statement(Statement_Identity) on delete cascade,
                Snak_Identity integer not null
                    references Snak(Snak_Identity) on delete restrict
            );
            create table if not exists ReferenceRecord (
                ReferenceRecord_Identity integer primary key autoincrement,
                Statement_Identity integer not null
                    references Statement(Statement_Identity) on delete cascade
            );
            create table if not exists ReferenceSnak (
                ReferenceSnak_Identity integer primary key autoincrement,
                ReferenceRecord_Identity integer not null
                    references ReferenceRecord(ReferenceRecord_Identity) on delete cascade,
                Snak_Identity integer not null
                    references Snak(Snak_Identity) on delete restrict
            );
            create table if not exists ItemMapping (
                Key text not null primary key,
                Item_Identity integer not null
                    references Entity(Entity_Identity) on delete restrict,
                constraint one_Key_per_Item unique (
                    Item_Identity
                )
            );
            create table if not exists PropertyMapping (
                Key text not null primary key,
                Property_Identity integer not null
                    references Entity(Entity_Identity) on delete restrict,
                constraint one_Key_per_Property unique (
                    Property_Identity
                )
            );
            create table if not exists PropertyOrderPreference (
                PropertyOrderPreference_Identity integer primary key autoincrement,
                Item_Identity integer not null
                    references Entity(Entity_Identity) on delete cascade,
                Property_Identity integer not null
                    references Entity(Entity_Identity) on delete cascade,
                Ordering integer not null
            );
            create index if not exists Statement_by_Subject on Statement (Subject_Identity);
            create index if not exists Snak_by_Value on Snak (Value_Identity);
            create index if not exists Snak_by_Property on Snak (Property_Identity);
            ",
        )?;
        Ok(())
    }

    // ------------- Datatypes -------------
    /// True when the row was inserted, false when it was already there.
    pub fn persist_datatype(&self, kind: ValueKind) -> Result<bool> {
        let added = self
            .db
            .prepare_cached(
                "
                insert or ignore into Datatype (
                    Datatype_Identity,
                    ClassName
                ) values (?, ?)
            ",
            )?
            .execute(params![kind.uid(), kind.class_name()])?;
        Ok(added > 0)
    }
    pub fn datatype_exists(&self, kind: ValueKind) -> Result<bool> {
        Ok(self
            .db
            .prepare_cached("select 1 from Datatype where Datatype_Identity = ?")?
            .query_row(params![kind.uid()], |_| Ok(()))
            .optional()?
            .is_some())
    }
    /// Describes every row that keeps the datatype from being deleted.
    pub fn datatype_references(&self, kind: ValueKind) -> Result<Vec<String>> {
        let checks: [(&str, &str); 2] = [
            ("property", "select count(*) from Entity where Datatype_Identity = ?"),
            ("value", "select count(*) from Value where ValueType_Identity = ?"),
        ];
        let mut references = Vec::new();
        for (what, sql) in checks {
            let count: i64 = self
                .db
                .prepare_cached(sql)?
                .query_row(params![kind.uid()], |r| r.get(0))?;
            if count > 0 {
                references.push(format!("{} {}", count, what));
            }
        }
        Ok(references)
    }
    pub fn delete_datatype(&self, kind: ValueKind) -> Result<usize> {
        Ok(self
            .db
            .prepare_cached("delete from Datatype where Datatype_Identity = ?")?
            .execute(params![kind.uid()])?)
    }

    // ------------- Values -------------
    fn add_value_row(&self, kind: ValueKind) -> Result<Identity> {
        self.db
            .prepare_cached("insert into Value (ValueType_Identity) values (?)")?
            .execute(params![kind.uid()])?;
        Ok(self.db.last_insert_rowid())
    }
    pub fn value_kind(&self, value: Identity) -> Result<Option<ValueKind>> {
        let uid: Option<u8> = self
            .db
            .prepare_cached("select ValueType_Identity from Value where Value_Identity = ?")?
            .query_row(params![value], |r| r.get(0))
            .optional()?;
        match uid {
            None => Ok(None),
            Some(uid) => ValueKind::from_uid(uid)
                .map(Some)
                .ok_or_else(|| corruption(format!("value {} has unknown type {}", value, uid))),
        }
    }
    pub fn persist_data_value(&self, data: &DataValue) -> Result<Identity> {
        let identity = self.add_value_row(data.kind())?;
        self.write_data_value(identity, data)?;
        debug!(value = identity, kind = %data.kind(), "persisted value");
        Ok(identity)
    }
    fn write_data_value(&self, identity: Identity, data: &DataValue) -> Result<()> {
        match data {
            DataValue::String(s) => {
                self.db
                    .prepare_cached(
                        "insert or replace into StringValue (Value_Identity, Text) values (?, ?)",
                    )?
                    .execute(params![identity, s.text])?;
            }
            DataValue::Url(u) => {
                self.db
                    .prepare_cached(
                        "insert or replace into UrlValue (Value_Identity, Text) values (?, ?)",
                    )?
                    .execute(params![identity, u.text])?;
            }
            DataValue::Quantity(q) => {
                self.db
                    .prepare_cached(
                        "
                    insert or replace into QuantityValue (
                        Value_Identity,
                        Number,
                        LowerBound,
                        UpperBound,
                        Unit_Identity
                    ) values (?, ?, ?, ?, ?)
                ",
                    )?
                    .execute(params![identity, q.number, q.lower, q.upper, q.unit])?;
            }
            DataValue::Time(t) => {
                self.db
                    .prepare_cached(
                        "
                    insert or replace into TimeValue (
                        Value_Identity,
                        Time,
                        Timezone,
                        Precision,
                        After,
                        Before,
                        CalendarModel_Identity
                    ) values (?, ?, ?, ?, ?, ?, ?)
                ",
                    )?
                    .execute(params![
                        identity,
                        t.time,
                        t.timezone,
                        t.precision,
                        t.after,
                        t.before,
                        t.calendar_model
                    ])?;
            }
            DataValue::GlobeCoordinates(g) => {
                self.db
                    .prepare_cached(
                        "
                    insert or replace into GlobeCoordinatesValue (
                        Value_Identity,
                        Latitude,
                        Longitude,
                        Precision,
                        Globe_Identity
                    ) values (?, ?, ?, ?, ?)
                ",
                    )?
                    .execute(params![identity, g.latitude, g.longitude, g.precision, g.globe])?;
            }
            DataValue::MonolingualText(m) => {
                self.db
                    .prepare_cached(
                        "
                    insert or replace into MonolingualTextValue (
                        Value_Identity,
                        Language,
                        Text
                    ) values (?, ?, ?)
                ",
                    )?
                    .execute(params![identity, m.language, m.text])?;
            }
        }
        Ok(())
    }
    /// Rewrites the fields of an existing value; the variant never changes.
    pub fn update_data_value(&self, identity: Identity, data: &DataValue) -> Result<()> {
        self.write_data_value(identity, data)
    }
    pub fn restore_data_value(
        &self,
        identity: Identity,
        kind: ValueKind,
    ) -> Result<Option<DataValue>> {
        let data = match kind {
            ValueKind::String => self
                .db
                .prepare_cached("select Text from StringValue where Value_Identity = ?")?
                .query_row(params![identity], |r| {
                    Ok(DataValue::String(StringValue { text: r.get(0)? }))
                })
                .optional()?,
            ValueKind::Url => self
                .db
                .prepare_cached("select Text from UrlValue where Value_Identity = ?")?
                .query_row(params![identity], |r| {
                    Ok(DataValue::Url(UrlValue { text: r.get(0)? }))
                })
                .optional()?,
            ValueKind::Quantity => self
                .db
                .prepare_cached(
                    "
                select Number, LowerBound, UpperBound, Unit_Identity
                    from QuantityValue
                    where Value_Identity = ?
            ",
                )?
                .query_row(params![identity], |r| {
                    Ok(DataValue::Quantity(QuantityValue {
                        number: r.get(0)?,
                        lower: r.get(1)?,
                        upper: r.get(2)?,
                        unit: r.get(3)?,
                    }))
                })
                .optional()?,
            ValueKind::Time => self
                .db
                .prepare_cached(
                    "
                select Time, Timezone, Precision, After, Before, CalendarModel_Identity
                    from TimeValue
                    where Value_Identity = ?
            ",
                )?
                .query_row(params![identity], |r| {
                    Ok(DataValue::Time(TimeValue {
                        time: r.get(0)?,
                        timezone: r.get(1)?,
                        precision: r.get::<_, Option<TimePrecision>>(2)?,
                        after: r.get(3)?,
                        before: r.get(4)?,
                        calendar_model: r.get(5)?,
                    }))
                })
                .optional()?,
            ValueKind::GlobeCoordinates => self
                .db
                .prepare_cached(
                    "
                select Latitude, Longitude, Precision, Globe_Identity
                    from GlobeCoordinatesValue
                    where Value_Identity = ?
            ",
                )?
                .query_row(params![identity], |r| {
                    Ok(DataValue::GlobeCoordinates(GlobeCoordinatesValue {
                        latitude: r.get::<_, Decimal>(0)?,
                        longitude: r.get::<_, Decimal>(1)?,
                        precision: r.get::<_, Decimal>(2)?,
                        globe: r.get(3)?,
                    }))
                })
                .optional()?,
            ValueKind::MonolingualText => self
                .db
                .prepare_cached(
                    "
                select Language, Text
                    from MonolingualTextValue
                    where Value_Identity = ?
            ",
                )?
                .query_row(params![identity], |r| {
                    Ok(DataValue::MonolingualText(MonolingualTextValue {
                        language: r.get(0)?,
                        text: r.get(1)?,
                    }))
                })
                .optional()?,
            ValueKind::Item | ValueKind::Property => None,
        };
        Ok(data)
    }
    /// Removes the value row; the variant (or entity) row goes with it.
    pub fn delete_value(&self, identity: Identity) -> Result<usize> {
        Ok(self
            .db
            .prepare_cached("delete from Value where Value_Identity = ?")?
            .execute(params![identity])?)
    }
    pub fn count_values(&self, kind: ValueKind) -> Result<usize> {
        let count: i64 = self
            .db
            .prepare_cached("select count(*) from Value where ValueType_Identity = ?")?
            .query_row(params![kind.uid()], |r| r.get(0))?;
        Ok(count as usize)
    }

    // ------------- Entities -------------
    /// Must run inside the write transaction that inserts the entity.
    pub fn next_display_id(&self, kind: EntityKind) -> Result<DisplayId> {
        Ok(self
            .db
            .prepare_cached("select coalesce(max(DisplayId), 0) + 1 from Entity where Kind = ?")?
            .query_row(params![kind.code()], |r| r.get(0))?)
    }
    pub fn persist_entity(
        &self,
        kind: EntityKind,
        display_id: DisplayId,
        datatype: Option<Datatype>,
    ) -> Result<Identity> {
        let identity = self.add_value_row(kind.value_kind())?;
        self.db
            .prepare_cached(
                "
                insert into Entity (
                    Entity_Identity,
                    Kind,
                    DisplayId,
                    Datatype_Identity
                ) values (?, ?, ?, ?)
            ",
            )?
            .execute(params![
                identity,
                kind.code(),
                display_id,
                datatype.map(|d| d.identity())
            ])?;
        Ok(identity)
    }
    fn entity_from_row(identity: Identity, kind: i64, display_id: DisplayId, datatype: Option<u8>) -> Result<Entity> {
        match (EntityKind::from_code(kind), datatype) {
            (Some(EntityKind::Item), None) => Ok(Entity::Item(Item::new(identity, display_id))),
            (Some(EntityKind::Property), Some(uid)) => {
                let kind = ValueKind::from_uid(uid).ok_or_else(|| {
                    corruption(format!("property {} has unknown datatype {}", identity, uid))
                })?;
                Ok(Entity::Property(Property::new(
                    identity,
                    display_id,
                    Datatype::new(kind),
                )))
            }
            _ => Err(corruption(format!(
                "entity {} has kind {} and datatype {:?}",
                identity, kind, datatype
            ))),
        }
    }
    fn collect_entities(&self, sql: &str, param: &dyn rusqlite::ToSql) -> Result<Vec<Entity>> {
        let mut statement = self.db.prepare_cached(sql)?;
        let rows = statement.query_map(params![param], |r| {
            Ok((r.get::<_, Identity>(0)?, r.get::<_, i64>(1)?, r.get::<_, DisplayId>(2)?, r.get::<_, Option<u8>>(3)?))
        })?;
        let mut entities = Vec::new();
        for row in rows {
            let (identity, kind, display_id, datatype) = row?;
            entities.push(Self::entity_from_row(identity, kind, display_id, datatype)?);
        }
        Ok(entities)
    }
    pub fn restore_entity(&self, identity: Identity) -> Result<Option<Entity>> {
        Ok(self
            .collect_entities(
                "
                select Entity_Identity, Kind, DisplayId, Datatype_Identity
                    from Entity
                    where Entity_Identity = ?
            ",
                &identity,
            )?
            .pop())
    }
    pub fn entity_by_display_id(
        &self,
        kind: EntityKind,
        display_id: DisplayId,
    ) -> Result<Option<Entity>> {
        let identity: Option<Identity> = self
            .db
            .prepare_cached("select Entity_Identity from Entity where Kind = ? and DisplayId = ?")?
            .query_row(params![kind.code(), display_id], |r| r.get(0))
            .optional()?;
        match identity {
            Some(identity) => self.restore_entity(identity),
            None => Ok(None),
        }
    }
    pub fn all_entities(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        self.collect_entities(
            "
            select Entity_Identity, Kind, DisplayId, Datatype_Identity
                from Entity
                where Kind = ?
                order by DisplayId
        ",
            &kind.code(),
        )
    }
    /// Entities of the given kind having a label containing the fragment.
    pub fn search_entities(&self, kind: EntityKind, fragment: &str) -> Result<Vec<Entity>> {
        let mut statement = self.db.prepare_cached(
            "
            select distinct e.Entity_Identity, e.Kind, e.DisplayId, e.Datatype_Identity
                from Entity e
                join Label l
                on l.Entity_Identity = e.Entity_Identity
                where e.Kind = ?
                and instr(l.Text, ?) > 0
                order by e.DisplayId
        ",
        )?;
        let rows = statement.query_map(params![kind.code(), fragment], |r| {
            Ok((r.get::<_, Identity>(0)?, r.get::<_, i64>(1)?, r.get::<_, DisplayId>(2)?, r.get::<_, Option<u8>>(3)?))
        })?;
        let mut entities = Vec::new();
        for row in rows {
            let (identity, kind, display_id, datatype) = row?;
            entities.push(Self::entity_from_row(identity, kind, display_id, datatype)?);
        }
        Ok(entities)
    }
    /// Describes every row that keeps the entity from being deleted.
    pub fn entity_references(&self, identity: Identity) -> Result<Vec<String>> {
        let checks: [(&str, &str); 7] = [
            ("snak value", "select count(*) from Snak where Value_Identity = ?"),
            ("snak property", "select count(*) from Snak where Property_Identity = ?"),
            ("quantity unit", "select count(*) from QuantityValue where Unit_Identity = ?"),
            ("calendar model", "select count(*) from TimeValue where CalendarModel_Identity = ?"),
            ("globe", "select count(*) from GlobeCoordinatesValue where Globe_Identity = ?"),
            ("item mapping", "select count(*) from ItemMapping where Item_Identity = ?"),
            ("property mapping", "select count(*) from PropertyMapping where Property_Identity = ?"),
        ];
        let mut references = Vec::new();
        for (what, sql) in checks {
            let count: i64 = self
                .db
                .prepare_cached(sql)?
                .query_row(params![identity], |r| r.get(0))?;
            if count > 0 {
                references.push(format!("{} {}", count, what));
            }
        }
        Ok(references)
    }

    // ------------- Terms -------------
    pub fn find_terms(
        &self,
        kind: TermKind,
        entity: Identity,
        language: &str,
    ) -> Result<Vec<Term>> {
        let sql = format!(
            "
            select {0}_Identity, Entity_Identity, Language, Text
                from {0}
                where Entity_Identity = ?
                and Language = ?
                order by {0}_Identity
        ",
            kind.table()
        );
        let mut statement = self.db.prepare_cached(&sql)?;
        let rows = statement.query_map(params![entity, language], |r| {
            Ok(Term::new(r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<Term>>>()?)
    }
    pub fn restore_terms(&self, kind: TermKind, entity: Identity) -> Result<Vec<Term>> {
        let sql = format!(
            "
            select {0}_Identity, Entity_Identity, Language, Text
                from {0}
                where Entity_Identity = ?
                order by {0}_Identity
        ",
            kind.table()
        );
        let mut statement = self.db.prepare_cached(&sql)?;
        let rows = statement.query_map(params![entity], |r| {
            Ok(Term::new(r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<Term>>>()?)
    }
    pub fn persist_term(
        &self,
        kind: TermKind,
        entity: Identity,
        language: &str,
        text: &str,
    ) -> Result<Identity> {
        let sql = format!(
            "insert into {} (Entity_Identity, Language, Text) values (?, ?, ?)",
            kind.table()
        );
        self.db
            .prepare_cached(&sql)?
            .execute(params![entity, language, text])?;
        Ok(self.db.last_insert_rowid())
    }
    pub fn update_term(&self, kind: TermKind, term: Identity, text: &str) -> Result<()> {
        let sql = format!("update {0} set Text = ? where {0}_Identity = ?", kind.table());
        self.db.prepare_cached(&sql)?.execute(params![text, term])?;
        Ok(())
    }
    pub fn delete_term(&self, kind: TermKind, term: Identity) -> Result<usize> {
        let sql = format!("delete from {0} where {0}_Identity = ?", kind.table());
        Ok(self.db.prepare_cached(&sql)?.execute(params![term])?)
    }

    // ------------- Snaks -------------
    pub fn persist_snak(
        &self,
        property: Identity,
        kind: SnakKind,
        value: Option<Identity>,
    ) -> Result<Identity> {
        self.db
            .prepare_cached(
                "
                insert into Snak (
                    Property_Identity,
                    Presence,
                    Value_Identity
                ) values (?, ?, ?)
            ",
            )?
            .execute(params![property, kind.code(), value])?;
        Ok(self.db.last_insert_rowid())
    }
    /// (property, presence, value) of a snak row.
    pub fn snak_row(&self, snak: Identity) -> Result<Option<(Identity, SnakKind, Option<Identity>)>> {
        let row: Option<(Identity, i64, Option<Identity>)> = self
            .db
            .prepare_cached(
                "
                select Property_Identity, Presence, Value_Identity
                    from Snak
                    where Snak_Identity = ?
            ",
            )?
            .query_row(params![snak], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .optional()?;
        match row {
            None => Ok(None),
            Some((property, presence, value)) => {
                Ok(Some((property, SnakKind::from_code(presence)?, value)))
            }
        }
    }
    pub fn set_snak_value(&self, snak: Identity, value: Identity) -> Result<()> {
        self.db
            .prepare_cached("update Snak set Value_Identity = ? where Snak_Identity = ?")?
            .execute(params![value, snak])?;
        Ok(())
    }
    /// How many statements, qualifiers and reference snaks point at a snak.
    pub fn snak_usage(&self, snak: Identity) -> Result<usize> {
        let count: i64 = self
            .db
            .prepare_cached(
                "
                select (select count(*) from Statement where MainSnak_Identity = ?1)
                     + (select count(*) from Qualifier where Snak_Identity = ?1)
                     + (select count(*) from ReferenceSnak where Snak_Identity = ?1)
            ",
            )?
            .query_row(params![snak], |r| r.get(0))?;
        Ok(count as usize)
    }
    pub fn value_usage(&self, value: Identity) -> Result<usize> {
        let count: i64 = self
            .db
            .prepare_cached("select count(*) from Snak where Value_Identity = ?")?
            .query_row(params![value], |r| r.get(0))?;
        Ok(count as usize)
    }
    pub fn delete_snak(&self, snak: Identity) -> Result<usize> {
        Ok(self
            .db
            .prepare_cached("delete from Snak where Snak_Identity = ?")?
            .execute(params![snak])?)
    }
    pub fn count_snaks(&self) -> Result<usize> {
        let count: i64 = self
            .db
            .prepare_cached("select count(*) from Snak")?
            .query_row([], |r| r.get(0))?;
        Ok(count as usize)
    }

    // ------------- Statements -------------
    pub fn persist_statement(
        &self,
        subject: Identity,
        mainsnak: Identity,
        rank: Rank,
    ) -> Result<Identity> {
        self.db
            .prepare_cached(
                "
                insert into Statement (
                    Subject_Identity,
                    MainSnak_Identity,
                    Rank
                ) values (?, ?, ?)
            ",
            )?
            .execute(params![subject, mainsnak, rank.code()])?;
        Ok(self.db.last_insert_rowid())
    }
    /// (subject, mainsnak, rank) of a statement row.
    pub fn statement_row(&self, statement: Identity) -> Result<Option<(Identity, Identity, Rank)>> {
        let row: Option<(Identity, Identity, i64)> = self
            .db
            .prepare_cached(
                "
                select Subject_Identity, MainSnak_Identity, Rank
                    from Statement
                    where Statement_Identity = ?
            ",
            )?
            .query_row(params![statement], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .optional()?;
        match row {
            None => Ok(None),
            Some((subject, mainsnak, rank)) => Ok(Some((subject, mainsnak, Rank::try_from(rank)?))),
        }
    }
    fn collect_identities(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Identity>> {
        let mut statement = self.db.prepare_cached(sql)?;
        let rows = statement.query_map(params, |r| r.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<Identity>>>()?)
    }
    pub fn statements_of(&self, subject: Identity) -> Result<Vec<Identity>> {
        self.collect_identities(
            "
            select Statement_Identity
                from Statement
                where Subject_Identity = ?
                order by Statement_Identity
        ",
            params![subject],
        )
    }
    /// Statements of a subject for one property, lowest identity first.
    pub fn statements_for(&self, subject: Identity, property: Identity) -> Result<Vec<Identity>> {
        self.collect_identities(
            "
            select st.Statement_Identity
                from Statement st
                join Snak sn
                on sn.Snak_Identity = st.MainSnak_Identity
                where st.Subject_Identity = ?
                and sn.Property_Identity = ?
                order by st.Statement_Identity
        ",
            params![subject, property],
        )
    }
    pub fn set_mainsnak(&self, statement: Identity, snak: Identity) -> Result<()> {
        self.db
            .prepare_cached("update Statement set MainSnak_Identity = ? where Statement_Identity = ?")?
            .execute(params![snak, statement])?;
        Ok(())
    }
    pub fn set_rank(&self, statement: Identity, rank: Rank) -> Result<()> {
        self.db
            .prepare_cached("update Statement set Rank = ? where Statement_Identity = ?")?
            .execute(params![rank.code(), statement])?;
        Ok(())
    }
    pub fn delete_statement(&self, statement: Identity) -> Result<usize> {
        Ok(self
            .db
            .prepare_cached("delete from Statement where Statement_Identity = ?")?
            .execute(params![statement])?)
    }
    pub fn count_statements(&self) -> Result<usize> {
        let count: i64 = self
            .db
            .prepare_cached("select count(*) from Statement")?
            .query_row([], |r| r.get(0))?;
        Ok(count as usize)
    }

    // ------------- Qualifiers -------------
    pub fn persist_qualifier(&self, statement: Identity, snak: Identity) -> Result<Identity> {
        self.db
            .prepare_cached("insert into Qualifier (Statement_Identity, Snak_Identity) values (?, ?)")?
            .execute(params![statement, snak])?;
        Ok(self.db.last_insert_rowid())
    }
    /// (qualifier, snak) pairs of a statement.
    pub fn qualifier_rows(&self, statement: Identity) -> Result<Vec<(Identity, Identity)>> {
        let mut query = self.db.prepare_cached(
            "
            select Qualifier_Identity, Snak_Identity
                from Qualifier
                where Statement_Identity = ?
                order by Qualifier_Identity
        ",
        )?;
        let rows = query.query_map(params![statement], |r| Ok((r.get(0)?, r.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<(Identity, Identity)>>>()?)
    }
    pub fn delete_qualifier(&self, qualifier: Identity) -> Result<usize> {
        Ok(self
            .db
            .prepare_cached("delete from Qualifier where Qualifier_Identity = ?")?
            .execute(params![qualifier])?)
    }

    // ------------- References -------------
    pub fn persist_reference_record(&self, statement: Identity) -> Result<Identity> {
        self.db
            .prepare_cached("insert into ReferenceRecord (Statement_Identity) values (?)")?
            .execute(params![statement])?;
        Ok(self.db.last_insert_rowid())
    }
    pub fn persist_reference_snak(&self, record: Identity, snak: Identity) -> Result<Identity> {
        self.db
            .prepare_cached(
                "insert into ReferenceSnak (ReferenceRecord_Identity, Snak_Identity) values (?, ?)",
            )?
            .execute(params![record, snak])?;
        Ok(self.db.last_insert_rowid())
    }
    pub fn reference_records(&self, statement: Identity) -> Result<Vec<Identity>> {
        self.collect_identities(
            "
            select ReferenceRecord_Identity
                from ReferenceRecord
                where Statement_Identity = ?
                order by ReferenceRecord_Identity
        ",
            params![statement],
        )
    }
    /// (reference snak, snak) pairs of a reference record.
    pub fn reference_snak_rows(&self, record: Identity) -> Result<Vec<(Identity, Identity)>> {
        let mut query = self.db.prepare_cached(
            "
            select ReferenceSnak_Identity, Snak_Identity
                from ReferenceSnak
                where ReferenceRecord_Identity = ?
                order by ReferenceSnak_Identity
        ",
        )?;
        let rows = query.query_map(params![record], |r| Ok((r.get(0)?, r.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<(Identity, Identity)>>>()?)
    }
    pub fn delete_reference_record(&self, record: Identity) -> Result<usize> {
        Ok(self
            .db
            .prepare_cached("delete from ReferenceRecord where ReferenceRecord_Identity = ?")?
            .execute(params![record])?)
    }

    // ------------- Mappings -------------
    pub fn persist_mapping(&self, mapping: MappingTable, key: &str, entity: Identity) -> Result<()> {
        let sql = format!(
            "insert into {} (Key, {}) values (?, ?)",
            mapping.table, mapping.column
        );
        self.db.prepare_cached(&sql)?.execute(params![key, entity])?;
        Ok(())
    }
    pub fn mapping_by_key(&self, mapping: MappingTable, key: &str) -> Result<Option<Identity>> {
        let sql = format!("select {} from {} where Key = ?", mapping.column, mapping.table);
        Ok(self
            .db
            .prepare_cached(&sql)?
            .query_row(params![key], |r| r.get(0))
            .optional()?)
    }
    pub fn mapping_by_entity(&self, mapping: MappingTable, entity: Identity) -> Result<Option<String>> {
        let sql = format!("select Key from {} where {} = ?", mapping.table, mapping.column);
        Ok(self
            .db
            .prepare_cached(&sql)?
            .query_row(params![entity], |r| r.get(0))
            .optional()?)
    }
    pub fn all_mappings(&self, mapping: MappingTable) -> Result<Vec<(String, Identity)>> {
        let sql = format!("select Key, {} from {} order by Key", mapping.column, mapping.table);
        let mut query = self.db.prepare_cached(&sql)?;
        let rows = query.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<(String, Identity)>>>()?)
    }
    pub fn delete_mapping(&self, mapping: MappingTable, key: &str) -> Result<usize> {
        let sql = format!("delete from {} where Key = ?", mapping.table);
        Ok(self.db.prepare_cached(&sql)?.execute(params![key])?)
    }

    // ------------- Property ordering -------------
    pub fn replace_order(&self, item: Identity, properties: &[Identity]) -> Result<()> {
        self.db
            .prepare_cached("delete from PropertyOrderPreference where Item_Identity = ?")?
            .execute(params![item])?;
        let mut insert = self.db.prepare_cached(
            "
            insert into PropertyOrderPreference (
                Item_Identity,
                Property_Identity,
                Ordering
            ) values (?, ?, ?)
        ",
        )?;
        for (ordering, property) in properties.iter().enumerate() {
            insert.execute(params![item, property, ordering as i64])?;
        }
        Ok(())
    }
    /// (property, ordering) rows of a type item, in display order.
    pub fn restore_order(&self, item: Identity) -> Result<Vec<(Identity, i64)>> {
        let mut query = self.db.prepare_cached(
            "
            select Property_Identity, Ordering
                from PropertyOrderPreference
                where Item_Identity = ?
                order by Ordering, PropertyOrderPreference_Identity
        ",
        )?;
        let rows = query.query_map(params![item], |r| Ok((r.get(0)?, r.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<(Identity, i64)>>>()?)
    }

    // ------------- Graph queries -------------
    /// Subjects of statements whose mainsnak, qualifiers or references use the value.
    pub fn subjects_using_value(&self, value: Identity) -> Result<Vec<Identity>> {
        self.collect_identities(
            "
            select distinct st.Subject_Identity
                from Statement st
                join Snak sn
                on sn.Snak_Identity = st.MainSnak_Identity
                where sn.Value_Identity = ?1
            union
            select distinct st.Subject_Identity
                from Statement st
                join Qualifier q
                on q.Statement_Identity = st.Statement_Identity
                join Snak sn
                on sn.Snak_Identity = q.Snak_Identity
                where sn.Value_Identity = ?1
            union
            select distinct st.Subject_Identity
                from Statement st
                join ReferenceRecord rr
                on rr.Statement_Identity = st.Statement_Identity
                join ReferenceSnak rs
                on rs.ReferenceRecord_Identity = rr.ReferenceRecord_Identity
                join Snak sn
                on sn.Snak_Identity = rs.Snak_Identity
                where sn.Value_Identity = ?1
            order by 1
        ",
            params![value],
        )
    }
    /// Values of a subject's mainsnaks for one property.
    pub fn mainsnak_values(&self, subject: Identity, property: Identity) -> Result<Vec<Identity>> {
        self.collect_identities(
            "
            select sn.Value_Identity
                from Statement st
                join Snak sn
                on sn.Snak_Identity = st.MainSnak_Identity
                where st.Subject_Identity = ?
                and sn.Property_Identity = ?
                and sn.Value_Identity is not null
                order by st.Statement_Identity
        ",
            params![subject, property],
        )
    }
    /// Subjects having a mainsnak (property, value).
    pub fn subjects_with(&self, property: Identity, value: Identity) -> Result<Vec<Identity>> {
        self.collect_identities(
            "
            select distinct st.Subject_Identity
                from Statement st
                join Snak sn
                on sn.Snak_Identity = st.MainSnak_Identity
                where sn.Property_Identity = ?
                and sn.Value_Identity = ?
                order by st.Subject_Identity
        ",
            params![property, value],
        )
    }
}
