// other keepers use HashMap with a fast hasher
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

// used to print out readable forms of a construct
use std::fmt;

// our own stuff that we need
use crate::datatype::{DataType, DataValue, ValueKind};
use crate::error::{Result, WikibaseError};

// ------------- Identity -------------
/// Internal storage identity, shared by every value row (entities included).
pub type Identity = i64;
/// Human-facing sequential identifier, dense per entity kind.
pub type DisplayId = i64;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// ------------- Datatype -------------
/// A persisted registry entry. Its identity is the variant's UID.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Datatype {
    kind: ValueKind,
}
impl Datatype {
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }
    pub fn identity(&self) -> Identity {
        self.kind.uid() as Identity
    }
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }
}
impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Datatype[{}]", self.class_name())
    }
}

// ------------- Entities -------------
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Item,
    Property,
}
impl EntityKind {
    pub fn code(self) -> i64 {
        match self {
            EntityKind::Item => 0,
            EntityKind::Property => 1,
        }
    }
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(EntityKind::Item),
            1 => Some(EntityKind::Property),
            _ => None,
        }
    }
    pub fn prefix(self) -> char {
        match self {
            EntityKind::Item => 'Q',
            EntityKind::Property => 'P',
        }
    }
    pub fn value_kind(self) -> ValueKind {
        match self {
            EntityKind::Item => ValueKind::Item,
            EntityKind::Property => ValueKind::Property,
        }
    }
}

impl DataType for Item {
    const UID: u8 = 1;
    const DATA_TYPE: &'static str = "Item";
}
impl DataType for Property {
    const UID: u8 = 2;
    const DATA_TYPE: &'static str = "Property";
}

// It's intentional to keep the fields private and only expose them through
// getters, because this yields true immutability for handles after creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    identity: Identity,
    display_id: DisplayId,
}
impl Item {
    pub fn new(identity: Identity, display_id: DisplayId) -> Self {
        Self {
            identity,
            display_id,
        }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn display_id(&self) -> DisplayId {
        self.display_id
    }
    pub fn entity(&self) -> Entity {
        Entity::Item(self.clone())
    }
    pub fn value(&self) -> Value {
        Value::Entity(self.entity())
    }
}
impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Q{}", self.display_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Property {
    identity: Identity,
    display_id: DisplayId,
    datatype: Datatype,
}
impl Property {
    pub fn new(identity: Identity, display_id: DisplayId, datatype: Datatype) -> Self {
        Self {
            identity,
            display_id,
            datatype,
        }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn display_id(&self) -> DisplayId {
        self.display_id
    }
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }
    pub fn entity(&self) -> Entity {
        Entity::Property(self.clone())
    }
    pub fn value(&self) -> Value {
        Value::Entity(self.entity())
    }
}
impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "P{}", self.display_id)
    }
}

/// A described entity: an item or a property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    Item(Item),
    Property(Property),
}
impl Entity {
    pub fn identity(&self) -> Identity {
        match self {
            Entity::Item(i) => i.identity(),
            Entity::Property(p) => p.identity(),
        }
    }
    pub fn display_id(&self) -> DisplayId {
        match self {
            Entity::Item(i) => i.display_id(),
            Entity::Property(p) => p.display_id(),
        }
    }
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Item(_) => EntityKind::Item,
            Entity::Property(_) => EntityKind::Property,
        }
    }
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Entity::Item(i) => Some(i),
            Entity::Property(_) => None,
        }
    }
    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Entity::Property(p) => Some(p),
            Entity::Item(_) => None,
        }
    }
}
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.kind().prefix(), self.display_id())
    }
}
impl From<Item> for Entity {
    fn from(item: Item) -> Self {
        Entity::Item(item)
    }
}
impl From<Property> for Entity {
    fn from(property: Property) -> Self {
        Entity::Property(property)
    }
}

// ------------- Values -------------
/// A data value that has been written to the store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredValue {
    identity: Identity,
    data: DataValue,
}
impl StoredValue {
    pub fn new(identity: Identity, data: DataValue) -> Self {
        Self { identity, data }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn data(&self) -> &DataValue {
        &self.data
    }
    pub fn value(&self) -> Value {
        Value::Data(self.clone())
    }
}

/// Anything a snak can point at: a shared entity or an owned data value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Entity(Entity),
    Data(StoredValue),
}
impl Value {
    pub fn identity(&self) -> Identity {
        match self {
            Value::Entity(e) => e.identity(),
            Value::Data(d) => d.identity(),
        }
    }
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Entity(e) => e.kind().value_kind(),
            Value::Data(d) => d.data().kind(),
        }
    }
    pub fn is_entity(&self) -> bool {
        self.kind().is_entity()
    }
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(e),
            Value::Data(_) => None,
        }
    }
    pub fn as_item(&self) -> Option<&Item> {
        self.as_entity().and_then(Entity::as_item)
    }
    pub fn as_data(&self) -> Option<&DataValue> {
        match self {
            Value::Data(d) => Some(d.data()),
            Value::Entity(_) => None,
        }
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Entity(e) => write!(f, "{}", e),
            Value::Data(d) => write!(f, "{}", d.data()),
        }
    }
}
impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        Value::Entity(entity)
    }
}
impl From<Item> for Value {
    fn from(item: Item) -> Self {
        Value::Entity(Entity::Item(item))
    }
}
impl From<Property> for Value {
    fn from(property: Property) -> Self {
        Value::Entity(Entity::Property(property))
    }
}
impl From<StoredValue> for Value {
    fn from(value: StoredValue) -> Self {
        Value::Data(value)
    }
}

// ------------- Terms -------------
/// The three monolingual term collections of a described entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TermKind {
    Label,
    Description,
    Alias,
}
impl TermKind {
    pub fn table(self) -> &'static str {
        match self {
            TermKind::Label => "Label",
            TermKind::Description => "Description",
            TermKind::Alias => "Alias",
        }
    }
    /// Labels and descriptions allow one entry per language, aliases many.
    pub fn unique_per_language(self) -> bool {
        !matches!(self, TermKind::Alias)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Term {
    identity: Identity,
    entity: Identity,
    language: String,
    text: String,
}
impl Term {
    pub fn new(identity: Identity, entity: Identity, language: String, text: String) -> Self {
        Self {
            identity,
            entity,
            language,
            text,
        }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn entity(&self) -> Identity {
        self.entity
    }
    pub fn language(&self) -> &str {
        &self.language
    }
    pub fn text(&self) -> &str {
        &self.text
    }
}

// ------------- Snaks -------------
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SnakKind {
    Value,
    SomeValue,
    NoValue,
}
impl SnakKind {
    pub fn code(self) -> i64 {
        match self {
            SnakKind::Value => 0,
            SnakKind::SomeValue => 1,
            SnakKind::NoValue => 2,
        }
    }
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(SnakKind::Value),
            1 => Ok(SnakKind::SomeValue),
            2 => Ok(SnakKind::NoValue),
            _ => Err(WikibaseError::invalid_field(
                "snaktype",
                format!("{} is not a snak type", code),
            )),
        }
    }
    pub fn wire_name(self) -> &'static str {
        match self {
            SnakKind::Value => "value",
            SnakKind::SomeValue => "somevalue",
            SnakKind::NoValue => "novalue",
        }
    }
    pub fn from_wire_name(name: &str) -> Result<Self> {
        match name {
            "value" => Ok(SnakKind::Value),
            "somevalue" => Ok(SnakKind::SomeValue),
            "novalue" => Ok(SnakKind::NoValue),
            _ => Err(WikibaseError::invalid_field(
                "snaktype",
                format!("'{}' is not a snak type", name),
            )),
        }
    }
}

/// What a snak asserts about its property.
#[derive(Clone, Debug, PartialEq)]
pub enum SnakValue {
    Value(Value),
    SomeValue,
    NoValue,
}
impl SnakValue {
    /// Builds a snak body from a presence kind and an optional value,
    /// rejecting combinations that break the presence invariant.
    pub fn from_parts(kind: SnakKind, value: Option<Value>) -> Result<Self> {
        match (kind, value) {
            (SnakKind::Value, Some(v)) => Ok(SnakValue::Value(v)),
            (SnakKind::Value, None) => Err(WikibaseError::Validation(
                "a value snak needs a value".to_string(),
            )),
            (SnakKind::SomeValue, None) => Ok(SnakValue::SomeValue),
            (SnakKind::NoValue, None) => Ok(SnakValue::NoValue),
            (kind, Some(_)) => Err(WikibaseError::Validation(format!(
                "a {} snak cannot carry a value",
                kind.wire_name()
            ))),
        }
    }
    pub fn kind(&self) -> SnakKind {
        match self {
            SnakValue::Value(_) => SnakKind::Value,
            SnakValue::SomeValue => SnakKind::SomeValue,
            SnakValue::NoValue => SnakKind::NoValue,
        }
    }
    pub fn value(&self) -> Option<&Value> {
        match self {
            SnakValue::Value(v) => Some(v),
            _ => None,
        }
    }
}
impl From<Value> for SnakValue {
    fn from(value: Value) -> Self {
        SnakValue::Value(value)
    }
}

/// The atomic claim body: (property, presence kind, optional value).
#[derive(Clone, Debug, PartialEq)]
pub struct Snak {
    identity: Identity,
    property: Property,
    body: SnakValue,
}
impl Snak {
    pub fn new(identity: Identity, property: Property, body: SnakValue) -> Self {
        Self {
            identity,
            property,
            body,
        }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn property(&self) -> &Property {
        &self.property
    }
    pub fn kind(&self) -> SnakKind {
        self.body.kind()
    }
    pub fn value(&self) -> Option<&Value> {
        self.body.value()
    }
    pub fn body(&self) -> &SnakValue {
        &self.body
    }
}
impl fmt::Display for Snak {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.body {
            SnakValue::Value(v) => write!(f, "{} --> {}", self.property, v),
            SnakValue::SomeValue => write!(f, "{} --> ?", self.property),
            SnakValue::NoValue => write!(f, "{} --> ∅", self.property),
        }
    }
}

// ------------- Statements -------------
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Rank {
    Deprecated,
    #[default]
    Normal,
    Preferred,
}
impl Rank {
    pub fn code(self) -> i64 {
        match self {
            Rank::Deprecated => -1,
            Rank::Normal => 0,
            Rank::Preferred => 1,
        }
    }
    pub fn name(self) -> &'static str {
        match self {
            Rank::Deprecated => "deprecated",
            Rank::Normal => "normal",
            Rank::Preferred => "preferred",
        }
    }
}
impl TryFrom<i64> for Rank {
    type Error = WikibaseError;
    fn try_from(code: i64) -> Result<Self> {
        match code {
            -1 => Ok(Rank::Deprecated),
            0 => Ok(Rank::Normal),
            1 => Ok(Rank::Preferred),
            other => Err(WikibaseError::RankOutOfRange(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    identity: Identity,
    subject: Entity,
    mainsnak: Snak,
    rank: Rank,
}
impl Statement {
    pub fn new(identity: Identity, subject: Entity, mainsnak: Snak, rank: Rank) -> Self {
        Self {
            identity,
            subject,
            mainsnak,
            rank,
        }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn subject(&self) -> &Entity {
        &self.subject
    }
    pub fn mainsnak(&self) -> &Snak {
        &self.mainsnak
    }
    pub fn rank(&self) -> Rank {
        self.rank
    }
    pub fn property(&self) -> &Property {
        self.mainsnak.property()
    }
}
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {} -- {}", self.rank.code(), self.subject, self.mainsnak)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Qualifier {
    identity: Identity,
    statement: Identity,
    snak: Snak,
}
impl Qualifier {
    pub fn new(identity: Identity, statement: Identity, snak: Snak) -> Self {
        Self {
            identity,
            statement,
            snak,
        }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn statement(&self) -> Identity {
        self.statement
    }
    pub fn snak(&self) -> &Snak {
        &self.snak
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceSnak {
    identity: Identity,
    snak: Snak,
}
impl ReferenceSnak {
    pub fn new(identity: Identity, snak: Snak) -> Self {
        Self { identity, snak }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn snak(&self) -> &Snak {
        &self.snak
    }
}

/// One citation supporting a statement.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceRecord {
    identity: Identity,
    statement: Identity,
    snaks: Vec<ReferenceSnak>,
}
impl ReferenceRecord {
    pub fn new(identity: Identity, statement: Identity, snaks: Vec<ReferenceSnak>) -> Self {
        Self {
            identity,
            statement,
            snaks,
        }
    }
    pub fn identity(&self) -> Identity {
        self.identity
    }
    pub fn statement(&self) -> Identity {
        self.statement
    }
    pub fn snaks(&self) -> &[ReferenceSnak] {
        &self.snaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_outside_minus_one_to_one_are_refused() {
        assert_eq!(Rank::try_from(-1).unwrap(), Rank::Deprecated);
        assert_eq!(Rank::try_from(0).unwrap(), Rank::Normal);
        assert_eq!(Rank::try_from(1).unwrap(), Rank::Preferred);
        assert!(matches!(Rank::try_from(2), Err(WikibaseError::RankOutOfRange(2))));
        assert!(matches!(Rank::try_from(-2), Err(WikibaseError::RankOutOfRange(-2))));
        assert_eq!(Rank::default(), Rank::Normal);
    }

    #[test]
    fn presence_invariant_on_snak_bodies() {
        let item = Item::new(10, 3);
        assert!(SnakValue::from_parts(SnakKind::Value, Some(item.value())).is_ok());
        assert!(SnakValue::from_parts(SnakKind::Value, None).is_err());
        assert!(SnakValue::from_parts(SnakKind::SomeValue, Some(item.value())).is_err());
        assert_eq!(
            SnakValue::from_parts(SnakKind::NoValue, None).unwrap(),
            SnakValue::NoValue
        );
    }

    #[test]
    fn display_ids_render_with_prefix() {
        let item = Item::new(10, 5);
        let property = Property::new(11, 5, Datatype::new(ValueKind::Item));
        assert_eq!(item.to_string(), "Q5");
        assert_eq!(property.to_string(), "P5");
        assert_eq!(Entity::from(property).to_string(), "P5");
    }

    #[test]
    fn snak_kinds_from_wire() {
        assert_eq!(SnakKind::from_wire_name("somevalue").unwrap(), SnakKind::SomeValue);
        assert_eq!(SnakKind::from_code(2).unwrap(), SnakKind::NoValue);
        assert!(SnakKind::from_wire_name("maybe").is_err());
    }
}
