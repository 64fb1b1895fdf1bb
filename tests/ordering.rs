use wikibase::construct::{Item, Property, Rank, SnakValue};
use wikibase::database::{Database, PersistenceMode};
use wikibase::datatype::StringValue;
use wikibase::error::WikibaseError;
use wikibase::mapping::IS_A;
use wikibase::ordering::IS_A_POSITION;

struct Fixture {
    db: Database,
    is_a: Property,
    city: Item,
}

fn fixture() -> Fixture {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    db.bootstrap().unwrap();
    let is_a = db.property_mapping().get(IS_A).unwrap();
    let city = db.create_item().unwrap();
    Fixture { db, is_a, city }
}

fn string_property(db: &Database) -> Property {
    let string = db.datatype("StringValue").unwrap();
    db.create_property(&string).unwrap()
}

fn text(db: &Database, s: &str) -> SnakValue {
    SnakValue::Value(db.store_value(StringValue::new(s).into()).unwrap().value())
}

#[test]
fn set_order_replaces_the_whole_list() {
    let Fixture { db, city, .. } = fixture();
    let a = string_property(&db);
    let b = string_property(&db);
    let c = string_property(&db);
    db.set_order(&city, &[a.clone(), b.clone(), c.clone()]).unwrap();
    assert_eq!(db.get_order(&city).unwrap(), vec![a.clone(), b.clone(), c]);
    db.set_order(&city, &[b.clone(), a.clone()]).unwrap();
    assert_eq!(db.get_order(&city).unwrap(), vec![b, a]);
    db.set_order(&city, &[]).unwrap();
    assert!(db.get_order(&city).unwrap().is_empty());
}

#[test]
fn set_order_only_accepts_properties() {
    let Fixture { db, city, .. } = fixture();
    let name = string_property(&db);
    db.set_order(&city, &[name.clone()]).unwrap();
    let river = db.create_item().unwrap();
    let posing = Property::new(river.identity(), 1, name.datatype());
    assert!(matches!(
        db.set_order(&city, &[posing]),
        Err(WikibaseError::Validation(_))
    ));
    assert_eq!(db.get_order(&city).unwrap(), vec![name]);
}

#[test]
fn instances_and_types_follow_is_a() {
    let Fixture { db, is_a, city } = fixture();
    let athens = db.create_item().unwrap();
    let sparta = db.create_item().unwrap();
    let river = db.create_item().unwrap();
    for place in [&athens, &sparta] {
        db.add_value(&place.entity(), &is_a, &city.value(), Rank::Normal)
            .unwrap();
    }
    assert_eq!(
        db.instances_of(&city).unwrap(),
        vec![athens.clone(), sparta.clone()]
    );
    assert!(db.instances_of(&river).unwrap().is_empty());
    assert_eq!(db.types_of(&athens).unwrap(), vec![city]);
}

#[test]
fn linked_items_look_through_qualifiers_and_references() {
    let Fixture { db, is_a, city } = fixture();
    let item = db.datatype("Item").unwrap();
    let located_in = db.create_property(&item).unwrap();
    let attica = db.create_item().unwrap();
    let athens = db.create_item().unwrap();
    let piraeus = db.create_item().unwrap();
    let source = db.create_item().unwrap();

    db.add_value(&athens.entity(), &located_in, &attica.value(), Rank::Normal)
        .unwrap();
    let statement = db
        .add_value(&piraeus.entity(), &is_a, &city.value(), Rank::Normal)
        .unwrap();
    db.add_qualifier(&statement, &located_in, SnakValue::Value(attica.value()))
        .unwrap();
    let cited = db
        .add_value(&source.entity(), &is_a, &city.value(), Rank::Normal)
        .unwrap();
    db.add_reference(&cited, &[(located_in.clone(), SnakValue::Value(attica.value()))])
        .unwrap();

    assert_eq!(
        db.linked_items(&attica).unwrap(),
        vec![athens, piraeus, source]
    );
}

#[test]
fn statement_groups_put_is_a_first_then_the_type_order() {
    let Fixture { db, is_a, city } = fixture();
    let name = string_property(&db);
    let motto = string_property(&db);
    let nickname = string_property(&db);
    db.set_order(&city, &[motto.clone(), name.clone()]).unwrap();

    let athens = db.create_item().unwrap();
    let subject = athens.entity();
    db.add_statement(&subject, &nickname, text(&db, "violet-crowned"), Rank::Normal)
        .unwrap();
    db.add_statement(&subject, &name, text(&db, "Athenai"), Rank::Normal)
        .unwrap();
    db.add_statement(&subject, &name, text(&db, "Athina"), Rank::Normal)
        .unwrap();
    db.add_statement(&subject, &motto, SnakValue::NoValue, Rank::Normal)
        .unwrap();
    db.add_value(&subject, &is_a, &city.value(), Rank::Normal)
        .unwrap();

    let groups = db.ordered_statement_groups(&athens).unwrap();
    let order: Vec<&Property> = groups.iter().map(|g| &g.property).collect();
    assert_eq!(order, vec![&is_a, &motto, &name, &nickname]);
    assert_eq!(groups[0].position, IS_A_POSITION);
    assert_eq!(groups[2].statements.len(), 2);
    // unlisted properties come after every explicit position
    assert!(groups[3].position > groups[2].position);
}

#[test]
fn statement_groups_without_types_sort_by_display_id() {
    let Fixture { db, .. } = fixture();
    let first = string_property(&db);
    let second = string_property(&db);
    let thing = db.create_item().unwrap();
    db.add_statement(&thing.entity(), &second, SnakValue::SomeValue, Rank::Normal)
        .unwrap();
    db.add_statement(&thing.entity(), &first, SnakValue::SomeValue, Rank::Normal)
        .unwrap();
    let groups = db.ordered_statement_groups(&thing).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].property, first);
    assert_eq!(groups[1].property, second);
}
