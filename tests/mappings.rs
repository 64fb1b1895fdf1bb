use wikibase::construct::{Item, Property};
use wikibase::database::{Database, PersistenceMode};
use wikibase::error::WikibaseError;
use wikibase::mapping::{EARTH, GREGORIAN, IS_A};

fn db() -> Database {
    Database::new(PersistenceMode::InMemory).unwrap()
}

#[test]
fn unknown_keys_fail_on_get_but_not_on_has() {
    let db = db();
    let err = db.item_mapping().get("nonexistent").unwrap_err();
    assert!(matches!(err, WikibaseError::UnknownMapping(key) if key == "nonexistent"));
    assert!(!db.item_mapping().has("nonexistent"));
    assert!(!db.property_mapping().has("nonexistent"));
}

#[test]
fn registered_keys_resolve_both_ways() {
    let db = db();
    let document = db.create_item().unwrap();
    db.item_mapping().register("document", &document).unwrap();
    assert!(db.item_mapping().has("document"));
    assert_eq!(db.item_mapping().get("document").unwrap(), document);
    assert_eq!(
        db.item_mapping().key_of(&document).as_deref(),
        Some("document")
    );
    // registering the same pair again changes nothing
    db.item_mapping().register("document", &document).unwrap();
}

#[test]
fn mappings_stay_bijective() {
    let db = db();
    let first = db.create_item().unwrap();
    let second = db.create_item().unwrap();
    db.item_mapping().register("document", &first).unwrap();

    let taken_key = db.item_mapping().register("document", &second).unwrap_err();
    assert!(matches!(taken_key, WikibaseError::Validation(_)));
    let taken_item = db.item_mapping().register("text", &first).unwrap_err();
    assert!(matches!(taken_item, WikibaseError::Validation(_)));
    assert!(!db.item_mapping().has("text"));
    assert_eq!(db.item_mapping().get("document").unwrap(), first);
}

#[test]
fn item_and_property_keys_are_separate() {
    let db = db();
    let string = db.datatype("StringValue").unwrap();
    let item = db.create_item().unwrap();
    let property = db.create_property(&string).unwrap();
    db.item_mapping().register("name", &item).unwrap();
    db.property_mapping().register("name", &property).unwrap();
    assert_eq!(db.item_mapping().get("name").unwrap(), item);
    assert_eq!(db.property_mapping().get("name").unwrap(), property);
}

#[test]
fn unregister_frees_key_and_entity() {
    let db = db();
    let item = db.create_item().unwrap();
    db.item_mapping().register("document", &item).unwrap();
    assert!(matches!(
        db.delete_entity(&item.entity()),
        Err(WikibaseError::ProtectedReference(_))
    ));
    db.item_mapping().unregister("document").unwrap();
    assert!(!db.item_mapping().has("document"));
    assert!(matches!(
        db.item_mapping().unregister("document"),
        Err(WikibaseError::UnknownMapping(_))
    ));
    db.delete_entity(&item.entity()).unwrap();
}

#[test]
fn failed_registrations_leave_the_keeper_untouched() {
    let db = db();
    let item = db.create_item().unwrap();
    let result: wikibase::error::Result<()> = db.transact(|work| {
        work.register("document", &item)?;
        assert!(work.has_mapping::<Item>("document")?);
        Err(WikibaseError::Validation("abandoned".to_string()))
    });
    assert!(result.is_err());
    assert!(!db.item_mapping().has("document"));
    assert!(db.read(|work| work.has_mapping::<Item>("document")).is_ok_and(|has| !has));
}

#[test]
fn bootstrap_registers_the_default_ontology_once() {
    let db = db();
    db.bootstrap().unwrap();
    let is_a: Property = db.property_mapping().get(IS_A).unwrap();
    assert_eq!(is_a.datatype().class_name(), "Item");
    assert_eq!(db.get_label(&is_a.entity(), "en").unwrap().as_deref(), Some("is a"));
    let earth: Item = db.item_mapping().get(EARTH).unwrap();
    assert!(db.item_mapping().has(GREGORIAN));

    db.bootstrap().unwrap();
    assert_eq!(db.properties().unwrap().len(), 1);
    assert_eq!(db.items().unwrap().len(), 2);
    assert_eq!(db.item_mapping().get(EARTH).unwrap(), earth);
}
