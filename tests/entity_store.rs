use wikibase::construct::{EntityKind, Rank};
use wikibase::database::{Database, PersistenceMode};
use wikibase::datatype::{QuantityValue, ValueKind};
use wikibase::error::WikibaseError;

fn db() -> Database {
    Database::new(PersistenceMode::InMemory).unwrap()
}

#[test]
fn display_ids_count_per_kind() {
    let db = db();
    let quantity = db.datatype("QuantityValue").unwrap();
    let i1 = db.create_item().unwrap();
    let p1 = db.create_property(&quantity).unwrap();
    let i2 = db.create_item().unwrap();
    assert_eq!(i1.display_id(), 1);
    assert_eq!(p1.display_id(), 1);
    assert_eq!(i2.display_id(), 2);
    assert_eq!(i2.to_string(), "Q2");
    assert_eq!(p1.to_string(), "P1");
    assert_ne!(i1.identity(), p1.identity());
}

#[test]
fn display_ids_continue_from_the_largest() {
    let db = db();
    let items: Vec<_> = (0..3).map(|_| db.create_item().unwrap()).collect();
    db.delete_entity(&items[1].entity()).unwrap();
    let next = db.create_item().unwrap();
    assert_eq!(next.display_id(), 4);
    db.delete_entity(&next.entity()).unwrap();
    assert_eq!(db.create_item().unwrap().display_id(), 4);
}

#[test]
fn set_label_replaces_text_in_the_same_language() {
    let db = db();
    let e = db.create_item().unwrap().entity();
    db.set_label(&e, "fr", "A").unwrap();
    db.set_label(&e, "fr", "B").unwrap();
    assert_eq!(db.get_label(&e, "fr").unwrap().as_deref(), Some("B"));
    assert_eq!(db.get_labels(&e).unwrap().len(), 1);
    db.set_label(&e, "en", "C").unwrap();
    assert_eq!(db.get_labels(&e).unwrap().len(), 2);
    assert_eq!(db.get_label(&e, "de").unwrap(), None);
}

#[test]
fn second_label_through_create_is_refused() {
    let db = db();
    let e = db.create_item().unwrap().entity();
    db.create_label(&e, "fr", "Athènes").unwrap();
    let err = db.create_label(&e, "fr", "Athenai").unwrap_err();
    assert!(matches!(err, WikibaseError::Validation(_)));
    assert!(err.is_validation());
    assert_eq!(db.get_label(&e, "fr").unwrap().as_deref(), Some("Athènes"));
}

#[test]
fn descriptions_follow_the_label_rules() {
    let db = db();
    let e = db.create_item().unwrap().entity();
    db.set_description(&e, "en", "capital of Greece").unwrap();
    db.set_description(&e, "en", "city in Attica").unwrap();
    assert_eq!(
        db.get_description(&e, "en").unwrap().as_deref(),
        Some("city in Attica")
    );
    assert!(db.create_description(&e, "en", "again").is_err());
    assert_eq!(db.get_descriptions(&e).unwrap().len(), 1);
}

#[test]
fn aliases_allow_many_per_language() {
    let db = db();
    let e = db.create_item().unwrap().entity();
    db.add_alias(&e, "en", "Athenae").unwrap();
    db.add_alias(&e, "en", "Athenai").unwrap();
    let aliases = db.get_aliases(&e).unwrap();
    assert_eq!(aliases.len(), 2);
    assert!(aliases.iter().all(|a| a.language() == "en"));
}

#[test]
fn malformed_language_codes_are_refused() {
    let db = db();
    let e = db.create_item().unwrap().entity();
    let err = db.set_label(&e, "French", "Athènes").unwrap_err();
    assert!(matches!(err, WikibaseError::InvalidField { field: "language", .. }));
}

#[test]
fn entities_are_found_by_display_id_and_label() {
    let db = db();
    let string = db.datatype("StringValue").unwrap();
    let athens = db.create_item().unwrap();
    let sparta = db.create_item().unwrap();
    let name = db.create_property(&string).unwrap();
    db.set_label(&athens.entity(), "en", "Athens").unwrap();
    db.set_label(&sparta.entity(), "en", "Sparta").unwrap();
    db.set_label(&name.entity(), "en", "ancient name").unwrap();

    assert_eq!(db.get_item(2).unwrap(), Some(sparta.clone()));
    assert_eq!(db.get_item(3).unwrap(), None);
    assert_eq!(db.get_property(1).unwrap(), Some(name.clone()));
    assert_eq!(db.items().unwrap(), vec![athens.clone(), sparta.clone()]);
    assert_eq!(db.properties().unwrap(), vec![name.clone()]);
    assert_eq!(db.search_items("Spar").unwrap(), vec![sparta]);
    assert_eq!(db.search_properties("name").unwrap(), vec![name]);
    assert!(db.search_items("Rome").unwrap().is_empty());

    let entity = db.entity(athens.identity()).unwrap().unwrap();
    assert_eq!(entity.kind(), EntityKind::Item);
    assert_eq!(entity.as_item(), Some(&athens));
}

#[test]
fn unknown_datatypes_are_refused() {
    let db = db();
    let err = db.datatype("UserValue").unwrap_err();
    assert!(matches!(err, WikibaseError::UnknownDatatype(name) if name == "UserValue"));
    let quantity = db.create_datatype("QuantityValue").unwrap();
    assert_eq!(quantity.kind(), ValueKind::Quantity);
}

#[test]
fn datatypes_in_use_cannot_be_deleted() {
    let db = db();
    let url = db.datatype("UrlValue").unwrap();
    db.create_property(&url).unwrap();
    let err = db.delete_datatype(&url).unwrap_err();
    assert!(matches!(err, WikibaseError::ProtectedReference(_)));
    assert!(db.datatype("UrlValue").is_ok());

    let mono = db.datatype("MonolingualTextValue").unwrap();
    db.delete_datatype(&mono).unwrap();
    assert!(matches!(
        db.datatype("MonolingualTextValue"),
        Err(WikibaseError::UnknownDatatype(_))
    ));
    assert!(db.create_property(&mono).is_err());
    // a deleted datatype can be recreated, an existing one is left alone
    db.create_datatype("MonolingualTextValue").unwrap();
    db.create_datatype("MonolingualTextValue").unwrap();
    assert!(db.create_property(&mono).is_ok());
}

#[test]
fn referenced_entities_cannot_be_deleted() {
    let db = db();
    let item = db.datatype("Item").unwrap();
    let located_in = db.create_property(&item).unwrap();
    let athens = db.create_item().unwrap();
    let attica = db.create_item().unwrap();
    db.set_label(&attica.entity(), "en", "Attica").unwrap();
    db.add_value(&athens.entity(), &located_in, &attica.value(), Rank::Normal)
        .unwrap();

    let err = db.delete_entity(&attica.entity()).unwrap_err();
    assert!(matches!(err, WikibaseError::ProtectedReference(_)));
    assert!(db.get_item(attica.display_id()).unwrap().is_some());
    assert_eq!(db.get_label(&attica.entity(), "en").unwrap().as_deref(), Some("Attica"));

    // the property is referenced by the statement's snak as well
    assert!(db.delete_entity(&located_in.entity()).is_err());

    // deleting the subject releases its own statements first
    db.delete_entity(&athens.entity()).unwrap();
    assert_eq!(db.count_statements().unwrap(), 0);
    assert_eq!(db.count_snaks().unwrap(), 0);
    db.delete_entity(&attica.entity()).unwrap();
    assert!(db.items().unwrap().is_empty());
}

#[test]
fn units_protect_their_item() {
    let db = db();
    let metre = db.create_item().unwrap();
    let value = db
        .store_value(QuantityValue::new(12.0).with_unit(&metre).into())
        .unwrap();
    assert!(matches!(
        db.delete_entity(&metre.entity()),
        Err(WikibaseError::ProtectedReference(_))
    ));
    db.delete_value(&value).unwrap();
    db.delete_entity(&metre.entity()).unwrap();
}
