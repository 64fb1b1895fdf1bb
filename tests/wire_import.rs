use serde_json::json;

use wikibase::construct::{Rank, Value};
use wikibase::database::{Database, PersistenceMode};
use wikibase::datatype::{DataValue, ValueKind};
use wikibase::error::WikibaseError;
use wikibase::import::{EntityDocument, import_entities, import_entity};
use wikibase::mapping::{EARTH, GREGORIAN};
use wikibase::wire::{StatementPayload, StatementUpdate};

fn bootstrapped() -> Database {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    db.bootstrap().unwrap();
    db
}

#[test]
fn coordinates_default_to_earth() {
    let db = bootstrapped();
    let globe = db.datatype("GlobeCoordinatesValue").unwrap();
    let value = db
        .value_from_json(&globe, &json!({"latitude": "37.97", "longitude": 23.72}))
        .unwrap();
    let earth = db.item_mapping().get(EARTH).unwrap();
    match value.as_data() {
        Some(DataValue::GlobeCoordinates(g)) => {
            assert_eq!(g.globe, earth.identity());
            assert_eq!(g.latitude.to_string(), "37.97");
        }
        other => panic!("unexpected value {:?}", other),
    }
    let json = db.value_to_json(&value).unwrap();
    assert_eq!(json["globe"], json!(earth.display_id()));
}

#[test]
fn times_default_to_the_gregorian_calendar_and_day_precision() {
    let db = bootstrapped();
    let time = db.datatype("TimeValue").unwrap();
    let value = db
        .value_from_json(&time, &json!({"time": "-0431-01-01T00:00:00Z"}))
        .unwrap();
    let gregorian = db.item_mapping().get(GREGORIAN).unwrap();
    let json = db.value_to_json(&value).unwrap();
    assert_eq!(json["calendarmodel"], json!(gregorian.display_id()));
    assert_eq!(json["precision"], json!(11));
    assert_eq!(json["timezone"], json!(0));

    let err = db
        .value_from_json(&time, &json!({"time": "431 BC"}))
        .unwrap_err();
    assert!(matches!(err, WikibaseError::InvalidField { field: "time", .. }));
}

#[test]
fn values_may_arrive_wrapped_or_bare() {
    let db = bootstrapped();
    let string = db.datatype("StringValue").unwrap();
    let wrapped = db
        .value_from_json(&string, &json!({"value": "Parthenon"}))
        .unwrap();
    let quantity = db.datatype("QuantityValue").unwrap();
    let counted = db
        .value_from_json(&quantity, &json!({"number": "46", "unit": "earth"}))
        .unwrap();
    assert_eq!(db.value_to_json(&wrapped).unwrap(), json!({"value": "Parthenon"}));
    let json = db.value_to_json(&counted).unwrap();
    assert_eq!(json["number"], json!(46.0));
    assert_eq!(json["unit"], json!(1));
    assert_eq!(db.count_kind(ValueKind::Quantity).unwrap(), 1);
}

#[test]
fn entity_values_resolve_instead_of_being_stored() {
    let db = bootstrapped();
    let item = db.datatype("Item").unwrap();
    let athens = db.create_item().unwrap();
    let by_id = db
        .value_from_json(&item, &json!({"item": athens.display_id()}))
        .unwrap();
    assert_eq!(by_id, athens.value());
    let by_key = db.value_from_json(&item, &json!({"item": "earth"})).unwrap();
    assert!(matches!(by_key, Value::Entity(_)));
    let missing = db.value_from_json(&item, &json!({"item": 99})).unwrap_err();
    assert!(matches!(missing, WikibaseError::NotFound(_)));
}

#[test]
fn statements_serialize_with_qualifiers_and_references() {
    let db = bootstrapped();
    let string = db.datatype("StringValue").unwrap();
    let name = db.create_property(&string).unwrap();
    let athens = db.create_item().unwrap();
    let payload: StatementPayload = serde_json::from_value(json!({
        "property": name.display_id(),
        "snaktype": "value",
        "value": {"value": "Athenai"},
        "rank": 1,
        "qualifiers": [{"property": "is_a", "snaktype": "somevalue"}],
        "references": [[{"property": name.display_id(), "value": "Thucydides"}]],
    }))
    .unwrap();
    let statement = db.add_statement_from_json(&athens.entity(), &payload).unwrap();
    assert_eq!(statement.rank(), Rank::Preferred);

    let json = db.statement_to_json(&statement).unwrap();
    assert_eq!(json["subject"], json!(athens.to_string()));
    assert_eq!(json["rank"], json!(1));
    assert_eq!(json["mainsnak"]["snaktype"], json!("value"));
    assert_eq!(json["mainsnak"]["value"]["value"], json!("Athenai"));
    assert_eq!(json["qualifiers"][0]["snaktype"], json!("somevalue"));
    assert!(json["qualifiers"][0].get("value").is_none());
    assert_eq!(json["references"][0][0]["value"]["value"], json!("Thucydides"));
}

#[test]
fn novalue_snaks_cannot_carry_a_value() {
    let db = bootstrapped();
    let string = db.datatype("StringValue").unwrap();
    let name = db.create_property(&string).unwrap();
    let athens = db.create_item().unwrap();
    let payload: StatementPayload = serde_json::from_value(json!({
        "property": name.display_id(),
        "snaktype": 2,
        "value": {"value": "Athenai"},
    }))
    .unwrap();
    let err = db
        .add_statement_from_json(&athens.entity(), &payload)
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(db.count_statements().unwrap(), 0);
}

#[test]
fn statements_update_from_json() {
    let db = bootstrapped();
    let string = db.datatype("StringValue").unwrap();
    let name = db.create_property(&string).unwrap();
    let athens = db.create_item().unwrap();
    let payload: StatementPayload = serde_json::from_value(json!({
        "property": name.display_id(),
        "value": "Athenai",
    }))
    .unwrap();
    let statement = db.add_statement_from_json(&athens.entity(), &payload).unwrap();
    let update: StatementUpdate =
        serde_json::from_value(json!({"snaktype": "novalue", "rank": -1})).unwrap();
    let updated = db.update_statement_from_json(&statement, &update).unwrap();
    assert_eq!(updated.identity(), statement.identity());
    assert_eq!(updated.rank(), Rank::Deprecated);
    assert!(updated.mainsnak().value().is_none());
    assert_eq!(db.count_kind(ValueKind::String).unwrap(), 0);
}

#[test]
fn imports_register_keys_and_terms() {
    let db = bootstrapped();
    let documents = EntityDocument::parse_all(
        r#"{
            "key": "athens",
            "labels": {"en": "Athens", "fr": "Athènes"},
            "descriptions": {"en": "capital of Greece"},
            "aliases": {"en": ["Athenae", "Athenai"]},
            "statements": [{"property": "is_a", "value": {"item": "earth"}}]
        }"#,
    )
    .unwrap();
    let items = import_entities(&db, &documents).unwrap();
    let athens = db.item_mapping().get("athens").unwrap();
    assert_eq!(items, vec![athens.clone()]);
    assert_eq!(db.get_labels(&athens.entity()).unwrap().len(), 2);
    assert_eq!(db.get_aliases(&athens.entity()).unwrap().len(), 2);
    assert_eq!(db.statements_of(&athens.entity()).unwrap().len(), 1);
}

#[test]
fn failed_imports_leave_nothing_behind() {
    let db = bootstrapped();
    let items_before = db.items().unwrap().len();
    let document: EntityDocument = serde_json::from_value(json!({
        "key": "sparta",
        "labels": {"en": "Sparta"},
        "statements": [
            {"property": "is_a", "value": {"item": "earth"}},
            {"property": "is_a", "value": {"item": "atlantis"}}
        ]
    }))
    .unwrap();
    let err = import_entity(&db, &document).unwrap_err();
    assert!(matches!(err, WikibaseError::UnknownMapping(key) if key == "atlantis"));
    assert_eq!(db.items().unwrap().len(), items_before);
    assert!(db.search_items("Sparta").unwrap().is_empty());
    assert!(!db.item_mapping().has("sparta"));
    assert_eq!(db.count_statements().unwrap(), 0);
}
