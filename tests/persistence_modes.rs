use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use wikibase::database::{Database, PersistenceMode};
use wikibase::mapping::EARTH;
use wikibase::settings::Settings;

fn temp_path(name: &str) -> String {
    let path = std::env::temp_dir().join(format!("{}_{}.db", name, std::process::id()));
    let path = path.to_string_lossy().to_string();
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn in_memory_mode_allows_basic_operations() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    let item = db.create_item().unwrap();
    db.set_label(&item.entity(), "en", "Athens").unwrap();
    assert_eq!(db.items().unwrap(), vec![item]);
    assert!(matches!(PersistenceMode::from_location(":memory:"), PersistenceMode::InMemory));
    assert!(matches!(PersistenceMode::from_location(""), PersistenceMode::InMemory));
}

#[test]
fn file_mode_survives_a_reopen() {
    let path = temp_path("wikibase_reopen");
    {
        let db = Database::new(PersistenceMode::File(path.clone())).expect("db");
        db.bootstrap().unwrap();
        let athens = db.create_item().unwrap();
        db.set_label(&athens.entity(), "fr", "Athènes").unwrap();
        db.item_mapping().register("athens", &athens).unwrap();
    }
    let db = Database::new(PersistenceMode::File(path.clone())).expect("db");
    let athens = db.item_mapping().get("athens").unwrap();
    assert_eq!(
        db.get_label(&athens.entity(), "fr").unwrap().as_deref(),
        Some("Athènes")
    );
    assert!(db.item_mapping().has(EARTH));
    // display ids continue where the previous session stopped
    assert_eq!(db.create_item().unwrap().display_id(), athens.display_id() + 1);
    drop(db);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn settings_open_and_bootstrap_the_store() {
    let path = temp_path("wikibase_settings");
    let settings = Settings {
        database: path.clone(),
        ..Settings::default()
    };
    let db = Database::from_settings(&settings).expect("db");
    assert!(db.property_mapping().has("is_a"));
    drop(db);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn concurrent_creations_get_distinct_display_ids() {
    let db = Arc::new(Database::new(PersistenceMode::InMemory).expect("db"));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                (0..25)
                    .map(|_| db.create_item().unwrap().display_id())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut seen = HashSet::new();
    for handle in handles {
        for display_id in handle.join().unwrap() {
            assert!(seen.insert(display_id), "Q{} handed out twice", display_id);
        }
    }
    assert_eq!(seen.len(), 100);
    assert_eq!(seen.iter().max(), Some(&100));
}
