use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use wikibase::construct::{Rank, SnakValue};
use wikibase::database::{Database, PersistenceMode};
use wikibase::datatype::{QuantityValue, StringValue};

fn create_items(c: &mut Criterion) {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    c.bench_function("create labelled item", |b| {
        b.iter(|| {
            let item = db.create_item().unwrap();
            db.set_label(&item.entity(), "en", black_box("Athens")).unwrap();
            item
        })
    });
}

fn attach_statements(c: &mut Criterion) {
    let db = Database::new(PersistenceMode::InMemory).unwrap();
    db.bootstrap().unwrap();
    let quantity = db.datatype("QuantityValue").unwrap();
    let string = db.datatype("StringValue").unwrap();
    let population = db.create_property(&quantity).unwrap();
    let name = db.create_property(&string).unwrap();
    let athens = db.create_item().unwrap().entity();
    c.bench_function("attach quantity statement", |b| {
        b.iter(|| {
            let value = db
                .store_value(QuantityValue::new(black_box(664_046.0)).into())
                .unwrap();
            db.add_value(&athens, &population, &value.value(), Rank::Normal)
                .unwrap()
        })
    });
    c.bench_function("attach qualified statement", |b| {
        b.iter(|| {
            let value = db.store_value(StringValue::new("Athenai").into()).unwrap();
            let statement = db
                .add_value(&athens, &name, &value.value(), Rank::Normal)
                .unwrap();
            db.add_qualifier(&statement, &name, SnakValue::SomeValue)
                .unwrap()
        })
    });
    c.bench_function("ordered statement groups", |b| {
        let item = athens.as_item().cloned().unwrap();
        b.iter(|| db.ordered_statement_groups(black_box(&item)).unwrap())
    });
}

criterion_group!(benches, create_items, attach_statements);
criterion_main!(benches);
