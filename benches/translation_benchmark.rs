use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hotel_booking_client::i18n::{format_number, Language, LanguageStateStore, TranslationCatalog};
use hotel_booking_client::price_filter::{PriceFilter, PriceFilterConfig, SpreadPolicy, Thumb};
use hotel_booking_client::storage::Storage;
use hotel_booking_client::view::Document;
use rand::{thread_rng, Rng};
use serde_json::json;

// Catalog with `sections` top-level sections of 20 keys each
fn catalog(sections: usize) -> TranslationCatalog {
    let mut tree = serde_json::Map::new();
    for s in 0..sections {
        let keys: serde_json::Map<String, serde_json::Value> = (0..20)
            .map(|k| (format!("key{}", k), json!(format!("Text {} {}", s, k))))
            .collect();
        tree.insert(format!("section{}", s), serde_json::Value::Object(keys));
    }
    let tree = serde_json::Value::Object(tree);
    TranslationCatalog::from_value(json!({ "en": tree.clone(), "ar": tree }))
}

pub fn translation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("translation_lookup");

    for sections in [10, 100, 1000].iter() {
        let catalog = catalog(*sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), sections, |b, &sections| {
            let mut rng = thread_rng();
            b.iter(|| {
                let key = format!("section{}.key{}", rng.gen_range(0..sections), rng.gen_range(0..20));
                black_box(catalog.lookup(Language::Ar, &key));
            });
        });
    }
    group.finish();

    // Re-rendering a page worth of bindings on language toggle
    c.bench_function("toggle_language_200_bindings", |b| {
        let mut store = LanguageStateStore::new(Storage::in_memory(), Language::En);
        store.set_catalog(catalog(10));
        let mut doc = Document::new();
        for i in 0..200 {
            doc.bind_text(&format!("el{}", i), &format!("section{}.key{}", i % 10, i % 20));
        }
        b.iter(|| black_box(store.toggle_language(&mut doc)));
    });

    c.bench_function("format_number_ar", |b| {
        b.iter(|| black_box(format_number(Language::Ar, black_box(1234567.891))));
    });
}

pub fn price_filter_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_filter_drag");

    for policy in [SpreadPolicy::ClampMoved, SpreadPolicy::PushOther] {
        group.bench_function(format!("{:?}", policy), |b| {
            let mut filter = PriceFilter::new(PriceFilterConfig {
                policy,
                ..PriceFilterConfig::default()
            });
            let mut rng = thread_rng();
            b.iter(|| {
                let thumb = if rng.gen_bool(0.5) { Thumb::Min } else { Thumb::Max };
                black_box(filter.drag_to(thumb, rng.gen::<f64>()));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, translation_benchmark, price_filter_benchmark);
criterion_main!(benches);
