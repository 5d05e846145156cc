use std::hint::black_box;
use std::sync::Arc;

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fraudlens::{Caller, SearchPipeline, SearchQuery};
use masking::{
    fields, mask_email, mask_iban, mask_name, mask_phone, DeterministicHasher, DisclosureEngine,
    FieldValue, MappingTable, Role,
};
use matcher::fuzzy_score;
use store::{InMemoryStore, Perpetrator, ReportRecord};

const SALT: &str = "3f9a1c7e5b2d8f4a6c0e9b1d3f5a7c2e4b6d8f0a1c3e5b7d9f2a4c6e8b0d1f3a";

const FIRST: [&str; 8] = ["john", "maria", "petr", "vladimir", "anna", "jan", "eva", "tomas"];
const LAST: [&str; 8] = ["scammer", "novak", "svoboda", "gala", "horvath", "kovac", "varga", "toth"];

fn name(i: usize) -> String {
    format!("{} {}", FIRST[i % FIRST.len()], LAST[(i / FIRST.len()) % LAST.len()])
}

fn bench_mask_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask_primitives");
    group.bench_function("name", |b| b.iter(|| mask_name(black_box("Vladimir Gala-Novak"))));
    group.bench_function("email", |b| {
        b.iter(|| mask_email(black_box("scammer@example.com")))
    });
    group.bench_function("phone", |b| b.iter(|| mask_phone(black_box("+421 912 345 678"))));
    group.bench_function("iban", |b| {
        b.iter(|| mask_iban(black_box("SK89 1100 0000 0029 4912 9426")))
    });
    group.finish();
}

fn bench_deterministic_masking(c: &mut Criterion) {
    let mut group = c.benchmark_group("deterministic_masking");
    let plain = DisclosureEngine::standard();
    let deterministic = DisclosureEngine::standard().with_deterministic(
        DeterministicHasher::new(SALT).expect("valid salt"),
        Arc::new(MappingTable::new()),
    );
    let emails: Vec<FieldValue> = (0..1000)
        .map(|i| FieldValue::text(format!("user{i}@example.com")))
        .collect();

    group.throughput(Throughput::Elements(emails.len() as u64));
    for (label, engine) in [("plain", &plain), ("deterministic", &deterministic)] {
        group.bench_with_input(BenchmarkId::from_parameter(label), engine, |b, engine| {
            b.iter(|| {
                for email in &emails {
                    black_box(engine.mask_field(fields::SCAMMER_EMAIL, Some(email), Role::Basic));
                }
            })
        });
    }
    group.finish();
}

fn bench_fuzzy_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy_score");
    for size in [100usize, 1000] {
        let names: Vec<String> = (0..size).map(name).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &names, |b, names| {
            b.iter(|| {
                for candidate in names {
                    black_box(fuzzy_score("john scam", [candidate.as_str()], 0.2));
                }
            })
        });
    }
    group.finish();
}

fn bench_pipeline_search(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime");
    let now = Utc::now();
    let records = (0..5000).map(|i| ReportRecord {
        country: Some(if i % 3 == 0 { "CZ" } else { "SK" }.into()),
        perpetrator: Perpetrator {
            full_name: Some(name(i)),
            email: Some(format!("user{i}@example.com")),
            ..Perpetrator::default()
        },
        ..ReportRecord::approved(format!("r-{i}"), "PHISHING", now - Duration::minutes(i as i64))
    });
    let store = InMemoryStore::with_records(records).expect("records load");
    let pipeline = SearchPipeline::in_memory(Arc::new(store));
    let caller = Caller::anonymous();

    let mut group = c.benchmark_group("pipeline_search");
    for (label, text) in [("exact", "user42@example.com"), ("fuzzy", "john scam")] {
        let query = SearchQuery::new(text).expect("valid query");
        group.bench_function(label, |b| {
            b.iter(|| {
                runtime
                    .block_on(pipeline.search(&query, &caller))
                    .expect("search succeeds")
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_mask_primitives,
    bench_deterministic_masking,
    bench_fuzzy_score,
    bench_pipeline_search
);
criterion_main!(benches);
