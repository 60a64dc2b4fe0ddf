//! Benchmarks for the recommendation pass
//!
//! Run with: cargo bench --package pipeline

use chrono::{NaiveDate, TimeDelta, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flight_data::{CandidateFlight, DestinationIndex, Season};
use pipeline::RecommendationEngine;
use preferences::{analysis, FeedbackKind, SearchEvent, UserPreferences};
use std::sync::Arc;

const CODES: [&str; 12] = [
    "CDG", "NCE", "FCO", "MXP", "BCN", "AMS", "PRG", "VIE", "LIS", "ZZZ", "DUB", "ATH",
];

fn build_candidates(count: usize) -> Vec<CandidateFlight> {
    let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    (0..count)
        .map(|i| {
            CandidateFlight::new(
                format!("bench-{}", i),
                "LHR",
                CODES[i % CODES.len()],
                80.0 + (i % 40) as f64 * 7.5,
                start + TimeDelta::days((i % 120) as i64),
            )
        })
        .collect()
}

fn build_preferences(index: &DestinationIndex) -> UserPreferences {
    let mut prefs = UserPreferences::new();
    let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    for (i, code) in CODES.iter().take(8).enumerate() {
        prefs.push_click(code, Utc::now());
        prefs.push_search(
            SearchEvent::new("LHR", "search")
                .with_destination(code)
                .with_price(100.0 + i as f64 * 25.0)
                .with_departure_date(date),
        );
    }
    prefs.apply_feedback("FCO", FeedbackKind::Like);
    prefs.apply_feedback("PRG", FeedbackKind::Dislike);
    let derived = analysis::derive(&prefs, index);
    prefs.set_derived(derived);
    prefs
}

fn bench_recommend(c: &mut Criterion) {
    let index = Arc::new(DestinationIndex::builtin());
    let engine = RecommendationEngine::new(index.clone());
    let prefs = build_preferences(&index);
    let candidates = build_candidates(200);

    c.bench_function("recommend_200_candidates", |b| {
        b.iter(|| {
            let ranked = engine
                .recommend(black_box(candidates.clone()), black_box(&prefs), Season::Summer)
                .unwrap();
            black_box(ranked)
        })
    });
}

fn bench_derive_preferences(c: &mut Criterion) {
    let index = DestinationIndex::builtin();
    let prefs = build_preferences(&index);

    c.bench_function("derive_preferences", |b| {
        b.iter(|| black_box(analysis::derive(black_box(&prefs), &index)))
    });
}

criterion_group!(benches, bench_recommend, bench_derive_preferences);
criterion_main!(benches);
