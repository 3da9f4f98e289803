use criterion::{criterion_group, criterion_main, Criterion};
use sift_core::retrieval::{intersect, positional_intersect};
use sift_core::{EngineBuilder, EngineConfig, PostingsEntry, PostingsList, Query, QueryType, RankingType};

fn strided(step: u32, n: u32) -> PostingsList {
    (0..n)
        .map(|i| PostingsEntry::with_positions(i * step, [i % 7, i % 7 + 1, 40]))
        .collect()
}

fn bench_intersect(c: &mut Criterion) {
    let a = strided(2, 50_000);
    let b = strided(3, 50_000);
    c.bench_function("intersect_50k", |bch| bch.iter(|| intersect(&a, &b)));
    c.bench_function("positional_intersect_50k", |bch| bch.iter(|| positional_intersect(&a, &b)));
}

fn bench_tf_idf(c: &mut Criterion) {
    let mut builder = EngineBuilder::new(EngineConfig::default()).expect("default config");
    let words = ["zombie", "attack", "davis", "campus", "library", "bike", "coffee", "student"];
    for d in 0..2_000usize {
        let text: Vec<&str> = (0..60).map(|i| words[(d * 7 + i * 3) % words.len()]).collect();
        builder.add_text(&format!("corpus/{d}.f"), &text.join(" ")).expect("index doc");
    }
    let engine = builder.build();
    let query = Query::parse("zombie attack library");
    c.bench_function("tf_idf_2k_docs", |bch| {
        bch.iter(|| engine.search(&query, QueryType::Ranked, RankingType::TfIdf))
    });
}

criterion_group!(benches, bench_intersect, bench_tf_idf);
criterion_main!(benches);
