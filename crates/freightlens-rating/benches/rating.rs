//! Rating hot-path benchmarks
//!
//! The rating functions run once per shipment per carrier inside the rerate
//! pipeline, so they dominate a pass over a large audit run.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use freightlens_rating::algorithms::{best_carrier, rate_hundredweight, rate_skid};
use freightlens_rating::WeightBreak;

fn standard_breaks() -> Vec<WeightBreak> {
    vec![
        WeightBreak {
            start: dec!(0),
            end: Some(dec!(500)),
            rate_per_cwt: dec!(20),
        },
        WeightBreak {
            start: dec!(500),
            end: Some(dec!(1000)),
            rate_per_cwt: dec!(18),
        },
        WeightBreak {
            start: dec!(1000),
            end: Some(dec!(2000)),
            rate_per_cwt: dec!(16),
        },
        WeightBreak {
            start: dec!(2000),
            end: Some(dec!(5000)),
            rate_per_cwt: dec!(14),
        },
        WeightBreak {
            start: dec!(5000),
            end: Some(dec!(10000)),
            rate_per_cwt: dec!(12),
        },
        WeightBreak {
            start: dec!(10000),
            end: None,
            rate_per_cwt: dec!(10),
        },
    ]
}

fn bench_hundredweight(c: &mut Criterion) {
    let breaks = standard_breaks();
    let mut group = c.benchmark_group("rate_hundredweight");

    for weight in [50u32, 750, 4800, 12000] {
        group.bench_with_input(BenchmarkId::from_parameter(weight), &weight, |b, &w| {
            b.iter(|| {
                rate_hundredweight(
                    black_box(Some(Decimal::from(w))),
                    black_box(&breaks),
                    black_box(dec!(45)),
                )
            });
        });
    }

    group.finish();
}

fn bench_skid(c: &mut Criterion) {
    let spots: BTreeMap<u32, Decimal> = (1..=26u32)
        .map(|n| (n, Decimal::from(60 + 90 * n)))
        .collect();

    c.bench_function("rate_skid", |b| {
        b.iter(|| {
            rate_skid(
                black_box(Some(dec!(2.3))),
                black_box(Some(dec!(4000))),
                black_box(&spots),
                black_box(dec!(2000)),
            )
        });
    });
}

fn bench_best_carrier(c: &mut Criterion) {
    let charges: BTreeMap<String, Decimal> = [
        ("APPS", dec!(382.50)),
        ("Rosedale", dec!(220.32)),
        ("Maritime Ontario", dec!(244.80)),
        ("Kindersley", dec!(301.17)),
        ("Gardewine", dec!(220.32)),
        ("Day & Ross", dec!(512.40)),
    ]
    .into_iter()
    .map(|(name, charge)| (name.to_string(), charge))
    .collect();

    c.bench_function("best_carrier", |b| {
        b.iter(|| best_carrier(black_box(&charges)));
    });
}

criterion_group!(benches, bench_hundredweight, bench_skid, bench_best_carrier);
criterion_main!(benches);
