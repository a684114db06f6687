use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sel_core::Label;
use sel_roc::RocCurve;

fn bench_roc(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let labels: Vec<Label> = (0..20_000)
        .map(|idx| if idx % 2 == 0 { Label::Signal } else { Label::Background })
        .collect();
    let scores: Vec<f64> = labels
        .iter()
        .map(|label| {
            let shift = if label.is_signal() { 0.2 } else { 0.0 };
            (rng.gen::<f64>() * 0.8 + shift).min(1.0)
        })
        .collect();

    c.bench_function("roc_20k_rows", |b| {
        b.iter(|| {
            let curve = RocCurve::from_scores(&scores, &labels).expect("curve");
            curve.auc()
        });
    });
}

criterion_group!(benches, bench_roc);
criterion_main!(benches);
