use criterion::{criterion_group, criterion_main, Criterion};
use sel_core::Trainer;
use sel_data::{assemble, generate_toys, AssemblyOpts, ToySpec, FEATURE_COLUMNS};
use sel_nn::{NeuralTrainer, NetworkSpec, TrainingOpts};

fn bench_training(c: &mut Criterion) {
    let toys = generate_toys(&ToySpec {
        background_events: 2000,
        simulation_events: 2000,
        region_signal_events: 100,
        region_background_events: 100,
        ..ToySpec::default()
    })
    .expect("toys");
    let opts = AssemblyOpts {
        features: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        split_fraction: 0.8,
        mass_column: "B0_MM".into(),
        baseline_column: None,
    };
    let data = assemble(&toys.background, &toys.simulation, &toys.signal_region, &opts)
        .expect("assemble");
    let trainer = NeuralTrainer::new(
        NetworkSpec::default(),
        TrainingOpts {
            epochs: 1,
            ..TrainingOpts::default()
        },
    );

    c.bench_function("train_one_epoch_3200_rows", |b| {
        b.iter(|| trainer.train(&data.training).expect("train"));
    });
}

criterion_group!(benches, bench_training);
criterion_main!(benches);
