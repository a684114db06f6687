use proptest::prelude::*;
use sel_core::Label;
use sel_data::{assemble, split_counts, AssemblyOpts, RecordSet};

fn labelled(name: &str, values: &[f64]) -> RecordSet {
    RecordSet::new(
        name,
        vec![
            ("x".into(), values.to_vec()),
            ("B0_MM".into(), vec![5280.0; values.len()]),
        ],
    )
    .unwrap()
}

fn opts(fraction: f64) -> AssemblyOpts {
    AssemblyOpts {
        features: vec!["x".into()],
        split_fraction: fraction,
        mass_column: "B0_MM".into(),
        baseline_column: None,
    }
}

proptest! {
    #[test]
    fn split_is_complete(rows in 1usize..5000, fraction in 0.01f64..0.99) {
        let counts = split_counts(rows, fraction).unwrap();
        prop_assert_eq!(counts.training + counts.evaluation, rows);
        prop_assert_eq!(counts.training, (fraction * rows as f64).floor() as usize);
    }

    #[test]
    fn labels_follow_the_source(
        bkg in prop::collection::vec(-1e3f64..1e3, 1..60),
        sim in prop::collection::vec(-1e3f64..1e3, 1..60),
        fraction in 0.05f64..0.95,
    ) {
        let data = assemble(
            &labelled("background", &bkg),
            &labelled("simulation", &sim),
            &labelled("signal_region", &sim),
            &opts(fraction),
        ).unwrap();
        let bkg_train = data.background_split.training;
        prop_assert!(data.training.labels[..bkg_train].iter().all(|l| *l == Label::Background));
        prop_assert!(data.training.labels[bkg_train..].iter().all(|l| *l == Label::Signal));
        let bkg_eval = data.background_split.evaluation;
        prop_assert!(data.evaluation.labels[..bkg_eval].iter().all(|l| *l == Label::Background));
        prop_assert!(data.evaluation.labels[bkg_eval..].iter().all(|l| *l == Label::Signal));
        prop_assert_eq!(data.training.len() + data.evaluation.len(), bkg.len() + sim.len());
    }

    #[test]
    fn reversing_rows_keeps_labels(values in prop::collection::vec(-1e3f64..1e3, 2..40)) {
        let mut reversed = values.clone();
        reversed.reverse();
        let forward = assemble(
            &labelled("background", &values),
            &labelled("simulation", &values),
            &labelled("signal_region", &values),
            &opts(0.8),
        ).unwrap();
        let backward = assemble(
            &labelled("background", &reversed),
            &labelled("simulation", &reversed),
            &labelled("signal_region", &reversed),
            &opts(0.8),
        ).unwrap();
        prop_assert_eq!(forward.training.labels, backward.training.labels);
        prop_assert_eq!(forward.evaluation.labels, backward.evaluation.labels);
    }
}
