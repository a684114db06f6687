use proptest::prelude::*;
use sel_core::Label;
use sel_roc::{cut_roc, Orientation, RocCurve};

fn labelled_scores() -> impl Strategy<Value = (Vec<f64>, Vec<Label>)> {
    prop::collection::vec((0.0f64..1.0, any::<bool>()), 2..200)
        .prop_filter("needs both classes", |pairs| {
            pairs.iter().any(|(_, s)| *s) && pairs.iter().any(|(_, s)| !*s)
        })
        .prop_map(|pairs| {
            let scores = pairs.iter().map(|(score, _)| *score).collect();
            let labels = pairs
                .iter()
                .map(|(_, signal)| if *signal { Label::Signal } else { Label::Background })
                .collect();
            (scores, labels)
        })
}

proptest! {
    #[test]
    fn curve_is_monotone_with_fixed_endpoints((scores, labels) in labelled_scores()) {
        let curve = RocCurve::from_scores(&scores, &labels).unwrap();
        let first = curve.points.first().unwrap();
        let last = curve.points.last().unwrap();
        prop_assert_eq!((first.fpr, first.tpr), (0.0, 0.0));
        prop_assert_eq!((last.fpr, last.tpr), (1.0, 1.0));
        for pair in curve.points.windows(2) {
            prop_assert!(pair[1].fpr >= pair[0].fpr);
            prop_assert!(pair[1].tpr >= pair[0].tpr);
        }
        let thresholds: Vec<f64> = curve.points.iter().filter_map(|p| p.threshold).collect();
        prop_assert!(thresholds.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn auc_is_bounded((scores, labels) in labelled_scores()) {
        let auc = RocCurve::from_scores(&scores, &labels).unwrap().auc();
        prop_assert!((0.0..=1.0 + 1e-12).contains(&auc));
    }

    #[test]
    fn flipping_orientation_complements_auc((scores, labels) in labelled_scores()) {
        let higher = cut_roc(&scores, &labels, Orientation::HigherIsSignal).unwrap().auc();
        let lower = cut_roc(&scores, &labels, Orientation::LowerIsSignal).unwrap().auc();
        prop_assert!((higher + lower - 1.0).abs() < 1e-9);
    }

    #[test]
    fn perfect_separator_scores_one(
        bkg in prop::collection::vec(0.0f64..0.5, 1..80),
        sig in prop::collection::vec(0.5001f64..1.0, 1..80),
    ) {
        let mut scores = bkg.clone();
        scores.extend(&sig);
        let mut labels = vec![Label::Background; bkg.len()];
        labels.extend(vec![Label::Signal; sig.len()]);
        let auc = RocCurve::from_scores(&scores, &labels).unwrap().auc();
        prop_assert!((auc - 1.0).abs() < 1e-12);
    }
}
