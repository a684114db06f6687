use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Normal};
use sel_fit::{extract, signal_yield, ExtractionOpts, LevenbergMarquardt};

proptest! {
    #[test]
    fn yield_is_non_negative_for_physical_parameters(
        a in 0.0f64..1e3,
        k in -0.01f64..0.01,
        width in 0.5f64..200.0,
        norm in 0.0f64..1e4,
        centres in prop::collection::vec(4800.0f64..5800.0, 1..200),
    ) {
        let values = [a, k, 5280.0, width, norm];
        prop_assert!(signal_yield(&values, &centres) >= 0.0);
    }
}

#[test]
fn sampled_peak_over_falling_background() {
    let mut rng = StdRng::seed_from_u64(11);
    let peak = Normal::new(5280.0, 20.0).unwrap();
    let slope = Exp::new(1.0 / 400.0).unwrap();

    let mut mass = Vec::new();
    for _ in 0..3000 {
        mass.push(peak.sample(&mut rng));
    }
    while mass.len() < 3000 + 12_000 {
        let value = 5100.0 + slope.sample(&mut rng);
        if value < 5700.0 {
            mass.push(value);
        }
    }
    let scores = vec![1.0; mass.len()];
    let opts = ExtractionOpts {
        mass_range: Some([5000.0, 5700.0]),
        ..ExtractionOpts::default()
    };

    let result = extract(&scores, &mass, &opts, &LevenbergMarquardt::default()).unwrap();
    assert!(result.trusted, "{}", result.fit.diagnostics.message);
    // Window [65, 195) of 3.5 MeV bins covers 5227.5..5682.5, i.e. ~99.6 % of the peak.
    let sigma = result.signal_yield_uncertainty.unwrap();
    assert!(
        (result.signal_yield - 2990.0).abs() < 5.0 * sigma,
        "yield {} +/- {}",
        result.signal_yield,
        sigma
    );
    assert!((result.fit.diagnostics.redchi - 1.0).abs() < 0.5);
}
