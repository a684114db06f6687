use sel_data::{generate_toys, RecordSet, ToySpec};

#[test]
fn toy_samples_survive_a_csv_roundtrip() {
    let spec = ToySpec {
        background_events: 25,
        simulation_events: 25,
        region_signal_events: 5,
        region_background_events: 20,
        ..ToySpec::default()
    };
    let toys = generate_toys(&spec).expect("toys");
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("data.csv");
    toys.signal_region.write_csv(&path).expect("write csv");

    let loaded = RecordSet::from_csv_path("signal_region", &path).expect("load csv");
    assert_eq!(loaded.column_names(), toys.signal_region.column_names());
    assert_eq!(loaded.n_rows(), 25);
    assert_eq!(
        loaded.canonical_hash(),
        toys.signal_region.canonical_hash()
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let err = RecordSet::from_csv_path("data", &dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, sel_core::SelError::Io(_)));
}
