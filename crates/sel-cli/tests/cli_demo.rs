use std::path::Path;
use std::process::{Command, Output};

fn sel(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sel"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("binary runs")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn version_prints_package_version() {
    let out = sel(&["version"]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        env!("CARGO_PKG_VERSION")
    );
}

#[test]
fn demo_then_run_writes_artefacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inputs = dir.path().join("inputs");
    let demo = sel(&[
        "demo",
        "--out",
        path_arg(&inputs),
        "--events",
        "1200",
        "--region-signal",
        "500",
        "--region-background",
        "2500",
    ]);
    assert!(demo.status.success(), "{}", String::from_utf8_lossy(&demo.stderr));
    for name in ["background.csv", "simulation.csv", "signal_region.csv", "config.yaml"] {
        assert!(inputs.join(name).exists(), "{name} missing");
    }

    let out = dir.path().join("run");
    let run = sel(&[
        "run",
        "--background",
        path_arg(&inputs.join("background.csv")),
        "--simulation",
        path_arg(&inputs.join("simulation.csv")),
        "--signal-region",
        path_arg(&inputs.join("signal_region.csv")),
        "--config",
        path_arg(&inputs.join("config.yaml")),
        "--epochs",
        "3",
        "--out",
        path_arg(&out),
    ]);
    assert!(run.status.success(), "{}", String::from_utf8_lossy(&run.stderr));
    let stdout = String::from_utf8_lossy(&run.stdout);
    assert!(stdout.contains("classifier AUC"));
    assert!(stdout.contains("[[Fit Statistics]]"));
    assert!(stdout.contains("signal events"));
    assert!(out.join("report.json").exists());
    assert!(out.join("mass_histogram.csv").exists());

    let inspect = sel(&[
        "inspect",
        "--input",
        path_arg(&inputs.join("signal_region.csv")),
        "--column",
        "B0_MM",
        "--column",
        "B0_FDCHI2_OWNPV",
        "--log",
        "B0_FDCHI2_OWNPV",
    ]);
    assert!(inspect.status.success());
    let table = String::from_utf8_lossy(&inspect.stdout);
    assert!(table.contains("log(B0_FDCHI2_OWNPV)"));
    assert!(table.contains("3000 rows"));
}

#[test]
fn missing_input_file_fails_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.csv");
    let out = sel(&[
        "run",
        "--background",
        path_arg(&missing),
        "--simulation",
        path_arg(&missing),
        "--signal-region",
        path_arg(&missing),
        "--out",
        path_arg(dir.path()),
    ]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("io error: [io]"));
}
