use std::fs;
use std::path::{Path, PathBuf};

use sel_core::errors::SelError;
use sel_core::serde::to_report_json;
use sel_roc::RocCurve;
use serde::Serialize;

use crate::report::PipelineReport;

#[derive(Serialize)]
struct RocRow {
    fpr: f64,
    tpr: f64,
    threshold: Option<f64>,
}

#[derive(Serialize)]
struct MassRow {
    low: f64,
    high: f64,
    centre: f64,
    kept: u64,
    best_fit: Option<f64>,
}

#[derive(Serialize)]
struct CountRow {
    low: f64,
    high: f64,
    centre: f64,
    count: u64,
}

#[derive(Serialize)]
struct ScoreRow {
    low: f64,
    high: f64,
    background: u64,
    simulation: u64,
}

#[derive(Serialize)]
struct ScanRow {
    threshold: f64,
    kept: usize,
    signal_yield: Option<f64>,
    background_yield: Option<f64>,
    signal_efficiency: Option<f64>,
    background_efficiency: Option<f64>,
    trusted: bool,
}

fn write_rows<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), SelError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| SelError::io(path, err))?;
    for row in rows {
        writer.serialize(row).map_err(|err| SelError::io(path, err))?;
    }
    writer.flush().map_err(|err| SelError::io(path, err))
}

fn roc_rows(curve: &RocCurve) -> impl Iterator<Item = RocRow> + '_ {
    curve.points.iter().map(|point| RocRow {
        fpr: point.fpr,
        tpr: point.tpr,
        threshold: point.threshold,
    })
}

/// Writes `report.json` and the CSV tables an external plotting tool needs.
///
/// Returns the paths written, in a fixed order.
pub fn write_artefacts(report: &PipelineReport, out: &Path) -> Result<Vec<PathBuf>, SelError> {
    fs::create_dir_all(out).map_err(|err| SelError::io(out, err))?;
    let mut written = Vec::new();

    let path = out.join("report.json");
    fs::write(&path, to_report_json(report)?).map_err(|err| SelError::io(&path, err))?;
    written.push(path);

    let path = out.join("roc_classifier.csv");
    write_rows(&path, roc_rows(&report.roc.classifier))?;
    written.push(path);

    if let Some(baseline) = &report.roc.baseline {
        let path = out.join("roc_baseline.csv");
        write_rows(&path, roc_rows(baseline))?;
        written.push(path);
    }

    let extraction = &report.extraction;
    let kept = &extraction.kept_events;
    let centres = kept.centers();
    let window = extraction.window;
    let path = out.join("mass_histogram.csv");
    write_rows(
        &path,
        (0..kept.bins()).map(|bin| MassRow {
            low: kept.edges[bin],
            high: kept.edges[bin + 1],
            centre: centres[bin],
            kept: kept.counts[bin],
            best_fit: (window.first_bin..window.end_bin)
                .contains(&bin)
                .then(|| extraction.best_fit[bin - window.first_bin]),
        }),
    )?;
    written.push(path);

    let all = &extraction.all_events;
    let centres = all.centers();
    let path = out.join("mass_histogram_all.csv");
    write_rows(
        &path,
        (0..all.bins()).map(|bin| CountRow {
            low: all.edges[bin],
            high: all.edges[bin + 1],
            centre: centres[bin],
            count: all.counts[bin],
        }),
    )?;
    written.push(path);

    let scores = &report.score_distributions;
    let path = out.join("score_distributions.csv");
    write_rows(
        &path,
        (0..scores.background.bins()).map(|bin| ScoreRow {
            low: scores.background.edges[bin],
            high: scores.background.edges[bin + 1],
            background: scores.background.counts[bin],
            simulation: scores.simulation.counts[bin],
        }),
    )?;
    written.push(path);

    if let Some(scan) = &report.scan {
        let path = out.join("threshold_scan.csv");
        write_rows(
            &path,
            scan.points.iter().map(|point| ScanRow {
                threshold: point.threshold,
                kept: point.kept,
                signal_yield: point.signal_yield,
                background_yield: point.background_yield,
                signal_efficiency: point.signal_efficiency,
                background_efficiency: point.background_efficiency,
                trusted: point.trusted,
            }),
        )?;
        written.push(path);
    }

    tracing::info!(directory = %out.display(), files = written.len(), "wrote artefacts");
    Ok(written)
}
