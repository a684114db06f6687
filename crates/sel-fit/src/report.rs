//! Plain-text fit report in the familiar `[[Fit Statistics]]` layout.

use std::fmt::{self, Display};

use crate::extract::SignalExtraction;
use crate::lm::FitResult;

const MIN_CORRELATION: f64 = 0.1;

/// Renders parameter table, statistics and correlations of a fit.
pub struct FitReport<'a>(pub &'a FitResult);

impl Display for FitReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fit = self.0;
        let diag = &fit.diagnostics;
        writeln!(f, "[[Model]]")?;
        writeln!(f, "    {}", fit.formula)?;
        writeln!(f, "[[Fit Statistics]]")?;
        writeln!(f, "    # fitting method   = {}", diag.method)?;
        writeln!(f, "    # function evals   = {}", diag.nfev)?;
        writeln!(f, "    # data points      = {}", diag.ndata)?;
        writeln!(f, "    # variables        = {}", diag.nvarys)?;
        writeln!(f, "    chi-square         = {:.7}", diag.chisqr)?;
        writeln!(f, "    reduced chi-square = {:.7}", diag.redchi)?;
        writeln!(f, "    Akaike info crit   = {:.7}", diag.aic)?;
        writeln!(f, "    Bayesian info crit = {:.7}", diag.bic)?;
        if !diag.converged {
            writeln!(f, "##  Warning: fit did not converge: {}", diag.message)?;
        }
        if diag.covariance.is_none() {
            writeln!(f, "##  Warning: uncertainties could not be estimated")?;
        }

        writeln!(f, "[[Variables]]")?;
        let name_width = fit.params.iter().map(|p| p.name.len()).max().unwrap_or(0) + 1;
        for param in fit.params.iter() {
            let label = format!("{}:", param.name);
            write!(f, "    {label:<width$} {:.8}", param.value, width = name_width + 1)?;
            if !param.vary {
                writeln!(f, " (fixed)")?;
                continue;
            }
            match param.stderr {
                Some(stderr) if param.value != 0.0 => write!(
                    f,
                    " +/- {:.8} ({:.2}%)",
                    stderr,
                    (stderr / param.value).abs() * 100.0
                )?,
                Some(stderr) => write!(f, " +/- {stderr:.8}")?,
                None => write!(f, " +/- None")?,
            }
            writeln!(f, " (init = {})", param.init_value)?;
        }

        let mut strong: Vec<_> = diag
            .correlations
            .iter()
            .filter(|corr| corr.value.abs() >= MIN_CORRELATION)
            .collect();
        if !strong.is_empty() {
            strong.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
            writeln!(
                f,
                "[[Correlations]] (unreported correlations are < {MIN_CORRELATION:.3})"
            )?;
            for corr in strong {
                writeln!(f, "    C({}, {}) = {:+.4}", corr.first, corr.second, corr.value)?;
            }
        }
        Ok(())
    }
}

/// Fit report followed by the yield summary of an extraction.
pub struct ExtractionReport<'a>(pub &'a SignalExtraction);

impl Display for ExtractionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extraction = self.0;
        writeln!(f, "{}", "=".repeat(50))?;
        write!(f, "{}", FitReport(&extraction.fit))?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(
            f,
            "kept {} of {} signal-region events at score >= {}",
            extraction.kept,
            extraction.kept + extraction.rejected,
            extraction.threshold
        )?;
        match extraction.signal_yield_uncertainty {
            Some(sigma) => writeln!(
                f,
                "The fit gives {:.0} +/- {:.0} signal events",
                extraction.signal_yield, sigma
            )?,
            None => writeln!(f, "The fit gives {:.0} signal events", extraction.signal_yield)?,
        }
        writeln!(f, "Background under the window: {:.0} events", extraction.background_yield)?;
        if !extraction.trusted {
            writeln!(f, "WARNING: fit diagnostics do not support this yield")?;
        }
        Ok(())
    }
}
