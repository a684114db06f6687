//! Synthetic toy samples mimicking the sideband, simulation and signal-region
//! inputs, so the pipeline can be exercised without detector data.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use sel_core::errors::{ErrorInfo, SelError};
use sel_core::rng::{RngHandle, Stream};
use serde::{Deserialize, Serialize};

use crate::assemble::Source;
use crate::record::RecordSet;

/// Default feature columns, in training order.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "B0_DiraAngle",
    "B0_ENDVERTEX_CHI2",
    "mu_minus_PT",
    "mu_plus_PT",
    "K_PT",
    "Pi_PT",
    "B0_FDCHI2_OWNPV",
    "B0_relinfo_MU_SLL_ISO_1",
    "B0_IPCHI2_OWNPV",
];

struct Shape {
    name: &'static str,
    signal: (f64, f64),
    background: (f64, f64),
    positive: bool,
}

const SHAPES: [Shape; 11] = [
    Shape {
        name: "B0_DiraAngle",
        signal: (0.005, 0.004),
        background: (0.02, 0.015),
        positive: true,
    },
    Shape {
        name: "B0_ENDVERTEX_CHI2",
        signal: (6.0, 4.0),
        background: (14.0, 8.0),
        positive: true,
    },
    Shape {
        name: "mu_minus_PT",
        signal: (2200.0, 900.0),
        background: (1500.0, 800.0),
        positive: true,
    },
    Shape {
        name: "mu_plus_PT",
        signal: (2200.0, 900.0),
        background: (1500.0, 800.0),
        positive: true,
    },
    Shape {
        name: "K_PT",
        signal: (1800.0, 900.0),
        background: (1100.0, 700.0),
        positive: true,
    },
    Shape {
        name: "Pi_PT",
        signal: (1000.0, 500.0),
        background: (800.0, 500.0),
        positive: true,
    },
    Shape {
        name: "B0_FDCHI2_OWNPV",
        signal: (900.0, 600.0),
        background: (300.0, 300.0),
        positive: true,
    },
    Shape {
        name: "B0_relinfo_MU_SLL_ISO_1",
        signal: (0.5, 0.6),
        background: (1.5, 1.0),
        positive: true,
    },
    Shape {
        name: "B0_IPCHI2_OWNPV",
        signal: (4.0, 3.0),
        background: (9.0, 6.0),
        positive: true,
    },
    Shape {
        name: "B0_PT",
        signal: (9000.0, 4000.0),
        background: (6000.0, 3000.0),
        positive: true,
    },
    Shape {
        name: "K_PIDK",
        signal: (20.0, 15.0),
        background: (8.0, 15.0),
        positive: false,
    },
];

fn default_seed() -> u64 {
    2024
}

/// Parameters of the toy generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToySpec {
    /// Master seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Rows in the sideband background sample.
    pub background_events: usize,
    /// Rows in the simulated signal sample.
    pub simulation_events: usize,
    /// True signal rows mixed into the signal region.
    pub region_signal_events: usize,
    /// Background rows mixed into the signal region.
    pub region_background_events: usize,
    /// Resonance mass.
    pub mass_mean: f64,
    /// Resonance resolution.
    pub mass_width: f64,
    /// Lower edge of the signal-region mass window.
    pub mass_low: f64,
    /// Upper edge of the mass spectrum.
    pub mass_high: f64,
    /// Lower edge of the upper sideband.
    pub sideband_low: f64,
    /// Decay length of the exponential combinatorial background.
    pub background_decay: f64,
}

impl Default for ToySpec {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            background_events: 4000,
            simulation_events: 4000,
            region_signal_events: 800,
            region_background_events: 6000,
            mass_mean: 5280.0,
            mass_width: 20.0,
            mass_low: 5000.0,
            mass_high: 5700.0,
            sideband_low: 5400.0,
            background_decay: 400.0,
        }
    }
}

/// The three generated record sets.
#[derive(Debug, Clone)]
pub struct ToySamples {
    /// Upper-sideband background.
    pub background: RecordSet,
    /// Simulated signal.
    pub simulation: RecordSet,
    /// Signal-region mixture.
    pub signal_region: RecordSet,
}

fn toy_error(message: impl ToString) -> SelError {
    SelError::Config(ErrorInfo::new("toy-spec", message.to_string()))
}

struct Generator {
    signal: Vec<Normal<f64>>,
    background: Vec<Normal<f64>>,
    bdt_noise: Normal<f64>,
    mass: Normal<f64>,
}

impl Generator {
    fn new(spec: &ToySpec) -> Result<Self, SelError> {
        let normal = |(mean, std): (f64, f64)| Normal::new(mean, std).map_err(toy_error);
        Ok(Self {
            signal: SHAPES.iter().map(|s| normal(s.signal)).collect::<Result<_, _>>()?,
            background: SHAPES
                .iter()
                .map(|s| normal(s.background))
                .collect::<Result<_, _>>()?,
            bdt_noise: normal((0.0, 1.3))?,
            mass: normal((spec.mass_mean, spec.mass_width))?,
        })
    }

    fn event(&self, rng: &mut RngHandle, signal: bool) -> Vec<f64> {
        let dists = if signal { &self.signal } else { &self.background };
        let mut row: Vec<f64> = SHAPES
            .iter()
            .zip(dists)
            .map(|(shape, dist)| {
                let value = dist.sample(rng);
                if shape.positive {
                    value.abs()
                } else {
                    value
                }
            })
            .collect();
        let shift = if signal { 1.2 } else { -1.2 };
        let bdt = 1.0 / (1.0 + (-(shift + self.bdt_noise.sample(rng))).exp());
        row.push(bdt);
        row
    }
}

fn truncated_exponential(rng: &mut RngHandle, low: f64, high: f64, decay: f64) -> f64 {
    let u: f64 = rng.gen();
    let span = 1.0 - (-(high - low) / decay).exp();
    low - decay * (1.0 - u * span).ln()
}

fn column_names() -> Vec<String> {
    SHAPES
        .iter()
        .map(|shape| shape.name.to_string())
        .chain(["BDT".to_string(), "B0_MM".to_string()])
        .collect()
}

fn into_record_set(source: Source, rows: Vec<Vec<f64>>) -> Result<RecordSet, SelError> {
    let names = column_names();
    let mut columns: Vec<(String, Vec<f64>)> = names
        .into_iter()
        .map(|name| (name, Vec::with_capacity(rows.len())))
        .collect();
    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.1.push(value);
        }
    }
    RecordSet::new(source.name(), columns)
}

/// Generates the three toy samples.
pub fn generate(spec: &ToySpec) -> Result<ToySamples, SelError> {
    if spec.mass_high <= spec.sideband_low || spec.mass_high <= spec.mass_low {
        return Err(toy_error("mass window edges must be increasing"));
    }
    let generator = Generator::new(spec)?;

    let mut rng = Stream::Toy { source: 0 }.rng(spec.seed);
    let background = (0..spec.background_events)
        .map(|_| {
            let mut row = generator.event(&mut rng, false);
            row.push(truncated_exponential(
                &mut rng,
                spec.sideband_low,
                spec.mass_high,
                spec.background_decay,
            ));
            row
        })
        .collect();

    let mut rng = Stream::Toy { source: 1 }.rng(spec.seed);
    let simulation = (0..spec.simulation_events)
        .map(|_| {
            let mut row = generator.event(&mut rng, true);
            row.push(generator.mass.sample(&mut rng));
            row
        })
        .collect();

    let mut rng = Stream::Toy { source: 2 }.rng(spec.seed);
    let mut truth: Vec<bool> = std::iter::repeat(true)
        .take(spec.region_signal_events)
        .chain(std::iter::repeat(false).take(spec.region_background_events))
        .collect();
    truth.shuffle(&mut rng);
    let signal_region = truth
        .into_iter()
        .map(|signal| {
            let mut row = generator.event(&mut rng, signal);
            let mass = if signal {
                generator
                    .mass
                    .sample(&mut rng)
                    .clamp(spec.mass_low, spec.mass_high)
            } else {
                truncated_exponential(
                    &mut rng,
                    spec.mass_low,
                    spec.mass_high,
                    spec.background_decay,
                )
            };
            row.push(mass);
            row
        })
        .collect();

    let samples = ToySamples {
        background: into_record_set(Source::Background, background)?,
        simulation: into_record_set(Source::Simulation, simulation)?,
        signal_region: into_record_set(Source::SignalRegion, signal_region)?,
    };
    tracing::debug!(seed = spec.seed, "generated toy samples");
    Ok(samples)
}
