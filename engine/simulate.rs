//! # Trajectory Simulation
//!
//! Two-stage mixture model for hearing-threshold progression:
//!
//! 1. A logistic gate decides whether a draw progresses at all. The gate
//!    probability depends only on the patient, so it is computed once per run.
//! 2. Progressing draws take a rate of `loc + Gamma(shape, scale)` dB per year,
//!    with `shape * scale` equal to the genotype-dependent mean `lambda0`.
//!
//! Each draw is projected linearly through the baseline point to every age in
//! `0..=HORIZON_YEARS` and clamped to the audiometric range. Draws are written
//! straight into an `[ages, draws]` matrix, one column per draw, so only one
//! trajectory exists at a time. The matrix is then handed to
//! [`crate::percentile::aggregate`].
//!
//! Randomness is always supplied by the caller. Passing a seeded generator makes
//! a run reproducible end to end.

use crate::params::ModelParameters;
use crate::patient::PatientInput;
use crate::percentile::{PercentileRecord, aggregate};
use ndarray::Array2;
use rand::distributions::{Distribution, Standard};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Gamma;
use thiserror::Error;

/// Draws per simulation run.
pub const DEFAULT_DRAWS: usize = 1000;
/// Last simulated age; ages run `0..=HORIZON_YEARS`.
pub const HORIZON_YEARS: u32 = 40;
pub const MIN_THRESHOLD_DB: f64 = 0.0;
pub const MAX_THRESHOLD_DB: f64 = 120.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Unknown genotype: {0}")]
    UnknownGenotype(String),
    #[error("Unknown gender '{0}'; expected 'Male' or 'Female'")]
    UnknownGender(String),
    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("Field '{field}' has invalid numeric value '{value}'")]
    InvalidNumericInput { field: &'static str, value: String },
    #[error("Model parameter '{0}' is not finite")]
    NonFiniteParameter(&'static str),
    #[error("Gamma shape must be positive, got {0}")]
    NonPositiveShape(f64),
    #[error("Cannot build a gamma distribution with shape {shape} and scale {scale}")]
    InvalidGamma { shape: f64, scale: f64 },
    #[error("At least one draw is required")]
    NoDraws,
}

/// Run-level settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub draws: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            draws: DEFAULT_DRAWS,
        }
    }
}

/// Outcome of the mixture model for a single draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressionRate {
    /// The logistic gate fired; the threshold stays at baseline.
    Zero,
    /// dB per year, `loc + gamma sample`.
    Progressing(f64),
}

impl ProgressionRate {
    pub fn db_per_year(self) -> f64 {
        match self {
            ProgressionRate::Zero => 0.0,
            ProgressionRate::Progressing(rate) => rate,
        }
    }
}

/// Thresholds of one draw at every age `0..=HORIZON_YEARS`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    thresholds: Vec<f64>,
}

impl Trajectory {
    /// Linear projection pivoted at the baseline point, clamped to
    /// `[MIN_THRESHOLD_DB, MAX_THRESHOLD_DB]`. Ages before the baseline are
    /// extrapolated backwards.
    pub fn project(baseline_threshold: f64, baseline_age: u32, rate: ProgressionRate) -> Self {
        let slope = rate.db_per_year();
        let thresholds = (0..=HORIZON_YEARS)
            .map(|age| {
                let elapsed = f64::from(age) - f64::from(baseline_age);
                (baseline_threshold + slope * elapsed).clamp(MIN_THRESHOLD_DB, MAX_THRESHOLD_DB)
            })
            .collect();
        Self { thresholds }
    }

    pub fn threshold_at(&self, age: u32) -> Option<f64> {
        self.thresholds.get(age as usize).copied()
    }

    /// `(age, threshold)` pairs in increasing age.
    pub fn points(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.thresholds
            .iter()
            .enumerate()
            .map(|(age, &threshold)| (age as u32, threshold))
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

/// Mixture model bound to one patient.
#[derive(Debug, Clone)]
pub struct TrajectorySimulator {
    input: PatientInput,
    config: SimulationConfig,
    prob_zero: f64,
    scale: f64,
    loc: f64,
    gamma: Gamma<f64>,
}

impl TrajectorySimulator {
    pub fn new(
        params: &ModelParameters,
        input: PatientInput,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        input.validate()?;
        if config.draws == 0 {
            return Err(SimulationError::NoDraws);
        }

        let covariates = input.covariates();
        let prob_zero =
            params.zero_progression_probability(covariates, input.gender, input.baseline_threshold);
        let shape = params.gamma.shape;
        let scale = params.gamma_scale(covariates);
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(SimulationError::InvalidGamma { shape, scale });
        }
        let gamma =
            Gamma::new(shape, scale).map_err(|_| SimulationError::InvalidGamma { shape, scale })?;

        log::debug!(
            "Simulator for {} ({}), {}: prob_zero = {prob_zero:.6}, shape = {shape}, scale = {scale:.6}",
            input.genotype,
            input.genotype.description(),
            input.gender,
        );

        Ok(Self {
            input,
            config,
            prob_zero,
            scale,
            loc: params.gamma.loc,
            gamma,
        })
    }

    pub fn zero_progression_probability(&self) -> f64 {
        self.prob_zero
    }

    pub fn gamma_scale(&self) -> f64 {
        self.scale
    }

    /// One independent draw of the progression rate.
    pub fn draw_rate<R: Rng + ?Sized>(&self, rng: &mut R) -> ProgressionRate {
        let gate: f64 = Standard.sample(rng);
        if gate < self.prob_zero {
            ProgressionRate::Zero
        } else {
            ProgressionRate::Progressing(self.loc + self.gamma.sample(rng))
        }
    }

    pub fn draw_trajectory<R: Rng + ?Sized>(&self, rng: &mut R) -> Trajectory {
        let rate = self.draw_rate(rng);
        Trajectory::project(self.input.baseline_threshold, self.input.baseline_age, rate)
    }

    /// Runs every draw and reduces them to one percentile record per age.
    pub fn run<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<PercentileRecord>, SimulationError> {
        let ages = HORIZON_YEARS as usize + 1;
        let mut draws = Array2::<f64>::zeros((ages, self.config.draws));
        let mut zero_draws = 0usize;

        for mut column in draws.columns_mut() {
            let rate = self.draw_rate(rng);
            if rate == ProgressionRate::Zero {
                zero_draws += 1;
            }
            let trajectory =
                Trajectory::project(self.input.baseline_threshold, self.input.baseline_age, rate);
            for (cell, (_, threshold)) in column.iter_mut().zip(trajectory.points()) {
                *cell = threshold;
            }
        }

        log::debug!(
            "{} of {} draws took the zero-progression branch (expected {:.1})",
            zero_draws,
            self.config.draws,
            self.prob_zero * self.config.draws as f64
        );

        aggregate(draws.view())
    }
}

/// Simulates one patient with an explicit parameter set and random source.
pub fn simulate_with_rng<R: Rng + ?Sized>(
    input: &PatientInput,
    params: &ModelParameters,
    config: SimulationConfig,
    rng: &mut R,
) -> Result<Vec<PercentileRecord>, SimulationError> {
    log::info!(
        "Simulating {} draws: baseline {} dB at age {}, genotype {}, {}",
        config.draws,
        input.baseline_threshold,
        input.baseline_age,
        input.genotype,
        input.gender
    );
    let simulator = TrajectorySimulator::new(params, *input, config)?;
    let records = simulator.run(rng)?;
    log::info!("Simulation produced {} percentile records", records.len());
    Ok(records)
}

/// Entry point with the built-in parameters, the default draw count, and an
/// entropy-seeded generator.
pub fn simulate(
    baseline_threshold: f64,
    baseline_age: u32,
    genotype: &str,
    gender: &str,
) -> Result<Vec<PercentileRecord>, SimulationError> {
    let input = PatientInput::new(
        baseline_threshold,
        baseline_age,
        genotype.parse()?,
        gender.parse()?,
    )?;
    let mut rng = StdRng::from_entropy();
    simulate_with_rng(
        &input,
        &ModelParameters::default(),
        SimulationConfig::default(),
        &mut rng,
    )
}
