use crate::genotype::{Covariates, Gender};
use crate::simulate::SimulationError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use thiserror::Error;

// --- Public Data Structures ---
// These structs define the human-readable format of the fitted model when
// serialized to a TOML file.

/// Coefficients of the logistic zero-progression gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub intercept: f64,
    #[serde(rename = "v919")]
    pub coef_v919: f64,
    #[serde(rename = "gender")]
    pub coef_gender: f64,
    #[serde(rename = "baseline_threshold")]
    pub coef_baseline: f64,
}

/// Log-linear rate model plus the fixed shape and location of the gamma draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParams {
    pub intercept: f64,
    #[serde(rename = "v7232")]
    pub coef_v7232: f64,
    #[serde(rename = "v919")]
    pub coef_v919: f64,
    /// Fitted alongside the other coefficients; the rate model does not use it.
    #[serde(rename = "age")]
    pub coef_age: f64,
    pub shape: f64,
    pub loc: f64,
}

/// The complete fitted model. Immutable once constructed and shared read-only
/// by every simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub logistic: LogisticParams,
    pub gamma: GammaParams,
}

/// Custom error type for parameter loading and saving.
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Failed to read or write parameter file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML parameter file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize parameters to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Parameter file is structurally valid but unusable: {0}")]
    Invalid(#[from] SimulationError),
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            logistic: LogisticParams {
                intercept: -4.259485,
                coef_v919: 0.33518,
                coef_gender: 0.331033,
                coef_baseline: 0.024602,
            },
            gamma: GammaParams {
                intercept: 3.219828,
                coef_v7232: -1.14074,
                coef_v919: -0.850773,
                coef_age: -0.038724,
                shape: 1.2490949,
                loc: 0.247527525556966,
            },
        }
    }
}

impl ModelParameters {
    /// Rejects non-finite coefficients and a non-positive gamma shape.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let named = [
            ("logistic.intercept", self.logistic.intercept),
            ("logistic.v919", self.logistic.coef_v919),
            ("logistic.gender", self.logistic.coef_gender),
            ("logistic.baseline_threshold", self.logistic.coef_baseline),
            ("gamma.intercept", self.gamma.intercept),
            ("gamma.v7232", self.gamma.coef_v7232),
            ("gamma.v919", self.gamma.coef_v919),
            ("gamma.age", self.gamma.coef_age),
            ("gamma.shape", self.gamma.shape),
            ("gamma.loc", self.gamma.loc),
        ];
        if let Some((name, _)) = named.iter().find(|(_, value)| !value.is_finite()) {
            return Err(SimulationError::NonFiniteParameter(*name));
        }
        if self.gamma.shape <= 0.0 {
            return Err(SimulationError::NonPositiveShape(self.gamma.shape));
        }
        Ok(())
    }

    /// Linear predictor of the zero-progression gate.
    pub fn zero_progression_logit(
        &self,
        covariates: Covariates,
        gender: Gender,
        baseline_threshold: f64,
    ) -> f64 {
        let p = &self.logistic;
        p.intercept
            + p.coef_v919 * f64::from(covariates.v919)
            + p.coef_gender * gender.indicator()
            + p.coef_baseline * baseline_threshold
    }

    /// Probability that a draw shows no progression at all.
    ///
    /// Evaluated as `1 / (1 + exp(-logit))`, which is the logistic transform
    /// without the overflow of `exp(logit) / (1 + exp(logit))` for large logits.
    pub fn zero_progression_probability(
        &self,
        covariates: Covariates,
        gender: Gender,
        baseline_threshold: f64,
    ) -> f64 {
        let logit = self.zero_progression_logit(covariates, gender, baseline_threshold);
        1.0 / (1.0 + (-logit).exp())
    }

    /// Mean progression rate `lambda0` of the gamma component (before `loc`).
    pub fn gamma_mean(&self, covariates: Covariates) -> f64 {
        let g = &self.gamma;
        (g.intercept
            + g.coef_v7232 * f64::from(covariates.v7232)
            + g.coef_v919 * f64::from(covariates.v919))
        .exp()
    }

    /// Scale of the gamma draw, chosen so that `shape * scale == lambda0`.
    pub fn gamma_scale(&self, covariates: Covariates) -> f64 {
        self.gamma_mean(covariates) / self.gamma.shape
    }

    /// Saves the parameters to a file in a human-readable TOML format.
    pub fn save(&self, path: &str) -> Result<(), ParameterError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads parameters from a TOML file and validates them.
    pub fn load(path: &str) -> Result<Self, ParameterError> {
        let toml_string = fs::read_to_string(path)?;
        let params: Self = toml::from_str(&toml_string)?;
        params.validate()?;
        log::info!("Loaded model parameters from {path}");
        Ok(params)
    }
}
