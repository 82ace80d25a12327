use crate::genotype::{Covariates, Gender, Genotype};
use crate::simulate::SimulationError;
use serde::{Deserialize, Serialize};

/// One individual's baseline measurement and covariates.
///
/// `baseline_threshold` is expected in 0..=120 dB but only finiteness is
/// enforced; out-of-range baselines are pulled into range by the per-age clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    pub baseline_threshold: f64,
    pub baseline_age: u32,
    pub genotype: Genotype,
    pub gender: Gender,
}

impl PatientInput {
    pub fn new(
        baseline_threshold: f64,
        baseline_age: u32,
        genotype: Genotype,
        gender: Gender,
    ) -> Result<Self, SimulationError> {
        let input = Self {
            baseline_threshold,
            baseline_age,
            genotype,
            gender,
        };
        input.validate()?;
        Ok(input)
    }

    /// Builds an input from raw text fields, as collected by a form or a TSV row.
    ///
    /// Every field must be present. The threshold must parse to a finite real and
    /// the age to a non-negative integer.
    pub fn from_fields(
        threshold: &str,
        age: &str,
        genotype: &str,
        gender: &str,
    ) -> Result<Self, SimulationError> {
        let threshold = required("threshold", threshold)?;
        let age = required("age", age)?;
        let genotype = required("genotype", genotype)?;
        let gender = required("gender", gender)?;

        let baseline_threshold: f64 =
            threshold
                .parse()
                .map_err(|_| SimulationError::InvalidNumericInput {
                    field: "threshold",
                    value: threshold.to_string(),
                })?;
        let baseline_age: u32 = age
            .parse()
            .map_err(|_| SimulationError::InvalidNumericInput {
                field: "age",
                value: age.to_string(),
            })?;

        Self::new(
            baseline_threshold,
            baseline_age,
            genotype.parse()?,
            gender.parse()?,
        )
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.baseline_threshold.is_finite() {
            return Err(SimulationError::InvalidNumericInput {
                field: "threshold",
                value: self.baseline_threshold.to_string(),
            });
        }
        Ok(())
    }

    pub fn covariates(&self) -> Covariates {
        self.genotype.covariates()
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, SimulationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SimulationError::MissingField(field));
    }
    Ok(trimmed)
}
