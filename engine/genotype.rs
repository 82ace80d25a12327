//! # Genotype Covariates
//!
//! The progression models condition on two SLC26A4 alleles: H723R (covariate
//! `v7232`, counted 0..=2) and IVS7-2A>G (covariate `v919`, 0 or 1). A genotype
//! code names the allele pair, e.g. `G11` carries one of each.
//!
//! The mapping is a closed enumeration. Unrecognized codes are rejected with
//! `SimulationError::UnknownGenotype`; there is no fallback covariate pair.

use crate::simulate::SimulationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Allele-pair genotype code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genotype {
    /// H723R/H723R
    G20,
    /// H723R/IVS7-2A>G
    G11,
    /// H723R/other
    G10,
    /// IVS7-2A>G/other
    G01,
    /// Other/other
    G00,
}

impl Genotype {
    pub const ALL: [Genotype; 5] = [
        Genotype::G20,
        Genotype::G11,
        Genotype::G10,
        Genotype::G01,
        Genotype::G00,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Genotype::G20 => "G20",
            Genotype::G11 => "G11",
            Genotype::G10 => "G10",
            Genotype::G01 => "G01",
            Genotype::G00 => "G00",
        }
    }

    /// Human-readable allele pair.
    pub fn description(self) -> &'static str {
        match self {
            Genotype::G20 => "H723R/H723R",
            Genotype::G11 => "H723R/IVS7-2A>G",
            Genotype::G10 => "H723R/other",
            Genotype::G01 => "IVS7-2A>G/other",
            Genotype::G00 => "Other/other",
        }
    }

    pub fn covariates(self) -> Covariates {
        let (v7232, v919) = match self {
            Genotype::G20 => (2, 0),
            Genotype::G11 => (1, 1),
            Genotype::G10 => (1, 0),
            Genotype::G01 => (0, 1),
            Genotype::G00 => (0, 0),
        };
        Covariates { v7232, v919 }
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Genotype {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genotype::ALL
            .into_iter()
            .find(|g| g.code() == s)
            .ok_or_else(|| SimulationError::UnknownGenotype(s.to_string()))
    }
}

/// Binary sex indicator used by the zero-progression gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// 1.0 for male, 0.0 otherwise.
    pub fn indicator(self) -> f64 {
        match self {
            Gender::Male => 1.0,
            Gender::Female => 0.0,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("Male"),
            Gender::Female => f.write_str("Female"),
        }
    }
}

impl FromStr for Gender {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("male") {
            Ok(Gender::Male)
        } else if s.eq_ignore_ascii_case("female") {
            Ok(Gender::Female)
        } else {
            Err(SimulationError::UnknownGender(s.to_string()))
        }
    }
}

/// Indicator covariates consumed by the logistic gate and the gamma rate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Covariates {
    /// H723R allele count, 0..=2.
    pub v7232: u8,
    /// IVS7-2A>G carrier flag, 0 or 1.
    pub v919: u8,
}

/// Resolves a raw genotype code to its covariate pair.
pub fn resolve_covariates(code: &str) -> Result<Covariates, SimulationError> {
    code.parse::<Genotype>().map(Genotype::covariates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covariate_table_is_exact() {
        let expected = [
            ("G20", 2, 0),
            ("G11", 1, 1),
            ("G10", 1, 0),
            ("G01", 0, 1),
            ("G00", 0, 0),
        ];
        for (code, v7232, v919) in expected {
            let cov = resolve_covariates(code).unwrap();
            assert_eq!(cov, Covariates { v7232, v919 }, "genotype {code}");
        }
    }

    #[test]
    fn unknown_genotype_carries_the_code() {
        for bad in ["G21", "g20", "", "G2", " G00"] {
            match resolve_covariates(bad) {
                Err(SimulationError::UnknownGenotype(code)) => assert_eq!(code, bad),
                other => panic!("expected UnknownGenotype for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn codes_round_trip_through_display() {
        for g in Genotype::ALL {
            assert_eq!(g.to_string().parse::<Genotype>().unwrap(), g);
        }
    }

    #[test]
    fn gender_parsing_ignores_case() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(Gender::Male.indicator(), 1.0);
        assert_eq!(Gender::Female.indicator(), 0.0);
        assert!(matches!(
            "other".parse::<Gender>(),
            Err(SimulationError::UnknownGender(_))
        ));
    }
}
