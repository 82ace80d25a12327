#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod genotype;
pub mod params;
pub mod patient;
pub mod percentile;
pub mod report;
pub mod simulate;

pub use genotype::{Covariates, Gender, Genotype, resolve_covariates};
pub use params::{GammaParams, LogisticParams, ModelParameters, ParameterError};
pub use patient::PatientInput;
pub use percentile::{PERCENTILE_LEVELS, PercentileRecord, aggregate, floor_rank_index};
pub use simulate::{
    DEFAULT_DRAWS, HORIZON_YEARS, MAX_THRESHOLD_DB, MIN_THRESHOLD_DB, ProgressionRate,
    SimulationConfig, SimulationError, Trajectory, TrajectorySimulator, simulate,
    simulate_with_rng,
};
