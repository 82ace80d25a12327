//! # Percentile Aggregation
//!
//! Reduces the simulated draws into one record per age. Percentiles use the
//! nearest-rank-floor rule: the value at 0-based index `floor(n * p / 100)` of
//! the ascending-sorted draws. There is no interpolation between ranks, so the
//! reported values are always thresholds that some draw actually produced.

use crate::simulate::SimulationError;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Percentile levels reported for every age.
pub const PERCENTILE_LEVELS: [usize; 9] = [10, 20, 30, 40, 50, 60, 70, 80, 90];

/// Threshold percentiles across all draws at one simulated age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileRecord {
    pub age: u32,
    #[serde(rename = "P10")]
    pub p10: f64,
    #[serde(rename = "P20")]
    pub p20: f64,
    #[serde(rename = "P30")]
    pub p30: f64,
    #[serde(rename = "P40")]
    pub p40: f64,
    #[serde(rename = "P50")]
    pub p50: f64,
    #[serde(rename = "P60")]
    pub p60: f64,
    #[serde(rename = "P70")]
    pub p70: f64,
    #[serde(rename = "P80")]
    pub p80: f64,
    #[serde(rename = "P90")]
    pub p90: f64,
}

impl PercentileRecord {
    /// Selects the nine percentiles from draws already sorted ascending.
    ///
    /// `sorted` must be non-empty.
    pub fn from_sorted(age: u32, sorted: &[f64]) -> Self {
        let n = sorted.len();
        let [p10, p20, p30, p40, p50, p60, p70, p80, p90] =
            PERCENTILE_LEVELS.map(|p| sorted[floor_rank_index(n, p)]);
        Self {
            age,
            p10,
            p20,
            p30,
            p40,
            p50,
            p60,
            p70,
            p80,
            p90,
        }
    }

    /// The nine percentile values, P10 first.
    pub fn values(&self) -> [f64; 9] {
        [
            self.p10, self.p20, self.p30, self.p40, self.p50, self.p60, self.p70, self.p80,
            self.p90,
        ]
    }

    pub fn median(&self) -> f64 {
        self.p50
    }

    /// Width of the P10..P90 band.
    pub fn band_width(&self) -> f64 {
        self.p90 - self.p10
    }
}

/// 0-based index of percentile `p` among `n` sorted values.
///
/// Integer division floors, matching `floor(n * p / 100)`. For `p < 100` and
/// `n >= 1` the index is always in bounds.
pub fn floor_rank_index(n: usize, p: usize) -> usize {
    n * p / 100
}

/// Aggregates a draw matrix shaped `[ages, draws]`; row `i` holds every draw's
/// threshold at age `i`. Records are returned in row order.
pub fn aggregate(draws: ArrayView2<'_, f64>) -> Result<Vec<PercentileRecord>, SimulationError> {
    if draws.ncols() == 0 {
        return Err(SimulationError::NoDraws);
    }

    let mut scratch = Vec::with_capacity(draws.ncols());
    let records = draws
        .rows()
        .into_iter()
        .enumerate()
        .map(|(age, row)| {
            scratch.clear();
            scratch.extend(row.iter().copied());
            scratch.sort_unstable_by(f64::total_cmp);
            PercentileRecord::from_sorted(age as u32, &scratch)
        })
        .collect();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    #[test]
    fn floor_rank_matches_reference_indices() {
        let indices: Vec<usize> = PERCENTILE_LEVELS
            .iter()
            .map(|&p| floor_rank_index(1000, p))
            .collect();
        assert_eq!(indices, vec![100, 200, 300, 400, 500, 600, 700, 800, 900]);
        assert_eq!(floor_rank_index(3, 70), 2);
        assert_eq!(floor_rank_index(1, 90), 0);
    }

    #[test]
    fn selects_floor_rank_without_interpolation() {
        let sorted: Vec<f64> = (0..10).map(f64::from).collect();
        let record = PercentileRecord::from_sorted(7, &sorted);
        assert_eq!(record.age, 7);
        assert_eq!(
            record.values(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
        );
        assert_eq!(record.median(), 5.0);
        assert_eq!(record.band_width(), 8.0);
    }

    #[test]
    fn duplicate_values_are_kept_as_is() {
        let sorted = [1.0, 1.0, 1.0, 2.0, 2.0];
        let record = PercentileRecord::from_sorted(0, &sorted);
        assert_eq!(record.values(), [1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn aggregate_sorts_each_age_independently() {
        let draws = array![[3.0, 1.0, 2.0, 0.0], [10.0, 40.0, 30.0, 20.0]];
        let records = aggregate(draws.view()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].age, 0);
        assert_eq!(records[1].age, 1);
        // n = 4: P10/P20 -> index 0, P30/P40 -> 1, P50..P70 -> 2, P80/P90 -> 3
        assert_eq!(records[0].p10, 0.0);
        assert_eq!(records[0].p40, 1.0);
        assert_eq!(records[0].p50, 2.0);
        assert_eq!(records[0].p90, 3.0);
        assert_eq!(records[1].p30, 20.0);
        assert_eq!(records[1].p70, 30.0);
        assert_eq!(records[1].p80, 40.0);
    }

    #[test]
    fn aggregate_rejects_empty_draws() {
        let draws = Array2::<f64>::zeros((41, 0));
        assert!(matches!(
            aggregate(draws.view()),
            Err(SimulationError::NoDraws)
        ));
    }
}
