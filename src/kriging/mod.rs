use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;

use crate::error::{Error, Result};

pub mod cancellation;
pub mod cross_validation;
pub mod estimator;
pub mod grid;

/// Outcome of one target.
#[derive(Clone, Debug, PartialEq)]
pub enum TargetStatus {
    Estimated,
    /// Why no estimate was produced. Only per-target error kinds appear here.
    Unestimated(Error),
}

#[derive(Clone, Debug, PartialEq)]
pub struct EstimationResult {
    /// `NaN` when unestimated.
    pub estimate: f64,
    /// `NaN` when unestimated.
    pub variance: f64,
    pub n_samples: usize,
    pub status: TargetStatus,
    /// `(sample index, weight)` pairs in neighborhood order, when requested.
    pub weights: Option<Vec<(usize, f64)>>,
    pub lagrange: Option<Vec<f64>>,
}

impl EstimationResult {
    pub fn estimated(estimate: f64, variance: f64, n_samples: usize) -> Self {
        Self {
            estimate,
            variance,
            n_samples,
            status: TargetStatus::Estimated,
            weights: None,
            lagrange: None,
        }
    }

    pub fn unestimated(reason: Error, n_samples: usize) -> Self {
        Self {
            estimate: f64::NAN,
            variance: f64::NAN,
            n_samples,
            status: TargetStatus::Unestimated(reason),
            weights: None,
            lagrange: None,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.status == TargetStatus::Estimated
    }

    pub fn reason(&self) -> Option<&Error> {
        match &self.status {
            TargetStatus::Estimated => None,
            TargetStatus::Unestimated(reason) => Some(reason),
        }
    }

    /// `(estimate, variance)`, or the reason the target was skipped.
    pub fn value(&self) -> Result<(f64, f64)> {
        match &self.status {
            TargetStatus::Estimated => Ok((self.estimate, self.variance)),
            TargetStatus::Unestimated(reason) => Err(reason.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// At least one target was skipped because the run was cancelled.
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ValueStatistics {
    fn from_values<I>(values: I) -> Option<Self>
    where
        I: Iterator<Item = f64> + Clone,
    {
        let (min, max) = match values.clone().map(OrderedFloat).minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(v) => (v.0, v.0),
            MinMaxResult::MinMax(lo, hi) => (lo.0, hi.0),
        };
        let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
        Some(Self {
            min,
            max,
            mean: sum / n as f64,
        })
    }
}

/// Counts and value ranges of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub n_targets: usize,
    pub n_estimated: usize,
    pub n_insufficient: usize,
    pub n_singular: usize,
    pub n_cancelled: usize,
    pub estimate: Option<ValueStatistics>,
    pub variance: Option<ValueStatistics>,
}

impl RunSummary {
    pub fn from_results(results: &[EstimationResult]) -> Self {
        let mut summary = Self {
            n_targets: results.len(),
            n_estimated: 0,
            n_insufficient: 0,
            n_singular: 0,
            n_cancelled: 0,
            estimate: None,
            variance: None,
        };

        for r in results {
            match r.reason() {
                None => summary.n_estimated += 1,
                Some(Error::InsufficientNeighborhood { .. }) => summary.n_insufficient += 1,
                Some(Error::SingularSystem { .. }) => summary.n_singular += 1,
                Some(Error::Cancelled) => summary.n_cancelled += 1,
                Some(Error::Configuration(_)) => {}
            }
        }

        let estimated = results.iter().filter(|r| r.is_estimated());
        summary.estimate = ValueStatistics::from_values(estimated.clone().map(|r| r.estimate));
        summary.variance = ValueStatistics::from_values(estimated.map(|r| r.variance));
        summary
    }

    pub fn n_unestimated(&self) -> usize {
        self.n_targets - self.n_estimated
    }
}

/// Results in target order.
#[derive(Clone, Debug, PartialEq)]
pub struct EstimationOutput {
    pub results: Vec<EstimationResult>,
    pub status: RunStatus,
    pub summary: RunSummary,
}

impl EstimationOutput {
    pub fn new(results: Vec<EstimationResult>) -> Self {
        let summary = RunSummary::from_results(&results);
        let status = if summary.n_cancelled > 0 {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        Self {
            results,
            status,
            summary,
        }
    }

    pub fn estimates(&self) -> impl Iterator<Item = f64> + '_ {
        self.results.iter().map(|r| r.estimate)
    }

    pub fn variances(&self) -> impl Iterator<Item = f64> + '_ {
        self.results.iter().map(|r| r.variance)
    }
}
