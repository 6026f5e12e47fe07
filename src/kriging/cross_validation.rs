use crate::error::Result;
use crate::geometry::support::Support;
use crate::variography::model_variograms::is_zero_lag;

use super::{
    cancellation::CancellationToken, estimator::Estimator, EstimationOutput, RunStatus,
};

/// Leave-one-out error statistics over the estimated samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossValidationSummary {
    pub n_estimated: usize,
    /// Mean of `estimate - true value`.
    pub mean_error: f64,
    pub mean_squared_error: f64,
    /// Mean of `error² / variance` over targets with positive variance. Near one when the
    /// variogram model describes the data well.
    pub mean_standardized_squared_error: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CrossValidation {
    /// One result per sample, in sample order.
    pub output: EstimationOutput,
    /// `estimate - true value`, `None` where the sample could not be re-estimated.
    pub errors: Vec<Option<f64>>,
    pub summary: Option<CrossValidationSummary>,
}

impl CrossValidation {
    pub fn status(&self) -> RunStatus {
        self.output.status
    }
}

impl Estimator {
    /// Re-estimate every sample location with the samples collocated with it removed.
    pub fn cross_validate(&self) -> Result<CrossValidation> {
        self.cross_validate_with_cancel(&CancellationToken::new())
    }

    pub fn cross_validate_with_cancel(&self, cancel: &CancellationToken) -> Result<CrossValidation> {
        let samples = self.samples().samples();
        let targets = samples
            .iter()
            .map(|s| Support::Point(s.position))
            .collect::<Vec<_>>();

        let output = self.run(&targets, cancel, |center, ind| {
            is_zero_lag(samples[ind].position - center)
        })?;

        let errors = output
            .results
            .iter()
            .zip(samples)
            .map(|(r, s)| r.is_estimated().then(|| r.estimate - s.value))
            .collect::<Vec<_>>();

        let summary = summarize(&output, &errors);
        Ok(CrossValidation {
            output,
            errors,
            summary,
        })
    }
}

fn summarize(output: &EstimationOutput, errors: &[Option<f64>]) -> Option<CrossValidationSummary> {
    let (mut n, mut sum, mut sum_sq) = (0usize, 0.0, 0.0);
    let (mut n_std, mut sum_std) = (0usize, 0.0);

    for (r, err) in output.results.iter().zip(errors) {
        let Some(err) = err else { continue };
        n += 1;
        sum += err;
        sum_sq += err * err;
        if r.variance > 0.0 {
            n_std += 1;
            sum_std += err * err / r.variance;
        }
    }

    (n > 0).then(|| CrossValidationSummary {
        n_estimated: n,
        mean_error: sum / n as f64,
        mean_squared_error: sum_sq / n as f64,
        mean_standardized_squared_error: if n_std > 0 {
            sum_std / n_std as f64
        } else {
            f64::NAN
        },
    })
}
