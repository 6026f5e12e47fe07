use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use nalgebra::Point3;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geometry::{ellipsoid::Ellipsoid, support::Support};
use crate::spatial_database::{
    rtree_point_set::point_set::{Candidate, SampleSet},
    Neighborhood, SearchParameters,
};
use crate::systems::{
    lu::{LUSystem, DEFAULT_PIVOT_TOLERANCE},
    KrigingType,
};
use crate::variography::model_variograms::composite::CompositeVariogram;

use super::{cancellation::CancellationToken, EstimationOutput, EstimationResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorOptions {
    /// Worker threads. Zero uses one per available core.
    pub threads: usize,
    /// Record the kriging weights and Lagrange multipliers of every target.
    pub keep_weights: bool,
    pub progress_bar: bool,
    pub pivot_tolerance: f64,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            keep_weights: false,
            progress_bar: false,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
        }
    }
}

impl EstimatorOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.pivot_tolerance.is_finite() && self.pivot_tolerance >= 0.0) {
            return Err(Error::config(format!(
                "pivot tolerance must be finite and non-negative, got {}",
                self.pivot_tolerance
            )));
        }
        Ok(())
    }
}

/// Per-worker scratch space, reused across targets.
struct Workspace {
    system: LUSystem,
    ellipsoid: Ellipsoid,
    neighborhood: Neighborhood,
    candidates: Vec<Candidate>,
}

/// Kriging estimator over a fixed sample set, variogram model and search strategy.
pub struct Estimator {
    samples: SampleSet,
    variogram: CompositeVariogram,
    search: SearchParameters,
    ellipsoid: Ellipsoid,
    kriging_type: KrigingType,
    options: EstimatorOptions,
    drift_scale: f64,
    pool: ThreadPool,
    progress: Arc<AtomicUsize>,
}

impl Estimator {
    /// Validates every parameter; nothing is estimated if this fails.
    pub fn new(
        samples: SampleSet,
        variogram: CompositeVariogram,
        search: SearchParameters,
        kriging_type: KrigingType,
        options: EstimatorOptions,
    ) -> Result<Self> {
        search.validate()?;
        kriging_type.validate()?;
        options.validate()?;

        let ellipsoid = search.ellipsoid()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .build()
            .map_err(|e| Error::config(format!("failed to build thread pool: {e}")))?;

        let drift_scale = search.radii.iter().copied().fold(0.0, f64::max);

        Ok(Self {
            samples,
            variogram,
            search,
            ellipsoid,
            kriging_type,
            options,
            drift_scale,
            pool,
            progress: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    pub fn variogram(&self) -> &CompositeVariogram {
        &self.variogram
    }

    pub fn search(&self) -> &SearchParameters {
        &self.search
    }

    pub fn kriging_type(&self) -> &KrigingType {
        &self.kriging_type
    }

    pub fn options(&self) -> &EstimatorOptions {
        &self.options
    }

    /// Number of targets processed by the current or last run. Can be polled from any thread.
    ///
    /// The counter is shared by every run of this estimator and reset to zero when a run starts,
    /// so it counts per run. Targets skipped after cancellation are not counted.
    pub fn progress(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.progress)
    }

    /// Estimate every target. Results are returned in target order.
    pub fn estimate(&self, targets: &[Support]) -> Result<EstimationOutput> {
        self.estimate_with_cancel(targets, &CancellationToken::new())
    }

    /// Like [`Estimator::estimate`]; targets not yet started when `cancel` is set are reported
    /// as cancelled.
    pub fn estimate_with_cancel(
        &self,
        targets: &[Support],
        cancel: &CancellationToken,
    ) -> Result<EstimationOutput> {
        self.run(targets, cancel, |_, _| false)
    }

    /// Shared driver. `exclude(center, ind)` drops sample `ind` from the search around `center`.
    pub(crate) fn run<F>(
        &self,
        targets: &[Support],
        cancel: &CancellationToken,
        exclude: F,
    ) -> Result<EstimationOutput>
    where
        F: Fn(&Point3<f64>, usize) -> bool + Sync,
    {
        for (i, target) in targets.iter().enumerate() {
            target.validate().map_err(|e| match e {
                Error::Configuration(msg) => Error::config(format!("target {i}: {msg}")),
                other => other,
            })?;
        }

        self.progress.store(0, Ordering::Relaxed);
        info!(
            targets = targets.len(),
            samples = self.samples.len(),
            threads = self.pool.current_num_threads(),
            kriging_type = ?self.kriging_type,
            "starting estimation"
        );

        let bar = if self.options.progress_bar {
            ProgressBar::new(targets.len() as u64).with_style(ProgressStyle::default_bar())
        } else {
            ProgressBar::hidden()
        };

        let results = self.pool.install(|| {
            targets
                .par_iter()
                .progress_with(bar.clone())
                .map_init(
                    || self.workspace(),
                    |ws, target| {
                        if cancel.is_cancelled() {
                            return EstimationResult::unestimated(Error::Cancelled, 0);
                        }
                        let result = self.estimate_target(target, ws, &exclude);
                        self.progress.fetch_add(1, Ordering::Relaxed);
                        result
                    },
                )
                .collect::<Vec<_>>()
        });
        bar.finish_and_clear();

        let output = EstimationOutput::new(results);

        let summary = &output.summary;
        info!(
            estimated = summary.n_estimated,
            insufficient = summary.n_insufficient,
            singular = summary.n_singular,
            cancelled = summary.n_cancelled,
            status = ?output.status,
            "estimation finished"
        );
        Ok(output)
    }

    fn workspace(&self) -> Workspace {
        Workspace {
            system: LUSystem::new(self.search.max_samples, self.kriging_type.num_constraints()),
            ellipsoid: self.ellipsoid.clone(),
            neighborhood: Neighborhood::with_capacity(self.search.max_samples),
            candidates: Vec::new(),
        }
    }

    fn estimate_target<F>(&self, target: &Support, ws: &mut Workspace, exclude: &F) -> EstimationResult
    where
        F: Fn(&Point3<f64>, usize) -> bool,
    {
        let center = target.center();
        ws.ellipsoid.translate_to(&center);
        self.samples.search_into(
            &ws.ellipsoid,
            &self.search,
            |ind| exclude(&center, ind),
            &mut ws.candidates,
            &mut ws.neighborhood,
        );

        let found = ws.neighborhood.len();
        let required = self.search.required_samples();
        if found < required {
            debug!(?center, found, required, "too few samples in search neighborhood");
            return EstimationResult::unestimated(
                Error::InsufficientNeighborhood { found, required },
                found,
            );
        }

        let samples = self.samples.samples();
        let inds = &ws.neighborhood.indices;
        ws.system.build(
            inds.iter().map(|i| samples[*i].position),
            target,
            &self.variogram,
            &self.kriging_type,
            self.drift_scale,
        );

        let solved = match ws.system.solve(self.options.pivot_tolerance) {
            Ok(solved) => solved,
            Err(err) => {
                warn!(?center, %err, "target left unestimated");
                return EstimationResult::unestimated(err, found);
            }
        };

        let estimate = solved.estimate(&self.kriging_type, inds.iter().map(|i| samples[*i].value));
        let mut result = EstimationResult::estimated(estimate, solved.variance(), found);
        if self.options.keep_weights {
            result.weights = Some(inds.iter().copied().zip(solved.weights().iter().copied()).collect());
            result.lagrange = Some(solved.lagrange().collect());
        }
        result
    }
}
