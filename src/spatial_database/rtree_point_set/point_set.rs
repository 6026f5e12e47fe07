use ordered_float::OrderedFloat;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};

use crate::error::Result;
use crate::geometry::{aabb::Aabb, ellipsoid::Ellipsoid};
use crate::spatial_database::conditioning::ConditioningDataCollector;
use crate::spatial_database::{Neighborhood, Sample, SearchParameters};

type Point = GeomWithData<[f64; 3], usize>;

/// Candidate buffer entry: squared normalized distance and sample index.
pub type Candidate = (OrderedFloat<f64>, usize);

/// Conditioning samples indexed by an R-tree on their positions.
#[derive(Clone, Debug)]
pub struct SampleSet {
    tree: RTree<Point>,
    samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        for (i, s) in samples.iter().enumerate() {
            s.validate(i)?;
        }

        let tree_points = samples
            .iter()
            .enumerate()
            .map(|(i, s)| Point::new([s.position.x, s.position.y, s.position.z], i))
            .collect();
        let tree = RTree::bulk_load(tree_points);

        Ok(Self { tree, samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[inline(always)]
    pub fn sample(&self, ind: usize) -> &Sample {
        &self.samples[ind]
    }

    /// Weighted mean of the sample values, using unit weights where none are given.
    pub fn declustered_mean(&self) -> Option<f64> {
        let (sum, total) = self.samples.iter().fold((0.0, 0.0), |(sum, total), s| {
            let w = s.weight.unwrap_or(1.0);
            (sum + w * s.value, total + w)
        });
        (total > 0.0).then(|| sum / total)
    }

    /// Samples inside `ellipsoid` (already centered on the target), nearest first.
    pub fn search(&self, ellipsoid: &Ellipsoid, params: &SearchParameters) -> Neighborhood {
        let mut neighborhood = Neighborhood::with_capacity(params.max_samples);
        let mut candidates = Vec::new();
        self.search_into(ellipsoid, params, |_| false, &mut candidates, &mut neighborhood);
        neighborhood
    }

    /// Buffer-reusing search. Samples for which `exclude` returns true are skipped.
    ///
    /// Candidates are sorted by (normalized distance, sample index), so equidistant samples are
    /// always admitted in the same order.
    pub fn search_into<F>(
        &self,
        ellipsoid: &Ellipsoid,
        params: &SearchParameters,
        exclude: F,
        candidates: &mut Vec<Candidate>,
        neighborhood: &mut Neighborhood,
    ) where
        F: Fn(usize) -> bool,
    {
        neighborhood.clear();
        candidates.clear();

        // widen slightly so samples on the ellipsoid surface survive rounding in the box
        let bbox = ellipsoid.bounding_box();
        let (lo, hi) = Aabb::new(bbox.center, bbox.half_extents * (1.0 + 1e-9)).corners();

        candidates.extend(
            self.tree
                .locate_in_envelope(&AABB::from_corners(lo, hi))
                .filter_map(|geom| {
                    let ind = geom.data;
                    let sample = &self.samples[ind];
                    if exclude(ind) || !params.accepts_value(sample.value) {
                        return None;
                    }
                    let dist = ellipsoid.normalized_distance_sq(&sample.position);
                    (dist <= 1.0).then_some((OrderedFloat(dist), ind))
                }),
        );
        candidates.sort_unstable();

        let mut collector = ConditioningDataCollector::new(ellipsoid, params);
        for (dist, ind) in candidates.iter() {
            collector.insert(&self.samples[*ind].position, dist.0, *ind, neighborhood);
            if collector.stop {
                break;
            }
        }
    }
}
