use nalgebra::Point3;

use crate::geometry::ellipsoid::Ellipsoid;

use super::{octant, Neighborhood, OctantAxes, SearchParameters};

/// Admits candidates, visited in order of increasing distance, into a [`Neighborhood`] while
/// respecting the sample limit and the per-octant quota.
pub struct ConditioningDataCollector<'b> {
    pub ellipsoid: &'b Ellipsoid,
    pub max_samples: usize,
    pub octant_quota: usize,
    pub octant_axes: OctantAxes,
    pub full_octants: u8,
    pub stop: bool,
}

impl<'b> ConditioningDataCollector<'b> {
    pub fn new(ellipsoid: &'b Ellipsoid, params: &SearchParameters) -> Self {
        let octant_quota = if params.octant_search {
            params.max_per_octant
        } else {
            usize::MAX
        };
        Self {
            ellipsoid,
            max_samples: params.max_samples,
            octant_quota,
            octant_axes: params.octant_axes,
            full_octants: 0,
            stop: params.max_samples == 0,
        }
    }

    #[inline(always)]
    pub fn all_octants_full(&self) -> bool {
        self.full_octants == 8
    }

    /// Offer one candidate. `dist` is its squared normalized distance to the target.
    #[inline(always)]
    pub fn insert(
        &mut self,
        point: &Point3<f64>,
        dist: f64,
        ind: usize,
        neighborhood: &mut Neighborhood,
    ) {
        if self.stop {
            return;
        }

        let offset = match self.octant_axes {
            OctantAxes::World => point - self.ellipsoid.center,
            OctantAxes::Search => self.ellipsoid.local_offset(point),
        };
        let octant = octant(&offset);

        let count = &mut neighborhood.octant_counts[octant];
        if *count >= self.octant_quota {
            return;
        }
        *count += 1;
        if *count == self.octant_quota {
            self.full_octants += 1;
        }

        neighborhood.indices.push(ind);
        neighborhood.distances.push(dist);

        if neighborhood.len() >= self.max_samples || self.all_octants_full() {
            self.stop = true;
        }
    }
}
