use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    geometry::{anisotropy::Anisotropy, ellipsoid::Ellipsoid},
};

pub mod conditioning;
pub mod rtree_point_set;
pub mod zero_mean;

/// A conditioning datum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub position: Point3<f64>,
    pub value: f64,
    /// Declustering weight.
    pub weight: Option<f64>,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64, value: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
            value,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub(crate) fn validate(&self, ind: usize) -> Result<()> {
        if !self.position.iter().all(|c| c.is_finite()) || !self.value.is_finite() {
            return Err(Error::config(format!(
                "sample {ind} has non-finite coordinates or value"
            )));
        }
        if let Some(w) = self.weight {
            if !(w.is_finite() && w >= 0.0) {
                return Err(Error::config(format!(
                    "sample {ind} has invalid weight {w}"
                )));
            }
        }
        Ok(())
    }
}

/// Axes used to assign samples to octants around a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OctantAxes {
    /// Easting, northing and elevation.
    #[default]
    World,
    /// Major, minor and vertical axes of the search ellipsoid.
    Search,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParameters {
    /// Major, minor and vertical search radii.
    pub radii: [f64; 3],
    /// Azimuth, dip and plunge of the search ellipsoid in degrees.
    pub angles: [f64; 3],
    pub min_samples: usize,
    pub max_samples: usize,

    //limit on the number of samples per octant
    pub octant_search: bool,
    pub max_per_octant: usize,
    pub octant_axes: OctantAxes,

    //samples outside of this value range are ignored
    pub valid_value_range: [f64; 2],
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            radii: [1.0; 3],
            angles: [0.0; 3],
            min_samples: 1,
            max_samples: 16,
            octant_search: false,
            max_per_octant: 4,
            octant_axes: OctantAxes::World,
            valid_value_range: [-1.0e21, 1.0e21],
        }
    }
}

impl SearchParameters {
    pub fn new(radii: [f64; 3], angles: [f64; 3], min_samples: usize, max_samples: usize) -> Self {
        Self {
            radii,
            angles,
            min_samples,
            max_samples,
            ..Default::default()
        }
    }

    pub fn isotropic(radius: f64, min_samples: usize, max_samples: usize) -> Self {
        Self::new([radius; 3], [0.0; 3], min_samples, max_samples)
    }

    pub fn with_octants(mut self, max_per_octant: usize, axes: OctantAxes) -> Self {
        self.octant_search = true;
        self.max_per_octant = max_per_octant;
        self.octant_axes = axes;
        self
    }

    /// Samples required before a system is built. Never less than one.
    pub fn required_samples(&self) -> usize {
        self.min_samples.max(1)
    }

    pub fn validate(&self) -> Result<()> {
        Anisotropy::new(self.angles, self.radii)
            .map_err(|e| Error::config(format!("search ellipsoid: {e}")))?;

        if self.max_samples == 0 {
            return Err(Error::config("max_samples must be at least 1"));
        }
        if self.min_samples > self.max_samples {
            return Err(Error::config(format!(
                "min_samples ({}) exceeds max_samples ({})",
                self.min_samples, self.max_samples
            )));
        }
        if self.octant_search && self.max_per_octant == 0 {
            return Err(Error::config("max_per_octant must be at least 1 with octant search"));
        }
        let [lo, hi] = self.valid_value_range;
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(Error::config(format!(
                "invalid value range [{lo}, {hi}]"
            )));
        }
        Ok(())
    }

    pub fn ellipsoid(&self) -> Result<Ellipsoid> {
        let [a, b, c] = self.radii;
        Ellipsoid::new(a, b, c, self.angles)
    }

    #[inline(always)]
    pub fn accepts_value(&self, value: f64) -> bool {
        value >= self.valid_value_range[0] && value <= self.valid_value_range[1]
    }
}

/// Octant of an offset, numbered 0..8.
#[inline(always)]
pub fn octant(offset: &Vector3<f64>) -> usize {
    match (offset.x >= 0.0, offset.y >= 0.0, offset.z >= 0.0) {
        (true, true, true) => 0,
        (false, true, true) => 1,
        (false, false, true) => 2,
        (true, false, true) => 3,
        (true, true, false) => 4,
        (false, true, false) => 5,
        (false, false, false) => 6,
        (true, false, false) => 7,
    }
}

/// Samples selected for one target, ordered by increasing normalized distance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Neighborhood {
    pub indices: Vec<usize>,
    /// Squared normalized distance of each sample to the target.
    pub distances: Vec<f64>,
    pub octant_counts: [usize; 8],
}

impl Neighborhood {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            indices: Vec::with_capacity(n),
            distances: Vec::with_capacity(n),
            octant_counts: [0; 8],
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.distances.clear();
        self.octant_counts = [0; 8];
    }

    pub fn conditioned_octants(&self) -> usize {
        self.octant_counts.iter().filter(|c| **c > 0).count()
    }
}
