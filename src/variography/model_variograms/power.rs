use nalgebra::Vector3;

use crate::geometry::anisotropy::Anisotropy;

use super::VariogramModel;

/// Pseudo-sill turning the unbounded power variogram into a covariance.
pub const PMX: f64 = 999.0;

/// Power structure `slope * h^exponent`, with `0 < exponent < 2`.
///
/// The anisotropy ranges act as distance units along each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerVariogram {
    pub slope: f64,
    pub exponent: f64,
    pub anisotropy: Anisotropy,
}

impl PowerVariogram {
    pub fn new(slope: f64, exponent: f64, anisotropy: Anisotropy) -> Self {
        Self {
            slope,
            exponent,
            anisotropy,
        }
    }
}

impl VariogramModel for PowerVariogram {
    #[inline(always)]
    fn c_0(&self) -> f64 {
        PMX
    }

    #[inline(always)]
    fn variogram(&self, h: Vector3<f64>) -> f64 {
        self.slope * self.anisotropy.normalized_distance(&h).powf(self.exponent)
    }

    #[inline(always)]
    fn covariogram(&self, h: Vector3<f64>) -> f64 {
        PMX - self.variogram(h)
    }
}
