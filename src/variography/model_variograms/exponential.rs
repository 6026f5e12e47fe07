use nalgebra::Vector3;

use crate::geometry::anisotropy::Anisotropy;

use super::VariogramModel;

/// Exponential structure parameterized by its practical range (95% of the sill).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialVariogram {
    pub sill: f64,
    pub anisotropy: Anisotropy,
}

impl ExponentialVariogram {
    pub fn new(sill: f64, anisotropy: Anisotropy) -> Self {
        Self { sill, anisotropy }
    }

    #[inline(always)]
    pub fn iso_covariogram(&self, h: f64) -> f64 {
        self.sill * (-3.0 * h).exp()
    }
}

impl VariogramModel for ExponentialVariogram {
    #[inline(always)]
    fn c_0(&self) -> f64 {
        self.sill
    }

    #[inline(always)]
    fn variogram(&self, h: Vector3<f64>) -> f64 {
        self.sill - self.covariogram(h)
    }

    #[inline(always)]
    fn covariogram(&self, h: Vector3<f64>) -> f64 {
        self.iso_covariogram(self.anisotropy.normalized_distance(&h))
    }
}
