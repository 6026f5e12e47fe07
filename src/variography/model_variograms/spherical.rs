use nalgebra::Vector3;

use crate::geometry::anisotropy::Anisotropy;

use super::VariogramModel;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphericalVariogram {
    pub sill: f64,
    pub anisotropy: Anisotropy,
}

impl SphericalVariogram {
    pub fn new(sill: f64, anisotropy: Anisotropy) -> Self {
        Self { sill, anisotropy }
    }

    /// Covariance at a normalized distance.
    #[inline(always)]
    pub fn iso_covariogram(&self, h: f64) -> f64 {
        if h < 1.0 {
            self.sill * (1.0 - h * (1.5 - 0.5 * h * h))
        } else {
            0.0
        }
    }
}

impl VariogramModel for SphericalVariogram {
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
