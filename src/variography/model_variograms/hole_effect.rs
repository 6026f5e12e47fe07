use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::geometry::anisotropy::Anisotropy;

use super::VariogramModel;

/// Cosine hole effect, periodic with the range as half wavelength.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoleEffectVariogram {
    pub sill: f64,
    pub anisotropy: Anisotropy,
}

impl HoleEffectVariogram {
    pub fn new(sill: f64, anisotropy: Anisotropy) -> Self {
        Self { sill, anisotropy }
    }
}

impl VariogramModel for HoleEffectVariogram {
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
        self.sill * (PI * self.anisotropy.normalized_distance(&h)).cos()
    }
}
