use nalgebra::Vector3;

use crate::geometry::anisotropy::Anisotropy;

use super::VariogramModel;

/// Gaussian structure parameterized by its practical range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianVariogram {
    pub sill: f64,
    pub anisotropy: Anisotropy,
}

impl GaussianVariogram {
    pub fn new(sill: f64, anisotropy: Anisotropy) -> Self {
        Self { sill, anisotropy }
    }

    #[inline(always)]
    pub fn iso_covariogram(&self, h: f64) -> f64 {
        self.sill * (-3.0 * h * h).exp()
    }
}

impl VariogramModel for GaussianVariogram {
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
        self.sill * (-3.0 * self.anisotropy.normalized_distance_sq(&h)).exp()
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn gaussian_is_flat_near_origin() {
        let vgram = GaussianVariogram::new(1.0, Anisotropy::isotropic(100.0).unwrap());
        let near = vgram.variogram(Vector3::new(1.0, 0.0, 0.0));
        assert!(near < 1e-3);
        assert_relative_eq!(
            vgram.variogram(Vector3::new(100.0, 0.0, 0.0)),
            1.0 - (-3.0f64).exp(),
            epsilon = 1e-12
        );
    }
}
