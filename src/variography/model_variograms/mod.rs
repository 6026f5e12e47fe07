use nalgebra::Vector3;

pub mod composite;
pub mod exponential;
pub mod gaussian;
pub mod hole_effect;
pub mod nugget;
pub mod power;
pub mod spherical;

/// Squared lag below which two locations are treated as coincident.
pub const ZERO_LAG_SQ: f64 = 1e-10;

#[inline(always)]
pub fn is_zero_lag(h: Vector3<f64>) -> bool {
    h.norm_squared() < ZERO_LAG_SQ
}

pub trait VariogramModel: Clone + Send + Sync {
    /// Covariance at zero lag.
    fn c_0(&self) -> f64;
    fn variogram(&self, h: Vector3<f64>) -> f64;
    fn covariogram(&self, h: Vector3<f64>) -> f64;
}
