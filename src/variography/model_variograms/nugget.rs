use nalgebra::Vector3;

use super::{is_zero_lag, VariogramModel};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Nugget {
    pub nugget: f64,
}

impl Nugget {
    pub fn new(nugget: f64) -> Self {
        Self { nugget }
    }
}

impl VariogramModel for Nugget {
    #[inline(always)]
    fn c_0(&self) -> f64 {
        self.nugget
    }

    #[inline(always)]
    fn variogram(&self, h: Vector3<f64>) -> f64 {
        if is_zero_lag(h) {
            0.0
        } else {
            self.nugget
        }
    }

    #[inline(always)]
    fn covariogram(&self, h: Vector3<f64>) -> f64 {
        self.nugget - self.variogram(h)
    }
}
