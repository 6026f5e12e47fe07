/// Shift between values and their residuals about a stationary mean.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZeroMeanTransform {
    mean: f64,
}

impl ZeroMeanTransform {
    pub fn new(mean: f64) -> Self {
        Self { mean }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    #[inline(always)]
    pub fn transform(&self, data: f64) -> f64 {
        data - self.mean
    }

    #[inline(always)]
    pub fn back_transform(&self, data: f64) -> f64 {
        data + self.mean
    }
}

impl From<&[f64]> for ZeroMeanTransform {
    fn from(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self::new(0.0);
        }
        Self::new(data.iter().sum::<f64>() / data.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residuals_are_centered() {
        let data = [1.0, 2.0, 6.0];
        let t = ZeroMeanTransform::from(&data[..]);
        assert_eq!(t.mean(), 3.0);
        let residuals = data.iter().map(|d| t.transform(*d)).collect::<Vec<_>>();
        assert_eq!(residuals, vec![-2.0, -1.0, 3.0]);
        assert_eq!(t.back_transform(-2.0), 1.0);
    }

    #[test]
    fn empty_data_has_zero_mean() {
        assert_eq!(ZeroMeanTransform::from(&[][..]).mean(), 0.0);
    }
}
