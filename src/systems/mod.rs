use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod lu;
pub mod solved_system;
pub mod system_builder;

/// Flavor of kriging system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KrigingType {
    /// Known stationary mean, no unbiasedness constraint.
    Simple { mean: f64 },
    /// Unknown constant mean: weights sum to one.
    #[default]
    Ordinary,
    /// Unknown mean with a polynomial trend in the coordinates.
    Universal { drift: DriftTerms },
}

impl KrigingType {
    /// Rows appended to the covariance block of the system.
    pub fn num_constraints(&self) -> usize {
        match self {
            KrigingType::Simple { .. } => 0,
            KrigingType::Ordinary => 1,
            KrigingType::Universal { drift } => 1 + drift.count(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            KrigingType::Simple { mean } if !mean.is_finite() => Err(Error::config(format!(
                "simple kriging mean must be finite, got {mean}"
            ))),
            KrigingType::Universal { drift } => drift.validate(),
            _ => Ok(()),
        }
    }
}

/// Drift terms for universal kriging, evaluated on coordinates relative to the target.
///
/// A quadratic term needs the linear terms of its axes: `(x - x0)²` only spans the same trend
/// surface as `x²` once `x` is present, and likewise for the cross terms. With that closure the
/// trend does not depend on where the target sits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftTerms {
    pub x: bool,
    pub y: bool,
    pub z: bool,
    pub xx: bool,
    pub yy: bool,
    pub zz: bool,
    pub xy: bool,
    pub xz: bool,
    pub yz: bool,
}

impl DriftTerms {
    pub fn linear() -> Self {
        Self {
            x: true,
            y: true,
            z: true,
            ..Default::default()
        }
    }

    /// Linear drift in the horizontal plane only.
    pub fn linear_xy() -> Self {
        Self {
            x: true,
            y: true,
            ..Default::default()
        }
    }

    pub fn quadratic() -> Self {
        Self {
            x: true,
            y: true,
            z: true,
            xx: true,
            yy: true,
            zz: true,
            xy: true,
            xz: true,
            yz: true,
        }
    }

    fn flags(&self) -> [bool; 9] {
        [
            self.x, self.y, self.z, self.xx, self.yy, self.zz, self.xy, self.xz, self.yz,
        ]
    }

    /// Every enabled quadratic term must come with the linear terms of its axes.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("xx", self.xx, [self.x, true]),
            ("yy", self.yy, [self.y, true]),
            ("zz", self.zz, [self.z, true]),
            ("xy", self.xy, [self.x, self.y]),
            ("xz", self.xz, [self.x, self.z]),
            ("yz", self.yz, [self.y, self.z]),
        ];
        match required
            .iter()
            .find(|(_, on, linear)| *on && !linear.iter().all(|l| *l))
        {
            Some((name, ..)) => Err(Error::config(format!(
                "drift term {name} requires the linear terms of its axes"
            ))),
            None => Ok(()),
        }
    }

    pub fn count(&self) -> usize {
        self.flags().iter().filter(|f| **f).count()
    }

    /// Push the enabled terms at offset `d`, in x, y, z, xx, yy, zz, xy, xz, yz order.
    #[inline(always)]
    pub fn evaluate(&self, d: &Vector3<f64>, out: &mut Vec<f64>) {
        let terms = [
            d.x,
            d.y,
            d.z,
            d.x * d.x,
            d.y * d.y,
            d.z * d.z,
            d.x * d.y,
            d.x * d.z,
            d.y * d.z,
        ];
        out.extend(
            self.flags()
                .iter()
                .zip(terms)
                .filter_map(|(on, t)| on.then_some(t)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_counts() {
        assert_eq!(KrigingType::Simple { mean: 1.0 }.num_constraints(), 0);
        assert_eq!(KrigingType::Ordinary.num_constraints(), 1);
        let uk = KrigingType::Universal {
            drift: DriftTerms::linear(),
        };
        assert_eq!(uk.num_constraints(), 4);
        assert_eq!(DriftTerms::quadratic().count(), 9);
    }

    #[test]
    fn quadratic_terms_need_their_linear_terms() {
        let xx_only = DriftTerms {
            xx: true,
            ..Default::default()
        };
        let uk = |drift| KrigingType::Universal { drift };
        assert!(matches!(uk(xx_only).validate(), Err(Error::Configuration(_))));

        let xy_without_y = DriftTerms {
            x: true,
            xy: true,
            ..Default::default()
        };
        assert!(uk(xy_without_y).validate().is_err());

        assert!(uk(DriftTerms::quadratic()).validate().is_ok());
        assert!(uk(DriftTerms::linear_xy()).validate().is_ok());
        assert!(uk(DriftTerms {
            x: true,
            xx: true,
            ..Default::default()
        })
        .validate()
        .is_ok());
    }

    #[test]
    fn drift_terms_in_fixed_order() {
        let drift = DriftTerms {
            x: true,
            z: true,
            zz: true,
            xy: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        drift.evaluate(&Vector3::new(2.0, 3.0, 4.0), &mut out);
        assert_eq!(out, vec![2.0, 4.0, 16.0, 6.0]);
    }

    #[test]
    fn kriging_type_from_json() {
        let sk: KrigingType = serde_json::from_str(r#"{"type": "simple", "mean": 2.5}"#).unwrap();
        assert_eq!(sk, KrigingType::Simple { mean: 2.5 });

        let uk: KrigingType =
            serde_json::from_str(r#"{"type": "universal", "drift": {"x": true, "y": true}}"#)
                .unwrap();
        assert_eq!(
            uk,
            KrigingType::Universal {
                drift: DriftTerms::linear_xy()
            }
        );

        assert!(KrigingType::Simple { mean: f64::NAN }.validate().is_err());
    }
}
