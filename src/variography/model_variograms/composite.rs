use std::{fmt, str::FromStr};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    geometry::anisotropy::Anisotropy,
};

use super::{
    exponential::ExponentialVariogram, gaussian::GaussianVariogram,
    hole_effect::HoleEffectVariogram, is_zero_lag, nugget::Nugget, power::PowerVariogram,
    spherical::SphericalVariogram, VariogramModel,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Nugget,
    Spherical,
    Exponential,
    Gaussian,
    Power,
    HoleEffect,
}

impl FromStr for StructureKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nugget" | "nug" => Ok(Self::Nugget),
            "spherical" | "sph" => Ok(Self::Spherical),
            "exponential" | "exp" => Ok(Self::Exponential),
            "gaussian" | "gau" => Ok(Self::Gaussian),
            "power" | "pow" => Ok(Self::Power),
            "hole_effect" | "hole-effect" | "hol" => Ok(Self::HoleEffect),
            other => Err(Error::config(format!("unknown variogram structure type '{other}'"))),
        }
    }
}

/// GSLIB `it` codes.
impl TryFrom<u8> for StructureKind {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::Spherical),
            2 => Ok(Self::Exponential),
            3 => Ok(Self::Gaussian),
            4 => Ok(Self::Power),
            5 => Ok(Self::HoleEffect),
            other => Err(Error::config(format!("unknown variogram structure code {other}"))),
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nugget => "nugget",
            Self::Spherical => "spherical",
            Self::Exponential => "exponential",
            Self::Gaussian => "gaussian",
            Self::Power => "power",
            Self::HoleEffect => "hole_effect",
        };
        f.write_str(name)
    }
}

fn unit_ranges() -> [f64; 3] {
    [1.0; 3]
}

/// Parameters of one nested structure, as supplied by configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureSpec {
    pub kind: StructureKind,
    /// Sill contribution (slope for the power model).
    pub contribution: f64,
    /// Ranges along the major, minor and vertical axes.
    #[serde(default = "unit_ranges")]
    pub ranges: [f64; 3],
    /// Azimuth, dip and plunge in degrees.
    #[serde(default)]
    pub angles: [f64; 3],
    /// Power model exponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f64>,
}

impl StructureSpec {
    pub fn new(kind: StructureKind, contribution: f64, ranges: [f64; 3], angles: [f64; 3]) -> Self {
        Self {
            kind,
            contribution,
            ranges,
            angles,
            exponent: None,
        }
    }

    pub fn nugget(contribution: f64) -> Self {
        Self::new(StructureKind::Nugget, contribution, unit_ranges(), [0.0; 3])
    }

    pub fn isotropic(kind: StructureKind, contribution: f64, range: f64) -> Self {
        Self::new(kind, contribution, [range; 3], [0.0; 3])
    }

    pub fn power(slope: f64, exponent: f64) -> Self {
        Self {
            exponent: Some(exponent),
            ..Self::new(StructureKind::Power, slope, unit_ranges(), [0.0; 3])
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum VariogramType {
    Nugget(Nugget),
    Spherical(SphericalVariogram),
    Exponential(ExponentialVariogram),
    Gaussian(GaussianVariogram),
    Power(PowerVariogram),
    HoleEffect(HoleEffectVariogram),
}

impl TryFrom<&StructureSpec> for VariogramType {
    type Error = Error;

    fn try_from(spec: &StructureSpec) -> Result<Self> {
        let c = spec.contribution;
        if !(c.is_finite() && c >= 0.0) {
            return Err(Error::config(format!(
                "{} contribution must be finite and non-negative, got {c}",
                spec.kind
            )));
        }

        if spec.kind == StructureKind::Nugget {
            return Ok(Self::Nugget(Nugget::new(c)));
        }

        let anisotropy = Anisotropy::new(spec.angles, spec.ranges)
            .map_err(|e| Error::config(format!("{} structure: {e}", spec.kind)))?;

        let vgram = match spec.kind {
            StructureKind::Spherical => Self::Spherical(SphericalVariogram::new(c, anisotropy)),
            StructureKind::Exponential => {
                Self::Exponential(ExponentialVariogram::new(c, anisotropy))
            }
            StructureKind::Gaussian => Self::Gaussian(GaussianVariogram::new(c, anisotropy)),
            StructureKind::HoleEffect => {
                Self::HoleEffect(HoleEffectVariogram::new(c, anisotropy))
            }
            StructureKind::Power => {
                let exponent = spec.exponent.ok_or_else(|| {
                    Error::config("power structure requires an exponent")
                })?;
                if !(exponent > 0.0 && exponent < 2.0) {
                    return Err(Error::config(format!(
                        "power exponent must lie in (0, 2), got {exponent}"
                    )));
                }
                Self::Power(PowerVariogram::new(c, exponent, anisotropy))
            }
            StructureKind::Nugget => unreachable!(),
        };

        Ok(vgram)
    }
}

impl VariogramModel for VariogramType {
    fn c_0(&self) -> f64 {
        match self {
            VariogramType::Nugget(v) => v.c_0(),
            VariogramType::Spherical(v) => v.c_0(),
            VariogramType::Exponential(v) => v.c_0(),
            VariogramType::Gaussian(v) => v.c_0(),
            VariogramType::Power(v) => v.c_0(),
            VariogramType::HoleEffect(v) => v.c_0(),
        }
    }

    fn variogram(&self, h: Vector3<f64>) -> f64 {
        match self {
            VariogramType::Nugget(v) => v.variogram(h),
            VariogramType::Spherical(v) => v.variogram(h),
            VariogramType::Exponential(v) => v.variogram(h),
            VariogramType::Gaussian(v) => v.variogram(h),
            VariogramType::Power(v) => v.variogram(h),
            VariogramType::HoleEffect(v) => v.variogram(h),
        }
    }

    fn covariogram(&self, h: Vector3<f64>) -> f64 {
        match self {
            VariogramType::Nugget(v) => v.covariogram(h),
            VariogramType::Spherical(v) => v.covariogram(h),
            VariogramType::Exponential(v) => v.covariogram(h),
            VariogramType::Gaussian(v) => v.covariogram(h),
            VariogramType::Power(v) => v.covariogram(h),
            VariogramType::HoleEffect(v) => v.covariogram(h),
        }
    }
}

/// Nested variogram model: the sum of its structures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StructureSpec>", into = "Vec<StructureSpec>")]
pub struct CompositeVariogram {
    specs: Vec<StructureSpec>,
    variograms: Vec<VariogramType>,
    c_0: f64,
    nugget: f64,
}

impl CompositeVariogram {
    pub fn new(specs: Vec<StructureSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::config("variogram model needs at least one structure"));
        }

        let variograms = specs
            .iter()
            .map(VariogramType::try_from)
            .collect::<Result<Vec<_>>>()?;

        let c_0 = variograms.iter().map(VariogramModel::c_0).sum();
        let nugget = variograms
            .iter()
            .filter_map(|v| match v {
                VariogramType::Nugget(n) => Some(n.nugget),
                _ => None,
            })
            .sum();

        Ok(Self {
            specs,
            variograms,
            c_0,
            nugget,
        })
    }

    pub fn specs(&self) -> &[StructureSpec] {
        &self.specs
    }

    pub fn variograms(&self) -> &[VariogramType] {
        &self.variograms
    }

    /// Total nugget contribution.
    pub fn nugget(&self) -> f64 {
        self.nugget
    }
}

impl TryFrom<Vec<StructureSpec>> for CompositeVariogram {
    type Error = Error;

    fn try_from(specs: Vec<StructureSpec>) -> Result<Self> {
        Self::new(specs)
    }
}

impl From<CompositeVariogram> for Vec<StructureSpec> {
    fn from(vgram: CompositeVariogram) -> Self {
        vgram.specs
    }
}

impl VariogramModel for CompositeVariogram {
    #[inline(always)]
    fn c_0(&self) -> f64 {
        self.c_0
    }

    #[inline(always)]
    fn variogram(&self, h: Vector3<f64>) -> f64 {
        self.c_0 - self.covariogram(h)
    }

    #[inline(always)]
    fn covariogram(&self, h: Vector3<f64>) -> f64 {
        if is_zero_lag(h) {
            return self.c_0;
        }
        self.variograms
            .iter()
            .fold(0.0, |acc, v| acc + v.covariogram(h))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn nested() -> CompositeVariogram {
        CompositeVariogram::new(vec![
            StructureSpec::nugget(0.2),
            StructureSpec::new(StructureKind::Spherical, 0.5, [100.0, 50.0, 20.0], [30.0, 0.0, 0.0]),
            StructureSpec::isotropic(StructureKind::Exponential, 0.3, 300.0),
        ])
        .unwrap()
    }

    #[test]
    fn zero_lag_is_total_sill() {
        let vgram = nested();
        assert_relative_eq!(vgram.c_0(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(vgram.covariogram(Vector3::zeros()), 1.0, epsilon = 1e-12);
        assert_relative_eq!(vgram.variogram(Vector3::zeros()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(vgram.nugget(), 0.2);
    }

    #[test]
    fn nugget_drops_off_immediately() {
        let vgram = nested();
        let cov = vgram.covariogram(Vector3::new(1e-3, 0.0, 0.0));
        assert!(cov < 0.8 + 1e-9);
        assert!(cov > 0.79);
    }

    #[test]
    fn bounded_structures_vanish_far_away() {
        let vgram = CompositeVariogram::new(vec![StructureSpec::isotropic(
            StructureKind::Spherical,
            1.0,
            100.0,
        )])
        .unwrap();
        assert_relative_eq!(vgram.covariogram(Vector3::new(100.0, 0.0, 0.0)), 0.0);
        assert_relative_eq!(vgram.covariogram(Vector3::new(1e6, 1e6, 0.0)), 0.0);
    }

    #[test]
    fn structures_keep_independent_rotations() {
        let vgram = CompositeVariogram::new(vec![
            StructureSpec::new(StructureKind::Spherical, 1.0, [100.0, 10.0, 10.0], [0.0; 3]),
            StructureSpec::new(StructureKind::Spherical, 1.0, [100.0, 10.0, 10.0], [90.0, 0.0, 0.0]),
        ])
        .unwrap();

        let north = vgram.covariogram(Vector3::new(0.0, 50.0, 0.0));
        let east = vgram.covariogram(Vector3::new(50.0, 0.0, 0.0));
        assert_relative_eq!(north, east, epsilon = 1e-12);
        assert_relative_eq!(north, 0.3125, epsilon = 1e-12);
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(matches!(
            CompositeVariogram::new(vec![]),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn non_positive_range_is_rejected() {
        let spec = StructureSpec::isotropic(StructureKind::Gaussian, 1.0, 0.0);
        assert!(matches!(
            CompositeVariogram::new(vec![spec]),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn power_exponent_is_checked() {
        assert!(CompositeVariogram::new(vec![StructureSpec::power(1.0, 2.0)]).is_err());
        let mut spec = StructureSpec::power(1.0, 1.5);
        spec.exponent = None;
        assert!(CompositeVariogram::new(vec![spec]).is_err());
        assert!(CompositeVariogram::new(vec![StructureSpec::power(1.0, 1.5)]).is_ok());
    }

    #[test]
    fn unknown_structure_names_and_codes() {
        assert_eq!("SPH".parse::<StructureKind>().unwrap(), StructureKind::Spherical);
        assert_eq!(StructureKind::try_from(3).unwrap(), StructureKind::Gaussian);
        assert!(matches!(
            "cubic".parse::<StructureKind>(),
            Err(Error::Configuration(_))
        ));
        assert!(StructureKind::try_from(9).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let json = r#"[
            {"kind": "nugget", "contribution": 0.1},
            {"kind": "spherical", "contribution": 0.9, "ranges": [50.0, 50.0, 10.0]}
        ]"#;
        let vgram: CompositeVariogram = serde_json::from_str(json).unwrap();
        assert_relative_eq!(vgram.c_0(), 1.0, epsilon = 1e-12);

        let bad = r#"[{"kind": "spherical", "contribution": 1.0, "ranges": [-1.0, 1.0, 1.0]}]"#;
        assert!(serde_json::from_str::<CompositeVariogram>(bad).is_err());

        let unknown = r#"[{"kind": "cubic", "contribution": 1.0}]"#;
        assert!(serde_json::from_str::<CompositeVariogram>(unknown).is_err());
    }
}
