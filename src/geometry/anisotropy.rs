use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

use crate::error::{Error, Result};

/// Rotation and rescaling of 3D offsets into an isotropic space.
///
/// Angles follow the GSLIB `setrot` convention (degrees):
///     - azimuth: rotation of the major axis clockwise from north (+y)
///     - dip: rotation of the major axis about the rotated x axis, negative downward
///     - plunge: rotation about the major axis
///
/// Rows of the rotation matrix are the major, minor and vertical axes expressed in world
/// coordinates. Dividing each row by its range maps the anisotropy ellipsoid onto the unit
/// sphere, so `normalized_distance(d) <= 1.0` is exactly "d is inside the ellipsoid".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anisotropy {
    angles: [f64; 3],
    ranges: Vector3<f64>,
    rotation: Rotation3<f64>,
    scaled: Matrix3<f64>,
}

impl Anisotropy {
    pub fn new(angles: [f64; 3], ranges: [f64; 3]) -> Result<Self> {
        if let Some(a) = angles.iter().find(|a| !a.is_finite()) {
            return Err(Error::config(format!(
                "rotation angle must be finite, got {a}"
            )));
        }
        if let Some(r) = ranges.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
            return Err(Error::config(format!(
                "anisotropy ranges must be positive, got {r}"
            )));
        }

        let [azimuth, dip, plunge] = angles;

        // Trig functions are periodic, so the GSLIB branch on azimuth >= 270 is not needed.
        let alpha = (90.0 - azimuth).to_radians();
        let beta = (-dip).to_radians();
        let theta = plunge.to_radians();

        let (sina, cosa) = alpha.sin_cos();
        let (sinb, cosb) = beta.sin_cos();
        let (sint, cost) = theta.sin_cos();

        #[rustfmt::skip]
        let m = Matrix3::new(
            cosb * cosa,                          cosb * sina,                          -sinb,
            -cost * sina + sint * sinb * cosa,    cost * cosa + sint * sinb * sina,     sint * cosb,
            sint * sina + cost * sinb * cosa,     -sint * cosa + cost * sinb * sina,    cost * cosb,
        );

        let ranges = Vector3::from(ranges);
        let mut scaled = m;
        for (i, r) in ranges.iter().enumerate() {
            scaled.row_mut(i).unscale_mut(*r);
        }

        Ok(Self {
            angles,
            ranges,
            rotation: Rotation3::from_matrix_unchecked(m),
            scaled,
        })
    }

    /// Unrotated anisotropy with the same range along every axis.
    pub fn isotropic(range: f64) -> Result<Self> {
        Self::new([0.0; 3], [range; 3])
    }

    pub fn angles(&self) -> [f64; 3] {
        self.angles
    }

    pub fn ranges(&self) -> &Vector3<f64> {
        &self.ranges
    }

    /// World to local rotation.
    pub fn rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// Express a world offset in the (major, minor, vertical) frame.
    #[inline(always)]
    pub fn to_local(&self, d: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * d
    }

    #[inline(always)]
    pub fn to_world(&self, d: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse_transform_vector(d)
    }

    /// Rotate and rescale a world offset so that the ranges map to one.
    #[inline(always)]
    pub fn normalized(&self, d: &Vector3<f64>) -> Vector3<f64> {
        self.scaled * d
    }

    #[inline(always)]
    pub fn normalized_distance_sq(&self, d: &Vector3<f64>) -> f64 {
        self.normalized(d).norm_squared()
    }

    #[inline(always)]
    pub fn normalized_distance(&self, d: &Vector3<f64>) -> f64 {
        self.normalized(d).norm()
    }

    /// Half extents along the world axes of the ellipsoid spanned by the ranges.
    pub fn world_half_extents(&self) -> Vector3<f64> {
        let m = self.rotation.matrix();
        Vector3::from_fn(|i, _| {
            (0..3)
                .map(|j| (m[(j, i)] * self.ranges[j]).powi(2))
                .sum::<f64>()
                .sqrt()
        })
    }

    /// Move points into the isotropic space centered on `origin`.
    pub fn rotate_and_rescale(
        &self,
        origin: &Point3<f64>,
        points: &[Point3<f64>],
    ) -> Vec<Point3<f64>> {
        points
            .iter()
            .map(|p| Point3::from(self.normalized(&(p - origin))))
            .collect()
    }

    /// Inverse of [`Anisotropy::rotate_and_rescale`].
    pub fn restore(&self, origin: &Point3<f64>, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
        points
            .iter()
            .map(|p| origin + self.to_world(&p.coords.component_mul(&self.ranges)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn zero_azimuth_points_north() {
        let a = Anisotropy::new([0.0, 0.0, 0.0], [100.0, 50.0, 10.0]).unwrap();

        let d = |x, y, z| a.normalized_distance(&Vector3::new(x, y, z));
        assert_relative_eq!(d(0.0, 100.0, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(d(50.0, 0.0, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(d(0.0, 0.0, 10.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn azimuth_rotates_clockwise() {
        let a = Anisotropy::new([90.0, 0.0, 0.0], [100.0, 50.0, 10.0]).unwrap();

        // major axis now points east
        let d = |x, y, z| a.normalized_distance(&Vector3::new(x, y, z));
        assert_relative_eq!(d(100.0, 0.0, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(d(0.0, 50.0, 0.0), 1.0, epsilon = 1e-12);

        let local = a.to_local(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(local, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn dip_tilts_major_axis() {
        let a = Anisotropy::new([0.0, 90.0, 0.0], [100.0, 50.0, 10.0]).unwrap();
        let h = a.normalized_distance(&Vector3::new(0.0, 0.0, 100.0));
        assert_relative_eq!(h, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_is_orthonormal() {
        let a = Anisotropy::new([32.0, -17.0, 71.0], [3.0, 2.0, 1.0]).unwrap();
        let m = a.rotation().matrix();
        assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn world_half_extents_bound_rotated_ellipsoid() {
        let a = Anisotropy::new([45.0, 0.0, 0.0], [100.0, 10.0, 5.0]).unwrap();
        let ext = a.world_half_extents();
        let expected = (100.0f64.powi(2) / 2.0 + 10.0f64.powi(2) / 2.0).sqrt();
        assert_relative_eq!(ext.x, expected, epsilon = 1e-9);
        assert_relative_eq!(ext.y, expected, epsilon = 1e-9);
        assert_relative_eq!(ext.z, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn rotate_and_rescale_round_trip() {
        let a = Anisotropy::new([20.0, 10.0, -5.0], [40.0, 20.0, 4.0]).unwrap();
        let origin = Point3::new(10.0, -3.0, 2.0);
        let points = vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-7.5, 0.25, 9.0)];

        let local = a.rotate_and_rescale(&origin, &points);
        let back = a.restore(&origin, &local);
        for (p, q) in points.iter().zip(back.iter()) {
            assert_relative_eq!(p, q, epsilon = 1e-9);
        }
    }

    #[test]
    fn non_positive_range_is_rejected() {
        assert!(matches!(
            Anisotropy::new([0.0; 3], [10.0, 0.0, 1.0]),
            Err(Error::Configuration(_))
        ));
        assert!(Anisotropy::new([f64::NAN, 0.0, 0.0], [1.0; 3]).is_err());
    }
}
