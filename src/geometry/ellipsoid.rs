use nalgebra::{Point3, Vector3};

use crate::error::Result;

use super::{aabb::Aabb, anisotropy::Anisotropy};

/// Search ellipsoid located at a target center.
#[derive(Clone, Debug)]
pub struct Ellipsoid {
    pub anisotropy: Anisotropy,
    pub center: Point3<f64>,
}

impl Ellipsoid {
    /// Create a new Ellipsoid with given major (a), minor (b), and vertical radius (c)
    ///  oriented by GSLIB angles `[azimuth, dip, plunge]`, centered on the origin.
    pub fn new(a: f64, b: f64, c: f64, angles: [f64; 3]) -> Result<Self> {
        Ok(Self::from_anisotropy(
            Anisotropy::new(angles, [a, b, c])?,
            Point3::origin(),
        ))
    }

    pub fn from_anisotropy(anisotropy: Anisotropy, center: Point3<f64>) -> Self {
        Self { anisotropy, center }
    }

    #[inline(always)]
    pub fn translate_to(&mut self, center: &Point3<f64>) {
        self.center = *center;
    }

    /// Computes the bounding box of the ellipsoid in world coordinates
    pub fn bounding_box(&self) -> Aabb {
        Aabb::new(self.center, self.anisotropy.world_half_extents())
    }

    /// Offset from the center in the ellipsoid's (major, minor, vertical) frame.
    #[inline(always)]
    pub fn local_offset(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.anisotropy.to_local(&(point - self.center))
    }

    /// Squared distance from the center in units of the radii.
    #[inline(always)]
    pub fn normalized_distance_sq(&self, point: &Point3<f64>) -> f64 {
        self.anisotropy.normalized_distance_sq(&(point - self.center))
    }

    /// Checks if ellipsoid contains a point (world coordinates)
    #[inline(always)]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        self.normalized_distance_sq(point) <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_ellipse_bounding_box() {
        // major along y, minor along x
        let ellipse = Ellipsoid::new(2.0, 1.0, 3.0, [0.0; 3]).unwrap();

        let bbox = ellipse.bounding_box();

        assert_relative_eq!(bbox.mins(), Point3::new(-1.0, -2.0, -3.0), epsilon = 1e-9);
        assert_relative_eq!(bbox.maxs(), Point3::new(1.0, 2.0, 3.0), epsilon = 1e-9);
    }

    #[test]
    fn test_translated_ellipse_bounding_box() {
        let mut ellipse = Ellipsoid::new(2.0, 1.0, 3.0, [0.0; 3]).unwrap();
        ellipse.translate_to(&Point3::new(1.0, 2.0, 3.0));

        let bbox = ellipse.bounding_box();

        assert_relative_eq!(bbox.mins(), Point3::new(0.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(bbox.maxs(), Point3::new(2.0, 4.0, 6.0), epsilon = 1e-9);
    }

    #[test]
    fn test_rotated_ellipse_bounding_box() {
        let ellipse = Ellipsoid::new(2.0, 1.0, 3.0, [90.0, 0.0, 0.0]).unwrap();

        let bbox = ellipse.bounding_box();

        assert_relative_eq!(bbox.mins(), Point3::new(-2.0, -1.0, -3.0), epsilon = 1e-9);
        assert_relative_eq!(bbox.maxs(), Point3::new(2.0, 1.0, 3.0), epsilon = 1e-9);
    }

    #[test]
    fn test_ellipse_contains_point() {
        let ellipse = Ellipsoid::new(2.0, 1.0, 3.0, [0.0; 3]).unwrap();

        assert!(ellipse.contains(&Point3::new(0.0, 0.0, 0.0)));
        assert!(ellipse.contains(&Point3::new(0.0, 2.0, 0.0)));
        assert!(ellipse.contains(&Point3::new(1.0, 0.0, 0.0)));
        assert!(!ellipse.contains(&Point3::new(2.0, 0.0, 0.0)));
        assert!(!ellipse.contains(&Point3::new(0.9, 1.9, 0.0)));
    }

    #[test]
    fn rotated_search_uses_local_frame() {
        let mut ellipse = Ellipsoid::new(10.0, 1.0, 1.0, [90.0, 0.0, 0.0]).unwrap();
        ellipse.translate_to(&Point3::new(5.0, 5.0, 0.0));

        assert!(ellipse.contains(&Point3::new(14.0, 5.0, 0.0)));
        assert!(!ellipse.contains(&Point3::new(5.0, 14.0, 0.0)));

        let local = ellipse.local_offset(&Point3::new(14.0, 5.0, 0.0));
        assert_relative_eq!(local, Vector3::new(9.0, 0.0, 0.0), epsilon = 1e-9);
    }
}
