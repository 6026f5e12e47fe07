use nalgebra::{Point3, Vector3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub center: Point3<f64>,
    pub half_extents: Vector3<f64>,
}

impl Aabb {
    #[inline(always)]
    pub fn new(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    #[inline(always)]
    pub fn mins(&self) -> Point3<f64> {
        self.center - self.half_extents
    }

    #[inline(always)]
    pub fn maxs(&self) -> Point3<f64> {
        self.center + self.half_extents
    }

    /// Corners in the form expected by `rstar::AABB::from_corners`.
    #[inline(always)]
    pub fn corners(&self) -> ([f64; 3], [f64; 3]) {
        let mins = self.mins();
        let maxs = self.maxs();
        ([mins.x, mins.y, mins.z], [maxs.x, maxs.y, maxs.z])
    }
}
