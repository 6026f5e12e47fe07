use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};

/// Support of an estimation target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Support {
    Point(Point3<f64>),
    Block {
        center: Point3<f64>,
        size: Vector3<f64>,
        discretization: [usize; 3],
    },
}

impl Support {
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Support::Point(Point3::new(x, y, z))
    }

    pub fn block(center: Point3<f64>, size: Vector3<f64>, discretization: [usize; 3]) -> Self {
        Support::Block {
            center,
            size,
            discretization,
        }
    }

    #[inline(always)]
    pub fn center(&self) -> Point3<f64> {
        match self {
            Support::Point(p) => *p,
            Support::Block { center, .. } => *center,
        }
    }

    #[inline(always)]
    pub fn discretize(&self) -> Discretization {
        match self {
            Support::Point(p) => Discretization::new(*p, Vector3::zeros(), [1, 1, 1]),
            Support::Block {
                center,
                size,
                discretization,
            } => Discretization::new(*center, *size, *discretization),
        }
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.discretize().len()
    }

    #[must_use]
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    pub fn validate(&self) -> Result<()> {
        let center = self.center();
        if !center.iter().all(|c| c.is_finite()) {
            return Err(Error::config(format!("target center must be finite: {center}")));
        }
        if let Support::Block {
            size,
            discretization,
            ..
        } = self
        {
            if !size.iter().all(|s| s.is_finite() && *s >= 0.0) {
                return Err(Error::config(format!(
                    "block dimensions must be finite and non-negative: {size}"
                )));
            }
            if discretization.iter().any(|n| *n == 0) {
                return Err(Error::config(format!(
                    "block discretization must be at least 1 along every axis: {discretization:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Regular sub-cell centers of a block.
///
/// Axes with zero size collapse to a single node at the block center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Discretization {
    center: Point3<f64>,
    size: Vector3<f64>,
    step: Vector3<f64>,
    counts: [usize; 3],
}

impl Discretization {
    pub fn new(center: Point3<f64>, size: Vector3<f64>, counts: [usize; 3]) -> Self {
        let counts: [usize; 3] =
            std::array::from_fn(|i| if size[i] > 0.0 { counts[i].max(1) } else { 1 });
        let size = size.map(|s| s.max(0.0));
        let step = Vector3::from_fn(|i, _| size[i] / counts[i] as f64);

        Self {
            center,
            size,
            step,
            counts,
        }
    }

    pub fn counts(&self) -> [usize; 3] {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node `k` in x-fastest order.
    #[inline(always)]
    pub fn node(&self, k: usize) -> Point3<f64> {
        let [nx, ny, _] = self.counts;
        let idx = [k % nx, (k / nx) % ny, k / (nx * ny)];
        // (i + 1/2) * step - size / 2 is exactly zero for a single node
        let offset =
            Vector3::from_fn(|i, _| (idx[i] as f64 + 0.5) * self.step[i] - 0.5 * self.size[i]);
        self.center + offset
    }

    pub fn iter(&self) -> DiscretizationIter {
        DiscretizationIter {
            disc: *self,
            next: 0,
        }
    }
}

impl IntoIterator for &Discretization {
    type Item = Point3<f64>;
    type IntoIter = DiscretizationIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct DiscretizationIter {
    disc: Discretization,
    next: usize,
}

impl Iterator for DiscretizationIter {
    type Item = Point3<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.disc.len() {
            return None;
        }
        let p = self.disc.node(self.next);
        self.next += 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.disc.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DiscretizationIter {}
