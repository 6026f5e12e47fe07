use itertools::iproduct;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::support::Support;

/// Regular grid in the GSLIB convention: `*mn` is the center of the first cell, `*siz` the cell
/// size and nodes are ordered with x fastest, then y, then z.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridDefinition {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub xmn: f64,
    pub ymn: f64,
    pub zmn: f64,
    pub xsiz: f64,
    pub ysiz: f64,
    pub zsiz: f64,
}

impl GridDefinition {
    pub fn new(counts: [usize; 3], first_center: [f64; 3], cell_size: [f64; 3]) -> Self {
        let [nx, ny, nz] = counts;
        let [xmn, ymn, zmn] = first_center;
        let [xsiz, ysiz, zsiz] = cell_size;
        Self {
            nx,
            ny,
            nz,
            xmn,
            ymn,
            zmn,
            xsiz,
            ysiz,
            zsiz,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 {
            return Err(Error::config(format!(
                "grid must have at least one node per axis, got {} x {} x {}",
                self.nx, self.ny, self.nz
            )));
        }
        let origin_ok = [self.xmn, self.ymn, self.zmn].iter().all(|v| v.is_finite());
        let size_ok = [self.xsiz, self.ysiz, self.zsiz]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !(origin_ok && size_ok) {
            return Err(Error::config(
                "grid origin must be finite and cell sizes positive",
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell_size(&self) -> Vector3<f64> {
        Vector3::new(self.xsiz, self.ysiz, self.zsiz)
    }

    /// Linear index of node `(ix, iy, iz)`.
    #[inline(always)]
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + iy * self.nx + iz * self.nx * self.ny
    }

    #[inline(always)]
    pub fn node(&self, ix: usize, iy: usize, iz: usize) -> Point3<f64> {
        Point3::new(
            self.xmn + ix as f64 * self.xsiz,
            self.ymn + iy as f64 * self.ysiz,
            self.zmn + iz as f64 * self.zsiz,
        )
    }

    /// Node centers in index order.
    pub fn nodes(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        iproduct!(0..self.nz, 0..self.ny, 0..self.nx).map(|(iz, iy, ix)| self.node(ix, iy, iz))
    }

    pub fn point_targets(&self) -> Vec<Support> {
        self.nodes().map(Support::Point).collect()
    }

    /// One block per cell, discretized `discretization` times along each axis.
    pub fn block_targets(&self, discretization: [usize; 3]) -> Vec<Support> {
        let size = self.cell_size();
        self.nodes()
            .map(|center| Support::block(center, size, discretization))
            .collect()
    }
}
