use nalgebra::{DMatrix, DVector, Point3};

use crate::error::{Error, Result};
use crate::geometry::support::Support;
use crate::variography::model_variograms::composite::CompositeVariogram;
use crate::variography::model_variograms::VariogramModel;

use super::solved_system::SolvedLUSystem;
use super::system_builder::KrigingSystemBuilder;
use super::KrigingType;

/// Default relative pivot magnitude below which a system is treated as singular.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-10;

/// Kriging system and the scratch buffers used to build and factor it.
///
/// One instance lives on each worker and is reused for every target it processes. The LU factors
/// are computed in place in a buffer that is only reallocated when the system size changes.
pub struct LUSystem {
    pub lhs: DMatrix<f64>,
    pub rhs: DVector<f64>,
    pub solution: DVector<f64>,
    pub n_samples: usize,
    pub n_constraints: usize,
    cbb: f64,
    unbias: f64,
    factors: DMatrix<f64>,
    pivots: Vec<usize>,
    points: Vec<Point3<f64>>,
    nodes: Vec<Point3<f64>>,
    drift_buffer: Vec<f64>,
}

impl Default for LUSystem {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl LUSystem {
    pub fn new(max_samples: usize, n_constraints: usize) -> Self {
        let n_total = max_samples + n_constraints;
        Self {
            lhs: DMatrix::zeros(n_total, n_total),
            rhs: DVector::zeros(n_total),
            solution: DVector::zeros(n_total),
            n_samples: max_samples,
            n_constraints,
            cbb: 0.0,
            unbias: 1.0,
            factors: DMatrix::zeros(n_total, n_total),
            pivots: Vec::with_capacity(n_total),
            points: Vec::with_capacity(max_samples),
            nodes: Vec::new(),
            drift_buffer: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.n_samples + self.n_constraints
    }

    /// Covariance of the target with itself.
    pub fn block_covariance(&self) -> f64 {
        self.cbb
    }

    /// Set the dimensions of the system. Every entry is rewritten by [`LUSystem::build`].
    #[inline(always)]
    fn set_dims(&mut self, n_samples: usize, n_constraints: usize) {
        self.n_samples = n_samples;
        self.n_constraints = n_constraints;
        let n = self.size();
        if self.lhs.nrows() != n {
            self.lhs.resize_mut(n, n, 0.0);
            self.factors.resize_mut(n, n, 0.0);
            self.rhs.resize_vertically_mut(n, 0.0);
            self.solution.resize_vertically_mut(n, 0.0);
        }
    }

    /// Assemble the system for `target` from the sample positions, in the order given.
    ///
    /// `drift_scale` normalizes the coordinates fed to universal kriging drift terms. Constraint
    /// rows are scaled by `C(0)` of the model.
    pub fn build<I>(
        &mut self,
        positions: I,
        target: &Support,
        vgram: &CompositeVariogram,
        kriging_type: &KrigingType,
        drift_scale: f64,
    ) where
        I: IntoIterator<Item = Point3<f64>>,
    {
        self.points.clear();
        self.points.extend(positions);

        self.nodes.clear();
        self.nodes.extend(target.discretize().iter());

        self.set_dims(self.points.len(), kriging_type.num_constraints());

        let c_0 = vgram.c_0();
        self.unbias = if c_0.is_finite() && c_0 > 0.0 { c_0 } else { 1.0 };

        KrigingSystemBuilder::build_cov_mat(&mut self.lhs, &self.points, vgram);
        KrigingSystemBuilder::build_cov_vec(&mut self.rhs, &self.points, &self.nodes, vgram);
        KrigingSystemBuilder::build_constraints(
            &mut self.lhs,
            &mut self.rhs,
            &self.points,
            &self.nodes,
            &target.center(),
            drift_scale,
            self.unbias,
            kriging_type,
            &mut self.drift_buffer,
        );
        self.cbb = KrigingSystemBuilder::block_covariance(vgram, &self.nodes);
    }

    /// Solve with LU decomposition and partial pivoting.
    ///
    /// The system is singular when the smallest pivot is at most `pivot_tolerance` times the
    /// largest absolute entry of the matrix, or when the solution is not finite. `lhs` and `rhs`
    /// are left untouched.
    pub fn solve(&mut self, pivot_tolerance: f64) -> Result<SolvedLUSystem<'_>> {
        let size = self.size();
        let singular = |pivot: f64| Error::SingularSystem { size, pivot };

        let scale = self.lhs.amax();
        if !(scale.is_finite() && scale > 0.0) {
            return Err(singular(0.0));
        }

        self.factors.copy_from(&self.lhs);
        let pivot = factor_in_place(&mut self.factors, &mut self.pivots);
        if !(pivot > pivot_tolerance * scale) {
            return Err(singular(pivot));
        }

        self.solution.copy_from(&self.rhs);
        for (k, p) in self.pivots.iter().enumerate() {
            if *p != k {
                self.solution.swap_rows(k, *p);
            }
        }
        let solved = self
            .factors
            .solve_lower_triangular_with_diag_mut(&mut self.solution, 1.0)
            && self.factors.solve_upper_triangular_mut(&mut self.solution);
        if !solved || self.solution.iter().any(|w| !w.is_finite()) {
            return Err(singular(pivot));
        }

        Ok(SolvedLUSystem::new(
            self.solution.as_slice(),
            self.rhs.as_slice(),
            self.n_samples,
            self.cbb,
            self.unbias,
        ))
    }
}

/// Overwrite `factors` with its LU factorization under partial pivoting: unit lower triangle
/// below the diagonal, upper triangle on and above it. `pivots[k]` is the row swapped with row
/// `k` at step `k`.
///
/// Returns the smallest pivot magnitude, zero when a column has no nonzero pivot.
fn factor_in_place(factors: &mut DMatrix<f64>, pivots: &mut Vec<usize>) -> f64 {
    let n = factors.nrows();
    pivots.clear();

    let mut min_pivot = f64::INFINITY;
    for k in 0..n {
        let (offset, pivot) = factors
            .view((k, k), (n - k, 1))
            .iter()
            .enumerate()
            .fold((0, 0.0), |(best, max), (i, v)| {
                if v.abs() > max {
                    (i, v.abs())
                } else {
                    (best, max)
                }
            });
        if pivot == 0.0 {
            return 0.0;
        }
        min_pivot = min_pivot.min(pivot);

        let p = k + offset;
        pivots.push(p);
        if p != k {
            factors.swap_rows(k, p);
        }

        let diag = factors[(k, k)];
        for i in k + 1..n {
            factors[(i, k)] /= diag;
        }
        // column major: walk each trailing column top to bottom
        for j in k + 1..n {
            let akj = factors[(k, j)];
            if akj == 0.0 {
                continue;
            }
            for i in k + 1..n {
                let lik = factors[(i, k)];
                factors[(i, j)] -= lik * akj;
            }
        }
    }
    min_pivot
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::systems::DriftTerms;
    use crate::variography::model_variograms::composite::{StructureKind, StructureSpec};

    fn vgram() -> CompositeVariogram {
        CompositeVariogram::new(vec![StructureSpec::isotropic(
            StructureKind::Spherical,
            1.0,
            100.0,
        )])
        .unwrap()
    }

    #[test]
    fn ordinary_weights_sum_to_one() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(30.0, 5.0, 0.0),
            Point3::new(-12.0, 40.0, 2.0),
            Point3::new(8.0, -25.0, -1.0),
        ];
        let mut system = LUSystem::default();
        system.build(
            positions,
            &Support::point(5.0, 5.0, 0.0),
            &vgram(),
            &KrigingType::Ordinary,
            100.0,
        );
        assert_eq!(system.size(), 5);
        assert_eq!(system.lhs, system.lhs.transpose());

        let solved = system.solve(DEFAULT_PIVOT_TOLERANCE).unwrap();
        assert_relative_eq!(solved.weights().iter().sum::<f64>(), 1.0, epsilon = 1e-10);
        assert_eq!(solved.lagrange().len(), 1);
    }

    #[test]
    fn collocated_samples_are_singular() {
        let positions = vec![Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 1.0)];
        let mut system = LUSystem::default();
        system.build(
            positions,
            &Support::point(0.0, 0.0, 0.0),
            &vgram(),
            &KrigingType::Ordinary,
            100.0,
        );
        assert!(matches!(
            system.solve(DEFAULT_PIVOT_TOLERANCE),
            Err(Error::SingularSystem { size: 3, .. })
        ));
    }

    #[test]
    fn buffers_are_reused_across_sizes() {
        let mut system = LUSystem::new(2, 1);
        let target = Support::point(0.0, 0.0, 0.0);
        let vgram = vgram();

        let many = (0..6).map(|i| Point3::new(i as f64 * 7.0, 3.0, 0.0));
        system.build(many, &target, &vgram, &KrigingType::Ordinary, 100.0);
        assert_eq!(system.lhs.nrows(), 7);
        let w_many = system.solve(DEFAULT_PIVOT_TOLERANCE).unwrap().weights().to_vec();
        assert_eq!(w_many.len(), 6);

        let few = (0..2).map(|i| Point3::new(i as f64 * 7.0, 3.0, 0.0));
        system.build(few, &target, &vgram, &KrigingType::Simple { mean: 0.0 }, 100.0);
        assert_eq!(system.lhs.nrows(), 2);
        assert_eq!(system.solve(DEFAULT_PIVOT_TOLERANCE).unwrap().weights().len(), 2);
    }

    fn scattered() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(30.0, 5.0, 1.0),
            Point3::new(-12.0, 40.0, 2.0),
            Point3::new(8.0, -25.0, -1.0),
            Point3::new(45.0, -30.0, 0.5),
            Point3::new(-35.0, -10.0, -2.0),
        ]
    }

    #[test]
    fn solution_matches_dense_lu() {
        let mut system = LUSystem::default();
        system.build(
            scattered(),
            &Support::point(5.0, 5.0, 0.0),
            &vgram(),
            &KrigingType::Universal {
                drift: DriftTerms::linear_xy(),
            },
            50.0,
        );
        let expected = system.lhs.clone().lu().solve(&system.rhs).unwrap();
        system.solve(DEFAULT_PIVOT_TOLERANCE).unwrap();
        for (a, b) in system.solution.iter().zip(expected.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn factor_buffer_is_reused_for_equal_sizes() {
        let mut system = LUSystem::new(6, 1);
        let vgram = vgram();
        let kriging_type = KrigingType::Ordinary;

        system.build(scattered(), &Support::point(0.0, 0.0, 0.0), &vgram, &kriging_type, 50.0);
        system.solve(DEFAULT_PIVOT_TOLERANCE).unwrap();
        let buffer = system.factors.as_ptr();

        system.build(scattered(), &Support::point(9.0, -3.0, 0.0), &vgram, &kriging_type, 50.0);
        system.solve(DEFAULT_PIVOT_TOLERANCE).unwrap();
        assert_eq!(system.factors.as_ptr(), buffer);
    }

    #[test]
    fn rescaled_sill_gives_same_status_and_weights() {
        let scaled = |sill: f64| {
            CompositeVariogram::new(vec![
                StructureSpec::nugget(0.1 * sill),
                StructureSpec::isotropic(StructureKind::Spherical, 0.9 * sill, 100.0),
            ])
            .unwrap()
        };
        let types = [
            KrigingType::Ordinary,
            KrigingType::Universal {
                drift: DriftTerms::linear(),
            },
        ];
        for kriging_type in types {
            let mut unit = LUSystem::default();
            let mut tiny = LUSystem::default();
            let target = Support::point(5.0, 5.0, 0.0);
            unit.build(scattered(), &target, &scaled(1.0), &kriging_type, 50.0);
            tiny.build(scattered(), &target, &scaled(1e-12), &kriging_type, 50.0);

            let unit = unit.solve(DEFAULT_PIVOT_TOLERANCE).unwrap();
            let tiny = tiny.solve(DEFAULT_PIVOT_TOLERANCE).unwrap();
            for (a, b) in unit.weights().iter().zip(tiny.weights()) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
            for (a, b) in unit.lagrange().zip(tiny.lagrange()) {
                assert_relative_eq!(a * 1e-12, b, epsilon = 1e-20, max_relative = 1e-6);
            }
            assert_relative_eq!(
                unit.variance() * 1e-12,
                tiny.variance(),
                epsilon = 1e-20,
                max_relative = 1e-6
            );
        }
    }

    #[test]
    fn uncorrelated_sample_gets_zero_weight() {
        let nugget_free = CompositeVariogram::new(vec![StructureSpec::isotropic(
            StructureKind::Spherical,
            1.0,
            1.0,
        )])
        .unwrap();
        let mut system = LUSystem::default();
        // sample beyond the range of the target
        system.build(
            vec![Point3::new(10.0, 0.0, 0.0)],
            &Support::point(0.0, 0.0, 0.0),
            &nugget_free,
            &KrigingType::Simple { mean: 0.0 },
            1.0,
        );
        let solved = system.solve(DEFAULT_PIVOT_TOLERANCE).unwrap();
        assert_eq!(solved.weights(), &[0.0]);
    }
}
