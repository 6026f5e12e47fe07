use nalgebra::{DMatrix, DVector, Point3};

use crate::variography::model_variograms::composite::CompositeVariogram;
use crate::variography::model_variograms::{is_zero_lag, VariogramModel};

use super::{DriftTerms, KrigingType};

/// Populates the blocks of a kriging system.
///
/// Sample to sample entries use point covariances. Sample to target entries are averaged over
/// the discretization nodes of the target; with more than one node the nugget is removed from
/// coincident pairs so it is not counted twice.
pub struct KrigingSystemBuilder;

impl KrigingSystemBuilder {
    /// Fill the leading `points.len()` square block of `lhs`. Both triangles are written from
    /// the same value so the block is exactly symmetric.
    pub fn build_cov_mat(lhs: &mut DMatrix<f64>, points: &[Point3<f64>], vgram: &CompositeVariogram) {
        for (i, p1) in points.iter().enumerate() {
            for (j, p2) in points.iter().enumerate().take(i + 1) {
                let cov = vgram.covariogram(p1 - p2);
                lhs[(i, j)] = cov;
                lhs[(j, i)] = cov;
            }
        }
    }

    pub fn build_cov_vec(
        rhs: &mut DVector<f64>,
        points: &[Point3<f64>],
        nodes: &[Point3<f64>],
        vgram: &CompositeVariogram,
    ) {
        if let [node] = nodes {
            for (i, p) in points.iter().enumerate() {
                rhs[i] = vgram.covariogram(p - node);
            }
            return;
        }

        let nugget = vgram.nugget();
        let n_nodes = nodes.len() as f64;
        for (i, p) in points.iter().enumerate() {
            let sum = nodes
                .iter()
                .map(|node| {
                    let h = p - node;
                    let cov = vgram.covariogram(h);
                    if is_zero_lag(h) {
                        cov - nugget
                    } else {
                        cov
                    }
                })
                .sum::<f64>();
            rhs[i] = sum / n_nodes;
        }
    }

    /// Unbiasedness and drift rows and columns, placed after the `points.len()` covariance block.
    ///
    /// Drift terms are evaluated on `(p - center) / scale`; the target side holds their average
    /// over the discretization nodes. Every constraint row is multiplied by `unbias` (normally
    /// `C(0)`) so the border has the magnitude of the covariances. This leaves the weights
    /// unchanged and divides the Lagrange multipliers by `unbias`.
    #[allow(clippy::too_many_arguments)]
    pub fn build_constraints(
        lhs: &mut DMatrix<f64>,
        rhs: &mut DVector<f64>,
        points: &[Point3<f64>],
        nodes: &[Point3<f64>],
        center: &Point3<f64>,
        scale: f64,
        unbias: f64,
        kriging_type: &KrigingType,
        drift_buffer: &mut Vec<f64>,
    ) {
        let n = points.len();
        let n_constraints = kriging_type.num_constraints();
        if n_constraints == 0 {
            return;
        }

        for i in 0..n {
            lhs[(i, n)] = unbias;
            lhs[(n, i)] = unbias;
        }
        rhs[n] = unbias;

        for r in n..n + n_constraints {
            for c in n..n + n_constraints {
                lhs[(r, c)] = 0.0;
            }
        }

        let KrigingType::Universal { drift } = kriging_type else {
            return;
        };

        for (i, p) in points.iter().enumerate() {
            drift_buffer.clear();
            drift.evaluate(&((p - center) / scale), drift_buffer);
            for (k, f) in drift_buffer.iter().enumerate() {
                lhs[(i, n + 1 + k)] = f * unbias;
                lhs[(n + 1 + k, i)] = f * unbias;
            }
        }

        Self::target_drift(drift, nodes, center, scale, drift_buffer);
        for (k, f) in drift_buffer.iter().enumerate() {
            rhs[n + 1 + k] = f * unbias;
        }
    }

    /// Average of the drift terms over the discretization nodes.
    fn target_drift(
        drift: &DriftTerms,
        nodes: &[Point3<f64>],
        center: &Point3<f64>,
        scale: f64,
        drift_buffer: &mut Vec<f64>,
    ) {
        let m = drift.count();
        drift_buffer.clear();
        for node in nodes {
            drift.evaluate(&((node - center) / scale), drift_buffer);
        }
        // fold the per-node rows into the first m entries
        for node in 1..nodes.len() {
            for k in 0..m {
                drift_buffer[k] += drift_buffer[node * m + k];
            }
        }
        drift_buffer.truncate(m);
        let n_nodes = nodes.len().max(1) as f64;
        drift_buffer.iter_mut().for_each(|f| *f /= n_nodes);
    }

    /// Average covariance between all pairs of discretization nodes.
    ///
    /// A single node gives `C(0)`. Otherwise the nugget is removed from every coincident pair.
    pub fn block_covariance(vgram: &CompositeVariogram, nodes: &[Point3<f64>]) -> f64 {
        if nodes.len() <= 1 {
            return vgram.c_0();
        }

        let nugget = vgram.nugget();
        let mut sum = 0.0;
        for p1 in nodes {
            for p2 in nodes {
                let h = p1 - p2;
                let cov = vgram.covariogram(h);
                sum += if is_zero_lag(h) { cov - nugget } else { cov };
            }
        }
        sum / (nodes.len() * nodes.len()) as f64
    }
}
