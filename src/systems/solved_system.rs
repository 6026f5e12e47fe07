use crate::spatial_database::zero_mean::ZeroMeanTransform;

use super::KrigingType;

/// View of a solved kriging system.
///
/// The solution holds the sample weights followed by the Lagrange multipliers. The right hand
/// side holds the sample to target covariances followed by the target side of the constraints.
/// Constraint rows were multiplied by `unbias`, so the stored multipliers are the true ones
/// divided by it.
#[derive(Clone, Copy, Debug)]
pub struct SolvedLUSystem<'a> {
    solution: &'a [f64],
    rhs: &'a [f64],
    n_samples: usize,
    cbb: f64,
    unbias: f64,
}

impl<'a> SolvedLUSystem<'a> {
    pub fn new(
        solution: &'a [f64],
        rhs: &'a [f64],
        n_samples: usize,
        cbb: f64,
        unbias: f64,
    ) -> Self {
        Self {
            solution,
            rhs,
            n_samples,
            cbb,
            unbias,
        }
    }

    #[inline(always)]
    pub fn weights(&self) -> &'a [f64] {
        &self.solution[..self.n_samples]
    }

    /// Lagrange multipliers of the unbiasedness and drift constraints.
    pub fn lagrange(&self) -> impl ExactSizeIterator<Item = f64> + 'a {
        let (unbias, solution) = (self.unbias, self.solution);
        solution[self.n_samples..].iter().map(move |mu| mu * unbias)
    }

    /// Weighted combination of `values`, taken in the order the system was built.
    pub fn estimate<I>(&self, kriging_type: &KrigingType, values: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        let weights = self.weights();
        match kriging_type {
            KrigingType::Simple { mean } => {
                let transform = ZeroMeanTransform::new(*mean);
                let residual = weights
                    .iter()
                    .zip(values)
                    .fold(0.0, |acc, (w, v)| acc + w * transform.transform(v));
                transform.back_transform(residual)
            }
            KrigingType::Ordinary | KrigingType::Universal { .. } => weights
                .iter()
                .zip(values)
                .fold(0.0, |acc, (w, v)| acc + w * v),
        }
    }

    /// `C_bb - λ·c - μ·f₀`.
    pub fn variance(&self) -> f64 {
        let explained = self
            .solution
            .iter()
            .zip(self.rhs)
            .fold(0.0, |acc, (s, r)| acc + s * r);
        self.cbb - explained
    }
}
