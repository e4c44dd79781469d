// =============================================================================
// Poisson Family
// =============================================================================
//
// Response: a non-negative daily event count. Prior weights are normally all
// ones for this family; they are still honored so the solver has a single
// code path.
//
// =============================================================================

use ndarray::Array1;

use super::{ylogy_over, Family};

const MU_MIN: f64 = 1e-10;

/// Poisson variance model for count responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoissonFamily;

impl Family for PoissonFamily {
    fn name(&self) -> &'static str {
        "Poisson"
    }

    /// V(μ) = μ
    fn variance(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.clone()
    }

    /// D = 2 Σ wᵢ [ yᵢ ln(yᵢ/μᵢ) - (yᵢ - μᵢ) ]
    fn deviance(&self, y: &Array1<f64>, mu: &Array1<f64>, weights: &Array1<f64>) -> f64 {
        let mut dev = 0.0;
        for ((&yi, &mui), &wi) in y.iter().zip(mu.iter()).zip(weights.iter()) {
            if wi <= 0.0 {
                continue;
            }
            dev += wi * (ylogy_over(yi, mui) - (yi - mui));
        }
        2.0 * dev
    }

    /// Shift zero counts off the boundary; the log link cannot start at 0.
    fn initialize_mu(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|yi| yi + 0.1)
    }

    fn clamp_mu(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| m.max(MU_MIN))
    }
}
