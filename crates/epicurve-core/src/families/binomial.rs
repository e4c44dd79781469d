// =============================================================================
// Binomial Family
// =============================================================================
//
// Response: the daily positivity proportion y_i = positives_i / tests_i,
// with tests_i supplied to the solver as the prior weight. A day with zero
// tests has no defined proportion; the convention is y = 0 with weight 0,
// which keeps the row in the design matrix while removing it from the
// likelihood entirely.
//
// =============================================================================

use ndarray::Array1;

use super::{ylogy_over, Family};

const MU_MIN: f64 = 1e-10;
const MU_MAX: f64 = 1.0 - 1e-10;

/// Binomial variance model for proportion responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinomialFamily;

impl Family for BinomialFamily {
    fn name(&self) -> &'static str {
        "Binomial"
    }

    /// V(μ) = μ(1 - μ)
    fn variance(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| m * (1.0 - m))
    }

    /// D = 2 Σ wᵢ [ yᵢ ln(yᵢ/μᵢ) + (1-yᵢ) ln((1-yᵢ)/(1-μᵢ)) ]
    fn deviance(&self, y: &Array1<f64>, mu: &Array1<f64>, weights: &Array1<f64>) -> f64 {
        let mut dev = 0.0;
        for ((&yi, &mui), &wi) in y.iter().zip(mu.iter()).zip(weights.iter()) {
            if wi <= 0.0 {
                continue;
            }
            dev += wi * (ylogy_over(yi, mui) + ylogy_over(1.0 - yi, 1.0 - mui));
        }
        2.0 * dev
    }

    /// Start halfway between the observed proportion and 1/2, which is
    /// strictly inside (0, 1) even for all-zero or all-one days.
    fn initialize_mu(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|yi| (yi + 0.5) / 2.0)
    }

    fn clamp_mu(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| m.max(MU_MIN).min(MU_MAX))
    }
}
