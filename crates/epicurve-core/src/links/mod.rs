// =============================================================================
// Link Functions
// =============================================================================
//
// The link g maps the mean μ to the linear predictor η = g(μ). The solver
// needs the forward map, the inverse, and dη/dμ for the working response
// and weights.
//
// Logit pairs with the binomial family, log with the Poisson family.
//
// =============================================================================

use ndarray::Array1;

/// Link function interface for the IRLS solver.
pub trait Link {
    /// Link name, for logs and error messages.
    fn name(&self) -> &'static str;

    /// η = g(μ)
    fn link(&self, mu: &Array1<f64>) -> Array1<f64>;

    /// μ = g⁻¹(η)
    fn inverse(&self, eta: &Array1<f64>) -> Array1<f64>;

    /// g′(μ) = dη/dμ
    fn derivative(&self, mu: &Array1<f64>) -> Array1<f64>;
}

/// Logit link: η = ln(μ / (1 - μ)).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogitLink;

impl Link for LogitLink {
    fn name(&self) -> &'static str {
        "logit"
    }

    fn link(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| (m / (1.0 - m)).ln())
    }

    /// Stable in both tails: never exponentiates a large positive value.
    fn inverse(&self, eta: &Array1<f64>) -> Array1<f64> {
        eta.mapv(|e| {
            if e >= 0.0 {
                1.0 / (1.0 + (-e).exp())
            } else {
                let x = e.exp();
                x / (1.0 + x)
            }
        })
    }

    fn derivative(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| 1.0 / (m * (1.0 - m)))
    }
}

/// Log link: η = ln(μ).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLink;

impl Link for LogLink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn link(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(f64::ln)
    }

    fn inverse(&self, eta: &Array1<f64>) -> Array1<f64> {
        // Cap the exponent so a wild intermediate iterate cannot produce an
        // infinite μ; the family clamp handles the rest.
        eta.mapv(|e| e.min(700.0).exp())
    }

    fn derivative(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| 1.0 / m)
    }
}

// =============================================================================
// Tests
// =============================================================================
