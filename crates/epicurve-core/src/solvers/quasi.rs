// =============================================================================
// Quasi-Likelihood Fit
// =============================================================================
//
// IRLS plus the dispersion step. The coefficient estimates are exactly the
// IRLS ones (quasi-likelihood changes nothing about the point fit), but
// the covariance handed to the uncertainty estimator is scaled by
//
//     max(1, φ),   φ = Pearson X² / (n_used - p)
//
// The floor at 1 is deliberate and preserved from the original pipeline:
// an estimated φ below 1 never shrinks the reported uncertainty below the
// nominal-variance assumption.
//
// =============================================================================

use ndarray::{Array1, Array2};

use crate::diagnostics::estimate_dispersion_pearson;
use crate::error::Result;
use crate::families::Family;
use crate::links::Link;
use crate::solvers::irls::{fit_glm, IRLSConfig};

/// A converged fit with dispersion-scaled covariance.
#[derive(Debug, Clone)]
pub struct QuasiFit {
    /// Coefficients aligned to the design matrix columns.
    pub coefficients: Array1<f64>,

    /// Coefficient covariance, already multiplied by max(1, dispersion).
    pub covariance_scaled: Array2<f64>,

    /// The Pearson dispersion estimate itself (pre-floor).
    pub dispersion: f64,

    /// Linear predictor η per row.
    pub linear_predictor: Array1<f64>,

    /// Fitted means μ per row.
    pub fitted_values: Array1<f64>,

    /// IRLS iterations used.
    pub iterations: usize,
}

/// Fit a quasi-likelihood GLM: IRLS, then dispersion-scale the covariance.
pub fn fit_quasi_glm(
    y: &Array1<f64>,
    x: &Array2<f64>,
    prior_weights: &Array1<f64>,
    family: &dyn Family,
    link: &dyn Link,
    config: &IRLSConfig,
) -> Result<QuasiFit> {
    let fit = fit_glm(y, x, prior_weights, family, link, config)?;

    let dispersion = estimate_dispersion_pearson(
        y,
        &fit.fitted_values,
        prior_weights,
        family,
        x.ncols(),
    );
    let scale = dispersion.max(1.0);

    Ok(QuasiFit {
        coefficients: fit.coefficients,
        covariance_scaled: fit.covariance_unscaled.mapv(|v| v * scale),
        dispersion,
        linear_predictor: fit.linear_predictor,
        fitted_values: fit.fitted_values,
        iterations: fit.iterations,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::{BinomialFamily, PoissonFamily};
    use crate::links::{LogLink, LogitLink};
    use ndarray::array;

    #[test]
    fn test_scaled_covariance_is_unscaled_times_floored_dispersion() {
        // Noisy counts around a flat mean: dispersion well above 1.
        let x = array![[1.0], [1.0], [1.0], [1.0], [1.0], [1.0]];
        let y = array![2.0, 19.0, 4.0, 25.0, 3.0, 22.0];
        let w = Array1::from_elem(6, 1.0);
        let cfg = IRLSConfig::default();
        let quasi = fit_quasi_glm(&y, &x, &w, &PoissonFamily, &LogLink, &cfg).unwrap();
        let plain = fit_glm(&y, &x, &w, &PoissonFamily, &LogLink, &cfg).unwrap();

        assert!(quasi.dispersion > 1.0);
        let expected = plain.covariance_unscaled[[0, 0]] * quasi.dispersion;
        assert!((quasi.covariance_scaled[[0, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_dispersion_below_one_is_floored() {
        // Proportions far tighter than binomial sampling noise allows:
        // the Pearson estimate lands below 1, the scaling must not.
        let x = array![[1.0], [1.0], [1.0], [1.0], [1.0]];
        let y = array![0.100, 0.101, 0.099, 0.100, 0.100];
        let w = Array1::from_elem(5, 10000.0);
        let cfg = IRLSConfig::default();
        let quasi = fit_quasi_glm(&y, &x, &w, &BinomialFamily, &LogitLink, &cfg).unwrap();
        let plain = fit_glm(&y, &x, &w, &BinomialFamily, &LogitLink, &cfg).unwrap();

        assert!(quasi.dispersion < 1.0);
        assert!(
            (quasi.covariance_scaled[[0, 0]] - plain.covariance_unscaled[[0, 0]]).abs() < 1e-15
        );
    }

    #[test]
    fn test_coefficients_unchanged_by_dispersion_step() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![3.0, 5.0, 6.0, 11.0];
        let w = Array1::from_elem(4, 1.0);
        let cfg = IRLSConfig::default();
        let quasi = fit_quasi_glm(&y, &x, &w, &PoissonFamily, &LogLink, &cfg).unwrap();
        let plain = fit_glm(&y, &x, &w, &PoissonFamily, &LogLink, &cfg).unwrap();
        assert_eq!(quasi.coefficients, plain.coefficients);
    }
}
