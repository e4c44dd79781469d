// =============================================================================
// Dispersion Estimation
// =============================================================================
//
// Daily test counts are over-dispersed relative to a textbook binomial, and
// death counts relative to a textbook Poisson: reporting batches, lab mix,
// and cluster outbreaks all inflate the variance. The quasi-likelihood
// answer is a single multiplicative factor φ on the nominal variance,
// estimated from Pearson residuals:
//
//     φ = X² / (n - p),   X² = Σ wᵢ (yᵢ - μᵢ)² / V(μᵢ)
//
// Rows with zero prior weight carry no information about φ and are excluded
// from both the sum and the degrees of freedom.
//
// =============================================================================

use ndarray::Array1;

use crate::diagnostics::resid_pearson;
use crate::families::Family;

/// Pearson chi-squared statistic X² = Σ wᵢ (yᵢ - μᵢ)² / V(μᵢ).
pub fn pearson_chi2(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    weights: &Array1<f64>,
    family: &dyn Family,
) -> f64 {
    resid_pearson(y, mu, weights, family).mapv(|r| r * r).sum()
}

/// Dispersion estimated from Pearson residuals: φ = X² / (n_used - p).
///
/// `n_used` counts only rows with positive prior weight. When the residual
/// degrees of freedom are not positive there is nothing to estimate from
/// and the nominal dispersion 1 is returned.
pub fn estimate_dispersion_pearson(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    weights: &Array1<f64>,
    family: &dyn Family,
    n_params: usize,
) -> f64 {
    let n_used = weights.iter().filter(|&&w| w > 0.0).count();
    if n_used <= n_params {
        return 1.0;
    }
    let df_resid = (n_used - n_params) as f64;
    pearson_chi2(y, mu, weights, family) / df_resid
}
