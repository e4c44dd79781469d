// =============================================================================
// Residuals
// =============================================================================

use ndarray::Array1;

use crate::families::Family;

/// Pearson residuals: (y - μ) · sqrt(w / V(μ)).
///
/// Standardized by the nominal (dispersion-free) variance, with prior
/// weights folded in so a high-trial day counts for more than a low-trial
/// day. A zero-weight row has residual exactly 0.
pub fn resid_pearson(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    weights: &Array1<f64>,
    family: &dyn Family,
) -> Array1<f64> {
    let variance = family.variance(mu);
    let mut resid = Array1::zeros(y.len());
    for i in 0..y.len() {
        if weights[i] > 0.0 {
            resid[i] = (y[i] - mu[i]) * (weights[i] / variance[i]).sqrt();
        }
    }
    resid
}
