// =============================================================================
// Distribution Families
// =============================================================================
//
// A family supplies the pieces of a GLM that depend on the response
// distribution: the variance function V(μ), the deviance, and how to get a
// safe starting μ for the solver.
//
// Only the two families the trend pipeline uses live here:
//
//   - Binomial: daily positives out of daily tests (the positivity rate)
//   - Poisson:  daily event counts (deaths, admissions)
//
// Both are fit as QUASI-likelihood models: the nominal variance V(μ) is
// inflated by a dispersion factor φ estimated from Pearson residuals after
// the fit. The family itself knows nothing about φ; see
// `diagnostics::estimate_dispersion_pearson` and `solvers::fit_quasi_glm`.
//
// =============================================================================

mod binomial;
mod poisson;

pub use binomial::BinomialFamily;
pub use poisson::PoissonFamily;

use ndarray::Array1;

/// The response-distribution interface used by the IRLS solver.
///
/// `y` is the response on the mean scale: a proportion in [0, 1] for the
/// binomial family (with trial counts passed to the solver as prior
/// weights), a non-negative count for the Poisson family.
pub trait Family {
    /// Family name, used in error reports and logs.
    fn name(&self) -> &'static str;

    /// Nominal variance function V(μ), before dispersion scaling.
    fn variance(&self, mu: &Array1<f64>) -> Array1<f64>;

    /// Weighted deviance: -2φ × (log-likelihood difference vs. the
    /// saturated model), with φ taken as 1.
    ///
    /// Rows with weight 0 contribute exactly 0, so degenerate observations
    /// (a day with zero tests) can sit in the data without poisoning the
    /// convergence criterion.
    fn deviance(&self, y: &Array1<f64>, mu: &Array1<f64>, weights: &Array1<f64>) -> f64;

    /// A starting μ for IRLS, strictly inside the family's valid range.
    fn initialize_mu(&self, y: &Array1<f64>) -> Array1<f64>;

    /// Clamp μ back into the family's valid open range.
    fn clamp_mu(&self, mu: &Array1<f64>) -> Array1<f64>;
}

/// y·ln(y/μ) with the 0·ln(0) = 0 convention.
///
/// Shared by both deviance implementations.
pub(crate) fn ylogy_over(y: f64, mu: f64) -> f64 {
    if y > 0.0 {
        y * (y / mu).ln()
    } else {
        0.0
    }
}
