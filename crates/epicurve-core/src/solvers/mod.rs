// =============================================================================
// Regression Solvers
// =============================================================================
//
// Two layers:
//
//   - `irls`: the mechanical loop. Iteratively reweighted least squares for
//     a GLM with prior weights and no intercept, ending in coefficients and
//     the unscaled covariance (X'WX)⁻¹.
//
//   - `quasi`: the fit the pipeline actually consumes. Runs IRLS, estimates
//     the quasi-likelihood dispersion from Pearson residuals, and returns
//     the covariance already scaled by max(1, φ) so downstream standard
//     errors can never be narrower than the nominal-variance ones.
//
// =============================================================================

mod irls;
mod quasi;

pub use irls::{fit_glm, IRLSConfig, IRLSResult};
pub use quasi::{fit_quasi_glm, QuasiFit};
