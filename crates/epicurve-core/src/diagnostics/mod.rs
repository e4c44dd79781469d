// =============================================================================
// Model Diagnostics
// =============================================================================
//
// Residuals and the dispersion estimate. For this pipeline the dispersion is
// not a diagnostic afterthought: it is part of the fit contract, because the
// reported standard errors are scaled by it (see `solvers::fit_quasi_glm`).
//
// =============================================================================

mod dispersion;
mod residuals;

pub use dispersion::{estimate_dispersion_pearson, pearson_chi2};
pub use residuals::resid_pearson;
