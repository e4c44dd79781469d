// =============================================================================
// epicurve-core
// =============================================================================
//
// The statistical engine behind the smoothed epidemic trend curves: a
// natural-cubic-spline design matrix with a sum-to-zero day-of-week block,
// an IRLS quasi-likelihood fitter, and curve-only uncertainty propagation.
//
// STRUCTURE:
// ----------
//   - error:       one error enum for the whole engine
//   - convert:     ndarray ↔ nalgebra plumbing and the shared WLS solve
//   - families:    Binomial and Poisson variance models
//   - links:       logit and log link functions
//   - splines:     natural cubic spline basis and knot placement
//   - contrasts:   the fixed 7×6 sum-to-zero weekday coding
//   - design:      block concatenation with recorded column ranges
//   - solvers:     the IRLS loop and the dispersion-scaling wrapper
//   - diagnostics: Pearson residuals and the dispersion estimate
//   - inference:   curve fit + standard errors, normal-quantile helpers
//
// The engine is pure computation: no I/O, no clocks, no global state. Given
// bit-identical input it produces bit-identical output, which is what makes
// the published trend reproducible.
//
// =============================================================================

pub mod contrasts;
pub mod convert;
pub mod design;
pub mod diagnostics;
pub mod error;
pub mod families;
pub mod inference;
pub mod links;
pub mod solvers;
pub mod splines;

// Re-export the items callers touch on every pipeline run.
pub use contrasts::{weekday_contrast_row, weekday_contrasts, WEEKDAY_COLS, WEEKDAY_LEVELS};
pub use design::{assemble_design, DesignMatrix};
pub use error::{EpiCurveError, Result};
pub use families::{BinomialFamily, Family, PoissonFamily};
pub use inference::{confidence_interval_z, curve_with_se, z_quantile, CurveEstimate};
pub use links::{Link, LogLink, LogitLink};
pub use solvers::{fit_glm, fit_quasi_glm, IRLSConfig, IRLSResult, QuasiFit};
pub use splines::{compute_knots_natural, compute_knots_trimmed, ns_basis, ns_basis_with_knots};
