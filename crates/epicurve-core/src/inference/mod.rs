// =============================================================================
// Curve Inference
// =============================================================================
//
// Turns a converged fit into the thing the dashboard plots: the smooth
// trend on the linear-predictor scale with a pointwise standard error.
//
// Only the CURVE columns participate. The weekday coefficients were
// estimated jointly, which is what cleans the day-of-week signature out of
// the spline, but they are nuisance structure: the reported trend is the
// average-weekday curve, so neither the weekday point estimates nor their
// covariance enter the output. Concretely, for each row i with curve
// covariates x_cᵢ:
//
//     fit_i = x_cᵢ · β_c
//     se_i  = sqrt( x_cᵢ · Σ_c · x_cᵢ )
//
// where β_c and Σ_c are the curve slices of the coefficients and of the
// dispersion-scaled covariance.
//
// The inverse-link transform and the z-multiplier that produce a plotted
// band live with the caller; the normal quantile helpers for that are here.
//
// =============================================================================

use ndarray::{s, Array1};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::design::DesignMatrix;
use crate::error::{EpiCurveError, Result};
use crate::solvers::QuasiFit;

/// Pointwise curve estimate: linear predictor and its standard error.
#[derive(Debug, Clone)]
pub struct CurveEstimate {
    /// Fitted linear predictor per row, curve columns only.
    pub fit: Array1<f64>,
    /// Pointwise standard error per row, curve columns only.
    pub se: Array1<f64>,
}

/// Fitted curve and standard errors from the curve-column block.
pub fn curve_with_se(design: &DesignMatrix, fit: &QuasiFit) -> Result<CurveEstimate> {
    let p = design.ncols();
    if fit.coefficients.len() != p {
        return Err(EpiCurveError::DimensionMismatch(format!(
            "fit has {} coefficients but design has {} columns",
            fit.coefficients.len(),
            p
        )));
    }
    if fit.covariance_scaled.nrows() != p || fit.covariance_scaled.ncols() != p {
        return Err(EpiCurveError::DimensionMismatch(format!(
            "covariance is {}×{} but design has {} columns",
            fit.covariance_scaled.nrows(),
            fit.covariance_scaled.ncols(),
            p
        )));
    }

    let cols = design.curve_cols.clone();
    let xc = design.curve_block();
    let beta_c = fit.coefficients.slice(s![cols.clone()]);
    let sigma_c = fit
        .covariance_scaled
        .slice(s![cols.clone(), cols.clone()]);

    let fitted = xc.dot(&beta_c);

    // Row-at-a-time diag(Xc Σc Xcᵗ): n·p² work instead of an n×n product.
    let n = design.nrows();
    let mut se = Array1::zeros(n);
    for i in 0..n {
        let row = xc.row(i);
        let tmp = sigma_c.dot(&row);
        let var = row.dot(&tmp);
        if var < -1e-8 {
            return Err(EpiCurveError::LinearAlgebra(format!(
                "negative curve variance {var:.3e} at row {i}"
            )));
        }
        se[i] = var.max(0.0).sqrt();
    }

    Ok(CurveEstimate { fit: fitted, se })
}

/// Two-sided standard-normal quantile for a confidence level, e.g.
/// `z_quantile(0.95)` ≈ 1.96.
pub fn z_quantile(confidence: f64) -> Result<f64> {
    if !(0.0..1.0).contains(&confidence) || confidence <= 0.0 {
        return Err(EpiCurveError::InvalidValue(format!(
            "confidence level must be in (0, 1), got {confidence}"
        )));
    }
    let normal = Normal::new(0.0, 1.0).expect("standard normal");
    Ok(normal.inverse_cdf(0.5 + confidence / 2.0))
}

/// Symmetric z-interval around an estimate.
pub fn confidence_interval_z(estimate: f64, se: f64, confidence: f64) -> Result<(f64, f64)> {
    let z = z_quantile(confidence)?;
    Ok((estimate - z * se, estimate + z * se))
}

// =============================================================================
// Tests
// =============================================================================
