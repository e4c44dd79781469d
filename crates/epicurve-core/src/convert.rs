// =============================================================================
// ndarray ↔ nalgebra Conversion Utilities
// =============================================================================
//
// Arrays are stored and exposed as ndarray types; factorizations run on
// nalgebra types. This module centralizes the conversions and the one solve
// pattern the fitter needs, so the solver code stays free of element loops.
//
// =============================================================================

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::error::{EpiCurveError, Result};

/// Convert an ndarray Array2 to a nalgebra DMatrix.
///
/// Handles non-contiguous arrays by making a contiguous copy first.
#[inline]
pub fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    let (nrows, ncols) = (a.nrows(), a.ncols());
    let contig = if a.is_standard_layout() {
        a.clone()
    } else {
        a.as_standard_layout().to_owned()
    };
    DMatrix::from_row_slice(nrows, ncols, contig.as_slice().unwrap())
}

/// Convert an ndarray Array1 to a nalgebra DVector.
#[inline]
pub fn to_dvector(v: &Array1<f64>) -> DVector<f64> {
    DVector::from_row_slice(v.as_slice().unwrap_or(&v.to_vec()))
}

/// Convert a nalgebra DMatrix to an ndarray Array2.
#[inline]
pub fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    let (nrows, ncols) = m.shape();
    let mut result = Array2::zeros((nrows, ncols));
    for i in 0..nrows {
        for j in 0..ncols {
            result[[i, j]] = m[(i, j)];
        }
    }
    result
}

/// Convert a nalgebra DVector to an ndarray Array1.
#[inline]
pub fn to_array1(v: &DVector<f64>) -> Array1<f64> {
    Array1::from_vec(v.as_slice().to_vec())
}

/// Solve Ax = b for symmetric positive-definite A and also return A⁻¹.
///
/// This is the weighted-least-squares pattern: the solution gives the
/// coefficient update and the inverse is kept for the covariance matrix.
/// Cholesky first, LU as fallback; a singular matrix is an error rather
/// than a silently zeroed covariance.
pub fn solve_and_invert(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    let p = a.nrows();
    if let Some(chol) = a.clone().cholesky() {
        let solution = chol.solve(b);
        let inverse = chol.solve(&DMatrix::identity(p, p));
        return Ok((to_array1(&solution), to_array2(&inverse)));
    }

    // Cholesky refused: matrix is not (numerically) positive definite.
    let lu = a.clone().lu();
    let solution = lu.solve(b).ok_or_else(|| {
        EpiCurveError::LinearAlgebra(
            "weighted least squares system is singular; the design matrix \
             likely has collinear columns"
                .to_string(),
        )
    })?;
    let inverse = a.clone().try_inverse().ok_or_else(|| {
        EpiCurveError::LinearAlgebra("X'WX is singular, covariance undefined".to_string())
    })?;
    Ok((to_array1(&solution), to_array2(&inverse)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_roundtrip_matrix() {
        let a = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let m = to_dmatrix(&a);
        let back = to_array2(&m);
        assert_eq!(a, back);
    }

    #[test]
    fn test_roundtrip_vector() {
        let v = array![1.0, 2.0, 3.0];
        let dv = to_dvector(&v);
        let back = to_array1(&dv);
        assert_eq!(v, back);
    }

    #[test]
    fn test_solve_and_invert() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[5.0, 4.0]);
        let (sol, inv) = solve_and_invert(&a, &b).unwrap();
        // A * x should equal b
        assert!((4.0 * sol[0] + 1.0 * sol[1] - 5.0).abs() < 1e-10);
        assert!((1.0 * sol[0] + 3.0 * sol[1] - 4.0).abs() < 1e-10);
        // A * A⁻¹ should be identity
        assert!((inv[[0, 0]] * 4.0 + inv[[0, 1]] * 1.0 - 1.0).abs() < 1e-10);
        assert!((inv[[1, 0]] * 4.0 + inv[[1, 1]] * 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_singular_matrix_is_an_error() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0]);
        assert!(solve_and_invert(&a, &b).is_err());
    }
}
