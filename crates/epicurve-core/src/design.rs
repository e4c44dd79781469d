// =============================================================================
// Design Matrix Assembly
// =============================================================================
//
// The design matrix is built from named blocks, and the block boundaries
// travel with the matrix. Downstream code (the uncertainty estimator in
// particular) selects the curve columns through these recorded ranges and
// never infers column meaning from position.
//
// No intercept column exists anywhere: the spline block carries the curve
// (including its baseline, see `splines`), and the weekday block spans
// deviations only.
//
// =============================================================================

use std::ops::Range;

use ndarray::{s, Array2, ArrayView2};

use crate::error::{EpiCurveError, Result};

/// A design matrix with recorded column-block ranges.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    /// The full n × p matrix: [spline block | weekday block].
    pub matrix: Array2<f64>,
    /// Columns whose coefficients define the reported smooth trend.
    pub curve_cols: Range<usize>,
    /// Columns for the day-of-week nuisance adjustment.
    pub weekday_cols: Range<usize>,
}

impl DesignMatrix {
    /// View of the curve-column block.
    pub fn curve_block(&self) -> ArrayView2<'_, f64> {
        self.matrix.slice(s![.., self.curve_cols.clone()])
    }

    /// Number of rows (observations).
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Total number of columns across all blocks.
    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }
}

/// Concatenate the spline and weekday blocks.
pub fn assemble_design(spline: &Array2<f64>, weekday: &Array2<f64>) -> Result<DesignMatrix> {
    let n = spline.nrows();
    if weekday.nrows() != n {
        return Err(EpiCurveError::DimensionMismatch(format!(
            "spline block has {} rows but weekday block has {}",
            n,
            weekday.nrows()
        )));
    }
    if spline.ncols() == 0 {
        return Err(EpiCurveError::EmptyInput("spline block has no columns".to_string()));
    }

    let p_curve = spline.ncols();
    let p_week = weekday.ncols();
    let mut matrix = Array2::zeros((n, p_curve + p_week));
    matrix.slice_mut(s![.., 0..p_curve]).assign(spline);
    matrix.slice_mut(s![.., p_curve..p_curve + p_week]).assign(weekday);

    Ok(DesignMatrix {
        matrix,
        curve_cols: 0..p_curve,
        weekday_cols: p_curve..p_curve + p_week,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_blocks_and_ranges() {
        let spline = array![[1.0, 2.0], [3.0, 4.0]];
        let weekday = array![[5.0], [6.0]];
        let design = assemble_design(&spline, &weekday).unwrap();
        assert_eq!(design.ncols(), 3);
        assert_eq!(design.curve_cols, 0..2);
        assert_eq!(design.weekday_cols, 2..3);
        assert_eq!(design.matrix[[0, 2]], 5.0);
        assert_eq!(design.curve_block()[[1, 1]], 4.0);
    }

    #[test]
    fn test_row_mismatch_rejected() {
        let spline = array![[1.0], [2.0]];
        let weekday = array![[1.0]];
        assert!(matches!(
            assemble_design(&spline, &weekday),
            Err(EpiCurveError::DimensionMismatch(_))
        ));
    }
}
