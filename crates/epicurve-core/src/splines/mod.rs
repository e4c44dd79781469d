// =============================================================================
// Natural Cubic Spline Basis
// =============================================================================
//
// The smooth trend is modeled as a natural cubic spline over the numeric
// date axis: piecewise cubic, C² at every knot, and linear beyond the
// boundary knots. Linear tails matter here because the most recent days are
// exactly where a cubic tail would whip around under sparse data.
//
// The basis for k interior knots has k + 1 columns and NO constant column:
//
//   column 0:      x / h                     (the linear term, h = boundary span)
//   column 1 + j:  d_j(u) - d_k(u)           (one curvature function per site,
//                                             j = 0..k-1, u = (x - a) / h)
//
// with d_m(u) = [ (u - s_m)₊³ - (u - s_{K-1})₊³ ] / (s_{K-1} - s_m) over the
// rescaled site sequence s = [0, interior..., 1]. The cubic growth of the
// two truncated terms cancels in each difference, which is what makes every
// column linear beyond the boundary sites.
//
// The linear column keeps the axis' epoch offset instead of centering it.
// Over any observation window the offset dwarfs the span, so this column is
// numerically near-constant and carries the baseline level of the curve --
// the model stays intercept-free while still able to represent a flat trend.
//
// Knot placement comes in the two flavors the pipeline needs:
//
//   - `compute_knots_trimmed`: quantile candidates with both boundaries AND
//     the most recent candidate removed (positivity-rate model; recent data
//     are too thin to anchor a knot)
//   - `compute_knots_natural`: the standard df-parameterized placement at
//     equally spaced quantiles (incidence-count model)
//
// =============================================================================

use ndarray::{Array1, Array2};

use crate::error::{EpiCurveError, Result};

/// Natural cubic spline basis with explicit interior knots.
///
/// Returns an n × (k + 1) matrix for k interior knots. The knots must be
/// strictly increasing and strictly inside the boundary interval.
///
/// Fails with `InsufficientData` when there are fewer observations than the
/// basis has columns plus the constant the model implicitly carries.
pub fn ns_basis_with_knots(
    x: &Array1<f64>,
    interior_knots: &[f64],
    boundary: (f64, f64),
) -> Result<Array2<f64>> {
    let n = x.len();
    let k = interior_knots.len();
    let (a, b) = boundary;

    if n == 0 {
        return Err(EpiCurveError::EmptyInput("spline axis is empty".to_string()));
    }
    if !(b > a) {
        return Err(EpiCurveError::InvalidValue(format!(
            "boundary knots must satisfy min < max, got ({a}, {b})"
        )));
    }
    if n < k + 2 {
        return Err(EpiCurveError::InsufficientData {
            n_obs: n,
            n_knots: k,
        });
    }
    for w in interior_knots.windows(2) {
        if w[1] <= w[0] {
            return Err(EpiCurveError::InvalidValue(
                "interior knots must be strictly increasing".to_string(),
            ));
        }
    }
    if k > 0 && (interior_knots[0] <= a || interior_knots[k - 1] >= b) {
        return Err(EpiCurveError::InvalidValue(
            "interior knots must lie strictly inside the boundary interval".to_string(),
        ));
    }

    let h = b - a;

    // Rescaled site sequence: boundaries at 0 and 1, interior in between.
    let mut sites = Vec::with_capacity(k + 2);
    sites.push(0.0);
    sites.extend(interior_knots.iter().map(|&t| (t - a) / h));
    sites.push(1.0);
    let s_last = sites[k + 1];
    let s_penult = sites[k];

    let cube_plus = |v: f64| if v > 0.0 { v * v * v } else { 0.0 };
    let d = |u: f64, s_m: f64| (cube_plus(u - s_m) - cube_plus(u - s_last)) / (s_last - s_m);

    let mut basis = Array2::zeros((n, k + 1));
    for (i, &xi) in x.iter().enumerate() {
        let u = (xi - a) / h;
        basis[[i, 0]] = xi / h;
        let d_k = if k > 0 { d(u, s_penult) } else { 0.0 };
        for j in 0..k {
            basis[[i, 1 + j]] = d(u, sites[j]) - d_k;
        }
    }
    Ok(basis)
}

/// Natural spline basis with df-parameterized knot placement.
///
/// `df - 1` interior knots at equally spaced quantiles of `x`; the returned
/// basis has exactly `df` columns. This is the count-model mode.
pub fn ns_basis(x: &Array1<f64>, df: usize) -> Result<Array2<f64>> {
    let (interior, lo, hi) = compute_knots_natural(x, df)?;
    ns_basis_with_knots(x, &interior, (lo, hi))
}

/// Standard df-parameterized knot placement for natural splines.
///
/// Returns `(interior_knots, boundary_min, boundary_max)` with the interior
/// knots at quantile levels 1/df, ..., (df-1)/df.
pub fn compute_knots_natural(x: &Array1<f64>, df: usize) -> Result<(Vec<f64>, f64, f64)> {
    if df == 0 {
        return Err(EpiCurveError::InvalidValue(
            "spline df must be at least 1".to_string(),
        ));
    }
    let sorted = sorted_axis(x)?;
    let levels: Vec<f64> = (1..df).map(|j| j as f64 / df as f64).collect();
    let interior = knots_at_levels(&sorted, &levels, df - 1)?;
    Ok((interior, sorted[0], sorted[sorted.len() - 1]))
}

/// Rate-model knot placement: quantile candidates with the boundaries and
/// the single most recent candidate removed.
///
/// From `nknots + 2` equally spaced candidate levels in [0, 1], the first,
/// the last, and the second-to-last are dropped; the surviving `nknots - 1`
/// levels are mapped to quantiles of `x`. Dropping the second-to-last keeps
/// the basis from pivoting on a knot anchored in the sparsest, most recent
/// stretch of the series.
pub fn compute_knots_trimmed(x: &Array1<f64>, nknots: usize) -> Result<(Vec<f64>, f64, f64)> {
    let sorted = sorted_axis(x)?;
    let lo = sorted[0];
    let hi = sorted[sorted.len() - 1];
    if nknots <= 1 {
        // Every candidate is a boundary or the trimmed recent one.
        return Ok((Vec::new(), lo, hi));
    }
    let denom = (nknots + 1) as f64;
    let levels: Vec<f64> = (1..nknots).map(|j| j as f64 / denom).collect();
    let interior = knots_at_levels(&sorted, &levels, nknots - 1)?;
    Ok((interior, lo, hi))
}

/// Map quantile levels to axis values, insisting on a strictly increasing,
/// strictly interior knot set. Ties mean the data cannot support this many
/// knots, which is an insufficient-data condition, not a silent degrade.
fn knots_at_levels(sorted: &[f64], levels: &[f64], n_knots: usize) -> Result<Vec<f64>> {
    let knots: Vec<f64> = levels.iter().map(|&p| quantile_type7(sorted, p)).collect();
    let lo = sorted[0];
    let hi = sorted[sorted.len() - 1];
    let strictly_ok = knots.windows(2).all(|w| w[1] > w[0])
        && knots.iter().all(|&t| t > lo && t < hi);
    if !strictly_ok {
        return Err(EpiCurveError::InsufficientData {
            n_obs: sorted.len(),
            n_knots,
        });
    }
    Ok(knots)
}

/// Linear-interpolation (type 7) sample quantile on a sorted slice.
fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let pos = p * (n - 1) as f64;
    let lo = pos.floor() as usize;
    if lo + 1 >= n {
        return sorted[n - 1];
    }
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}

fn sorted_axis(x: &Array1<f64>) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(EpiCurveError::EmptyInput("spline axis is empty".to_string()));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(EpiCurveError::InvalidValue(
            "spline axis contains non-finite values".to_string(),
        ));
    }
    let mut sorted: Vec<f64> = x.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    Ok(sorted)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize) -> Array1<f64> {
        // Day numbers with a realistic epoch offset.
        Array1::from_iter((0..n).map(|i| 18300.0 + i as f64))
    }

    #[test]
    fn test_column_count_is_knots_plus_one() {
        let x = axis(60);
        for k in [0usize, 1, 3, 5] {
            let interior: Vec<f64> = (1..=k)
                .map(|j| 18300.0 + 59.0 * j as f64 / (k + 1) as f64)
                .collect();
            let basis = ns_basis_with_knots(&x, &interior, (18300.0, 18359.0)).unwrap();
            assert_eq!(basis.ncols(), k + 1);
            assert_eq!(basis.nrows(), 60);
        }
    }

    #[test]
    fn test_df_mode_column_count() {
        let x = axis(90);
        for df in [1usize, 2, 3, 5] {
            let basis = ns_basis(&x, df).unwrap();
            assert_eq!(basis.ncols(), df);
        }
    }

    #[test]
    fn test_insufficient_data_is_explicit() {
        let x = axis(5);
        let interior: Vec<f64> = (1..=10).map(|j| 18300.0 + j as f64 * 0.35).collect();
        let err = ns_basis_with_knots(&x, &interior, (18300.0, 18304.0)).unwrap_err();
        match err {
            EpiCurveError::InsufficientData { n_obs, n_knots } => {
                assert_eq!(n_obs, 5);
                assert_eq!(n_knots, 10);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn test_trimmed_placement_drops_boundaries_and_most_recent() {
        let x = axis(100);
        let nknots = 5;
        let (knots, lo, hi) = compute_knots_trimmed(&x, nknots).unwrap();
        assert_eq!(knots.len(), nknots - 1);
        assert!(knots.iter().all(|&t| t > lo && t < hi));
        // The largest surviving level is (nknots-1)/(nknots+1); the dropped
        // most-recent candidate sat at nknots/(nknots+1).
        let highest_kept = quantile_type7(&x.to_vec(), (nknots - 1) as f64 / (nknots + 1) as f64);
        let dropped_recent = quantile_type7(&x.to_vec(), nknots as f64 / (nknots + 1) as f64);
        assert!((knots[knots.len() - 1] - highest_kept).abs() < 1e-9);
        assert!(knots[knots.len() - 1] < dropped_recent);
    }

    #[test]
    fn test_trimmed_placement_degenerates_to_no_knots() {
        let x = axis(20);
        let (knots, _, _) = compute_knots_trimmed(&x, 1).unwrap();
        assert!(knots.is_empty());
        let (knots, _, _) = compute_knots_trimmed(&x, 0).unwrap();
        assert!(knots.is_empty());
    }

    #[test]
    fn test_linear_beyond_boundary_knots() {
        // Evaluate the basis on a grid extending past both boundaries and
        // check that second differences vanish outside while the spline is
        // genuinely curved inside.
        let interior = vec![18320.0, 18335.0];
        let boundary = (18300.0, 18350.0);
        // 18280..18370 in half-day steps; boundaries sit at i = 40 and i = 140.
        let grid: Array1<f64> = Array1::from_iter((0..181).map(|i| 18280.0 + i as f64 * 0.5));
        let basis = ns_basis_with_knots(&grid, &interior, boundary).unwrap();

        let second_diff = |col: usize, i: usize| {
            basis[[i + 1, col]] - 2.0 * basis[[i, col]] + basis[[i - 1, col]]
        };
        for col in 0..basis.ncols() {
            for i in 1..39 {
                assert!(second_diff(col, i).abs() < 1e-8, "left tail curved");
            }
            for i in 142..180 {
                assert!(second_diff(col, i).abs() < 1e-8, "right tail curved");
            }
        }
        // Inside the knot span at least one column must carry curvature.
        let mid_curved = (1..basis.ncols()).any(|col| second_diff(col, 100).abs() > 1e-10);
        assert!(mid_curved);
    }

    #[test]
    fn test_basis_values_finite_and_continuous() {
        let x = axis(200);
        let basis = ns_basis(&x, 6).unwrap();
        assert!(basis.iter().all(|v| v.is_finite()));
        // Adjacent-day basis values should move smoothly (no jumps).
        for col in 0..basis.ncols() {
            for i in 1..basis.nrows() {
                assert!((basis[[i, col]] - basis[[i - 1, col]]).abs() < 1.0);
            }
        }
    }

    #[test]
    fn test_quantile_type7_matches_known_values() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert!((quantile_type7(&v, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile_type7(&v, 1.0) - 4.0).abs() < 1e-12);
        assert!((quantile_type7(&v, 0.5) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_df_zero_rejected() {
        let x = axis(30);
        assert!(matches!(
            ns_basis(&x, 0),
            Err(EpiCurveError::InvalidValue(_))
        ));
    }
}
