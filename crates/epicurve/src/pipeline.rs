// =============================================================================
// Trend Pipeline
// =============================================================================
//
// The two model runs the dashboard consumes:
//
//   - POSITIVITY RATE: daily positives out of daily tests, binomial family,
//     logit link, trial counts as prior weights. Knots from trimmed
//     quantile candidates: boundaries and the most recent candidate are
//     removed, because the newest stretch of the series is exactly where
//     test data are still trickling in.
//
//   - INCIDENCE COUNT: daily event counts, Poisson family, log link, one
//     knot per ~30 observations at plain quantiles.
//
// Both runs share one shape: numeric date axis → spline block + weekday
// block → quasi-likelihood fit → curve standard errors → one output row
// per input date, in input order. The runs are pure functions over their
// inputs and entirely independent of each other; callers that want them
// concurrent can spawn them on two threads without coordination.
//
// Output is the linear predictor and its standard error. The inverse-link
// band for plotting is `response_band`, kept separate so consumers that
// need the raw predictor scale (e.g. for growth-rate arithmetic) get it
// untouched.
//
// =============================================================================

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use epicurve_core::{
    assemble_design, compute_knots_trimmed, curve_with_se, fit_quasi_glm, ns_basis,
    ns_basis_with_knots, weekday_contrasts, BinomialFamily, EpiCurveError, IRLSConfig, Link,
    LogLink, LogitLink, PoissonFamily, Result,
};

use crate::aggregate::{CountObservation, RateObservation};

/// One day of smoothed trend: the fitted linear predictor and its
/// pointwise standard error, curve columns only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub date: NaiveDate,
    pub fit: f64,
    pub standard_error: f64,
}

/// A completed model run: the smoothed rows plus the aggregated input
/// observations, handed back unchanged for the snapshot artifact.
#[derive(Debug, Clone, Serialize)]
pub struct TrendFit<O> {
    pub rows: Vec<PredictionRow>,
    pub observations: Vec<O>,
    /// Pearson dispersion estimate (pre-floor).
    pub dispersion: f64,
    /// IRLS iterations used.
    pub iterations: usize,
}

/// Fit the smoothed test-positivity trend.
///
/// Knot budget: `df = round(3n/30)` target degrees of freedom (roughly
/// three per month of data), then a `df - 1` knot request handed to the
/// trimmed quantile placement, which drops both boundary candidates and
/// the most recent one.
///
/// Days with zero trials are retained as zero-weight rows: they get a
/// fitted value and standard error like any other day but contribute
/// nothing to the fit (logged per row as a warning).
pub fn fit_positivity_trend(observations: &[RateObservation]) -> Result<TrendFit<RateObservation>> {
    let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
    let x = numeric_axis(&dates)?;

    for o in observations {
        if o.successes > o.trials {
            return Err(EpiCurveError::InvalidValue(format!(
                "{}: {} positives out of {} tests",
                o.date, o.successes, o.trials
            )));
        }
        if o.trials == 0 {
            warn!("{}: zero tests reported, day carried with weight 0", o.date);
        }
    }

    let n = observations.len();
    let df = (3.0 * n as f64 / 30.0).round() as usize;
    let nknots = df.saturating_sub(1);
    let (interior, lo, hi) = compute_knots_trimmed(&x, nknots)?;
    let spline = ns_basis_with_knots(&x, &interior, (lo, hi))?;

    let y: Array1<f64> = observations
        .iter()
        .map(|o| {
            if o.trials == 0 {
                0.0
            } else {
                o.successes as f64 / o.trials as f64
            }
        })
        .collect();
    let weights: Array1<f64> = observations.iter().map(|o| o.trials as f64).collect();

    let rows = run_model(&dates, spline, &y, &weights, Model::Rate)?;
    Ok(finish(rows, observations))
}

/// Fit the smoothed incidence trend from daily event counts.
///
/// Knot budget: `df = round(n/30)` degrees of freedom with standard
/// df-parameterized quantile placement.
pub fn fit_incidence_trend(observations: &[CountObservation]) -> Result<TrendFit<CountObservation>> {
    let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
    let x = numeric_axis(&dates)?;

    let n = observations.len();
    let df = (n as f64 / 30.0).round() as usize;
    if df == 0 {
        return Err(EpiCurveError::InsufficientData {
            n_obs: n,
            n_knots: 0,
        });
    }
    let spline = ns_basis(&x, df)?;

    let y: Array1<f64> = observations.iter().map(|o| o.count as f64).collect();
    let weights = Array1::from_elem(n, 1.0);

    let rows = run_model(&dates, spline, &y, &weights, Model::Count)?;
    Ok(finish(rows, observations))
}

/// Inverse-link confidence band on the response scale.
///
/// For the logit link every endpoint lands strictly inside (0, 1); for the
/// log link, strictly above 0.
pub fn response_band(
    rows: &[PredictionRow],
    link: &dyn Link,
    confidence: f64,
) -> Result<Vec<(f64, f64)>> {
    let z = epicurve_core::z_quantile(confidence)?;
    let lo: Array1<f64> = rows.iter().map(|r| r.fit - z * r.standard_error).collect();
    let hi: Array1<f64> = rows.iter().map(|r| r.fit + z * r.standard_error).collect();
    let lo = link.inverse(&lo);
    let hi = link.inverse(&hi);
    Ok(lo.iter().copied().zip(hi.iter().copied()).collect())
}

// =============================================================================
// Shared plumbing
// =============================================================================

enum Model {
    Rate,
    Count,
}

/// Numeric axis: days since 1970-01-01, as f64.
///
/// The epoch offset is kept on purpose; see `epicurve_core::splines` for
/// how the basis uses it to carry the curve's baseline.
fn numeric_axis(dates: &[NaiveDate]) -> Result<Array1<f64>> {
    if dates.is_empty() {
        return Err(EpiCurveError::EmptyInput(
            "observation sequence is empty".to_string(),
        ));
    }
    for w in dates.windows(2) {
        if w[1] <= w[0] {
            return Err(EpiCurveError::InvalidValue(format!(
                "observation dates must be strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }
    }
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch");
    Ok(dates.iter().map(|d| (*d - epoch).num_days() as f64).collect())
}

fn run_model(
    dates: &[NaiveDate],
    spline: ndarray::Array2<f64>,
    y: &Array1<f64>,
    weights: &Array1<f64>,
    model: Model,
) -> Result<(Vec<PredictionRow>, f64, usize)> {
    let weekdays: Vec<chrono::Weekday> = dates.iter().map(|d| d.weekday()).collect();
    let weekday_block = weekday_contrasts(&weekdays)?;
    let design = assemble_design(&spline, &weekday_block)?;

    let config = IRLSConfig::default();
    let fit = match model {
        Model::Rate => fit_quasi_glm(y, &design.matrix, weights, &BinomialFamily, &LogitLink, &config)?,
        Model::Count => fit_quasi_glm(y, &design.matrix, weights, &PoissonFamily, &LogLink, &config)?,
    };
    debug!(
        "fit over {} days: {} curve columns, dispersion {:.3}, {} iterations",
        dates.len(),
        design.curve_cols.len(),
        fit.dispersion,
        fit.iterations
    );

    let estimate = curve_with_se(&design, &fit)?;
    let rows = dates
        .iter()
        .zip(estimate.fit.iter())
        .zip(estimate.se.iter())
        .map(|((&date, &f), &se)| PredictionRow {
            date,
            fit: f,
            standard_error: se,
        })
        .collect();
    Ok((rows, fit.dispersion, fit.iterations))
}

fn finish<O: Clone>(
    (rows, dispersion, iterations): (Vec<PredictionRow>, f64, usize),
    observations: &[O],
) -> TrendFit<O> {
    TrendFit {
        rows,
        observations: observations.to_vec(),
        dispersion,
        iterations,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 1).unwrap() + chrono::Duration::days(offset)
    }

    #[test]
    fn test_axis_is_days_since_epoch() {
        let dates = vec![date(0), date(1), date(5)];
        let x = numeric_axis(&dates).unwrap();
        assert_eq!(x[1] - x[0], 1.0);
        assert_eq!(x[2] - x[0], 5.0);
        // 2020-06-01 is 18414 days after 1970-01-01.
        assert_eq!(x[0], 18414.0);
    }

    #[test]
    fn test_axis_rejects_unordered_dates() {
        let dates = vec![date(0), date(2), date(2)];
        assert!(matches!(
            numeric_axis(&dates),
            Err(EpiCurveError::InvalidValue(_))
        ));
        let dates = vec![date(3), date(1)];
        assert!(numeric_axis(&dates).is_err());
    }

    #[test]
    fn test_rows_align_with_input_order() {
        let observations: Vec<RateObservation> = (0..40)
            .map(|i| RateObservation {
                date: date(i),
                successes: 8 + (i as u64 % 3),
                trials: 100,
            })
            .collect();
        let fit = fit_positivity_trend(&observations).unwrap();
        assert_eq!(fit.rows.len(), observations.len());
        for (row, obs) in fit.rows.iter().zip(observations.iter()) {
            assert_eq!(row.date, obs.date);
            assert!(row.fit.is_finite());
            assert!(row.standard_error > 0.0);
        }
        assert_eq!(fit.observations, observations);
    }

    #[test]
    fn test_invalid_rate_observation_rejected() {
        let observations = vec![RateObservation {
            date: date(0),
            successes: 5,
            trials: 3,
        }];
        assert!(matches!(
            fit_positivity_trend(&observations),
            Err(EpiCurveError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_count_model_needs_a_month_of_data() {
        let observations: Vec<CountObservation> = (0..10)
            .map(|i| CountObservation {
                date: date(i),
                count: 5,
            })
            .collect();
        assert!(matches!(
            fit_incidence_trend(&observations),
            Err(EpiCurveError::InsufficientData { n_obs: 10, n_knots: 0 })
        ));
    }

    #[test]
    fn test_band_respects_link_range() {
        let rows = vec![
            PredictionRow { date: date(0), fit: -2.0, standard_error: 0.4 },
            PredictionRow { date: date(1), fit: 3.0, standard_error: 2.0 },
        ];
        let band = response_band(&rows, &LogitLink, 0.95).unwrap();
        for (lo, hi) in band {
            assert!(lo > 0.0 && hi < 1.0 && lo < hi);
        }
    }
}
