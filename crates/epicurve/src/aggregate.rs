// =============================================================================
// Daily Series Aggregation
// =============================================================================
//
// Collapses cleaned per-record data into one row per calendar date, sorted
// ascending. Calendar gaps stay gaps: no interpolation here, the spline
// handles missing days naturally through the numeric axis.
//
// =============================================================================

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::records::{CleanEventRecord, CleanTestRecord, TestOutcome};

/// One day of the positivity-rate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: NaiveDate,
    /// Positive tests.
    pub successes: u64,
    /// Positive + negative tests; `Other` outcomes never count.
    pub trials: u64,
}

/// One day of the event-count series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountObservation {
    pub date: NaiveDate,
    pub count: u64,
}

/// Aggregate cleaned test records into the daily rate series.
///
/// A date whose records are all `Other` has no defined denominator and is
/// not emitted; a date with at least one conclusive record is.
pub fn aggregate_rate(records: &[CleanTestRecord]) -> Vec<RateObservation> {
    let mut by_date: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for r in records {
        let entry = by_date.entry(r.date).or_insert((0, 0));
        match r.outcome {
            TestOutcome::Positive => {
                entry.0 += 1;
                entry.1 += 1;
            }
            TestOutcome::Negative => {
                entry.1 += 1;
            }
            TestOutcome::Other => {}
        }
    }
    by_date
        .into_iter()
        .filter(|&(_, (_, trials))| trials > 0)
        .map(|(date, (successes, trials))| RateObservation {
            date,
            successes,
            trials,
        })
        .collect()
}

/// Aggregate cleaned event records into the daily count series.
pub fn aggregate_counts(records: &[CleanEventRecord]) -> Vec<CountObservation> {
    let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for r in records {
        *by_date.entry(r.date).or_insert(0) += r.count;
    }
    by_date
        .into_iter()
        .map(|(date, count)| CountObservation { date, count })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
