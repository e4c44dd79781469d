// =============================================================================
// Raw Record Cleaning
// =============================================================================
//
// The reporting feed is messy in two specific ways this module owns:
//
//   - OUTCOME STRINGS: the lab result arrives as free-ish text in a mix of
//     spellings and languages. Classification is a fixed table lookup, and
//     anything unrecognized is `Other`, counted in neither the numerator
//     nor the denominator of the positivity rate.
//
//   - DATES: the sample date is sometimes missing or later than the date
//     the feed was pulled. What to do then is an explicit, named policy
//     passed in by the caller, not a code path toggled in the source.
//
// The evaluation date is always a parameter. Nothing in this crate reads
// the system clock, so a pipeline run is reproducible from its inputs.
//
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single diagnostic test report as it arrives from the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    /// Date the record entered the reporting system.
    pub reported_date: NaiveDate,
    /// Date the sample was taken, when the feed has it.
    pub sample_date: Option<NaiveDate>,
    /// Raw outcome string, classified by `classify_outcome`.
    pub outcome: String,
}

/// A single event report (deaths or admissions) with a numeric count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub reported_date: NaiveDate,
    pub sample_date: Option<NaiveDate>,
    /// Number of events this record represents (usually 1).
    pub count: u64,
}

/// Classified test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    Positive,
    Negative,
    /// Inconclusive, pending, or unparseable: excluded from both the
    /// numerator and the denominator.
    Other,
}

/// A record that survived cleaning, pinned to one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanTestRecord {
    pub date: NaiveDate,
    pub outcome: TestOutcome,
}

/// A cleaned event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanEventRecord {
    pub date: NaiveDate,
    pub count: u64,
}

/// What to do with a record whose sample date is missing or inconsistent
/// with the evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateCleaningPolicy {
    /// Fall back to the reported date (and drop the record only if that is
    /// also in the future).
    ImputeFromReportedDate,
    /// Drop the record outright.
    DropInconsistentRows,
}

/// Classify a raw outcome string.
///
/// Matching is case- and whitespace-insensitive and covers the spellings
/// the feed has actually produced.
pub fn classify_outcome(raw: &str) -> TestOutcome {
    match raw.trim().to_lowercase().as_str() {
        "positive" | "positivo" | "pos" | "detected" => TestOutcome::Positive,
        "negative" | "negativo" | "neg" | "not detected" => TestOutcome::Negative,
        _ => TestOutcome::Other,
    }
}

/// Resolve a record's effective date under the given policy.
///
/// Returns `None` when the record must be dropped.
fn effective_date(
    sample_date: Option<NaiveDate>,
    reported_date: NaiveDate,
    policy: DateCleaningPolicy,
    evaluation_date: NaiveDate,
) -> Option<NaiveDate> {
    match sample_date {
        Some(d) if d <= evaluation_date => Some(d),
        _ => match policy {
            DateCleaningPolicy::ImputeFromReportedDate if reported_date <= evaluation_date => {
                Some(reported_date)
            }
            _ => None,
        },
    }
}

/// Clean a batch of test records.
pub fn clean_test_records(
    records: &[TestRecord],
    policy: DateCleaningPolicy,
    evaluation_date: NaiveDate,
) -> Vec<CleanTestRecord> {
    records
        .iter()
        .filter_map(|r| {
            effective_date(r.sample_date, r.reported_date, policy, evaluation_date).map(|date| {
                CleanTestRecord {
                    date,
                    outcome: classify_outcome(&r.outcome),
                }
            })
        })
        .collect()
}

/// Clean a batch of event records.
pub fn clean_event_records(
    records: &[EventRecord],
    policy: DateCleaningPolicy,
    evaluation_date: NaiveDate,
) -> Vec<CleanEventRecord> {
    records
        .iter()
        .filter_map(|r| {
            effective_date(r.sample_date, r.reported_date, policy, evaluation_date)
                .map(|date| CleanEventRecord {
                    date,
                    count: r.count,
                })
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, d).unwrap()
    }

    #[test]
    fn test_classify_known_spellings() {
        assert_eq!(classify_outcome("Positive"), TestOutcome::Positive);
        assert_eq!(classify_outcome(" POSITIVO "), TestOutcome::Positive);
        assert_eq!(classify_outcome("negativo"), TestOutcome::Negative);
        assert_eq!(classify_outcome("Not Detected"), TestOutcome::Negative);
        assert_eq!(classify_outcome("inconclusive"), TestOutcome::Other);
        assert_eq!(classify_outcome(""), TestOutcome::Other);
    }

    #[test]
    fn test_impute_policy_uses_reported_date() {
        let records = vec![TestRecord {
            reported_date: day(10),
            sample_date: None,
            outcome: "positive".to_string(),
        }];
        let cleaned = clean_test_records(
            &records,
            DateCleaningPolicy::ImputeFromReportedDate,
            day(20),
        );
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].date, day(10));
    }

    #[test]
    fn test_drop_policy_discards_dateless_rows() {
        let records = vec![TestRecord {
            reported_date: day(10),
            sample_date: None,
            outcome: "positive".to_string(),
        }];
        let cleaned =
            clean_test_records(&records, DateCleaningPolicy::DropInconsistentRows, day(20));
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_future_sample_date_falls_back_by_policy() {
        let records = vec![TestRecord {
            reported_date: day(12),
            sample_date: Some(day(25)),
            outcome: "negative".to_string(),
        }];
        let imputed = clean_test_records(
            &records,
            DateCleaningPolicy::ImputeFromReportedDate,
            day(20),
        );
        assert_eq!(imputed[0].date, day(12));
        let dropped =
            clean_test_records(&records, DateCleaningPolicy::DropInconsistentRows, day(20));
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_event_records_follow_the_same_policy() {
        let records = vec![
            EventRecord {
                reported_date: day(8),
                sample_date: Some(day(7)),
                count: 2,
            },
            EventRecord {
                reported_date: day(9),
                sample_date: None,
                count: 1,
            },
        ];
        let imputed = clean_event_records(
            &records,
            DateCleaningPolicy::ImputeFromReportedDate,
            day(20),
        );
        assert_eq!(imputed.len(), 2);
        assert_eq!(imputed[0].date, day(7));
        assert_eq!(imputed[1].date, day(9));
        let dropped =
            clean_event_records(&records, DateCleaningPolicy::DropInconsistentRows, day(20));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].count, 2);
    }

    #[test]
    fn test_record_entirely_in_the_future_is_always_dropped() {
        let records = vec![TestRecord {
            reported_date: day(25),
            sample_date: Some(day(26)),
            outcome: "positive".to_string(),
        }];
        for policy in [
            DateCleaningPolicy::ImputeFromReportedDate,
            DateCleaningPolicy::DropInconsistentRows,
        ] {
            assert!(clean_test_records(&records, policy, day(20)).is_empty());
        }
    }
}
