// =============================================================================
// epicurve
// =============================================================================
//
// Smoothed test-positivity and incidence trends with confidence bands.
//
// This crate is the pipeline surface around the statistical engine in
// `epicurve-core`: it cleans raw feed records under an explicit date
// policy, aggregates them into daily series, and runs the two model fits
// the dashboard plots. Everything downstream of the fit (persistence of
// the snapshot, plotting, scheduling) belongs to the caller; the output
// here is plain serializable data.
//
// A typical run:
//
//     use epicurve::records::{clean_test_records, DateCleaningPolicy};
//     use epicurve::aggregate::aggregate_rate;
//     use epicurve::pipeline::fit_positivity_trend;
//
//     let cleaned = clean_test_records(&raw, DateCleaningPolicy::ImputeFromReportedDate, today);
//     let series = aggregate_rate(&cleaned);
//     let trend = fit_positivity_trend(&series)?;
//
// The incidence-count run is the same shape and fully independent; the two
// fits share no state and may run concurrently.
//
// =============================================================================

pub mod aggregate;
pub mod pipeline;
pub mod records;

pub use aggregate::{aggregate_counts, aggregate_rate, CountObservation, RateObservation};
pub use pipeline::{
    fit_incidence_trend, fit_positivity_trend, response_band, PredictionRow, TrendFit,
};
pub use records::{
    classify_outcome, clean_event_records, clean_test_records, CleanEventRecord, CleanTestRecord,
    DateCleaningPolicy, EventRecord, TestOutcome, TestRecord,
};

// The engine types callers need to hold or match on.
pub use epicurve_core::{EpiCurveError, LogLink, LogitLink, Result};
