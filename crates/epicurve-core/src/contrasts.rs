// =============================================================================
// Weekday Contrasts
// =============================================================================
//
// Reporting feeds have a strong day-of-week signature (weekend labs, Monday
// backlogs). The fit absorbs it with a weekday factor coded as sum-to-zero
// deviation contrasts: 6 columns for 7 levels, with the full week of code
// rows summing to the zero vector. That zero-sum is what lets the spline
// block alone be read as the average-weekday trend.
//
// The coding is a fixed table indexed by weekday, not discovered from the
// data: Sunday..Friday map to the six unit rows, Saturday to (-1, ..., -1).
// The sign/order convention is internal; only the zero-sum property is
// contractual.
//
// =============================================================================

use chrono::Weekday;
use ndarray::Array2;

use crate::error::{EpiCurveError, Result};

/// Number of weekday levels.
pub const WEEKDAY_LEVELS: usize = 7;

/// Number of contrast columns (levels - 1).
pub const WEEKDAY_COLS: usize = WEEKDAY_LEVELS - 1;

/// The 7 × 6 deviation-coding table, rows indexed Sunday..Saturday.
const CONTRAST_TABLE: [[f64; WEEKDAY_COLS]; WEEKDAY_LEVELS] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    [-1.0, -1.0, -1.0, -1.0, -1.0, -1.0],
];

/// Contrast row for a single weekday.
pub fn weekday_contrast_row(day: Weekday) -> &'static [f64; WEEKDAY_COLS] {
    &CONTRAST_TABLE[day.num_days_from_sunday() as usize]
}

/// Build the n × 6 weekday block for a sequence of observation weekdays.
pub fn weekday_contrasts(days: &[Weekday]) -> Result<Array2<f64>> {
    if days.is_empty() {
        return Err(EpiCurveError::EmptyInput(
            "weekday label sequence is empty".to_string(),
        ));
    }
    let mut block = Array2::zeros((days.len(), WEEKDAY_COLS));
    for (i, &day) in days.iter().enumerate() {
        let row = weekday_contrast_row(day);
        for (j, &v) in row.iter().enumerate() {
            block[[i, j]] = v;
        }
    }
    Ok(block)
}

// =============================================================================
// Tests
// =============================================================================
