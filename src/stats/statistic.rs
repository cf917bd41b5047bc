//! Descriptive statistics over a fixed, non-empty sample.
//!
//! [`Statistic`] never changes after construction: every derived quantity is
//! computed from the stored sample on demand. Two statistics are ranked by
//! their *risk-adjusted* value, `mean - std`, which penalises high-variance
//! samples when choosing between candidates.

use std::cmp::Ordering;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Display precision used when none is given.
pub const DEFAULT_PRECISION: usize = 2;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Plain-data export of a [`Statistic`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Statistic
// ---------------------------------------------------------------------------

/// An immutable sample with mean/std/min/max/sum accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistic {
    values: Vec<f64>,
    precision: usize,
}

#[allow(clippy::len_without_is_empty)]
impl Statistic {
    /// Build a statistic rendered with [`DEFAULT_PRECISION`] decimals.
    pub fn new(values: Vec<f64>) -> Result<Self, StatsError> {
        Self::with_precision(values, DEFAULT_PRECISION)
    }

    /// Build a statistic rendered with `precision` decimals (0 renders
    /// integers).
    pub fn with_precision(values: Vec<f64>, precision: usize) -> Result<Self, StatsError> {
        if values.is_empty() {
            return Err(StatsError::EmptySample);
        }
        Ok(Self { values, precision })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Sample size (always at least one).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.values.len() as f64
    }

    /// Population standard deviation (divides by N, not N - 1).
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.values.len() as f64;
        variance.sqrt()
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    // ------------------------------------------------------------------
    // Risk-adjusted comparison
    // ------------------------------------------------------------------

    /// `mean - std`, the value all comparisons are based on.
    pub fn risk_adjusted(&self) -> f64 {
        self.mean() - self.std()
    }

    /// `(self.mean - self.std) - (other.mean - other.std)`.
    pub fn risk_adjusted_diff(&self, other: &Self) -> f64 {
        self.risk_adjusted() - other.risk_adjusted()
    }

    /// Strictly better: the risk-adjusted difference is positive.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.risk_adjusted_diff(other) > 0.0
    }

    /// Better or tied: the risk-adjusted difference is non-negative.
    pub fn is_at_least(&self, other: &Self) -> bool {
        self.risk_adjusted_diff(other) >= 0.0
    }

    /// Total order over the risk-adjusted value. A NaN value ranks below
    /// every number, so it never wins a selection.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }

    fn rank(&self) -> Option<OrderedFloat<f64>> {
        let value = self.risk_adjusted();
        (!value.is_nan()).then_some(OrderedFloat(value))
    }

    pub fn summary(&self) -> StatisticSummary {
        StatisticSummary {
            mean: self.mean(),
            std: self.std(),
            min: self.min(),
            max: self.max(),
        }
    }
}

/// Render `value` rounded to `precision` decimals.
///
/// Trailing zeros are dropped down to a single decimal (`1.50` -> `1.5`,
/// `2.00` -> `2.0`); precision 0 renders an integer. A value that rounds to
/// zero never carries a minus sign.
pub(crate) fn fmt_rounded(value: f64, precision: usize) -> String {
    let mut s = format!("{value:.precision$}");
    if precision > 0 && value.is_finite() {
        let trimmed = s.trim_end_matches('0');
        let keep = if trimmed.ends_with('.') {
            trimmed.len() + 1
        } else {
            trimmed.len()
        };
        s.truncate(keep);
    }
    if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
        s.remove(0);
    }
    s
}

impl fmt::Display for Statistic {
    /// `"{mean} +/- {std}"` at the configured precision.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} +/- {}",
            fmt_rounded(self.mean(), self.precision),
            fmt_rounded(self.std(), self.precision),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
