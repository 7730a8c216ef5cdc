use std::fmt;
use thiserror::Error;

/// Number of quantile levels tabulated per allele (0.01 through 0.99).
pub const QUANTILE_LEVELS: u8 = 99;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("Percentile must lie strictly between 0 and 1, got {0}")]
pub struct InvalidPercentile(pub f64);

/// A stringency level in the open interval (0, 1).
///
/// A higher percentile always means a harder threshold to pass, whichever way the underlying score
/// is oriented. Cutoff tables are indexed by hundredths, see [`Percentile::level`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentile(f64);

impl Percentile {
    pub fn new(value: f64) -> Result<Self, InvalidPercentile> {
        if value.is_finite() && value > 0.0 && value < 1.0 {
            Ok(Self(value))
        } else {
            Err(InvalidPercentile(value))
        }
    }

    /// Builds a percentile from a level in hundredths (`1..=99`).
    pub fn from_level(level: u8) -> Result<Self, InvalidPercentile> {
        Self::new(f64::from(level) / 100.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The percentile expressed in hundredths, rounded to the nearest tabulated level (`1..=99`).
    pub fn level(self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, QUANTILE_LEVELS)
    }

    pub fn complement(self) -> f64 {
        1.0 - self.0
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the finite values of `values` sorted ascending.
pub fn sorted_finite(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Empirical quantile of an ascending slice using linear interpolation between the two nearest
/// order statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn quantile(values: impl IntoIterator<Item = f64>, q: f64) -> Option<f64> {
    quantile_sorted(&sorted_finite(values), q)
}
