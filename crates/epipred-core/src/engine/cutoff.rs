use crate::core::models::cutoffs::{CutoffTable, ScoreDistribution};
use crate::core::models::record::PredictionRecord;
use crate::core::profiles::ScoreDirection;
use crate::core::stats::{Percentile, quantile};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Where per-allele thresholds come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoffPolicy<'a> {
    /// Quantile of each allele's scores over the whole dataset handed to the resolver.
    Global,
    /// Thresholds from a precomputed table, falling back to the quantile of the allele's own rows.
    Default(Option<&'a CutoffTable>),
    /// One threshold for every allele.
    Simple(f64),
}

impl CutoffPolicy<'_> {
    /// Whether thresholds under this policy correspond to a percentile.
    pub fn is_percentile_based(&self) -> bool {
        !matches!(self, CutoffPolicy::Simple(_))
    }
}

fn scores_by_allele(data: &[PredictionRecord]) -> BTreeMap<&str, Vec<f64>> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in data {
        groups
            .entry(record.allele.as_str())
            .or_default()
            .push(record.score);
    }
    groups
}

/// Threshold of one allele group at `percentile` stringency.
pub fn allele_quantile(
    scores: &[f64],
    percentile: Percentile,
    direction: ScoreDirection,
) -> Option<f64> {
    quantile(scores.iter().copied(), direction.quantile_for(percentile))
}

/// Resolves one threshold per allele present in `data`.
///
/// Under [`CutoffPolicy::Default`], an allele that is neither in the table nor has a finite score
/// in `data` is left out of the result, and its rows will not be classified.
pub fn resolve(
    data: &[PredictionRecord],
    percentile: Percentile,
    direction: ScoreDirection,
    policy: CutoffPolicy<'_>,
) -> CutoffTable {
    let groups = scores_by_allele(data);
    let mut table = CutoffTable::new();

    for (allele, scores) in groups {
        let threshold = match policy {
            CutoffPolicy::Simple(value) => Some(value),
            CutoffPolicy::Global => allele_quantile(&scores, percentile, direction),
            CutoffPolicy::Default(precomputed) => {
                precomputed.and_then(|t| t.get(allele)).or_else(|| {
                    debug!(allele, "No precomputed cutoff; using the allele's own rows.");
                    allele_quantile(&scores, percentile, direction)
                })
            }
        };
        match threshold {
            Some(value) => table.insert(allele, value),
            None => warn!(allele, "No cutoff can be resolved for allele; skipping it."),
        }
    }
    table
}

/// Thresholds at `percentile` taken from a stored score distribution.
pub fn from_distribution(distribution: &ScoreDistribution, percentile: Percentile) -> CutoffTable {
    distribution.cutoffs_at(percentile)
}
