use crate::core::models::cutoffs::{QuantilePoint, ScoreDistribution};
use crate::core::models::record::PredictionRecord;
use crate::core::profiles::ScoreDirection;
use crate::core::stats::{QUANTILE_LEVELS, quantile_sorted, sorted_finite};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scores of one allele, one per distinct peptide (first occurrence wins).
fn allele_scores(records: &[PredictionRecord]) -> Vec<(&str, Vec<f64>)> {
    let mut groups: BTreeMap<&str, (HashSet<&str>, Vec<f64>)> = BTreeMap::new();
    for record in records {
        let (seen, scores) = groups.entry(record.allele.as_str()).or_default();
        if seen.insert(record.peptide.as_str()) {
            scores.push(record.score);
        }
    }
    groups
        .into_iter()
        .map(|(allele, (_, scores))| (allele, scores))
        .collect()
}

/// The 99 oriented quantile points of one allele's scores, or `None` if it has no finite score.
fn quantile_table(scores: &[f64], direction: ScoreDirection) -> Option<Vec<QuantilePoint>> {
    let sorted = sorted_finite(scores.iter().copied());
    if sorted.is_empty() {
        return None;
    }
    let points = (1..=QUANTILE_LEVELS)
        .filter_map(|k| {
            let value = quantile_sorted(&sorted, f64::from(k) / 100.0)?;
            let level = match direction {
                ScoreDirection::LowerIsBetter => 100 - k,
                ScoreDirection::HigherIsBetter => k,
            };
            Some(QuantilePoint { level, value })
        })
        .collect();
    Some(points)
}

/// Estimates per-allele score distributions from a batch of records.
///
/// Returns `None` when there are no records, so "no data" stays distinguishable from a
/// distribution over alleles.
#[instrument(skip_all, name = "score_distribution")]
pub fn estimate(
    records: &[PredictionRecord],
    direction: ScoreDirection,
) -> Option<ScoreDistribution> {
    if records.is_empty() {
        warn!("No prediction data to estimate score distributions from.");
        return None;
    }

    let groups = allele_scores(records);

    let iterator = groups.iter();

    #[cfg(feature = "parallel")]
    let iterator = groups.par_iter();

    let tables: Vec<(&str, Option<Vec<QuantilePoint>>)> = iterator
        .map(|(allele, scores)| (*allele, quantile_table(scores, direction)))
        .collect();

    let mut distribution = ScoreDistribution::new(direction);
    for (allele, table) in tables {
        match table {
            Some(points) => distribution.insert_allele(allele, points),
            None => debug!(allele, "Allele has no finite scores; no quantiles recorded."),
        }
    }

    info!(
        alleles = distribution.len(),
        records = records.len(),
        %direction,
        "Estimated score distributions."
    );
    Some(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::Percentile;

    fn record(peptide: &str, allele: &str, score: f64) -> PredictionRecord {
        PredictionRecord::new(peptide, peptide, 0, "P1", allele, score)
    }

    fn uniform(allele: &str, n: usize) -> Vec<PredictionRecord> {
        (0..n)
            .map(|i| record(&format!("PEP{:04}", i), allele, i as f64))
            .collect()
    }

    fn assert_monotonic_in_stringency(dist: &ScoreDistribution) {
        for (allele, points) in dist.iter() {
            assert_eq!(points.len(), 99, "allele {allele}");
            for pair in points.windows(2) {
                assert!(pair[0].level < pair[1].level);
                match dist.direction() {
                    ScoreDirection::HigherIsBetter => assert!(pair[0].value <= pair[1].value),
                    ScoreDirection::LowerIsBetter => assert!(pair[0].value >= pair[1].value),
                }
            }
        }
    }

    #[test]
    fn empty_input_yields_no_distribution() {
        assert!(estimate(&[], ScoreDirection::LowerIsBetter).is_none());
    }

    #[test]
    fn levels_are_oriented_so_higher_means_more_stringent() {
        let mut records = uniform("A", 1000);
        records.extend(uniform("B", 200));

        let lower = estimate(&records, ScoreDirection::LowerIsBetter).unwrap();
        assert_eq!(lower.len(), 2);
        assert_monotonic_in_stringency(&lower);
        let p98 = Percentile::new(0.98).unwrap();
        assert!((lower.value_at("A", p98).unwrap() - 19.98).abs() < 1e-9);

        let higher = estimate(&records, ScoreDirection::HigherIsBetter).unwrap();
        assert_monotonic_in_stringency(&higher);
        assert!((higher.value_at("A", p98).unwrap() - 979.02).abs() < 1e-9);
    }

    #[test]
    fn duplicate_peptides_per_allele_count_once() {
        let records = vec![
            record("AAA", "A", 10.0),
            record("AAA", "A", 1000.0),
            record("BBB", "A", 20.0),
            record("AAA", "B", 5.0),
        ];
        let dist = estimate(&records, ScoreDirection::HigherIsBetter).unwrap();
        let top = Percentile::new(0.99).unwrap();
        assert!((dist.value_at("A", top).unwrap() - 19.9).abs() < 1e-9);
        assert_eq!(dist.value_at("B", top), Some(5.0));
    }

    #[test]
    fn alleles_without_finite_scores_are_left_out() {
        let records = vec![record("AAA", "A", f64::NAN), record("AAA", "B", 1.0)];
        let dist = estimate(&records, ScoreDirection::LowerIsBetter).unwrap();
        assert_eq!(dist.alleles().collect::<Vec<_>>(), vec!["B"]);
    }
}
