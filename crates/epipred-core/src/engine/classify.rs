use crate::core::models::binder::Binder;
use crate::core::models::cutoffs::CutoffTable;
use crate::core::models::record::PredictionRecord;
use crate::core::profiles::ScoreDirection;
use crate::core::stats::Percentile;
use crate::engine::cutoff::{self, CutoffPolicy};
use crate::engine::error::AnalysisError;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Assigns ranks by score, best first, and returns the records sorted by `(rank, name, allele)`.
///
/// Tied scores share the lowest rank of their run and the next distinct score skips past the tie
/// (`1, 2, 2, 4`).
pub fn rank(records: &[PredictionRecord], direction: ScoreDirection) -> Vec<PredictionRecord> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| direction.compare(records[a].score, records[b].score));

    let mut ranked: Vec<PredictionRecord> = Vec::with_capacity(records.len());
    let mut current_rank = 0;
    let mut previous: Option<f64> = None;
    for (i, &idx) in order.iter().enumerate() {
        let score = records[idx].score;
        if previous.is_none_or(|p| p.total_cmp(&score).is_ne()) {
            current_rank = i + 1;
            previous = Some(score);
        }
        let mut record = records[idx].clone();
        record.rank = Some(current_rank);
        ranked.push(record);
    }

    ranked.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.allele.cmp(&b.allele))
    });
    ranked
}

/// Ranks each allele's records on its own when any record arrived without a rank.
///
/// Ranked output is grouped by allele in name order, best first within each allele. Fully ranked
/// input is returned untouched.
pub fn ensure_ranked(
    records: Cow<'_, [PredictionRecord]>,
    direction: ScoreDirection,
) -> Cow<'_, [PredictionRecord]> {
    if records.iter().all(|r| r.rank.is_some()) {
        return records;
    }
    let ranked: Vec<PredictionRecord> = group_by_allele(&records)
        .into_values()
        .flat_map(|group| {
            let group: Vec<PredictionRecord> = group.into_iter().cloned().collect();
            rank(&group, direction)
        })
        .collect();
    debug!(records = ranked.len(), "Ranked records per allele.");
    Cow::Owned(ranked)
}

/// Keeps the records whose score passes `threshold` (inclusive), in input order.
pub fn evaluate<'a>(
    records: impl IntoIterator<Item = &'a PredictionRecord>,
    threshold: f64,
    direction: ScoreDirection,
) -> Vec<&'a PredictionRecord> {
    records
        .into_iter()
        .filter(|r| direction.passes(r.score, threshold))
        .collect()
}

/// Restricts `data` to one protein.
///
/// # Errors
///
/// Returns [`AnalysisError::UnknownProtein`] if no record carries the requested name.
pub fn select_protein<'a>(
    data: &'a [PredictionRecord],
    protein: Option<&str>,
) -> Result<Cow<'a, [PredictionRecord]>, AnalysisError> {
    let Some(name) = protein else {
        return Ok(Cow::Borrowed(data));
    };
    let selected: Vec<PredictionRecord> = data.iter().filter(|r| r.name == name).cloned().collect();
    if selected.is_empty() {
        return Err(AnalysisError::UnknownProtein(name.to_string()));
    }
    Ok(Cow::Owned(selected))
}

fn group_by_allele(data: &[PredictionRecord]) -> BTreeMap<&str, Vec<&PredictionRecord>> {
    let mut groups: BTreeMap<&str, Vec<&PredictionRecord>> = BTreeMap::new();
    for record in data {
        groups.entry(record.allele.as_str()).or_default().push(record);
    }
    groups
}

/// Classifies each allele group against its threshold and concatenates the survivors, alleles in
/// name order and each group in input order.
///
/// Alleles missing from `thresholds` are excluded.
pub fn apply_cutoffs(
    data: &[PredictionRecord],
    thresholds: &CutoffTable,
    percentile: Option<Percentile>,
    direction: ScoreDirection,
) -> Vec<Binder> {
    let mut binders = Vec::new();
    for (allele, group) in group_by_allele(data) {
        let Some(threshold) = thresholds.get(allele) else {
            warn!(allele, rows = group.len(), "Allele has no cutoff; its rows are excluded.");
            continue;
        };
        let passed = evaluate(group.iter().copied(), threshold, direction);
        debug!(
            allele,
            threshold,
            test = direction.symbol(),
            passed = passed.len(),
            total = group.len(),
            "Classified allele group."
        );
        binders.extend(
            passed
                .into_iter()
                .map(|r| Binder::new(r.clone(), threshold, percentile)),
        );
    }
    binders
}

/// Thresholds used by [`get_binders`] for `data` under `policy`.
///
/// A global policy is resolved over the whole of `data`, before any protein filter.
pub fn resolve_cutoffs(
    data: &[PredictionRecord],
    selected: &[PredictionRecord],
    policy: CutoffPolicy<'_>,
    percentile: Percentile,
    direction: ScoreDirection,
) -> CutoffTable {
    match policy {
        CutoffPolicy::Global => cutoff::resolve(data, percentile, direction, policy),
        _ => cutoff::resolve(selected, percentile, direction, policy),
    }
}

/// Selects the binders of `data`, optionally restricted to one protein.
///
/// Empty input yields an empty result.
///
/// # Errors
///
/// Returns [`AnalysisError::UnknownProtein`] if `protein` names no record in `data`.
#[instrument(skip_all, name = "binder_classification")]
pub fn get_binders(
    data: &[PredictionRecord],
    policy: CutoffPolicy<'_>,
    percentile: Percentile,
    direction: ScoreDirection,
    protein: Option<&str>,
) -> Result<Vec<Binder>, AnalysisError> {
    if data.is_empty() {
        warn!("No prediction data available.");
        return Ok(Vec::new());
    }
    let selected = select_protein(data, protein)?;
    let thresholds = resolve_cutoffs(data, &selected, policy, percentile, direction);
    let binder_percentile = policy.is_percentile_based().then_some(percentile);
    let binders = apply_cutoffs(&selected, &thresholds, binder_percentile, direction);

    info!(
        binders = binders.len(),
        records = selected.len(),
        alleles = thresholds.len(),
        "Selected binders."
    );
    Ok(binders)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(peptide: &str, pos: usize, name: &str, allele: &str, score: f64) -> PredictionRecord {
        PredictionRecord::new(peptide, peptide, pos, name, allele, score)
    }

    fn three_alleles() -> Vec<PredictionRecord> {
        let peptides = ["AAAAA", "CCCCC", "DDDDD", "EEEEE", "FFFFF"];
        let scores = [10.0, 20.0, 30.0, 40.0, 50.0];
        ["A*01", "A*02", "A*03"]
            .iter()
            .flat_map(|allele| {
                peptides
                    .iter()
                    .zip(scores)
                    .enumerate()
                    .map(move |(i, (p, s))| record(p, i, "P1", allele, s))
            })
            .collect()
    }

    fn p(value: f64) -> Percentile {
        Percentile::new(value).unwrap()
    }

    #[test]
    fn rank_shares_minimum_rank_on_ties_and_sorts_by_rank_name_allele() {
        let data = vec![
            record("A", 0, "P2", "X", 5.0),
            record("B", 1, "P1", "Y", 3.0),
            record("C", 2, "P1", "X", 3.0),
            record("D", 3, "P1", "X", 9.0),
        ];
        let ranked = rank(&data, ScoreDirection::LowerIsBetter);
        let summary: Vec<_> = ranked
            .iter()
            .map(|r| (r.peptide.as_str(), r.rank.unwrap()))
            .collect();
        assert_eq!(summary, vec![("C", 1), ("B", 1), ("A", 3), ("D", 4)]);

        let ranked = rank(&data, ScoreDirection::HigherIsBetter);
        assert_eq!(ranked[0].peptide, "D");
        assert_eq!(ranked[0].rank, Some(1));
    }

    #[test]
    fn ensure_ranked_ranks_each_allele_separately() {
        let data = vec![
            record("A", 0, "P1", "Y", 30.0),
            record("B", 1, "P1", "X", 20.0),
            record("C", 2, "P1", "Y", 10.0),
            record("D", 3, "P1", "X", 40.0),
        ];
        let ranked = ensure_ranked(
            Cow::Borrowed(data.as_slice()),
            ScoreDirection::LowerIsBetter,
        );
        let summary: Vec<_> = ranked
            .iter()
            .map(|r| (r.peptide.as_str(), r.allele.as_str(), r.rank.unwrap()))
            .collect();
        assert_eq!(
            summary,
            vec![("B", "X", 1), ("D", "X", 2), ("C", "Y", 1), ("A", "Y", 2)]
        );
    }

    #[test]
    fn ensure_ranked_keeps_supplied_ranks() {
        let mut data = vec![record("A", 0, "P1", "X", 30.0), record("B", 1, "P1", "X", 10.0)];
        data[0].rank = Some(7);
        data[1].rank = Some(3);
        let kept = ensure_ranked(
            Cow::Borrowed(data.as_slice()),
            ScoreDirection::LowerIsBetter,
        );
        assert!(matches!(kept, Cow::Borrowed(_)));
        assert_eq!(kept[0].rank, Some(7));
    }

    #[test]
    fn evaluate_is_inclusive_and_idempotent() {
        let data = three_alleles();
        let once = evaluate(&data, 20.0, ScoreDirection::LowerIsBetter);
        assert_eq!(once.len(), 6);
        let twice = evaluate(once.iter().copied(), 20.0, ScoreDirection::LowerIsBetter);
        assert_eq!(once, twice);

        let high = evaluate(&data, 40.0, ScoreDirection::HigherIsBetter);
        assert!(high.iter().all(|r| r.score >= 40.0));
        assert_eq!(high.len(), 6);
    }

    #[test]
    fn global_cutoff_at_eighty_percent_keeps_one_binder_per_allele() {
        let data = three_alleles();
        let binders = get_binders(
            &data,
            CutoffPolicy::Global,
            p(0.8),
            ScoreDirection::LowerIsBetter,
            None,
        )
        .unwrap();
        assert_eq!(binders.len(), 3);
        for binder in &binders {
            assert_eq!(binder.record.score, 10.0);
            assert!((binder.threshold - 18.0).abs() < 1e-9);
            assert_eq!(binder.percentile, Some(p(0.8)));
        }
        let alleles: Vec<_> = binders.iter().map(|b| b.record.allele.as_str()).collect();
        assert_eq!(alleles, vec!["A*01", "A*02", "A*03"]);
    }

    #[test]
    fn uniform_scores_retain_about_two_percent_at_high_stringency() {
        let data: Vec<_> = (0..1000)
            .map(|i| record(&format!("P{i:04}"), i, "P1", "A*01", i as f64))
            .collect();
        let binders = get_binders(
            &data,
            CutoffPolicy::Global,
            p(0.98),
            ScoreDirection::LowerIsBetter,
            None,
        )
        .unwrap();
        assert_eq!(binders.len(), 20);
    }

    #[test]
    fn unknown_protein_is_reported_distinctly() {
        let data = three_alleles();
        let err = get_binders(
            &data,
            CutoffPolicy::Global,
            p(0.8),
            ScoreDirection::LowerIsBetter,
            Some("missing"),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownProtein(ref name) if name == "missing"));
    }

    #[test]
    fn empty_data_yields_empty_binders_even_with_protein_filter() {
        let binders = get_binders(
            &[],
            CutoffPolicy::Global,
            p(0.8),
            ScoreDirection::LowerIsBetter,
            Some("P1"),
        )
        .unwrap();
        assert!(binders.is_empty());
    }

    #[test]
    fn global_cutoffs_come_from_all_proteins_before_filtering() {
        let mut data = vec![
            record("AAA", 0, "P1", "X", 1.0),
            record("BBB", 1, "P1", "X", 2.0),
        ];
        data.extend((0..8).map(|i| record("CCC", i, "P2", "X", 100.0 + i as f64)));

        let binders = get_binders(
            &data,
            CutoffPolicy::Global,
            p(0.5),
            ScoreDirection::HigherIsBetter,
            Some("P1"),
        )
        .unwrap();
        assert!(binders.is_empty());

        let binders = get_binders(
            &data,
            CutoffPolicy::Default(None),
            p(0.5),
            ScoreDirection::HigherIsBetter,
            Some("P1"),
        )
        .unwrap();
        assert_eq!(binders.len(), 1);
        assert_eq!(binders[0].record.peptide, "BBB");
    }

    #[test]
    fn simple_cutoff_binders_carry_no_percentile() {
        let data = three_alleles();
        let binders = get_binders(
            &data,
            CutoffPolicy::Simple(30.0),
            p(0.98),
            ScoreDirection::LowerIsBetter,
            None,
        )
        .unwrap();
        assert_eq!(binders.len(), 9);
        assert!(binders.iter().all(|b| b.percentile.is_none()));
    }

    #[test]
    fn alleles_missing_from_table_are_excluded() {
        let data = three_alleles();
        let thresholds: CutoffTable = [("A*02", 25.0)].into_iter().collect();
        let binders = apply_cutoffs(&data, &thresholds, None, ScoreDirection::LowerIsBetter);
        assert_eq!(binders.len(), 2);
        assert!(binders.iter().all(|b| b.record.allele == "A*02"));
    }
}
