use crate::core::models::binder::{Binder, PromiscuousBinder};
use crate::core::models::record::{PredictionRecord, SiteKey};
use crate::core::profiles::ScoreDirection;
use crate::core::stats::Percentile;
use crate::engine::classify;
use crate::engine::cutoff::CutoffPolicy;
use crate::engine::error::AnalysisError;
use crate::engine::summary;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// Binder calls of one peptide window merged across alleles.
struct SiteGroup<'a> {
    alleles: BTreeSet<&'a str>,
    best: f64,
    sum: f64,
    rows: usize,
    own_core: &'a str,
}

impl SiteGroup<'_> {
    fn mean(&self) -> f64 {
        self.sum / self.rows as f64
    }
}

fn group_sites(
    binders: &[Binder],
    direction: ScoreDirection,
) -> BTreeMap<SiteKey<'_>, SiteGroup<'_>> {
    let mut groups: BTreeMap<SiteKey<'_>, SiteGroup<'_>> = BTreeMap::new();
    for binder in binders {
        let record = &binder.record;
        groups
            .entry(record.site_key())
            .and_modify(|g| {
                g.alleles.insert(&record.allele);
                g.best = direction.best(g.best, record.score);
                g.sum += record.score;
                g.rows += 1;
            })
            .or_insert_with(|| SiteGroup {
                alleles: BTreeSet::from([record.allele.as_str()]),
                best: record.score,
                sum: record.score,
                rows: 1,
                own_core: &record.core,
            });
    }
    groups
}

/// Cores of the representative allele (the first allele name in `records`), by peptide window.
fn representative_cores(records: &[PredictionRecord]) -> HashMap<SiteKey<'_>, &str> {
    let Some(allele) = records.iter().map(|r| r.allele.as_str()).min() else {
        return HashMap::new();
    };
    debug!(allele, "Using representative allele for core annotation.");
    records
        .iter()
        .filter(|r| r.allele == allele)
        .map(|r| (r.site_key(), r.core.as_str()))
        .collect()
}

/// Merges binder calls across alleles into one row per binding core supported by at least
/// `min_alleles` alleles, sorted by position.
///
/// Rows are first merged per `(peptide, pos, name)`: `alleles` counts the distinct alleles,
/// `score` is the best score and `mean` the mean score. The core of each window is taken from
/// `records` for the representative allele, or from the binder itself when that allele did not
/// score the window. Windows sharing a core are then collapsed: the row keeps the first window in
/// `(peptide, pos, name)` order and the largest score among them. Each row records the distance to
/// the nearest other row of its protein.
///
/// An empty result means no window reached `min_alleles`.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidMinAlleles`] if `min_alleles` is zero.
#[instrument(skip_all, name = "promiscuous_aggregation")]
pub fn aggregate(
    binders: &[Binder],
    records: &[PredictionRecord],
    min_alleles: usize,
    direction: ScoreDirection,
) -> Result<Vec<PromiscuousBinder>, AnalysisError> {
    if min_alleles == 0 {
        return Err(AnalysisError::InvalidMinAlleles(min_alleles));
    }

    let sites = group_sites(binders, direction);
    let total_sites = sites.len();
    let cores = representative_cores(records);

    let mut by_core: BTreeMap<&str, PromiscuousBinder> = BTreeMap::new();
    for ((peptide, pos, name), group) in sites {
        if group.alleles.len() < min_alleles {
            continue;
        }
        let core = cores
            .get(&(peptide, pos, name))
            .copied()
            .unwrap_or(group.own_core);
        by_core
            .entry(core)
            .and_modify(|row| row.score = row.score.max(group.best))
            .or_insert_with(|| PromiscuousBinder {
                core: core.to_string(),
                peptide: peptide.to_string(),
                pos,
                name: name.to_string(),
                alleles: group.alleles.len(),
                score: group.best,
                mean: group.mean(),
                nearest: 1,
            });
    }

    let mut result: Vec<PromiscuousBinder> = by_core.into_values().collect();
    result.sort_by_key(|row| row.pos);
    let distances = summary::nearest_binder_distances(&result);
    for (row, distance) in result.iter_mut().zip(distances) {
        row.nearest = distance;
    }

    info!(
        windows = total_sites,
        cores = result.len(),
        min_alleles,
        "Aggregated promiscuous binders."
    );
    Ok(result)
}

/// Selects binders and aggregates them in one call.
///
/// # Errors
///
/// Fails as [`classify::get_binders`] and [`aggregate`] do.
pub fn find_promiscuous(
    data: &[PredictionRecord],
    policy: CutoffPolicy<'_>,
    percentile: Percentile,
    direction: ScoreDirection,
    protein: Option<&str>,
    min_alleles: usize,
) -> Result<Vec<PromiscuousBinder>, AnalysisError> {
    let binders = classify::get_binders(data, policy, percentile, direction, protein)?;
    aggregate(&binders, data, min_alleles, direction)
}
