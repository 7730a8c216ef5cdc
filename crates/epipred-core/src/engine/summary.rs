use crate::core::models::binder::{Binder, CoreScore};
use crate::core::models::record::{Located, PredictionRecord};
use crate::core::profiles::ScoreDirection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlleleSummary {
    pub allele: String,
    pub binders: usize,
    pub mean_score: f64,
}

/// Binder count and mean score per allele, in allele order.
pub fn allele_summary(binders: &[Binder]) -> Vec<AlleleSummary> {
    let mut groups: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for binder in binders {
        let entry = groups.entry(binder.record.allele.as_str()).or_default();
        entry.0 += 1;
        entry.1 += binder.record.score;
    }
    groups
        .into_iter()
        .map(|(allele, (count, sum))| AlleleSummary {
            allele: allele.to_string(),
            binders: count,
            mean_score: sum / count as f64,
        })
        .collect()
}

/// Best score of each distinct core, best first; ties are broken by core.
pub fn unique_cores<'a>(
    records: impl IntoIterator<Item = &'a PredictionRecord>,
    direction: ScoreDirection,
) -> Vec<CoreScore> {
    let mut best: HashMap<&str, f64> = HashMap::new();
    for record in records {
        best.entry(record.core.as_str())
            .and_modify(|s| *s = direction.best(*s, record.score))
            .or_insert(record.score);
    }
    let mut cores: Vec<CoreScore> = best
        .into_iter()
        .map(|(core, score)| CoreScore {
            core: core.to_string(),
            score,
        })
        .collect();
    cores.sort_by(|a, b| {
        direction
            .compare(a.score, b.score)
            .then_with(|| a.core.cmp(&b.core))
    });
    cores
}

/// For each item, the distance to the nearest other position in the same protein.
///
/// An item whose protein has no other position gets a distance of 1. The result is aligned with
/// `items`.
pub fn nearest_binder_distances<T: Located>(items: &[T]) -> Vec<usize> {
    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    for item in items {
        positions.entry(item.name()).or_default().push(item.pos());
    }
    for list in positions.values_mut() {
        list.sort_unstable();
        list.dedup();
    }

    items
        .iter()
        .map(|item| {
            let pos = item.pos();
            let list = &positions[item.name()];
            let idx = list.partition_point(|&p| p < pos);
            let before = idx.checked_sub(1).map(|i| pos - list[i]);
            let after = list.get(idx + 1).map(|&p| p - pos);
            match (before, after) {
                (Some(b), Some(a)) => b.min(a),
                (Some(d), None) | (None, Some(d)) => d,
                (None, None) => 1,
            }
        })
        .collect()
}

/// How a window from the second set must sit against an item to count in [`overlaps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapMode {
    /// The other window lies wholly within the item's window.
    #[default]
    Inside,
    /// The windows share a residue and start at different positions.
    Any,
}

/// For each item, how many windows of `others` in the same protein overlap it under `mode`.
///
/// Windows run from `pos` to `pos + peptide length`, end exclusive. The result is aligned with
/// `items`.
pub fn overlaps<A: Located, B: Located>(
    items: &[A],
    others: &[B],
    mode: OverlapMode,
) -> Vec<usize> {
    let mut windows: HashMap<&str, Vec<(usize, usize)>> = HashMap::new();
    for other in others {
        windows
            .entry(other.name())
            .or_default()
            .push((other.start(), other.end()));
    }

    items
        .iter()
        .map(|item| {
            let (start, end) = (item.start(), item.end());
            windows.get(item.name()).map_or(0, |list| {
                list.iter()
                    .filter(|&&(s, e)| match mode {
                        OverlapMode::Inside => start <= s && end >= e,
                        OverlapMode::Any => (start < s && end > s) || (start > s && start < e),
                    })
                    .count()
            })
        })
        .collect()
}
