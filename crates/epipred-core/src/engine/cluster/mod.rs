//! Grouping of binder positions along a sequence.
//!
//! Two strategies share one entry point, [`cluster`]: the greedy overlap search in [`overlap`] and
//! one-dimensional density clustering in [`density`]. [`regions`] builds epitope-dense regions on
//! top of density clusters.

pub mod density;
pub mod overlap;
pub mod regions;

use crate::core::models::cluster::{Cluster, ProteinClusters};
use crate::core::models::record::Located;
use crate::engine::config::ClusterConfig;
use std::collections::BTreeMap;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterStrategy {
    /// Runs of positions each within `gap` of the previous, inside a `window` from the run start.
    Overlap { window: usize, gap: usize },
    /// Points within `eps` of each other, grown from points with at least `min_points` neighbors.
    Density { eps: usize, min_points: usize },
}

/// Clusters positions of one sequence. Empty input gives no clusters.
pub fn cluster(positions: &[usize], strategy: ClusterStrategy) -> Vec<Cluster> {
    match strategy {
        ClusterStrategy::Overlap { window, gap } => overlap::greedy_clusters(positions, gap, window),
        ClusterStrategy::Density { eps, min_points } => density::dbscan(positions, eps, min_points),
    }
}

/// Positions of `items` grouped by sequence name, in name order.
pub(crate) fn positions_by_name<T: Located>(items: &[T]) -> Vec<(&str, Vec<usize>)> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for item in items {
        groups.entry(item.name()).or_default().push(item.pos());
    }
    groups.into_iter().collect()
}

/// Clusters the positions of `items` separately for each protein.
///
/// Distances left unset in `config` are derived from the peptide length of the first item.
/// Proteins without any cluster are left out.
#[instrument(skip_all, name = "protein_clustering")]
pub fn cluster_proteins<T: Located + Sync>(
    items: &[T],
    config: &ClusterConfig,
) -> Vec<ProteinClusters> {
    let Some(first) = items.first() else {
        return Vec::new();
    };
    let strategy = config.strategy_for(first.peptide_length());
    let groups = positions_by_name(items);

    let iterator = groups.iter();

    #[cfg(feature = "parallel")]
    let iterator = groups.par_iter();

    let results: Vec<ProteinClusters> = iterator
        .map(|(name, positions)| ProteinClusters {
            name: name.to_string(),
            clusters: cluster(positions, strategy),
        })
        .filter(|protein| !protein.clusters.is_empty())
        .collect();

    info!(
        proteins = groups.len(),
        clustered = results.len(),
        clusters = results.iter().map(|p| p.clusters.len()).sum::<usize>(),
        ?strategy,
        "Clustered binder positions."
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::record::PredictionRecord;
    use crate::engine::config::ClusterMethod;

    fn record(name: &str, pos: usize) -> PredictionRecord {
        PredictionRecord::new("AAAAAAAAA", "AAAAA", pos, name, "A*01", 1.0)
    }

    #[test]
    fn empty_input_yields_no_clusters_for_either_strategy() {
        assert!(cluster(&[], ClusterStrategy::Overlap { window: 25, gap: 9 }).is_empty());
        assert!(
            cluster(
                &[],
                ClusterStrategy::Density {
                    eps: 10,
                    min_points: 2
                }
            )
            .is_empty()
        );
        assert!(cluster_proteins::<PredictionRecord>(&[], &ClusterConfig::default()).is_empty());
    }

    #[test]
    fn proteins_are_clustered_independently() {
        let items = vec![
            record("P2", 100),
            record("P1", 10),
            record("P1", 14),
            record("P2", 105),
            record("P3", 0),
        ];
        let config = ClusterConfig::default();
        let result = cluster_proteins(&items, &config);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "P1");
        assert_eq!(result[0].clusters[0].positions(), &[10, 14]);
        assert_eq!(result[1].name, "P2");
        assert_eq!(result[1].clusters[0].positions(), &[100, 105]);

        let config = ClusterConfig {
            method: ClusterMethod::Density,
            ..ClusterConfig::default()
        };
        let result = cluster_proteins(&items, &config);
        assert_eq!(result.len(), 2);
    }
}
