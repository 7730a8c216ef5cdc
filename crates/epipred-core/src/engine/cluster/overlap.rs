use crate::core::models::cluster::Cluster;
use itertools::Itertools;

/// The run starting at `positions[start]`: each following position within `gap` of the previous
/// one and below `positions[start] + window`.
fn overlapping_run(positions: &[usize], start: usize, gap: usize, window: usize) -> Vec<usize> {
    let origin = positions[start];
    let limit = origin.saturating_add(window);
    let mut run = vec![origin];
    for &next in positions[start + 1..].iter().take_while(|&&p| p < limit) {
        let previous = run[run.len() - 1];
        if next > previous + gap {
            break;
        }
        run.push(next);
    }
    run
}

/// Greedy interval-overlap clustering.
///
/// Every distinct position starts one candidate run. Candidates are taken largest first (ties in
/// position order) and accepted when they hold at least two positions and share none with an
/// accepted cluster, so accepted clusters are pairwise disjoint. The result is not guaranteed to
/// be the best possible partition.
pub fn greedy_clusters(positions: &[usize], gap: usize, window: usize) -> Vec<Cluster> {
    let positions: Vec<usize> = positions.iter().copied().sorted_unstable().dedup().collect();

    let mut candidates: Vec<Vec<usize>> = (0..positions.len())
        .map(|i| overlapping_run(&positions, i, gap, window))
        .collect();
    candidates.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut accepted: Vec<Cluster> = Vec::new();
    for candidate in candidates {
        if candidate.len() < 2 {
            break;
        }
        let candidate = Cluster::new(candidate);
        if accepted.iter().all(|c| c.is_disjoint(&candidate)) {
            accepted.push(candidate);
        }
    }
    accepted
}
