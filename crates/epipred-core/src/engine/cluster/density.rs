use crate::core::models::cluster::Cluster;

/// Indices of the points within `eps` of `points[idx]`, the point itself included.
fn region_query(points: &[usize], idx: usize, eps: usize) -> std::ops::Range<usize> {
    let center = points[idx];
    let lo = points.partition_point(|&p| p.saturating_add(eps) < center);
    let hi = points.partition_point(|&p| p <= center.saturating_add(eps));
    lo..hi
}

/// Density-based clustering of positions on a line.
///
/// A point with at least `min_points` points within `eps` (itself included) seeds a cluster, which
/// grows through every point reachable from such dense points. Points reachable from no dense
/// point are noise and appear in no cluster. A border point reachable from two clusters belongs to
/// the first one found. Clusters are returned in order of their lowest position.
pub fn dbscan(positions: &[usize], eps: usize, min_points: usize) -> Vec<Cluster> {
    if positions.is_empty() {
        return Vec::new();
    }
    let mut points = positions.to_vec();
    points.sort_unstable();

    let mut labels: Vec<Option<usize>> = vec![None; points.len()];
    let mut visited = vec![false; points.len()];
    let mut cluster_count = 0;

    for point_idx in 0..points.len() {
        if visited[point_idx] {
            continue;
        }
        visited[point_idx] = true;
        let neighbours = region_query(&points, point_idx, eps);
        if neighbours.len() < min_points {
            continue;
        }

        let cluster_id = cluster_count;
        cluster_count += 1;
        labels[point_idx] = Some(cluster_id);

        let mut frontier: Vec<usize> = neighbours.collect();
        let mut i = 0;
        while i < frontier.len() {
            let neighbour_idx = frontier[i];
            if !visited[neighbour_idx] {
                visited[neighbour_idx] = true;
                let reachable = region_query(&points, neighbour_idx, eps);
                if reachable.len() >= min_points {
                    frontier.extend(reachable);
                }
            }
            if labels[neighbour_idx].is_none() {
                labels[neighbour_idx] = Some(cluster_id);
            }
            i += 1;
        }
    }

    let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
    for (point, label) in points.iter().zip(&labels) {
        if let Some(id) = label {
            clusters[*id].push(*point);
        }
    }
    clusters.into_iter().map(Cluster::new).collect()
}
