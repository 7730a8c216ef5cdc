use serde::Serialize;

/// A group of binder positions considered co-located along one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cluster {
    positions: Vec<usize>, // Sorted ascending
}

impl Cluster {
    pub fn new(mut positions: Vec<usize>) -> Self {
        positions.sort_unstable();
        Self { positions }
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn first(&self) -> Option<usize> {
        self.positions.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.positions.last().copied()
    }

    pub fn contains(&self, position: usize) -> bool {
        self.positions.binary_search(&position).is_ok()
    }

    pub fn is_disjoint(&self, other: &Cluster) -> bool {
        !self.positions.iter().any(|&p| other.contains(p))
    }
}

/// Clusters found in the binders of one protein.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinClusters {
    pub name: String,
    pub clusters: Vec<Cluster>,
}

/// An epitope-dense stretch of a protein derived from a density cluster of binders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpitopeRegion {
    pub name: String,
    pub start: usize,
    /// Exclusive end: last binder position plus the peptide length.
    pub end: usize,
    pub binders: usize,
    pub length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_sorts_positions_and_answers_membership() {
        let cluster = Cluster::new(vec![30, 10, 20]);
        assert_eq!(cluster.positions(), &[10, 20, 30]);
        assert_eq!(cluster.first(), Some(10));
        assert_eq!(cluster.last(), Some(30));
        assert!(cluster.contains(20));
        assert!(!cluster.contains(25));
    }

    #[test]
    fn disjointness_checks_shared_positions() {
        let a = Cluster::new(vec![1, 2, 3]);
        let b = Cluster::new(vec![3, 4]);
        let c = Cluster::new(vec![5, 6]);
        assert!(!a.is_disjoint(&b));
        assert!(a.is_disjoint(&c));
    }
}
