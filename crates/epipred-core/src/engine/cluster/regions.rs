use super::density::dbscan;
use super::positions_by_name;
use crate::core::models::cluster::EpitopeRegion;
use crate::core::models::record::Located;
use crate::engine::config::RegionParams;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn protein_regions(
    name: &str,
    positions: &[usize],
    eps: usize,
    peptide_length: usize,
    params: &RegionParams,
) -> Vec<EpitopeRegion> {
    dbscan(positions, eps, params.min_binders)
        .into_iter()
        .filter_map(|cluster| {
            let start = cluster.first()?;
            let end = cluster.last()? + peptide_length;
            Some(EpitopeRegion {
                name: name.to_string(),
                start,
                end,
                binders: cluster.len(),
                length: end - start,
            })
        })
        .filter(|r| r.length >= params.min_length && r.length <= params.max_length)
        .collect()
}

/// Finds epitope-dense regions: density clusters of binder positions per protein, spanning from
/// the first binder to the end of the last one, kept when their length is within bounds.
///
/// The peptide length of the first binder is used for every protein.
#[instrument(skip_all, name = "region_search")]
pub fn find_regions<T: Located + Sync>(
    binders: &[T],
    params: &RegionParams,
) -> Vec<EpitopeRegion> {
    let Some(first) = binders.first() else {
        return Vec::new();
    };
    let peptide_length = first.peptide_length();
    let eps = params.dist.unwrap_or(peptide_length + 1);
    let groups = positions_by_name(binders);

    let iterator = groups.iter();

    #[cfg(feature = "parallel")]
    let iterator = groups.par_iter();

    let per_protein: Vec<Vec<EpitopeRegion>> = iterator
        .map(|(name, positions)| protein_regions(name, positions, eps, peptide_length, params))
        .collect();
    let regions: Vec<EpitopeRegion> = per_protein.into_iter().flatten().collect();

    info!(
        regions = regions.len(),
        proteins = groups.len(),
        eps,
        "Found epitope-dense regions."
    );
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::binder::PromiscuousBinder;

    fn binder(name: &str, pos: usize) -> PromiscuousBinder {
        PromiscuousBinder {
            core: format!("CORE{pos}"),
            peptide: "ABCDEFGHIJ".to_string(),
            pos,
            name: name.to_string(),
            alleles: 2,
            score: 1.0,
            mean: 1.0,
            nearest: 5,
        }
    }

    #[test]
    fn region_spans_first_binder_to_end_of_last() {
        let binders = vec![binder("P1", 10), binder("P1", 15), binder("P1", 20)];
        let regions = find_regions(&binders, &RegionParams::default());
        assert_eq!(
            regions,
            vec![EpitopeRegion {
                name: "P1".to_string(),
                start: 10,
                end: 30,
                binders: 3,
                length: 20,
            }]
        );
    }

    #[test]
    fn regions_outside_length_bounds_are_dropped() {
        // Two adjacent binders span 11 residues, below the default minimum of 12.
        let short = vec![binder("P1", 10), binder("P1", 11)];
        assert!(find_regions(&short, &RegionParams::default()).is_empty());

        let long: Vec<_> = (0..10).map(|i| binder("P1", i * 8)).collect();
        assert!(find_regions(&long, &RegionParams::default()).is_empty());

        let relaxed = RegionParams {
            max_length: 100,
            ..RegionParams::default()
        };
        let regions = find_regions(&long, &relaxed);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].length, 82);
    }

    #[test]
    fn each_protein_is_searched_separately() {
        let binders = vec![
            binder("P2", 10),
            binder("P1", 40),
            binder("P2", 14),
            binder("P1", 44),
            binder("P3", 5),
        ];
        let regions = find_regions(&binders, &RegionParams::default());
        let names: Vec<_> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2"]);
        assert_eq!(regions[1].start, 10);
        assert_eq!(regions[1].end, 24);
    }

    #[test]
    fn explicit_distance_overrides_peptide_length() {
        let binders = vec![binder("P1", 0), binder("P1", 30)];
        assert!(find_regions(&binders, &RegionParams::default()).is_empty());
        let wide = RegionParams {
            dist: Some(30),
            ..RegionParams::default()
        };
        assert_eq!(find_regions(&binders, &wide)[0].length, 40);
    }

    #[test]
    fn no_binders_no_regions() {
        assert!(find_regions::<PromiscuousBinder>(&[], &RegionParams::default()).is_empty());
    }
}
