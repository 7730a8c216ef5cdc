use crate::core::profiles::ScoreDirection;
use crate::core::stats::Percentile;
use std::collections::BTreeMap;
use std::collections::btree_map::Iter;

/// Per-allele numeric thresholds valid for one percentile level and one scoring direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutoffTable {
    thresholds: BTreeMap<String, f64>,
}

impl CutoffTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, allele: impl Into<String>, threshold: f64) {
        self.thresholds.insert(allele.into(), threshold);
    }

    pub fn get(&self, allele: &str) -> Option<f64> {
        self.thresholds.get(allele).copied()
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, f64> {
        self.thresholds.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for CutoffTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            thresholds: iter.into_iter().map(|(a, t)| (a.into(), t)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CutoffTable {
    type Item = (&'a String, &'a f64);
    type IntoIter = Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.thresholds.iter()
    }
}

/// One tabulated point of an allele's score distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantilePoint {
    /// Stringency level in hundredths, already oriented: a higher level is always harder to pass.
    pub level: u8,
    pub value: f64,
}

/// Per-allele quantile tables, oriented so that each stored level is the threshold at that
/// stringency.
///
/// For a lower-is-better score the value stored at level `k` is the raw `(100 - k)`th quantile; for
/// a higher-is-better score it is the raw `k`th quantile. Reading a level therefore yields a cutoff
/// directly, without consulting the direction again.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDistribution {
    direction: ScoreDirection,
    quantiles: BTreeMap<String, Vec<QuantilePoint>>, // Points sorted by level ascending
}

impl ScoreDistribution {
    pub fn new(direction: ScoreDirection) -> Self {
        Self {
            direction,
            quantiles: BTreeMap::new(),
        }
    }

    pub fn direction(&self) -> ScoreDirection {
        self.direction
    }

    pub fn insert_allele(&mut self, allele: impl Into<String>, mut points: Vec<QuantilePoint>) {
        points.sort_by_key(|p| p.level);
        points.dedup_by_key(|p| p.level);
        self.quantiles.insert(allele.into(), points);
    }

    pub fn quantiles(&self, allele: &str) -> Option<&[QuantilePoint]> {
        self.quantiles.get(allele).map(Vec::as_slice)
    }

    pub fn alleles(&self) -> impl Iterator<Item = &str> {
        self.quantiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[QuantilePoint])> {
        self.quantiles
            .iter()
            .map(|(allele, points)| (allele.as_str(), points.as_slice()))
    }

    pub fn value_at(&self, allele: &str, percentile: Percentile) -> Option<f64> {
        let level = percentile.level();
        let points = self.quantiles.get(allele)?;
        points
            .binary_search_by_key(&level, |p| p.level)
            .ok()
            .map(|i| points[i].value)
    }

    /// Materializes the thresholds of every allele at one percentile.
    pub fn cutoffs_at(&self, percentile: Percentile) -> CutoffTable {
        self.quantiles
            .keys()
            .filter_map(|allele| {
                self.value_at(allele, percentile)
                    .map(|v| (allele.clone(), v))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.quantiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantiles.is_empty()
    }
}
