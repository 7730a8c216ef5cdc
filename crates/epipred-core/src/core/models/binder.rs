use super::record::{Located, PredictionRecord};
use crate::core::stats::Percentile;
use serde::Serialize;

/// A prediction record that passed its allele's threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Binder {
    pub record: PredictionRecord,
    /// The threshold the record was tested against.
    pub threshold: f64,
    /// The percentile the threshold was resolved at; `None` for a fixed scalar cutoff.
    pub percentile: Option<Percentile>,
}

impl Binder {
    pub fn new(record: PredictionRecord, threshold: f64, percentile: Option<Percentile>) -> Self {
        Self {
            record,
            threshold,
            percentile,
        }
    }
}

/// A peptide core bound by at least `n` alleles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromiscuousBinder {
    pub core: String,
    pub peptide: String,
    pub pos: usize,
    pub name: String,
    /// Number of distinct alleles supporting the representative peptide window.
    pub alleles: usize,
    /// Aggregate score over the supporting alleles.
    pub score: f64,
    /// Mean score over the supporting alleles.
    pub mean: f64,
    /// Distance to the closest other promiscuous position in the same protein; 1 when alone.
    pub nearest: usize,
}

/// Best score seen for one distinct binding core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreScore {
    pub core: String,
    pub score: f64,
}

impl PromiscuousBinder {
    pub fn peptide_length(&self) -> usize {
        self.peptide.chars().count()
    }
}

impl Located for Binder {
    fn name(&self) -> &str {
        &self.record.name
    }
    fn pos(&self) -> usize {
        self.record.pos
    }
    fn peptide_length(&self) -> usize {
        self.record.peptide_length()
    }
}

impl Located for PromiscuousBinder {
    fn name(&self) -> &str {
        &self.name
    }
    fn pos(&self) -> usize {
        self.pos
    }
    fn peptide_length(&self) -> usize {
        PromiscuousBinder::peptide_length(self)
    }
}
