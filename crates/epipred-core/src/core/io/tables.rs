use super::traits::ResultTable;
use crate::core::models::binder::{Binder, CoreScore, PromiscuousBinder};
use crate::core::models::cluster::{EpitopeRegion, ProteinClusters};
use itertools::Itertools;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct BinderRow<'a> {
    peptide: &'a str,
    core: &'a str,
    pos: usize,
    name: &'a str,
    allele: &'a str,
    score: f64,
    rank: Option<usize>,
    threshold: f64,
}

impl<'a> From<&'a Binder> for BinderRow<'a> {
    fn from(binder: &'a Binder) -> Self {
        let r = &binder.record;
        Self {
            peptide: &r.peptide,
            core: &r.core,
            pos: r.pos,
            name: &r.name,
            allele: &r.allele,
            score: r.score,
            rank: r.rank,
            threshold: binder.threshold,
        }
    }
}

#[derive(Serialize)]
struct ClusterRow<'a> {
    name: &'a str,
    cluster: usize,
    start: usize,
    end: usize,
    size: usize,
    positions: String,
}

fn write_rows<W, T, I>(writer: W, header: &[&str], rows: I) -> Result<(), csv::Error>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    // Serialized headers would be lost on an empty table.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

impl ResultTable for [Binder] {
    fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_rows(
            writer,
            &[
                "peptide",
                "core",
                "pos",
                "name",
                "allele",
                "score",
                "rank",
                "threshold",
            ],
            self.iter().map(BinderRow::from),
        )
    }
}

impl ResultTable for [PromiscuousBinder] {
    fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_rows(
            writer,
            &[
                "core", "peptide", "pos", "name", "alleles", "score", "mean", "nearest",
            ],
            self.iter(),
        )
    }
}

impl ResultTable for [CoreScore] {
    fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_rows(writer, &["core", "score"], self.iter())
    }
}

impl ResultTable for [ProteinClusters] {
    /// One row per cluster, numbered from 1 within each protein.
    fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let rows = self.iter().flat_map(|protein| {
            protein
                .clusters
                .iter()
                .enumerate()
                .map(move |(i, cluster)| ClusterRow {
                    name: &protein.name,
                    cluster: i + 1,
                    start: cluster.first().unwrap_or_default(),
                    end: cluster.last().unwrap_or_default(),
                    size: cluster.len(),
                    positions: cluster.positions().iter().join(";"),
                })
        });
        write_rows(
            writer,
            &["name", "cluster", "start", "end", "size", "positions"],
            rows,
        )
    }
}

impl ResultTable for [EpitopeRegion] {
    fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_rows(
            writer,
            &["name", "start", "end", "binders", "length"],
            self.iter(),
        )
    }
}
