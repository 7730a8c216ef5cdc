use super::error::TableError;
use super::traits::ResultTable;
use crate::core::models::cutoffs::{QuantilePoint, ScoreDistribution};
use crate::core::profiles::{ScoreDirection, ScoringScheme};
use crate::core::stats::QUANTILE_LEVELS;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

const QUANTILES_STEM: &str = "quantiles";
const PERCENTILE_COLUMN: &str = "percentile";

/// File name of the quantile side-table for one scoring scheme, e.g. `quantiles_ic50_lower.csv`.
///
/// Characters of the score key other than ASCII letters, digits, `-` and `_` become `_`.
pub fn quantiles_file_name(scheme: &ScoringScheme) -> String {
    let key: String = scheme
        .score_key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let direction = match scheme.direction {
        ScoreDirection::LowerIsBetter => "lower",
        ScoreDirection::HigherIsBetter => "higher",
    };
    format!("{QUANTILES_STEM}_{key}_{direction}.csv")
}

/// Whether `file_name` is a quantile side-table, a bare `quantiles.csv` included.
pub fn is_quantiles_file(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    let Some(stem) = lower.strip_suffix(".csv") else {
        return false;
    };
    stem == QUANTILES_STEM
        || stem
            .strip_prefix(QUANTILES_STEM)
            .is_some_and(|rest| rest.starts_with('_'))
}

impl ResultTable for ScoreDistribution {
    /// One row per level (`0.01` to `0.99`), one column per allele, values with three decimals.
    fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        let alleles: Vec<&str> = self.alleles().collect();

        let mut header = Vec::with_capacity(alleles.len() + 1);
        header.push(PERCENTILE_COLUMN);
        header.extend(alleles.iter().copied());
        wtr.write_record(&header)?;

        for level in 1..=QUANTILE_LEVELS {
            let mut row = Vec::with_capacity(alleles.len() + 1);
            row.push(format!("{:.2}", f64::from(level) / 100.0));
            for allele in &alleles {
                let cell = self
                    .quantiles(allele)
                    .and_then(|points| points.iter().find(|p| p.level == level))
                    .map(|p| format!("{:.3}", p.value))
                    .unwrap_or_default();
                row.push(cell);
            }
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Reads a quantile side-table written by [`ResultTable::write_to`] for `ScoreDistribution`.
///
/// The first column holds the levels whatever its header says, so tables written with an unnamed
/// index column read the same way. Levels are taken as stringencies already oriented for
/// `direction`. Empty cells are treated as missing levels. The direction is not stored in the file
/// and must be supplied by the caller.
pub fn read_quantiles_from<R: Read>(
    reader: R,
    source: &str,
    direction: ScoreDirection,
) -> Result<ScoreDistribution, TableError> {
    let csv_error = |e| TableError::Csv {
        path: source.to_string(),
        source: e,
    };
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Err(TableError::MissingColumn {
            path: source.to_string(),
            column: PERCENTILE_COLUMN.to_string(),
        });
    }

    let alleles: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
    let mut points: BTreeMap<&str, Vec<QuantilePoint>> = BTreeMap::new();

    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(csv_error)?;
        let invalid = |column: &str, value: &str| TableError::InvalidValue {
            path: source.to_string(),
            column: column.to_string(),
            row: i + 1,
            value: value.to_string(),
        };

        let raw_level = row.get(0).unwrap_or("").trim();
        let level = raw_level
            .parse::<f64>()
            .ok()
            .map(|p| (p * 100.0).round())
            .filter(|l| *l >= 1.0 && *l <= f64::from(QUANTILE_LEVELS))
            .ok_or_else(|| invalid(PERCENTILE_COLUMN, raw_level))? as u8;

        for (allele, cell) in alleles.iter().zip(row.iter().skip(1)) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let value = cell.parse::<f64>().map_err(|_| invalid(allele.as_str(), cell))?;
            points
                .entry(allele.as_str())
                .or_default()
                .push(QuantilePoint { level, value });
        }
    }

    let mut distribution = ScoreDistribution::new(direction);
    for (allele, allele_points) in points {
        distribution.insert_allele(allele, allele_points);
    }
    Ok(distribution)
}

pub fn read_quantiles(
    path: &Path,
    direction: ScoreDirection,
) -> Result<ScoreDistribution, TableError> {
    let file = std::fs::File::open(path).map_err(|e| TableError::io(path, e))?;
    read_quantiles_from(file, &path.to_string_lossy(), direction)
}
