use super::error::TableError;
use super::quantiles::is_quantiles_file;
use crate::core::models::record::PredictionRecord;
use csv::StringRecord;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Records gathered from a directory of prediction tables.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<PredictionRecord>,
    pub files_read: usize,
    /// Tables that were passed over because they lack the score column.
    pub skipped: Vec<PathBuf>,
}

impl LoadedRecords {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

struct ColumnMap {
    peptide: usize,
    core: Option<usize>,
    pos: usize,
    name: usize,
    allele: usize,
    score: usize,
    rank: Option<usize>,
}

impl ColumnMap {
    fn from_headers(
        headers: &StringRecord,
        score_key: &str,
        source: &str,
    ) -> Result<Self, TableError> {
        let find = |column: &str| headers.iter().position(|h| h.trim() == column);
        let require = |column: &str| {
            find(column).ok_or_else(|| TableError::MissingColumn {
                path: source.to_string(),
                column: column.to_string(),
            })
        };

        let score = find(score_key).ok_or_else(|| TableError::MissingScoreColumn {
            path: source.to_string(),
            score_key: score_key.to_string(),
        })?;

        Ok(Self {
            peptide: require("peptide")?,
            core: find("core"),
            pos: require("pos")?,
            name: require("name")?,
            allele: require("allele")?,
            score,
            rank: find("rank"),
        })
    }
}

/// Parses an index-like column that may have been written as a float (`"12.0"`).
fn parse_index(value: &str) -> Option<usize> {
    let value = value.trim();
    if let Ok(v) = value.parse::<usize>() {
        return Some(v);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Some(v as usize),
        _ => None,
    }
}

fn field(row: &StringRecord, index: usize) -> &str {
    row.get(index).unwrap_or("").trim()
}

/// Reads prediction records from any reader holding a delimited table with a header row.
///
/// `source` only labels errors and log messages. Extra columns, including a leading unnamed index
/// column, are ignored.
///
/// # Errors
///
/// Returns [`TableError::MissingScoreColumn`] if `score_key` is not a column,
/// [`TableError::MissingColumn`] if another required column is absent, and
/// [`TableError::InvalidValue`] if a position cannot be read.
pub fn read_records_from<R: Read>(
    reader: R,
    source: &str,
    score_key: &str,
) -> Result<Vec<PredictionRecord>, TableError> {
    let csv_error = |e| TableError::Csv {
        path: source.to_string(),
        source: e,
    };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = ColumnMap::from_headers(&headers, score_key, source)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(csv_error)?;
        let row_number = i + 1;

        let score = match field(&row, columns.score).parse::<f64>() {
            Ok(score) if score.is_finite() => score,
            _ => {
                dropped += 1;
                continue;
            }
        };

        let pos_value = field(&row, columns.pos);
        let pos = parse_index(pos_value).ok_or_else(|| TableError::InvalidValue {
            path: source.to_string(),
            column: "pos".to_string(),
            row: row_number,
            value: pos_value.to_string(),
        })?;

        let peptide = field(&row, columns.peptide).to_string();
        let core = columns
            .core
            .map(|c| field(&row, c))
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| peptide.clone());
        let rank = columns.rank.and_then(|c| parse_index(field(&row, c)));

        records.push(PredictionRecord {
            peptide,
            core,
            pos,
            name: field(&row, columns.name).to_string(),
            allele: field(&row, columns.allele).to_string(),
            score,
            rank,
        });
    }

    if dropped > 0 {
        debug!(source, dropped, "Dropped rows without a numeric score.");
    }
    Ok(records)
}

/// Reads one prediction table from disk.
///
/// # Errors
///
/// See [`read_records_from`]; additionally fails with [`TableError::Io`] if the file cannot be
/// opened.
pub fn read_records(path: &Path, score_key: &str) -> Result<Vec<PredictionRecord>, TableError> {
    let file = std::fs::File::open(path).map_err(|e| TableError::io(path, e))?;
    read_records_from(file, &path.to_string_lossy(), score_key)
}

/// Lists the prediction tables (`*.csv`) in `dir`, sorted by file name.
///
/// Quantile side-tables are never listed.
pub fn list_tables(dir: &Path) -> Result<Vec<PathBuf>, TableError> {
    let entries = std::fs::read_dir(dir).map_err(|e| TableError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TableError::io(dir, e))?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let is_quantiles = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_quantiles_file);
        if path.is_file() && is_csv && !is_quantiles {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Loads every prediction table in `dir`, up to `file_limit` files.
///
/// Tables lacking `score_key` are skipped with a warning and reported in
/// [`LoadedRecords::skipped`]; any other failure aborts the load.
pub fn load_directory(
    dir: &Path,
    score_key: &str,
    file_limit: Option<usize>,
) -> Result<LoadedRecords, TableError> {
    load_directory_with(dir, score_key, file_limit, |_| {})
}

/// [`load_directory`], calling `on_table` after each table has been read or skipped.
pub fn load_directory_with<F>(
    dir: &Path,
    score_key: &str,
    file_limit: Option<usize>,
    mut on_table: F,
) -> Result<LoadedRecords, TableError>
where
    F: FnMut(&Path),
{
    let mut files = list_tables(dir)?;
    if let Some(limit) = file_limit {
        files.truncate(limit);
    }

    let mut loaded = LoadedRecords::default();
    for path in files {
        match read_records(&path, score_key) {
            Ok(records) => {
                loaded.records.extend(records);
                loaded.files_read += 1;
            }
            Err(e) if e.is_skippable() => {
                warn!(path = %path.display(), "Skipping table: {}", e);
                loaded.skipped.push(path.clone());
            }
            Err(e) => return Err(e),
        }
        on_table(&path);
    }

    info!(
        files = loaded.files_read,
        skipped = loaded.skipped.len(),
        records = loaded.records.len(),
        "Loaded prediction tables from {}.",
        dir.display()
    );
    Ok(loaded)
}
