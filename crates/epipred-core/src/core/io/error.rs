use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Table '{path}' has no '{column}' column")]
    MissingColumn { path: String, column: String },
    #[error("Table '{path}' has no score column '{score_key}'")]
    MissingScoreColumn { path: String, score_key: String },
    #[error("Invalid value '{value}' in column '{column}' at row {row} of '{path}'")]
    InvalidValue {
        path: String,
        column: String,
        row: usize,
        value: String,
    },
}

impl TableError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        TableError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        TableError::Csv {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }

    /// Whether the table should be skipped rather than failing the batch it belongs to.
    pub fn is_skippable(&self) -> bool {
        matches!(self, TableError::MissingScoreColumn { .. })
    }
}
