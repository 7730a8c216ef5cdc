use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::TableError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No such protein in data: '{0}'")]
    UnknownProtein(String),

    #[error("Promiscuous binders need at least 1 supporting allele, got {0}")]
    InvalidMinAlleles(usize),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Table error: {source}")]
    Table {
        #[from]
        source: TableError,
    },
}
