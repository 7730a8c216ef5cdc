//! Reading and writing the tabular files that surround an analysis.
//!
//! Prediction tables come in as delimited files with one row per peptide/allele call. Binder,
//! promiscuous-binder, cluster, region and quantile tables go out through the [`traits::ResultTable`]
//! interface, so every result type is written with the same column conventions.

pub mod error;
pub mod quantiles;
pub mod records;
pub mod tables;
pub mod traits;

pub use error::TableError;
pub use traits::ResultTable;
