//! # epipred Core Library
//!
//! Binder classification, cross-allele ("promiscuous") aggregation and epitope clustering for
//! peptide/MHC binding predictions produced by external predictors.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Immutable record models (`PredictionRecord`, `Binder`,
//!   `PromiscuousBinder`), quantile statistics, predictor scoring profiles and tabular I/O.
//!
//! - **[`engine`]: The Logic Core.** The pipeline stages: score distribution estimation, cutoff
//!   resolution, binder classification, promiscuous aggregation and position clustering. Every
//!   stage is a pure function over borrowed input; cutoff tables and records are passed in and out
//!   explicitly rather than held as shared state.
//!
//! - **[`workflows`]: The Public API.** Ties the stages together into a complete analysis run over
//!   a record set or a directory of prediction tables.

pub mod core;
pub mod engine;
pub mod workflows;
