//! # Workflows Module
//!
//! End-to-end entry points that chain the engine stages over a batch of prediction records.
//!
//! - **Analysis** ([`analyze`]) - binders, promiscuous binders, clusters and regions from records
//!   or from a directory of prediction tables
//! - **Cutoff cache** ([`cutoffs`]) - the quantile side-table kept next to prediction tables

pub mod analyze;
pub mod cutoffs;
