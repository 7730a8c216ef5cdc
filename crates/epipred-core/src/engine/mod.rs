//! # Engine Module
//!
//! The analysis stages that turn prediction records into binders, promiscuous binders and
//! clusters.
//!
//! ## Stages
//!
//! Each stage is a plain function over borrowed input and can be called on its own with externally
//! supplied thresholds or data:
//!
//! - **Score distributions** ([`distribution`]) - per-allele quantile tables
//! - **Cutoff resolution** ([`cutoff`]) - per-allele thresholds from a percentile policy
//! - **Binder classification** ([`classify`]) - ranking and threshold tests per allele group
//! - **Promiscuous aggregation** ([`promiscuous`]) - merging binder calls across alleles by core
//! - **Clustering** ([`cluster`]) - greedy overlap and density clustering of binder positions
//! - **Summaries** ([`summary`]) - per-allele counts, unique cores, nearest-binder distances and
//!   window overlaps
//!
//! Configuration lives in [`config`], failures in [`error`], and progress events in
//! [`progress`].

pub mod classify;
pub mod cluster;
pub mod config;
pub mod cutoff;
pub mod distribution;
pub mod error;
pub mod progress;
pub mod promiscuous;
pub mod summary;
