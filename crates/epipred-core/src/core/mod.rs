//! # Core Module
//!
//! Fundamental data structures and utilities shared by every pipeline stage.
//!
//! - **Records** ([`models`]) - Prediction records, binders, promiscuous binders and clusters
//! - **Statistics** ([`stats`]) - Empirical quantiles and percentile levels
//! - **Scoring** ([`profiles`]) - Score direction and known predictor profiles
//! - **File I/O** ([`io`]) - Reading prediction tables and writing result tables

pub mod io;
pub mod models;
pub mod profiles;
pub mod stats;
