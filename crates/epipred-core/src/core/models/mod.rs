//! Immutable value records flowing between pipeline stages.

pub mod binder;
pub mod cluster;
pub mod cutoffs;
pub mod record;
