pub mod analyze;
pub mod cutoffs;
pub mod presets;
