mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_config, scoring_from_args};
pub use models::AppConfig;
