use epipred::engine::config as core_config;
use std::path::PathBuf;

pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Name used in output file names.
    pub label: String,
    pub file_limit: Option<usize>,
    pub overwrite_cutoffs: bool,
    pub core_config: core_config::AnalysisConfig,
}
