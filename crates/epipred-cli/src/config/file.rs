use crate::error::{CliError, Result};
use epipred::core::profiles::ScoreDirection;
use epipred::engine::config::{self as core_config, ClusterMethod, CutoffMethod};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileScoringConfig {
    pub predictor: Option<String>,
    pub score_key: Option<String>,
    pub direction: Option<ScoreDirection>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileCutoffConfig {
    pub method: Option<CutoffMethod>,
    pub percentile: Option<f64>,
    pub value: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePromiscuousConfig {
    pub min_alleles: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileClusterConfig {
    pub method: Option<ClusterMethod>,
    pub window: Option<usize>,
    pub gap: Option<usize>,
    pub length: Option<usize>,
    pub eps: Option<usize>,
    pub min_points: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRegionConfig {
    pub enabled: Option<bool>,
    pub dist: Option<usize>,
    pub min_binders: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl FileRegionConfig {
    pub fn params(&self) -> core_config::RegionParams {
        let defaults = core_config::RegionParams::default();
        core_config::RegionParams {
            dist: self.dist.or(defaults.dist),
            min_binders: self.min_binders.unwrap_or(defaults.min_binders),
            min_length: self.min_length.unwrap_or(defaults.min_length),
            max_length: self.max_length.unwrap_or(defaults.max_length),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub protein: Option<String>,
    pub scoring: Option<FileScoringConfig>,
    pub cutoff: Option<FileCutoffConfig>,
    pub promiscuous: Option<FilePromiscuousConfig>,
    pub clustering: Option<FileClusterConfig>,
    pub regions: Option<FileRegionConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
