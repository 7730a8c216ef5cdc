use crate::core::profiles::{PredictorProfile, ScoreDirection, ScoringScheme};
use crate::core::stats::{InvalidPercentile, Percentile};
use crate::engine::cluster::ClusterStrategy;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Side of the overlap window used when neither a window nor a cluster length is configured.
pub const DEFAULT_CLUSTER_LENGTH: usize = 25;
pub const DEFAULT_MIN_CLUSTER_POINTS: usize = 2;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error(transparent)]
    InvalidPercentile(#[from] InvalidPercentile),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// How per-allele thresholds are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoffMethod {
    /// Precomputed table first, then the quantile of the allele's own rows.
    #[default]
    Default,
    /// Quantiles of the full loaded dataset, recomputed on every call.
    Global,
    /// One scalar threshold for every allele.
    Simple,
}

impl fmt::Display for CutoffMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CutoffMethod::Default => "default",
            CutoffMethod::Global => "global",
            CutoffMethod::Simple => "simple",
        };
        f.write_str(name)
    }
}

impl FromStr for CutoffMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(CutoffMethod::Default),
            "global" => Ok(CutoffMethod::Global),
            "simple" => Ok(CutoffMethod::Simple),
            other => Err(format!(
                "Unknown cutoff method '{}'. Expected one of: default, global, simple.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterMethod {
    #[default]
    Overlap,
    Density,
}

impl fmt::Display for ClusterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterMethod::Overlap => f.write_str("overlap"),
            ClusterMethod::Density => f.write_str("density"),
        }
    }
}

impl FromStr for ClusterMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlap" => Ok(ClusterMethod::Overlap),
            "density" | "dbscan" => Ok(ClusterMethod::Density),
            other => Err(format!(
                "Unknown cluster method '{}'. Expected 'overlap' or 'density'.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffConfig {
    pub method: CutoffMethod,
    pub percentile: Percentile,
    /// Required by [`CutoffMethod::Simple`], ignored otherwise.
    pub simple_cutoff: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromiscuousConfig {
    pub min_alleles: usize,
}

/// Clustering parameters; unset distances are derived from the peptide length at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    pub method: ClusterMethod,
    pub window: Option<usize>,
    pub gap: Option<usize>,
    /// Target cluster length; stands in for an unset window, and for an unset gap as the length
    /// left after one peptide.
    pub length: Option<usize>,
    pub eps: Option<usize>,
    pub min_points: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            method: ClusterMethod::Overlap,
            window: None,
            gap: None,
            length: None,
            eps: None,
            min_points: DEFAULT_MIN_CLUSTER_POINTS,
        }
    }
}

impl ClusterConfig {
    pub fn strategy_for(&self, peptide_length: usize) -> ClusterStrategy {
        match self.method {
            ClusterMethod::Overlap => ClusterStrategy::Overlap {
                window: self.window.or(self.length).unwrap_or(DEFAULT_CLUSTER_LENGTH),
                gap: self.gap.unwrap_or_else(|| {
                    self.length
                        .map_or(peptide_length, |l| l.saturating_sub(peptide_length))
                }),
            },
            ClusterMethod::Density => ClusterStrategy::Density {
                eps: self.eps.unwrap_or(peptide_length + 1),
                min_points: self.min_points,
            },
        }
    }
}

/// Parameters of the epitope-dense region search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionParams {
    /// Neighborhood radius; defaults to the peptide length plus one.
    pub dist: Option<usize>,
    pub min_binders: usize,
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for RegionParams {
    fn default() -> Self {
        Self {
            dist: None,
            min_binders: 2,
            min_length: 12,
            max_length: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub scoring: ScoringScheme,
    pub cutoff: CutoffConfig,
    pub promiscuous: PromiscuousConfig,
    pub clustering: ClusterConfig,
    /// Region search runs only when set.
    pub regions: Option<RegionParams>,
    /// Restricts binder selection to one protein.
    pub protein: Option<String>,
}

impl AnalysisConfig {
    pub fn direction(&self) -> ScoreDirection {
        self.scoring.direction
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    scoring: Option<ScoringScheme>,
    cutoff_method: Option<CutoffMethod>,
    percentile: Option<f64>,
    simple_cutoff: Option<f64>,
    min_alleles: Option<usize>,
    clustering: ClusterConfig,
    regions: Option<RegionParams>,
    protein: Option<String>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scoring(mut self, scoring: ScoringScheme) -> Self {
        self.scoring = Some(scoring);
        self
    }
    /// Takes score column and direction from a known predictor, and its scalar cutoff unless one
    /// was already set.
    pub fn predictor(mut self, profile: &PredictorProfile) -> Self {
        self.scoring = Some(profile.scoring());
        self.simple_cutoff = self.simple_cutoff.or(Some(profile.simple_cutoff));
        self
    }
    pub fn cutoff_method(mut self, method: CutoffMethod) -> Self {
        self.cutoff_method = Some(method);
        self
    }
    pub fn percentile(mut self, percentile: f64) -> Self {
        self.percentile = Some(percentile);
        self
    }
    pub fn simple_cutoff(mut self, cutoff: f64) -> Self {
        self.simple_cutoff = Some(cutoff);
        self
    }
    pub fn min_alleles(mut self, n: usize) -> Self {
        self.min_alleles = Some(n);
        self
    }
    pub fn cluster_method(mut self, method: ClusterMethod) -> Self {
        self.clustering.method = method;
        self
    }
    pub fn cluster_window(mut self, window: usize) -> Self {
        self.clustering.window = Some(window);
        self
    }
    pub fn cluster_gap(mut self, gap: usize) -> Self {
        self.clustering.gap = Some(gap);
        self
    }
    /// Derives window and gap from a target cluster length once the peptide length is known.
    pub fn cluster_length(mut self, length: usize) -> Self {
        self.clustering.length = Some(length);
        self
    }
    pub fn cluster_eps(mut self, eps: usize) -> Self {
        self.clustering.eps = Some(eps);
        self
    }
    pub fn cluster_min_points(mut self, min_points: usize) -> Self {
        self.clustering.min_points = min_points;
        self
    }
    pub fn regions(mut self, params: RegionParams) -> Self {
        self.regions = Some(params);
        self
    }
    pub fn protein(mut self, name: impl Into<String>) -> Self {
        self.protein = Some(name.into());
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let method = self
            .cutoff_method
            .ok_or(ConfigError::MissingParameter("cutoff_method"))?;
        let percentile = Percentile::new(
            self.percentile
                .ok_or(ConfigError::MissingParameter("percentile"))?,
        )?;
        if method == CutoffMethod::Simple && self.simple_cutoff.is_none() {
            return Err(ConfigError::MissingParameter("simple_cutoff"));
        }
        if let Some(cutoff) = self.simple_cutoff.filter(|c| !c.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "simple_cutoff",
                reason: format!("{} is not a finite number", cutoff),
            });
        }

        let min_alleles = self
            .min_alleles
            .ok_or(ConfigError::MissingParameter("min_alleles"))?;
        if min_alleles == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "min_alleles",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.clustering.window == Some(0) || self.clustering.length == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "cluster_window",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.clustering.min_points == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "cluster_min_points",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(regions) = self.regions.filter(|r| r.min_length > r.max_length) {
            return Err(ConfigError::InvalidParameter {
                name: "regions",
                reason: format!(
                    "minimum length {} exceeds maximum length {}",
                    regions.min_length, regions.max_length
                ),
            });
        }

        Ok(AnalysisConfig {
            scoring: self
                .scoring
                .ok_or(ConfigError::MissingParameter("scoring"))?,
            cutoff: CutoffConfig {
                method,
                percentile,
                simple_cutoff: self.simple_cutoff,
            },
            promiscuous: PromiscuousConfig { min_alleles },
            clustering: self.clustering,
            regions: self.regions,
            protein: self.protein,
        })
    }
}
