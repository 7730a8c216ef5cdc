use super::stats::Percentile;
use phf::{Map, phf_map};
use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which end of a predictor's score range marks a stronger binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreDirection {
    /// IC50-like scores: a binder has `score <= threshold`.
    LowerIsBetter,
    /// Matrix-like scores: a binder has `score >= threshold`.
    HigherIsBetter,
}

impl ScoreDirection {
    /// The raw quantile of the score distribution that sits at `percentile` stringency.
    pub fn quantile_for(self, percentile: Percentile) -> f64 {
        match self {
            ScoreDirection::LowerIsBetter => percentile.complement(),
            ScoreDirection::HigherIsBetter => percentile.value(),
        }
    }

    pub fn passes(self, score: f64, threshold: f64) -> bool {
        match self {
            ScoreDirection::LowerIsBetter => score <= threshold,
            ScoreDirection::HigherIsBetter => score >= threshold,
        }
    }

    pub fn best(self, a: f64, b: f64) -> f64 {
        match self {
            ScoreDirection::LowerIsBetter => a.min(b),
            ScoreDirection::HigherIsBetter => a.max(b),
        }
    }

    /// Orders scores best first.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        match self {
            ScoreDirection::LowerIsBetter => a.total_cmp(&b),
            ScoreDirection::HigherIsBetter => b.total_cmp(&a),
        }
    }

    /// Comparison a passing score makes with its threshold.
    pub fn symbol(self) -> &'static str {
        match self {
            ScoreDirection::LowerIsBetter => "<=",
            ScoreDirection::HigherIsBetter => ">=",
        }
    }
}

impl fmt::Display for ScoreDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreDirection::LowerIsBetter => write!(f, "lower-is-better"),
            ScoreDirection::HigherIsBetter => write!(f, "higher-is-better"),
        }
    }
}

impl FromStr for ScoreDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lower-is-better" | "lower" | "<" => Ok(ScoreDirection::LowerIsBetter),
            "higher-is-better" | "higher" | ">" => Ok(ScoreDirection::HigherIsBetter),
            other => Err(format!(
                "Unknown score direction '{}'. Expected 'lower-is-better' or 'higher-is-better'.",
                other
            )),
        }
    }
}

/// The column holding the score in a prediction table and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringScheme {
    pub score_key: String,
    pub direction: ScoreDirection,
}

impl ScoringScheme {
    pub fn new(score_key: impl Into<String>, direction: ScoreDirection) -> Self {
        Self {
            score_key: score_key.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorProfile {
    pub name: &'static str,
    pub score_key: &'static str,
    pub direction: ScoreDirection,
    /// Threshold used by the `simple` cutoff policy when none is given.
    pub simple_cutoff: f64,
}

impl PredictorProfile {
    pub fn scoring(&self) -> ScoringScheme {
        ScoringScheme::new(self.score_key, self.direction)
    }
}

static PREDICTOR_PROFILES: Map<&'static str, PredictorProfile> = phf_map! {
    "tepitope" => PredictorProfile {
        name: "tepitope",
        score_key: "score",
        direction: ScoreDirection::HigherIsBetter,
        simple_cutoff: 2.0,
    },
    "netmhciipan" => PredictorProfile {
        name: "netmhciipan",
        score_key: "Affinity",
        direction: ScoreDirection::LowerIsBetter,
        simple_cutoff: 500.0,
    },
    "iedbmhc1" => PredictorProfile {
        name: "iedbmhc1",
        score_key: "ic50",
        direction: ScoreDirection::LowerIsBetter,
        simple_cutoff: 500.0,
    },
    "iedbmhc2" => PredictorProfile {
        name: "iedbmhc2",
        score_key: "consensus_percentile",
        direction: ScoreDirection::LowerIsBetter,
        simple_cutoff: 3.0,
    },
    "bcell" => PredictorProfile {
        name: "bcell",
        score_key: "Score",
        direction: ScoreDirection::HigherIsBetter,
        simple_cutoff: 0.9,
    },
};

pub fn predictor_profile(name: &str) -> Option<&'static PredictorProfile> {
    PREDICTOR_PROFILES.get(name.trim().to_ascii_lowercase().as_str())
}

/// All known predictor profiles, sorted by name.
pub fn predictor_profiles() -> Vec<&'static PredictorProfile> {
    let mut profiles: Vec<_> = PREDICTOR_PROFILES.values().collect();
    profiles.sort_by_key(|p| p.name);
    profiles
}
