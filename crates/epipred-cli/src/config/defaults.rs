use epipred::engine::config::{ClusterMethod, CutoffMethod};

pub struct DefaultsConfig {
    pub predictor: String,
    pub cutoff_method: CutoffMethod,
    pub percentile: f64,
    pub min_alleles: usize,
    pub cluster_method: ClusterMethod,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            predictor: "tepitope".to_string(),
            cutoff_method: CutoffMethod::Default,
            percentile: 0.98,
            min_alleles: 2,
            cluster_method: ClusterMethod::Overlap,
        }
    }
}
