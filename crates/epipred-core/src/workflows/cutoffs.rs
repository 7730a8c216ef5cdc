use crate::core::io::ResultTable;
use crate::core::io::TableError;
use crate::core::io::quantiles::{quantiles_file_name, read_quantiles};
use crate::core::models::cutoffs::ScoreDistribution;
use crate::core::models::record::PredictionRecord;
use crate::core::profiles::ScoringScheme;
use crate::engine::distribution;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Where the side-table for `scheme` lives in `dir`.
pub fn quantiles_path(dir: &Path, scheme: &ScoringScheme) -> PathBuf {
    dir.join(quantiles_file_name(scheme))
}

/// Score distributions for the prediction tables in `dir`.
///
/// Each scoring scheme has its own side-table, named after its score key and direction. An
/// existing one is read unless `overwrite` is set; otherwise the distributions are estimated from
/// `records` and written there. Returns `None` when there is nothing to estimate from.
///
/// # Errors
///
/// Returns [`TableError`] if the side-table cannot be read or written.
#[instrument(skip_all, name = "cutoff_cache")]
pub fn load_or_compute(
    dir: &Path,
    records: &[PredictionRecord],
    scheme: &ScoringScheme,
    overwrite: bool,
) -> Result<Option<ScoreDistribution>, TableError> {
    let path = quantiles_path(dir, scheme);
    if path.is_file() && !overwrite {
        info!(
            score_key = %scheme.score_key,
            "Reading stored quantiles from {}.",
            path.display()
        );
        return read_quantiles(&path, scheme.direction).map(Some);
    }

    let Some(distribution) = distribution::estimate(records, scheme.direction) else {
        return Ok(None);
    };
    distribution.write_to_path(&path)?;
    info!(
        alleles = distribution.len(),
        "Wrote quantiles to {}.",
        path.display()
    );
    Ok(Some(distribution))
}
