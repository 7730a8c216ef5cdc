use crate::core::io::records;
use crate::core::models::binder::{Binder, CoreScore, PromiscuousBinder};
use crate::core::models::cluster::{EpitopeRegion, ProteinClusters};
use crate::core::models::cutoffs::CutoffTable;
use crate::core::models::record::PredictionRecord;
use crate::engine::classify;
use crate::engine::cluster::{cluster_proteins, regions::find_regions};
use crate::engine::config::{AnalysisConfig, ConfigError, CutoffMethod};
use crate::engine::cutoff::{self, CutoffPolicy};
use crate::engine::error::AnalysisError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::{promiscuous, summary};
use crate::workflows::cutoffs;
use std::path::Path;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// Thresholds the binders were selected with.
    pub cutoffs: CutoffTable,
    pub binders: Vec<Binder>,
    /// Best binder score of each distinct core, best first.
    pub cores: Vec<CoreScore>,
    pub promiscuous: Vec<PromiscuousBinder>,
    pub clusters: Vec<ProteinClusters>,
    pub regions: Vec<EpitopeRegion>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }
}

fn cutoff_policy<'a>(
    config: &AnalysisConfig,
    precomputed: Option<&'a CutoffTable>,
) -> Result<CutoffPolicy<'a>, ConfigError> {
    Ok(match config.cutoff.method {
        CutoffMethod::Default => CutoffPolicy::Default(precomputed),
        CutoffMethod::Global => CutoffPolicy::Global,
        CutoffMethod::Simple => CutoffPolicy::Simple(
            config
                .cutoff
                .simple_cutoff
                .ok_or(ConfigError::MissingParameter("simple_cutoff"))?,
        ),
    })
}

/// Runs binder selection, promiscuous aggregation, clustering and (when configured) the region
/// search over `records`.
///
/// Records without a rank are ranked per allele first. `precomputed` is only consulted by the
/// default cutoff method.
///
/// # Errors
///
/// Returns [`AnalysisError::UnknownProtein`] if the configured protein is absent from non-empty
/// `records`, and [`AnalysisError::Config`] if the cutoff policy cannot be formed.
#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(
    records: &[PredictionRecord],
    config: &AnalysisConfig,
    precomputed: Option<&CutoffTable>,
    reporter: &ProgressReporter,
) -> Result<AnalysisResult, AnalysisError> {
    if records.is_empty() {
        warn!("No prediction records to analyze.");
        return Ok(AnalysisResult::default());
    }

    let policy = cutoff_policy(config, precomputed)?;
    let direction = config.direction();
    let percentile = config.cutoff.percentile;
    info!(
        method = %config.cutoff.method,
        percentile = percentile.value(),
        score_key = %config.scoring.score_key,
        %direction,
        "Starting analysis."
    );

    let selected = classify::select_protein(records, config.protein.as_deref())?;
    let selected = classify::ensure_ranked(selected, direction);
    let cutoffs = classify::resolve_cutoffs(records, &selected, policy, percentile, direction);

    let binders = reporter.stage("Binder selection", || {
        let binder_percentile = policy.is_percentile_based().then_some(percentile);
        Ok::<_, AnalysisError>(classify::apply_cutoffs(
            &selected,
            &cutoffs,
            binder_percentile,
            direction,
        ))
    })?;
    let cores = summary::unique_cores(binders.iter().map(|b| &b.record), direction);

    let promiscuous = reporter.stage("Promiscuous aggregation", || {
        promiscuous::aggregate(
            &binders,
            &selected,
            config.promiscuous.min_alleles,
            direction,
        )
    })?;

    let clusters = reporter.stage("Clustering", || {
        Ok::<_, AnalysisError>(cluster_proteins(&promiscuous, &config.clustering))
    })?;

    let regions = match &config.regions {
        Some(params) => reporter.stage("Region search", || {
            Ok::<_, AnalysisError>(find_regions(&promiscuous, params))
        })?,
        None => Vec::new(),
    };

    info!(
        binders = binders.len(),
        cores = cores.len(),
        promiscuous = promiscuous.len(),
        clusters = clusters.iter().map(|p| p.clusters.len()).sum::<usize>(),
        regions = regions.len(),
        "Analysis complete."
    );

    Ok(AnalysisResult {
        cutoffs,
        binders,
        cores,
        promiscuous,
        clusters,
        regions,
    })
}

/// Options for [`from_directory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryOptions {
    /// Reads at most this many tables.
    pub file_limit: Option<usize>,
    /// Re-estimates the stored quantile table even when one exists.
    pub overwrite_cutoffs: bool,
}

/// Loads the prediction tables in `dir` and analyzes them.
///
/// With the default cutoff method, thresholds come from the directory's quantile side-table for
/// the configured scoring scheme, which is created (or refreshed, with `overwrite_cutoffs`) from
/// the loaded records.
///
/// # Errors
///
/// Returns [`AnalysisError::Table`] if a table or the side-table cannot be read or written, and
/// otherwise fails as [`run`] does.
#[instrument(skip_all, name = "directory_analysis")]
pub fn from_directory(
    dir: &Path,
    config: &AnalysisConfig,
    options: DirectoryOptions,
    reporter: &ProgressReporter,
) -> Result<AnalysisResult, AnalysisError> {
    reporter.report(Progress::StageStart {
        name: "Loading predictions",
    });
    let mut total = records::list_tables(dir)?.len();
    if let Some(limit) = options.file_limit {
        total = total.min(limit);
    }
    reporter.report(Progress::TaskStart {
        total_steps: total as u64,
    });
    let loaded = records::load_directory_with(
        dir,
        &config.scoring.score_key,
        options.file_limit,
        |_| reporter.report(Progress::TaskIncrement),
    )?;
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::StageFinish {
        items: loaded.records.len(),
    });

    if !loaded.skipped.is_empty() {
        reporter.report(Progress::Message(format!(
            "Skipped {} table(s) without a '{}' column.",
            loaded.skipped.len(),
            config.scoring.score_key
        )));
    }

    let precomputed = match config.cutoff.method {
        CutoffMethod::Default => cutoffs::load_or_compute(
            dir,
            &loaded.records,
            &config.scoring,
            options.overwrite_cutoffs,
        )?
        .map(|distribution| cutoff::from_distribution(&distribution, config.cutoff.percentile)),
        _ => None,
    };

    run(&loaded.records, config, precomputed.as_ref(), reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profiles::{ScoreDirection, ScoringScheme};
    use crate::engine::config::{AnalysisConfigBuilder, RegionParams};
    use std::fmt::Write as _;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    const ALLELES: [&str; 3] = ["DRB1*01:01", "DRB1*03:01", "DRB1*04:01"];

    /// Three alleles scoring the same 20 windows of one protein; windows 3, 5 and 7 bind strongly.
    fn records(name: &str) -> Vec<PredictionRecord> {
        let mut out = Vec::new();
        for allele in ALLELES {
            for pos in 0..20 {
                let peptide = format!("{name}PEPTIDE{pos:02}");
                let score = if matches!(pos, 3 | 5 | 7) {
                    10.0 + pos as f64
                } else {
                    500.0 + pos as f64
                };
                out.push(PredictionRecord::new(
                    peptide,
                    format!("{name}CORE{pos:02}"),
                    pos,
                    name,
                    allele,
                    score,
                ));
            }
        }
        out
    }

    fn config(method: CutoffMethod) -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::new()
            .scoring(ScoringScheme::new("Affinity", ScoreDirection::LowerIsBetter))
            .cutoff_method(method)
            .percentile(0.85)
            .min_alleles(2)
    }

    #[test]
    fn run_chains_every_stage() {
        let data = records("P1");
        let config = config(CutoffMethod::Global)
            .regions(RegionParams::default())
            .build()
            .unwrap();
        let result = run(&data, &config, None, &ProgressReporter::new()).unwrap();

        assert_eq!(result.cutoffs.len(), 3);
        assert_eq!(result.binders.len(), 9);
        assert_eq!(result.promiscuous.len(), 3);
        assert!(result.promiscuous.iter().all(|p| p.alleles == 3));
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].clusters[0].positions(), &[3, 5, 7]);
        assert_eq!(result.regions.len(), 1);
        assert_eq!(result.regions[0].start, 3);
    }

    #[test]
    fn run_ranks_binders_and_collects_their_cores() {
        let data = records("P1");
        let config = config(CutoffMethod::Global).build().unwrap();
        let result = run(&data, &config, None, &ProgressReporter::new()).unwrap();

        let first: Vec<_> = result.binders[..3]
            .iter()
            .map(|b| (b.record.allele.as_str(), b.record.pos, b.record.rank))
            .collect();
        assert_eq!(
            first,
            vec![
                ("DRB1*01:01", 3, Some(1)),
                ("DRB1*01:01", 5, Some(2)),
                ("DRB1*01:01", 7, Some(3)),
            ]
        );

        let cores: Vec<_> = result
            .cores
            .iter()
            .map(|c| (c.core.as_str(), c.score))
            .collect();
        assert_eq!(
            cores,
            vec![("P1CORE03", 13.0), ("P1CORE05", 15.0), ("P1CORE07", 17.0)]
        );
        let nearest: Vec<_> = result.promiscuous.iter().map(|p| p.nearest).collect();
        assert_eq!(nearest, vec![2, 2, 2]);
    }

    #[test]
    fn directory_cache_follows_the_score_column() {
        let dir = tempdir().unwrap();
        write_table(&dir.path().join("P1.csv"), &records("P1"));
        let mut stale = String::from("percentile,DRB1*01:01,DRB1*03:01,DRB1*04:01\n");
        for level in 1..=99 {
            writeln!(stale, "0.{level:02},1.000,1.000,1.000").unwrap();
        }
        std::fs::write(dir.path().join("quantiles.csv"), stale).unwrap();

        let config = config(CutoffMethod::Default).build().unwrap();
        let result = from_directory(
            dir.path(),
            &config,
            DirectoryOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(result.binders.len(), 9);
        assert!(result.cutoffs.get("DRB1*01:01").unwrap() > 17.0);
    }

    #[test]
    fn run_on_empty_records_is_empty_not_an_error() {
        let config = config(CutoffMethod::Global).protein("P9").build().unwrap();
        let result = run(&[], &config, None, &ProgressReporter::new()).unwrap();
        assert!(result.is_empty());
        assert!(result.promiscuous.is_empty());
    }

    #[test]
    fn run_reports_unknown_protein() {
        let config = config(CutoffMethod::Global).protein("P9").build().unwrap();
        let err = run(&records("P1"), &config, None, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownProtein(_)));
    }

    #[test]
    fn simple_method_uses_the_scalar_cutoff() {
        let config = config(CutoffMethod::Simple)
            .simple_cutoff(15.0)
            .build()
            .unwrap();
        let result = run(&records("P1"), &config, None, &ProgressReporter::new()).unwrap();
        assert_eq!(result.binders.len(), 6);
        assert!(result.binders.iter().all(|b| b.percentile.is_none()));
    }

    #[test]
    fn precomputed_table_drives_default_method() {
        let config = config(CutoffMethod::Default).build().unwrap();
        let table: CutoffTable = ALLELES.iter().map(|a| (*a, 1.0)).collect();
        let result = run(&records("P1"), &config, Some(&table), &ProgressReporter::new()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.cutoffs.get("DRB1*01:01"), Some(1.0));
    }

    #[test]
    fn run_reports_each_stage() {
        let events = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::StageStart { name } = event {
                sink.lock().unwrap().push_str(&format!("{name};"));
            }
        }));
        let config = config(CutoffMethod::Global).build().unwrap();
        run(&records("P1"), &config, None, &reporter).unwrap();
        assert_eq!(
            events.lock().unwrap().as_str(),
            "Binder selection;Promiscuous aggregation;Clustering;"
        );
    }

    fn write_table(path: &Path, data: &[PredictionRecord]) {
        let mut text = String::from(",peptide,core,pos,name,allele,Affinity,rank\n");
        for (i, r) in data.iter().enumerate() {
            writeln!(
                text,
                "{i},{},{},{},{},{},{},{}",
                r.peptide,
                r.core,
                r.pos,
                r.name,
                r.allele,
                r.score,
                i + 1
            )
            .unwrap();
        }
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn from_directory_loads_tables_and_stores_quantiles() {
        let dir = tempdir().unwrap();
        write_table(&dir.path().join("P1.csv"), &records("P1"));
        write_table(&dir.path().join("P2.csv"), &records("P2"));
        std::fs::write(dir.path().join("other.csv"), "peptide,pos,name,allele,ic50\n").unwrap();

        let config = config(CutoffMethod::Default).build().unwrap();
        let result = from_directory(
            dir.path(),
            &config,
            DirectoryOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert!(dir.path().join("quantiles_Affinity_lower.csv").is_file());
        assert_eq!(result.binders.len(), 18);
        assert_eq!(result.promiscuous.len(), 6);
        assert_eq!(result.clusters.len(), 2);
    }
}
