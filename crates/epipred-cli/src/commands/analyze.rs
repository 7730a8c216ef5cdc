use crate::cli::AnalyzeArgs;
use crate::config::{AppConfig, build_config};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use epipred::{
    core::io::{ResultTable, records},
    engine::{progress::ProgressReporter, summary},
    workflows::analyze::{self, AnalysisResult, DirectoryOptions},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let app = build_config(&args)?;
    info!(
        label = %app.label,
        input = %app.input_path.display(),
        "Configuration assembled."
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting epitope analysis...");
    let result = analyze_input(&app, &reporter)?;

    if result.is_empty() {
        warn!("Analysis completed but selected no binders.");
        println!("Warning: no binders passed the cutoffs.");
    }
    for row in summary::allele_summary(&result.binders) {
        debug!(
            allele = %row.allele,
            binders = row.binders,
            mean_score = row.mean_score,
            "Allele summary."
        );
    }

    std::fs::create_dir_all(&app.output_dir)?;
    write_outputs(&app, &result)
}

fn analyze_input(app: &AppConfig, reporter: &ProgressReporter) -> Result<AnalysisResult> {
    if app.input_path.is_dir() {
        let options = DirectoryOptions {
            file_limit: app.file_limit,
            overwrite_cutoffs: app.overwrite_cutoffs,
        };
        return Ok(analyze::from_directory(
            &app.input_path,
            &app.core_config,
            options,
            reporter,
        )?);
    }

    info!("Loading predictions from {:?}", &app.input_path);
    let records = records::read_records(&app.input_path, &app.core_config.scoring.score_key)
        .map_err(|e| CliError::FileParsing {
            path: app.input_path.clone(),
            source: e.into(),
        })?;
    Ok(analyze::run(&records, &app.core_config, None, reporter)?)
}

pub(crate) fn output_paths(dir: &Path, label: &str, min_alleles: usize) -> [PathBuf; 5] {
    [
        dir.join(format!("binders_{}_{}.csv", label, min_alleles)),
        dir.join(format!("cores_{}.csv", label)),
        dir.join(format!("prom_binders_{}_{}.csv", label, min_alleles)),
        dir.join(format!("clusters_{}.csv", label)),
        dir.join(format!("regions_{}.csv", label)),
    ]
}

fn write_outputs(app: &AppConfig, result: &AnalysisResult) -> Result<()> {
    let [binders_path, cores_path, promiscuous_path, clusters_path, regions_path] = output_paths(
        &app.output_dir,
        &app.label,
        app.core_config.promiscuous.min_alleles,
    );

    result.binders.write_to_path(&binders_path)?;
    println!(
        "✓ {} binder(s) written to: {}",
        result.binders.len(),
        binders_path.display()
    );

    result.cores.write_to_path(&cores_path)?;
    println!(
        "✓ {} unique core(s) written to: {}",
        result.cores.len(),
        cores_path.display()
    );

    result.promiscuous.write_to_path(&promiscuous_path)?;
    println!(
        "✓ {} promiscuous binder(s) written to: {}",
        result.promiscuous.len(),
        promiscuous_path.display()
    );

    result.clusters.write_to_path(&clusters_path)?;
    println!(
        "✓ {} cluster(s) written to: {}",
        result.clusters.iter().map(|p| p.clusters.len()).sum::<usize>(),
        clusters_path.display()
    );

    if app.core_config.regions.is_some() {
        result.regions.write_to_path(&regions_path)?;
        println!(
            "✓ {} region(s) written to: {}",
            result.regions.len(),
            regions_path.display()
        );
    }
    Ok(())
}
