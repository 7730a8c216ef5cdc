use crate::cli::CutoffsArgs;
use crate::config::scoring_from_args;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use epipred::{
    core::io::records,
    engine::progress::{Progress, ProgressReporter},
    workflows::cutoffs,
};
use tracing::{info, warn};

pub fn run(args: CutoffsArgs) -> Result<()> {
    if !args.input.is_dir() {
        return Err(CliError::Argument(format!(
            "'{}' is not a directory of prediction tables.",
            args.input.display()
        )));
    }

    let scoring = scoring_from_args(&args.scoring)?;
    let path = cutoffs::quantiles_path(&args.input, &scoring.scheme);
    if path.is_file() && !args.overwrite {
        println!(
            "Quantiles already exist at {}. Use --overwrite to recompute them.",
            path.display()
        );
        return Ok(());
    }

    info!(
        score_key = %scoring.scheme.score_key,
        direction = %scoring.scheme.direction,
        "Estimating score quantiles."
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    reporter.report(Progress::StageStart {
        name: "Loading predictions",
    });
    let loaded = records::load_directory(&args.input, &scoring.scheme.score_key, args.limit)?;
    reporter.report(Progress::StageFinish {
        items: loaded.records.len(),
    });
    if !loaded.skipped.is_empty() {
        reporter.report(Progress::Message(format!(
            "Skipped {} table(s) without a '{}' column.",
            loaded.skipped.len(),
            scoring.scheme.score_key
        )));
    }

    match cutoffs::load_or_compute(
        &args.input,
        &loaded.records,
        &scoring.scheme,
        true,
    )? {
        Some(distribution) => println!(
            "✓ Quantiles for {} allele(s) written to: {}",
            distribution.len(),
            path.display()
        ),
        None => {
            warn!("No scores found under '{}'.", scoring.scheme.score_key);
            println!(
                "Warning: no '{}' scores found in {}; nothing written.",
                scoring.scheme.score_key,
                args.input.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ScoringArgs;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn cutoffs_args(input: &Path, overwrite: bool) -> CutoffsArgs {
        predictor_args(input, "iedbmhc1", overwrite)
    }

    fn predictor_args(input: &Path, predictor: &str, overwrite: bool) -> CutoffsArgs {
        CutoffsArgs {
            input: input.to_path_buf(),
            scoring: ScoringArgs {
                predictor: Some(predictor.to_string()),
                ..ScoringArgs::default()
            },
            overwrite,
            limit: None,
        }
    }

    #[test]
    fn writes_quantiles_and_keeps_them_without_overwrite() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("P1.csv"),
            "peptide,pos,name,allele,ic50\nAAAAAAAAA,0,P1,HLA-A*02:01,10\nCCCCCCCCC,1,P1,HLA-A*02:01,20\n",
        )
        .unwrap();

        run(cutoffs_args(dir.path(), false)).unwrap();
        let path = dir.path().join("quantiles_ic50_lower.csv");
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.starts_with("percentile,HLA-A*02:01"));

        fs::write(&path, "percentile,HLA-A*02:01\n0.50,15.000\n").unwrap();
        run(cutoffs_args(dir.path(), false)).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "percentile,HLA-A*02:01\n0.50,15.000\n"
        );

        run(cutoffs_args(dir.path(), true)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn directory_without_scores_writes_nothing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("P1.csv"), "peptide,pos,name,allele,score\n").unwrap();
        run(cutoffs_args(dir.path(), false)).unwrap();
        assert!(!dir.path().join("quantiles_ic50_lower.csv").exists());
    }

    #[test]
    fn predictors_sharing_a_directory_get_separate_tables() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("P1.csv"),
            "peptide,pos,name,allele,ic50,score\nAAAAAAAAA,0,P1,A,10,9.0\nCCCCCCCCC,1,P1,A,20,1.0\n",
        )
        .unwrap();

        run(predictor_args(dir.path(), "tepitope", false)).unwrap();
        run(predictor_args(dir.path(), "iedbmhc1", false)).unwrap();

        let matrix = fs::read_to_string(dir.path().join("quantiles_score_higher.csv")).unwrap();
        let ic50 = fs::read_to_string(dir.path().join("quantiles_ic50_lower.csv")).unwrap();
        assert!(matrix.contains("\n0.99,8.920\n"));
        assert!(ic50.contains("\n0.99,10.100\n"));
    }

    #[test]
    fn input_must_be_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("P1.csv");
        fs::write(&file, "").unwrap();
        let result = run(cutoffs_args(&file, false));
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
