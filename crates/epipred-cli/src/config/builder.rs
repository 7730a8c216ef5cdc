use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileScoringConfig};
use super::models::AppConfig;
use crate::cli::{AnalyzeArgs, ScoringArgs};
use crate::error::{CliError, Result};
use epipred::core::profiles::{
    PredictorProfile, ScoreDirection, ScoringScheme, predictor_profile,
};
use epipred::engine::config as core_config;
use std::str::FromStr;

/// Score column and direction chosen for a run, with the name used to label its outputs.
#[derive(Debug, Clone)]
pub struct ResolvedScoring {
    pub scheme: ScoringScheme,
    pub profile: Option<&'static PredictorProfile>,
    pub label: String,
}

fn lookup_profile(name: &str) -> Result<&'static PredictorProfile> {
    predictor_profile(name).ok_or_else(|| {
        CliError::Argument(format!(
            "Unknown predictor '{}'. Run 'epipred presets' to list known predictors.",
            name
        ))
    })
}

/// Picks the scoring scheme: CLI flags first, then the config file, then the default predictor.
///
/// A custom score column needs a direction, either given explicitly or taken from the named
/// predictor.
pub fn resolve_scoring(
    args: &ScoringArgs,
    file: &FileScoringConfig,
    defaults: &DefaultsConfig,
) -> Result<ResolvedScoring> {
    let predictor = args.predictor.as_deref().or(file.predictor.as_deref());
    let score_key = args.score_key.as_deref().or(file.score_key.as_deref());
    let direction = match (args.direction.lower_is_better, args.direction.higher_is_better) {
        (true, false) => Some(ScoreDirection::LowerIsBetter),
        (false, true) => Some(ScoreDirection::HigherIsBetter),
        _ => file.direction,
    };

    if let Some(score_key) = score_key {
        let profile = predictor.map(lookup_profile).transpose()?;
        let direction = direction
            .or(profile.map(|p| p.direction))
            .ok_or_else(|| {
                CliError::Config(format!(
                    "Score column '{}' needs a direction: pass --lower-is-better or --higher-is-better, or set `scoring.direction`.",
                    score_key
                ))
            })?;
        return Ok(ResolvedScoring {
            scheme: ScoringScheme::new(score_key, direction),
            profile,
            label: profile.map_or(score_key, |p| p.name).to_string(),
        });
    }

    let profile = lookup_profile(predictor.unwrap_or(&defaults.predictor))?;
    let mut scheme = profile.scoring();
    if let Some(direction) = direction {
        scheme.direction = direction;
    }
    Ok(ResolvedScoring {
        scheme,
        profile: Some(profile),
        label: profile.name.to_string(),
    })
}

/// [`resolve_scoring`] for commands that take no config file.
pub fn scoring_from_args(args: &ScoringArgs) -> Result<ResolvedScoring> {
    resolve_scoring(args, &FileScoringConfig::default(), &DefaultsConfig::default())
}

pub fn build_config(args: &AnalyzeArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let scoring_file = file_config.scoring.take().unwrap_or_default();
    let scoring = resolve_scoring(&args.scoring, &scoring_file, &defaults)?;

    let cutoff_file = file_config.cutoff.take().unwrap_or_default();
    let cutoff_method = args
        .cutoff_method
        .or(cutoff_file.method)
        .unwrap_or(defaults.cutoff_method);
    let percentile = args
        .percentile
        .or(cutoff_file.percentile)
        .unwrap_or(defaults.percentile);

    let min_alleles = args
        .min_alleles
        .or(file_config.promiscuous.take().and_then(|p| p.min_alleles))
        .unwrap_or(defaults.min_alleles);

    let cluster_file = file_config.clustering.take().unwrap_or_default();
    let cluster_method = args
        .cluster_method
        .or(cluster_file.method)
        .unwrap_or(defaults.cluster_method);

    let mut builder = core_config::AnalysisConfigBuilder::new();
    if let Some(profile) = scoring.profile {
        builder = builder.predictor(profile);
    }
    builder = builder
        .scoring(scoring.scheme)
        .cutoff_method(cutoff_method)
        .percentile(percentile)
        .min_alleles(min_alleles)
        .cluster_method(cluster_method);

    if let Some(value) = args.simple_cutoff.or(cutoff_file.value) {
        builder = builder.simple_cutoff(value);
    }
    if let Some(length) = args.cluster_length.or(cluster_file.length) {
        builder = builder.cluster_length(length);
    }
    if let Some(window) = cluster_file.window {
        builder = builder.cluster_window(window);
    }
    if let Some(gap) = cluster_file.gap {
        builder = builder.cluster_gap(gap);
    }
    if let Some(eps) = cluster_file.eps {
        builder = builder.cluster_eps(eps);
    }
    if let Some(min_points) = cluster_file.min_points {
        builder = builder.cluster_min_points(min_points);
    }

    let region_file = file_config.regions.take().unwrap_or_default();
    if args.regions || region_file.enabled.unwrap_or(false) {
        builder = builder.regions(region_file.params());
    }
    if let Some(protein) = args.protein.clone().or(file_config.protein.take()) {
        builder = builder.protein(protein);
    }

    let core_config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input_path: args.input.clone(),
        output_dir: args.output.clone(),
        label: args.label.clone().unwrap_or(scoring.label),
        file_limit: args.limit,
        overwrite_cutoffs: args.overwrite_cutoffs,
        core_config,
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "protein" => config.protein = Some(value_str.trim().to_string()),
            "scoring.predictor" => {
                config
                    .scoring
                    .get_or_insert_with(Default::default)
                    .predictor = Some(value_str.trim().to_string());
            }
            "scoring.score-key" => {
                config
                    .scoring
                    .get_or_insert_with(Default::default)
                    .score_key = Some(value_str.trim().to_string());
            }
            "scoring.direction" => {
                let direction = ScoreDirection::from_str(value_str).map_err(CliError::Config)?;
                config
                    .scoring
                    .get_or_insert_with(Default::default)
                    .direction = Some(direction);
            }
            "cutoff.method" => {
                let method =
                    core_config::CutoffMethod::from_str(value_str).map_err(CliError::Config)?;
                config.cutoff.get_or_insert_with(Default::default).method = Some(method);
            }
            "cutoff.percentile" => {
                config.cutoff.get_or_insert_with(Default::default).percentile =
                    Some(parse_value(key, value_str, "float")?);
            }
            "cutoff.value" => {
                config.cutoff.get_or_insert_with(Default::default).value =
                    Some(parse_value(key, value_str, "float")?);
            }
            "promiscuous.min-alleles" => {
                config
                    .promiscuous
                    .get_or_insert_with(Default::default)
                    .min_alleles = Some(parse_value(key, value_str, "integer")?);
            }
            "clustering.method" => {
                let method =
                    core_config::ClusterMethod::from_str(value_str).map_err(CliError::Config)?;
                config.clustering.get_or_insert_with(Default::default).method = Some(method);
            }
            "clustering.window" => {
                config.clustering.get_or_insert_with(Default::default).window =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "clustering.gap" => {
                config.clustering.get_or_insert_with(Default::default).gap =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "clustering.length" => {
                config.clustering.get_or_insert_with(Default::default).length =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "clustering.eps" => {
                config.clustering.get_or_insert_with(Default::default).eps =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "clustering.min-points" => {
                config
                    .clustering
                    .get_or_insert_with(Default::default)
                    .min_points = Some(parse_value(key, value_str, "integer")?);
            }
            "regions.enabled" => {
                config.regions.get_or_insert_with(Default::default).enabled =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "regions.dist" => {
                config.regions.get_or_insert_with(Default::default).dist =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "regions.min-binders" => {
                config
                    .regions
                    .get_or_insert_with(Default::default)
                    .min_binders = Some(parse_value(key, value_str, "integer")?);
            }
            "regions.min-length" => {
                config.regions.get_or_insert_with(Default::default).min_length =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "regions.max-length" => {
                config.regions.get_or_insert_with(Default::default).max_length =
                    Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DirectionFlags;
    use epipred::core::stats::Percentile;
    use epipred::engine::config::{ClusterMethod, CutoffMethod};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_analyze_args() -> AnalyzeArgs {
        AnalyzeArgs {
            input: PathBuf::from("predictions"),
            output: PathBuf::from("results"),
            config: None,
            label: None,
            limit: None,
            scoring: ScoringArgs::default(),
            cutoff_method: None,
            percentile: None,
            simple_cutoff: None,
            overwrite_cutoffs: false,
            protein: None,
            min_alleles: None,
            cluster_method: None,
            cluster_length: None,
            regions: false,
            set_values: vec![],
        }
    }

    #[test]
    fn build_config_uses_defaults_for_everything_unset() {
        let app = build_config(&base_analyze_args()).expect("build ok");
        let cfg = app.core_config;
        let defaults = DefaultsConfig::default();

        assert_eq!(app.label, "tepitope");
        assert_eq!(cfg.scoring.score_key, "score");
        assert_eq!(cfg.direction(), ScoreDirection::HigherIsBetter);
        assert_eq!(cfg.cutoff.method, defaults.cutoff_method);
        assert_eq!(cfg.cutoff.percentile, Percentile::new(defaults.percentile).unwrap());
        assert_eq!(cfg.cutoff.simple_cutoff, Some(2.0));
        assert_eq!(cfg.promiscuous.min_alleles, defaults.min_alleles);
        assert_eq!(cfg.clustering.method, defaults.cluster_method);
        assert!(cfg.regions.is_none());
        assert!(cfg.protein.is_none());
    }

    #[test]
    fn build_config_reads_file_and_merges() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        let toml = r#"
            protein = "Rv0001"

            [scoring]
            predictor = "netmhciipan"

            [cutoff]
            method = "simple"
            value = 250.0

            [promiscuous]
            min-alleles = 3

            [clustering]
            method = "density"
            eps = 12

            [regions]
            enabled = true
            min-length = 10
            "#;
        fs::write(&cfg_path, toml).unwrap();

        let mut args = base_analyze_args();
        args.config = Some(cfg_path);

        let app = build_config(&args).expect("build ok");
        let cfg = app.core_config;

        assert_eq!(app.label, "netmhciipan");
        assert_eq!(cfg.scoring.score_key, "Affinity");
        assert_eq!(cfg.cutoff.method, CutoffMethod::Simple);
        assert_eq!(cfg.cutoff.simple_cutoff, Some(250.0));
        assert_eq!(cfg.promiscuous.min_alleles, 3);
        assert_eq!(cfg.clustering.method, ClusterMethod::Density);
        assert_eq!(cfg.clustering.eps, Some(12));
        assert_eq!(cfg.regions.unwrap().min_length, 10);
        assert_eq!(cfg.protein.as_deref(), Some("Rv0001"));
    }

    #[test]
    fn cli_overrides_file_values() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        let toml = r#"
            [cutoff]
            method = "global"
            percentile = 0.9
            [promiscuous]
            min-alleles = 4
            "#;
        fs::write(&cfg_path, toml).unwrap();

        let mut args = base_analyze_args();
        args.config = Some(cfg_path);
        args.cutoff_method = Some(CutoffMethod::Default);
        args.percentile = Some(0.95);
        args.min_alleles = Some(1);
        args.label = Some("run1".to_string());

        let app = build_config(&args).expect("build ok");
        let cfg = app.core_config;

        assert_eq!(app.label, "run1");
        assert_eq!(cfg.cutoff.method, CutoffMethod::Default);
        assert_eq!(cfg.cutoff.percentile.level(), 95);
        assert_eq!(cfg.promiscuous.min_alleles, 1);
    }

    #[test]
    fn set_values_override() {
        let mut args = base_analyze_args();
        args.set_values = vec![
            "cutoff.method=global".to_string(),
            "cutoff.percentile=0.9".to_string(),
            "promiscuous.min-alleles=3".to_string(),
            "clustering.length=20".to_string(),
            "regions.enabled=true".to_string(),
            "regions.max-length=80".to_string(),
        ];

        let app = build_config(&args).expect("build ok");
        let cfg = app.core_config;

        assert_eq!(cfg.cutoff.method, CutoffMethod::Global);
        assert_eq!(cfg.cutoff.percentile.level(), 90);
        assert_eq!(cfg.promiscuous.min_alleles, 3);
        assert_eq!(cfg.clustering.length, Some(20));
        assert_eq!(cfg.regions.unwrap().max_length, 80);
    }

    #[test]
    fn malformed_or_unknown_set_values_are_rejected() {
        let mut args = base_analyze_args();
        args.set_values = vec!["cutoff.percentile".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));

        args.set_values = vec!["cutoff.colour=blue".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));

        args.set_values = vec!["promiscuous.min-alleles=two".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn invalid_core_parameters_surface_as_config_errors() {
        let mut args = base_analyze_args();
        args.percentile = Some(1.5);
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));

        let mut args = base_analyze_args();
        args.min_alleles = Some(0);
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn custom_score_key_requires_a_direction() {
        let defaults = DefaultsConfig::default();
        let mut scoring = ScoringArgs {
            score_key: Some("my_score".to_string()),
            ..ScoringArgs::default()
        };
        let result = resolve_scoring(&scoring, &FileScoringConfig::default(), &defaults);
        assert!(matches!(result, Err(CliError::Config(_))));

        scoring.direction = DirectionFlags {
            lower_is_better: true,
            higher_is_better: false,
        };
        let resolved =
            resolve_scoring(&scoring, &FileScoringConfig::default(), &defaults).unwrap();
        assert_eq!(resolved.scheme.score_key, "my_score");
        assert_eq!(resolved.scheme.direction, ScoreDirection::LowerIsBetter);
        assert!(resolved.profile.is_none());
        assert_eq!(resolved.label, "my_score");
    }

    #[test]
    fn custom_score_key_borrows_direction_from_predictor() {
        let scoring = ScoringArgs {
            predictor: Some("iedbmhc1".to_string()),
            score_key: Some("percentile_rank".to_string()),
            ..ScoringArgs::default()
        };
        let resolved = resolve_scoring(
            &scoring,
            &FileScoringConfig::default(),
            &DefaultsConfig::default(),
        )
        .unwrap();
        assert_eq!(resolved.scheme.score_key, "percentile_rank");
        assert_eq!(resolved.scheme.direction, ScoreDirection::LowerIsBetter);
        assert_eq!(resolved.label, "iedbmhc1");
    }

    #[test]
    fn unknown_predictor_is_an_argument_error() {
        let scoring = ScoringArgs {
            predictor: Some("nosuch".to_string()),
            ..ScoringArgs::default()
        };
        let result = resolve_scoring(
            &scoring,
            &FileScoringConfig::default(),
            &DefaultsConfig::default(),
        );
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
