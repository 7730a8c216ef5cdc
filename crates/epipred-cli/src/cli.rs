use clap::{Args, Parser, Subcommand};
use epipred::engine::config::{ClusterMethod, CutoffMethod};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "epipred CLI - Binder selection, promiscuous binder aggregation and epitope clustering over MHC binding predictions.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select binders, aggregate promiscuous binders and cluster them along each protein.
    Analyze(AnalyzeArgs),
    /// Estimate per-allele score quantiles for a directory of predictions and store them.
    Cutoffs(CutoffsArgs),
    /// List the known predictor profiles.
    Presets,
}

/// Options selecting the score column of the prediction tables.
#[derive(Args, Debug, Clone, Default)]
pub struct ScoringArgs {
    /// Known predictor whose score column and direction to use (see `epipred presets`).
    #[arg(short, long, value_name = "NAME")]
    pub predictor: Option<String>,

    /// Score column to read, overriding the predictor's.
    #[arg(long, value_name = "COLUMN")]
    pub score_key: Option<String>,

    #[command(flatten)]
    pub direction: DirectionFlags,
}

/// A group to handle mutually exclusive score direction flags.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct DirectionFlags {
    /// Lower scores mark stronger binders (IC50-like).
    #[arg(long)]
    pub lower_is_better: bool,
    /// Higher scores mark stronger binders.
    #[arg(long)]
    pub higher_is_better: bool,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    // --- Core Arguments ---
    /// Directory of prediction tables, or a single table.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory the result tables are written to.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to an analysis configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Label used in output file names. Defaults to the predictor name or score column.
    #[arg(long, value_name = "LABEL")]
    pub label: Option<String>,

    /// Read at most this many tables from the input directory.
    #[arg(long, value_name = "INT")]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    // --- Cutoff Overrides ---
    /// How per-allele thresholds are obtained.
    #[arg(long, value_name = "METHOD")]
    pub cutoff_method: Option<CutoffMethod>,

    /// Stringency of percentile-based cutoffs, in (0, 1).
    #[arg(long, value_name = "FLOAT")]
    pub percentile: Option<f64>,

    /// Scalar threshold for the `simple` cutoff method.
    #[arg(long = "cutoff", value_name = "FLOAT")]
    pub simple_cutoff: Option<f64>,

    /// Re-estimate stored quantiles even if the input directory already has them.
    #[arg(long)]
    pub overwrite_cutoffs: bool,

    /// Restrict binder selection to one protein.
    #[arg(long, value_name = "NAME")]
    pub protein: Option<String>,

    // --- Aggregation & Clustering Overrides ---
    /// Minimum number of alleles a promiscuous binder must bind.
    #[arg(short = 'n', long, value_name = "INT")]
    pub min_alleles: Option<usize>,

    /// Clustering method for promiscuous binder positions.
    #[arg(long, value_name = "METHOD")]
    pub cluster_method: Option<ClusterMethod>,

    /// Target cluster length; sets the overlap window and gap.
    #[arg(long, value_name = "INT")]
    pub cluster_length: Option<usize>,

    /// Also search for epitope-dense regions and write them.
    #[arg(long)]
    pub regions: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S cutoff.percentile=0.95
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `cutoffs` subcommand.
#[derive(Args, Debug)]
pub struct CutoffsArgs {
    /// Directory of prediction tables.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub input: PathBuf,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Replace an existing quantile table.
    #[arg(long)]
    pub overwrite: bool,

    /// Read at most this many tables from the input directory.
    #[arg(long, value_name = "INT")]
    pub limit: Option<usize>,
}
