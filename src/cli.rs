use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "regcover",
    version,
    about = "Multi-provider compliance coverage reconciliation tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Taxonomy(TaxonomyArgs),
    Plan(PlanArgs),
    Review(ReviewArgs),
    Aggregate(AggregateArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReviewMode {
    Regulation,
    Documentation,
}

impl ReviewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regulation => "regulation",
            Self::Documentation => "documentation",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TaxonomyArgs {
    #[arg(long, default_value = ".cache/compliance")]
    pub output_root: PathBuf,

    #[arg(long)]
    pub taxonomy_path: Option<PathBuf>,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long, default_value = ".cache/compliance")]
    pub output_root: PathBuf,

    #[arg(long)]
    pub taxonomy_path: Option<PathBuf>,

    #[arg(long)]
    pub document: PathBuf,

    #[arg(long, value_enum, default_value_t = ReviewMode::Regulation)]
    pub mode: ReviewMode,

    #[arg(long, default_value_t = 2)]
    pub categories_per_call: usize,

    #[arg(long, default_value_t = 15000)]
    pub max_content_chars: usize,

    #[arg(long)]
    pub plan_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    #[arg(long, default_value = ".cache/compliance")]
    pub output_root: PathBuf,

    #[arg(long)]
    pub taxonomy_path: Option<PathBuf>,

    /// Document the replies were produced for; only its file name is recorded.
    #[arg(long)]
    pub document: PathBuf,

    /// Directory holding one subdirectory of chunk replies per provider.
    #[arg(long)]
    pub replies_root: PathBuf,

    #[arg(long, value_enum, default_value_t = ReviewMode::Regulation)]
    pub mode: ReviewMode,

    #[arg(long, default_value_t = 2)]
    pub categories_per_call: usize,

    /// `provider=model` pairs recorded alongside each provider's result.
    #[arg(long = "model")]
    pub models: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub no_individual_results: bool,

    #[arg(long, default_value_t = false)]
    pub no_consolidated_results: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AggregateArgs {
    #[arg(long, default_value = ".cache/compliance")]
    pub output_root: PathBuf,

    #[arg(long)]
    pub taxonomy_path: Option<PathBuf>,

    /// Combined analysis JSON written by `review`.
    #[arg(long)]
    pub consolidated_path: PathBuf,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/compliance")]
    pub output_root: PathBuf,
}
