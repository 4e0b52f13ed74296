use clap::{Args, Parser, Subcommand};
use randomly_core::{RequestedSeed, SeedError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "randomly",
    version,
    about = "Deterministic random seeding and test-order shuffling for test runs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve and print the run seed
    Seed(SeedArgs),
    /// Deterministically shuffle a collected-test manifest
    Shuffle(ShuffleArgs),
    /// Print per-phase effective seeds for test identifiers
    Phases(PhasesArgs),
}

/// Seed resolution options, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct SeedOpts {
    /// Run seed: an integer, 'last' to reuse the previous run's seed, or
    /// 'auto' for a fresh one
    #[arg(long, default_value = "auto", value_parser = parse_seed, allow_negative_numbers = true)]
    pub seed: RequestedSeed,

    /// Adopt a coordinator-resolved seed (distributed workers must not
    /// resolve independently)
    #[arg(long, env = "RANDOMLY_WORKER_SEED", allow_negative_numbers = true)]
    pub worker_seed: Option<i64>,

    /// Directory for the 'last seed' cache; omit to disable persistence
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    #[command(flatten)]
    pub seed: SeedOpts,
}

#[derive(Args, Debug, Clone)]
pub struct ShuffleArgs {
    #[command(flatten)]
    pub seed: SeedOpts,

    /// JSON manifest of collected tests: [{"id", "module"?, "class"?}, ...]
    #[arg(long)]
    pub manifest: PathBuf,

    /// Do not reset generator state around test phases
    #[arg(long)]
    pub dont_reset_seed: bool,

    /// Do not reorganize the collection order
    #[arg(long)]
    pub dont_reorganize: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PhasesArgs {
    #[command(flatten)]
    pub seed: SeedOpts,

    /// Test identifiers to report on
    #[arg(required = true)]
    pub node_ids: Vec<String>,
}

fn parse_seed(s: &str) -> Result<RequestedSeed, String> {
    s.parse().map_err(|e: SeedError| e.to_string())
}
