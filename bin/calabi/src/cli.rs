use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "calabi")]
#[command(
    author,
    version,
    about = "Deploy the Calabi swap contracts and track their addresses"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "CALABI_VERBOSITY", default_value_t = LevelFilter::INFO, global = true)]
    pub verbosity: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the swap deployment plan against the configured node.
    Deploy(DeployArgs),
    /// Print the contents of the deployments registry.
    Status(StatusArgs),
}

#[derive(Args)]
pub struct DeployArgs {
    /// Path to a Calabi.toml configuration file.
    ///
    /// Settings merge in order: built-in defaults, the config file, then
    /// CALABI_* environment variables.
    #[arg(short, long, alias = "conf", env = "CALABI_CONFIG", default_value = "Calabi.toml")]
    pub config: PathBuf,

    /// Redeploy contracts whose registry entry already exists.
    ///
    /// Without this flag a re-run skips completed steps, so an interrupted
    /// deployment can be resumed safely.
    #[arg(long, default_value_t = false)]
    pub redeploy: bool,

    /// Delay in milliseconds between consecutive steps, to avoid
    /// overwhelming the node. Overrides the configured value.
    #[arg(long, alias = "pace")]
    pub pace_ms: Option<u64>,

    /// Override the deployments registry location.
    #[arg(long)]
    pub deployments: Option<PathBuf>,

    /// Override the JSON-RPC endpoint of the target node.
    #[arg(long, alias = "rpc")]
    pub rpc_url: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Path to a Calabi.toml configuration file.
    #[arg(short, long, alias = "conf", env = "CALABI_CONFIG", default_value = "Calabi.toml")]
    pub config: PathBuf,

    /// Override the deployments registry location.
    #[arg(long)]
    pub deployments: Option<PathBuf>,
}
