//! calabi is a CLI for deploying the Calabi swap stack and inspecting the
//! recorded deployments.

mod cli;

use std::{path::Path, process::ExitCode, time::Duration};

use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use calabi_deploy::{
    DeployConfig, EthRpc, Pacer, PlanOptions, RegistryFile, RpcDeployer, run_plan, swap_plan,
};
use cli::{Cli, Command, DeployArgs, StatusArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    if let Err(err) = run(cli.command).await {
        tracing::error!(err = ?err, "Run failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Deploy(args) => deploy(args).await,
        Command::Status(args) => status(args),
    }
}

/// Layer built-in defaults, the config file, and `CALABI_*` environment
/// variables into a [`DeployConfig`].
fn load_config(path: &Path) -> Result<DeployConfig> {
    Figment::from(Serialized::defaults(DeployConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CALABI_"))
        .extract()
        .context("Failed to load configuration")
}

async fn deploy(args: DeployArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(deployments) = args.deployments {
        config.deployments = deployments;
    }
    if let Some(rpc_url) = args.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(pace_ms) = args.pace_ms {
        config.step_delay_ms = Some(pace_ms);
    }

    let signer: PrivateKeySigner = config
        .private_key
        .parse()
        .context("Failed to parse deployer private key")?;
    let deployer_address = signer.address();

    tracing::info!(
        rpc_url = %config.rpc_url,
        deployments = %config.deployments.display(),
        deployer = %deployer_address.to_checksum(None),
        "Starting deployment run..."
    );

    let store = RegistryFile::new(&config.deployments);
    let _lock = store.lock()?;
    let mut registry = store.load()?;

    let rpc = EthRpc::new(&config.rpc_url)?;
    let mut backend = RpcDeployer::new(
        rpc,
        deployer_address,
        &config.artifacts,
        config.gas_limit,
        Duration::from_secs(config.confirm_timeout_secs),
    );

    let options = PlanOptions {
        redeploy: args.redeploy,
        pacer: config
            .step_delay_ms
            .map(|ms| Pacer::new(Duration::from_millis(ms))),
    };

    run_plan(
        &swap_plan(deployer_address),
        &mut registry,
        &store,
        &mut backend,
        options,
    )
    .await?;

    tracing::info!("Deployment complete");
    for (category, name, address) in registry.iter() {
        tracing::info!(
            category = category,
            contract = name,
            address = %address.to_checksum(None),
            "Recorded deployment"
        );
    }

    Ok(())
}

fn status(args: StatusArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(deployments) = args.deployments {
        config.deployments = deployments;
    }

    let store = RegistryFile::new(&config.deployments);
    let registry = store.load()?;

    let mut table = comfy_table::Table::new();
    table.set_header(vec!["Category", "Contract", "Address"]);
    for (category, name, address) in registry.iter() {
        table.add_row(vec![
            category.to_string(),
            name.to_string(),
            address.to_checksum(None),
        ]);
    }
    println!("{table}");

    Ok(())
}
