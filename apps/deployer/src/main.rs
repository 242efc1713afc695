use std::{process::ExitCode, sync::Arc};

use chain::{ContractArtifact, JsonRpcClient, RpcDeployer};
use clap::{Parser, Subcommand};
use shared::{constants::MINT_PRICE_WEI, error::DappException};
use tracing_subscriber::EnvFilter;

mod config;
mod constants;
mod script;

use config::{load_settings, SETTINGS_FILE};

#[derive(Parser, Debug)]
#[command(about = "Publishes the Crypto Devs sale contract")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Deploy the contract and print its address.
    #[default]
    Deploy,
    /// Deploy, start the presale and mint one token as a smoke test.
    Run,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match execute(cli.command.unwrap_or_default()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{}", DappException::deployment(format!("{err:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command) -> anyhow::Result<()> {
    let settings = load_settings(SETTINGS_FILE)?;
    let rpc = Arc::new(JsonRpcClient::new(&settings.rpc_url)?);
    let artifact = ContractArtifact::load(&settings.artifact_path)?;
    let deployer = RpcDeployer::new(
        rpc,
        artifact,
        settings.deployer_address,
        settings.confirmation,
    );

    match command {
        Command::Deploy => {
            script::deploy(&deployer, &settings.deploy_args).await?;
        }
        Command::Run => {
            script::run(&deployer, &settings.deploy_args, MINT_PRICE_WEI).await?;
        }
    }
    Ok(())
}
