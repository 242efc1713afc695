use std::{sync::Arc, time::Duration};

use alloy_primitives::Address;
use anyhow::Result;
use chain::{JsonRpcClient, RpcSaleContract, RpcWallet};
use clap::Parser;
use client_core::{ControllerConfig, SaleController, WalletSession};
use shared::{
    clock::SystemClock,
    domain::{ChainId, SaleOperation},
};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod view;

use commands::{mint_operation, UserCommand, HELP};

#[derive(Parser, Debug)]
#[command(about = "Terminal front end for the Crypto Devs whitelist sale")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8545")]
    rpc_url: String,
    #[arg(long)]
    contract_address: Address,
    #[arg(long, default_value_t = 4)]
    chain_id: u64,
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let rpc = Arc::new(JsonRpcClient::new(&args.rpc_url)?);
    let session = WalletSession::new(Arc::new(RpcWallet::new(Arc::clone(&rpc))));
    let contract = Arc::new(RpcSaleContract::new(rpc, args.contract_address));
    let interval = Duration::from_secs(args.poll_interval_secs);
    let config = ControllerConfig {
        required_chain_id: ChainId(args.chain_id),
        sale_status_interval: interval,
        mint_count_interval: interval,
        ..ControllerConfig::default()
    };

    let controller = SaleController::new(session, contract, Arc::new(SystemClock), config);
    let mut events = BroadcastStream::new(controller.subscribe());
    controller.mount().await;
    info!(contract = %args.contract_address, chain = %ChainId(args.chain_id), "minter mounted");

    println!("{HELP}");
    print_status(&controller).await;

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = UserCommand::parse(&line) else {
                    if !line.trim().is_empty() {
                        println!("unknown command '{}'; {HELP}", line.trim());
                    }
                    continue;
                };
                if command == UserCommand::Quit {
                    break;
                }
                dispatch(&controller, command).await;
            }
            Some(event) = events.next() => match event {
                Ok(event) => {
                    if let Some(text) = view::alert_text(&event) {
                        println!("! {text}");
                    }
                    print_status(&controller).await;
                }
                Err(err) => warn!(error = %err, "event stream lagged"),
            },
        }
    }

    controller.dispose().await;
    Ok(())
}

/// Writes are spawned so the render loop keeps running while a transaction
/// waits for confirmation.
async fn dispatch(controller: &Arc<SaleController>, command: UserCommand) {
    let operation = match command {
        UserCommand::Connect => SaleOperation::ConnectWallet,
        UserCommand::StartPresale => SaleOperation::StartPresale,
        UserCommand::Mint => {
            let shown = controller.affordance().await;
            match mint_operation(shown) {
                Some(operation) => operation,
                None => {
                    println!("nothing to mint right now: {}", shown.label());
                    return;
                }
            }
        }
        UserCommand::Status => {
            print_status(controller).await;
            return;
        }
        UserCommand::Quit => return,
    };

    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        // Outcomes arrive on the event stream.
        let _ = match operation {
            SaleOperation::ConnectWallet => controller.connect_wallet().await.map(|_| ()),
            SaleOperation::StartPresale => controller.start_presale().await.map(|_| ()),
            SaleOperation::PresaleMint => controller.presale_mint().await.map(|_| ()),
            SaleOperation::PublicMint => controller.public_mint().await.map(|_| ()),
            SaleOperation::PollSaleStatus | SaleOperation::PollMintCount => Ok(()),
        };
    });
}

async fn print_status(controller: &SaleController) {
    for line in view::status_lines(&controller.snapshot().await) {
        println!("{line}");
    }
}
