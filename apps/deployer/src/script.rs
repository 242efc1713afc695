use std::sync::Arc;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use chain::{ContractDeployer, DeployArgs, SaleContract};
use tracing::{info, warn};

/// Deploys the sale contract and prints its address.
pub async fn deploy(
    deployer: &dyn ContractDeployer,
    args: &DeployArgs,
) -> Result<Arc<dyn SaleContract>> {
    let from = deployer
        .deployer_account()
        .await
        .context("failed to resolve deployer account")?;
    publish(deployer, from, args).await
}

/// Deploys, starts the presale and mints one token from the deployer account.
pub async fn run(
    deployer: &dyn ContractDeployer,
    args: &DeployArgs,
    price: U256,
) -> Result<Arc<dyn SaleContract>> {
    let from = deployer
        .deployer_account()
        .await
        .context("failed to resolve deployer account")?;
    let contract = publish(deployer, from, args).await?;

    let tx = contract
        .start_presale(from)
        .await
        .context("startPresale failed")?;
    contract.wait_for_confirmation(tx).await?;
    info!(contract = %contract.address(), "presale started");

    let tx = contract
        .presale_mint(from, price)
        .await
        .context("presaleMint failed")?;
    println!("Minting...");
    contract.wait_for_confirmation(tx).await?;
    println!("Minted");

    Ok(contract)
}

async fn publish(
    deployer: &dyn ContractDeployer,
    from: Address,
    args: &DeployArgs,
) -> Result<Arc<dyn SaleContract>> {
    info!(
        %from,
        metadata_url = %args.metadata_url,
        whitelist = %args.whitelist_contract,
        "deploying sale contract"
    );
    let contract = deployer
        .deploy(from, args)
        .await
        .context("contract deployment failed")?;
    println!("Contract deployed at: {}", contract.address());
    match contract.max_token_ids().await {
        Ok(max_supply) => info!(contract = %contract.address(), max_supply, "sale contract ready"),
        Err(err) => warn!(contract = %contract.address(), error = %err, "could not read max supply"),
    }
    Ok(contract)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use chain::memory::InMemoryDeployer;
    use shared::{clock::ManualClock, constants::MINT_PRICE_WEI};

    use super::*;

    const OPERATOR: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const WHITELIST: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    fn args() -> DeployArgs {
        DeployArgs {
            metadata_url: "https://example.com/api/".into(),
            whitelist_contract: WHITELIST,
        }
    }

    #[tokio::test]
    async fn deploy_makes_operator_the_owner() {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let deployer = InMemoryDeployer::new(OPERATOR, vec![OPERATOR], clock);

        let contract = deploy(&deployer, &args()).await.expect("deploy");

        assert_eq!(contract.get_owner().await.expect("owner"), OPERATOR);
        assert!(!contract.presale_started().await.expect("started"));
        assert_eq!(deployer.deployments(), 1);

        let deployed = deployer.last_deployment().expect("recorded deployment");
        assert_eq!(deployed.address(), contract.address());
        assert_eq!(deployed.metadata_url(), "https://example.com/api/");
    }

    #[tokio::test]
    async fn run_starts_presale_and_mints_once() {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let deployer = InMemoryDeployer::new(OPERATOR, vec![OPERATOR], clock);

        let contract = run(&deployer, &args(), MINT_PRICE_WEI).await.expect("run");

        assert_eq!(deployer.deployments(), 1);
        assert!(contract.presale_started().await.expect("started"));
        assert_eq!(contract.token_ids().await.expect("token ids"), 1);
    }

    #[tokio::test]
    async fn run_fails_when_operator_is_not_whitelisted() {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let deployer = InMemoryDeployer::new(OPERATOR, Vec::new(), clock);

        let err = run(&deployer, &args(), MINT_PRICE_WEI)
            .await
            .err().expect("not whitelisted");

        let rendered = format!("{err:#}");
        assert!(rendered.contains("presaleMint failed"), "{rendered}");
        assert!(rendered.contains("You are not whitelisted"), "{rendered}");
    }

    #[tokio::test]
    async fn unreachable_node_is_a_deployment_error() {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let deployer = InMemoryDeployer::new(OPERATOR, Vec::new(), clock);
        deployer.set_reachable(false);

        let err = deploy(&deployer, &args()).await.err().expect("unreachable");
        assert!(format!("{err:#}").contains("contract deployment failed"));
    }
}
