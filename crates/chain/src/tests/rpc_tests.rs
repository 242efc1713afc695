use super::*;
use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{address, B256};
use alloy_sol_types::SolCall;
use axum::{extract::State, routing::post, Json, Router};
use shared::constants::MINT_PRICE_WEI;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    bindings::ICryptoDevs, ContractArtifact, ContractDeployer, DeployArgs, RpcDeployer,
    RpcSaleContract, SaleContract,
};

const CONTRACT: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");
const ALICE: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

#[derive(Clone, Default)]
struct MockNode {
    replies: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockNode {
    /// Queues a reply body (`{"result": ..}` or `{"error": ..}`); the last
    /// queued reply for a method repeats.
    async fn reply(&self, method: &str, body: Value) {
        self.replies
            .lock()
            .await
            .entry(method.to_string())
            .or_default()
            .push(body);
    }

    async fn params_of(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(name, _)| name == method)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

async fn handle(State(node): State<MockNode>, Json(request): Json<Value>) -> Json<Value> {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    node.calls
        .lock()
        .await
        .push((method.clone(), request["params"].clone()));

    let reply = {
        let mut replies = node.replies.lock().await;
        match replies.get_mut(&method) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) => queue.first().cloned().unwrap_or(json!({ "result": null })),
            None => json!({
                "error": { "code": -32601, "message": format!("method {method} not found") }
            }),
        }
    };

    let mut body = json!({ "jsonrpc": "2.0", "id": request["id"].clone() });
    if let (Some(target), Some(extra)) = (body.as_object_mut(), reply.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(body)
}

async fn spawn_node(node: MockNode) -> Arc<JsonRpcClient> {
    let app = Router::new().route("/", post(handle)).with_state(node);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    Arc::new(JsonRpcClient::new(&format!("http://{addr}/")).expect("client"))
}

fn fast_policy() -> ConfirmationPolicy {
    ConfirmationPolicy {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_millis(200),
    }
}

fn abi_word(last_byte: u8) -> String {
    format!("0x{}{:02x}", "0".repeat(62), last_byte)
}

#[test]
fn parses_hex_quantities() {
    assert_eq!(parse_quantity("m", "0x1b").expect("quantity"), 27);
    assert_eq!(parse_quantity("m", "0x").expect("quantity"), 0);
    assert!(matches!(
        parse_quantity("m", "27"),
        Err(ChainError::Decode { .. })
    ));
    assert!(parse_quantity("m", "0xzz").is_err());
}

#[test]
fn rejects_invalid_url() {
    assert!(matches!(
        JsonRpcClient::new("not a url"),
        Err(ChainError::InvalidUrl { .. })
    ));
}

#[tokio::test]
async fn chain_id_is_parsed_from_hex() {
    let node = MockNode::default();
    node.reply("eth_chainId", json!({ "result": "0x4" })).await;
    let rpc = spawn_node(node).await;

    assert_eq!(rpc.chain_id().await.expect("chain id"), 4);
}

#[tokio::test]
async fn rpc_error_object_is_surfaced() {
    let node = MockNode::default();
    let rpc = spawn_node(node).await;

    let err = rpc.accounts().await.expect_err("unknown method");
    assert!(matches!(err, ChainError::Rpc { code: -32601, .. }));
}

#[tokio::test]
async fn view_call_encodes_selector_and_decodes_result() {
    let node = MockNode::default();
    node.reply("eth_call", json!({ "result": abi_word(1) })).await;
    let rpc = spawn_node(node.clone()).await;
    let contract = RpcSaleContract::new(rpc, CONTRACT);

    assert!(contract.presale_started().await.expect("presale started"));

    let params = node.params_of("eth_call").await;
    assert_eq!(params.len(), 1);
    assert_eq!(params[0][0]["to"], json!(CONTRACT));
    assert_eq!(
        params[0][0]["data"],
        json!(Bytes::from(ICryptoDevs::presaleStartedCall::SELECTOR.to_vec()))
    );
    assert_eq!(params[0][1], json!("latest"));
}

#[tokio::test]
async fn token_ids_are_decoded_as_integers() {
    let node = MockNode::default();
    node.reply("eth_call", json!({ "result": abi_word(7) })).await;
    let rpc = spawn_node(node).await;
    let contract = RpcSaleContract::new(rpc, CONTRACT);

    assert_eq!(contract.token_ids().await.expect("token ids"), 7);
}

#[tokio::test]
async fn mint_sends_price_as_value() {
    let tx_hash = B256::repeat_byte(0xab);
    let node = MockNode::default();
    node.reply("eth_sendTransaction", json!({ "result": tx_hash }))
        .await;
    let rpc = spawn_node(node.clone()).await;
    let contract = RpcSaleContract::new(rpc, CONTRACT);

    let sent = contract
        .presale_mint(ALICE, MINT_PRICE_WEI)
        .await
        .expect("presale mint");
    assert_eq!(sent, tx_hash);

    let params = node.params_of("eth_sendTransaction").await;
    let tx = &params[0][0];
    assert_eq!(tx["from"], json!(ALICE));
    assert_eq!(tx["to"], json!(CONTRACT));
    assert_eq!(tx["value"], json!(MINT_PRICE_WEI));
    assert_eq!(
        tx["data"],
        json!(Bytes::from(ICryptoDevs::presaleMintCall::SELECTOR.to_vec()))
    );
}

#[tokio::test]
async fn start_presale_carries_no_value() {
    let node = MockNode::default();
    node.reply(
        "eth_sendTransaction",
        json!({ "result": B256::repeat_byte(0x01) }),
    )
    .await;
    let rpc = spawn_node(node.clone()).await;
    let contract = RpcSaleContract::new(rpc, CONTRACT);

    contract.start_presale(ALICE).await.expect("start presale");

    let params = node.params_of("eth_sendTransaction").await;
    assert!(params[0][0].get("value").is_none());
}

#[tokio::test]
async fn confirmation_waits_for_pending_receipt() {
    let tx_hash = B256::repeat_byte(0x11);
    let node = MockNode::default();
    node.reply("eth_getTransactionReceipt", json!({ "result": null }))
        .await;
    node.reply(
        "eth_getTransactionReceipt",
        json!({ "result": {
            "transactionHash": tx_hash,
            "status": "0x1",
            "blockNumber": "0x10",
            "contractAddress": null
        }}),
    )
    .await;
    let rpc = spawn_node(node.clone()).await;

    let receipt = rpc
        .wait_for_receipt(tx_hash, &fast_policy())
        .await
        .expect("receipt");
    assert_eq!(receipt.tx_hash, tx_hash);
    assert_eq!(receipt.block_number, Some(16));
    assert_eq!(node.params_of("eth_getTransactionReceipt").await.len(), 2);
}

#[tokio::test]
async fn reverted_receipt_is_a_failure() {
    let tx_hash = B256::repeat_byte(0x22);
    let node = MockNode::default();
    node.reply(
        "eth_getTransactionReceipt",
        json!({ "result": {
            "transactionHash": tx_hash,
            "status": "0x0",
            "blockNumber": "0x3"
        }}),
    )
    .await;
    let rpc = spawn_node(node).await;
    let contract = RpcSaleContract::with_confirmation(rpc, CONTRACT, fast_policy());

    let err = contract
        .wait_for_confirmation(tx_hash)
        .await
        .expect_err("reverted");
    assert!(matches!(
        err.downcast::<ChainError>(),
        Ok(ChainError::Reverted { tx_hash: hash }) if hash == tx_hash
    ));
}

#[tokio::test]
async fn confirmation_times_out() {
    let tx_hash = B256::repeat_byte(0x33);
    let node = MockNode::default();
    node.reply("eth_getTransactionReceipt", json!({ "result": null }))
        .await;
    let rpc = spawn_node(node).await;

    let policy = ConfirmationPolicy {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_millis(50),
    };
    let err = rpc
        .wait_for_receipt(tx_hash, &policy)
        .await
        .expect_err("never mined");
    assert!(matches!(err, ChainError::ConfirmationTimeout { .. }));
}

#[tokio::test]
async fn deployer_creates_contract_from_first_account() {
    let tx_hash = B256::repeat_byte(0x44);
    let node = MockNode::default();
    node.reply("eth_accounts", json!({ "result": [ALICE] })).await;
    node.reply("eth_sendTransaction", json!({ "result": tx_hash }))
        .await;
    node.reply(
        "eth_getTransactionReceipt",
        json!({ "result": {
            "transactionHash": tx_hash,
            "status": "0x1",
            "blockNumber": "0x1",
            "contractAddress": CONTRACT
        }}),
    )
    .await;
    let rpc = spawn_node(node.clone()).await;
    let artifact = ContractArtifact {
        contract_name: "CryptoDevs".into(),
        bytecode: Bytes::from(vec![0x60, 0x80]),
    };
    let deployer = RpcDeployer::new(rpc, artifact, None, fast_policy());

    let from = deployer.deployer_account().await.expect("account");
    assert_eq!(from, ALICE);

    let contract = deployer
        .deploy(
            from,
            &DeployArgs {
                metadata_url: "https://example.com/api/".into(),
                whitelist_contract: CONTRACT,
            },
        )
        .await
        .expect("deploy");
    assert_eq!(contract.address(), CONTRACT);

    let params = node.params_of("eth_sendTransaction").await;
    let tx = &params[0][0];
    assert!(tx.get("to").is_none());
    let data = tx["data"].as_str().expect("data");
    assert!(data.starts_with("0x6080"));
}
