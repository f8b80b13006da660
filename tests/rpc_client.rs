use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use alloy_sol_types::SolCall;
use anyhow::Result;
use axum::{Json, Router, extract::State, routing::post};
use parsec_deploy::{
    chain::Chain,
    contracts::{Controller, IController},
    deployer::Deployer,
    migrations::deploy_and_initialize,
    rpc::{Client, Error, Receipt, TransactionRequest},
    supply,
    test_utils::test_registry,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

const CHAIN_ID: u64 = 1337;

#[derive(Default)]
struct FakeNode {
    nonce: u8,
    never_mine: bool,
    reject_transactions: bool,
    omit_contract_address: bool,
    code: HashMap<Address, Bytes>,
    caps: HashMap<Address, U256>,
    initialized: HashSet<Address>,
    initialize_targets: Vec<Address>,
    receipts: HashMap<B256, Receipt>,
    polls: HashMap<B256, u32>,
}

impl FakeNode {
    fn send_transaction(&mut self, tx: TransactionRequest) -> Result<Value, (i64, String)> {
        if self.reject_transactions {
            return Err((-32000, "insufficient funds for gas".to_string()));
        }
        self.nonce += 1;
        let hash = B256::with_last_byte(self.nonce);
        let mut receipt = Receipt {
            transaction_hash: hash,
            contract_address: None,
            block_number: Some(U64::from(self.nonce)),
            status: Some(U64::from(1)),
            gas_used: Some(U256::from(50_000)),
        };
        match tx.to {
            None => {
                let address = Address::with_last_byte(0xa0 + self.nonce);
                self.code.insert(address, tx.data);
                if !self.omit_contract_address {
                    receipt.contract_address = Some(address);
                }
            }
            Some(to) => {
                let call = IController::initializeCall::abi_decode(&tx.data, true)
                    .map_err(|e| (-32602, e.to_string()))?;
                self.initialize_targets.push(to);
                if !self.initialized.insert(to) {
                    receipt.status = Some(U64::ZERO);
                } else {
                    self.caps.insert(to, call.cap);
                }
            }
        }
        self.receipts.insert(hash, receipt);
        Ok(json!(hash))
    }

    fn get_receipt(&mut self, hash: B256) -> Value {
        let polls = self.polls.entry(hash).or_default();
        *polls += 1;
        // Every receipt is pending on its first poll.
        if self.never_mine || *polls < 2 {
            return Value::Null;
        }
        json!(self.receipts.get(&hash))
    }

    fn dispatch(&mut self, method: &str, params: &[Value]) -> Result<Value, (i64, String)> {
        let param = |i: usize| params.get(i).cloned().unwrap_or(Value::Null);
        let parse_error = |e: serde_json::Error| (-32602, e.to_string());
        match method {
            "eth_chainId" => Ok(json!(U64::from(CHAIN_ID))),
            "eth_sendTransaction" => {
                let tx = serde_json::from_value(param(0)).map_err(parse_error)?;
                self.send_transaction(tx)
            }
            "eth_getTransactionReceipt" => {
                let hash = serde_json::from_value(param(0)).map_err(parse_error)?;
                Ok(self.get_receipt(hash))
            }
            "eth_call" => {
                let tx: TransactionRequest =
                    serde_json::from_value(param(0)).map_err(parse_error)?;
                let to = tx.to.unwrap_or_default();
                let cap = self.caps.get(&to).copied().unwrap_or_default();
                Ok(json!(Bytes::from(IController::capCall::abi_encode_returns(
                    &(cap,)
                ))))
            }
            "eth_getCode" => {
                let address: Address = serde_json::from_value(param(0)).map_err(parse_error)?;
                Ok(json!(self.code.get(&address).cloned().unwrap_or_default()))
            }
            _ => Err((-32601, format!("the method {} does not exist", method))),
        }
    }
}

async fn handle(State(node): State<Arc<Mutex<FakeNode>>>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].as_array().cloned().unwrap_or_default();
    let outcome = node.lock().unwrap().dispatch(&method, &params);
    Json(match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message }
        }),
    })
}

async fn spawn_node(node: FakeNode) -> Result<(String, Arc<Mutex<FakeNode>>)> {
    let state = Arc::new(Mutex::new(node));
    let app = Router::new()
        .route("/", post(handle))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await });
    Ok((format!("http://{}", addr), state))
}

fn new_client(url: String, cancel_token: CancellationToken) -> Result<Client> {
    Ok(
        Client::new(url, None, Address::with_last_byte(1), cancel_token)?
            .with_polling(Duration::from_millis(5), 5),
    )
}

#[tokio::test]
async fn test_deploy_and_initialize_over_rpc() -> Result<()> {
    let (url, node) = spawn_node(FakeNode::default()).await?;
    let client = new_client(url, CancellationToken::new())?;
    client.ensure_chain_id(CHAIN_ID).await?;

    let mut deployer = Deployer::new(client, test_registry());
    let report = deploy_and_initialize(&mut deployer, true).await?;

    assert_eq!(report.cap, supply::initial_cap()?);
    assert_ne!(report.proxy, report.controller);
    let node = node.lock().unwrap();
    assert_eq!(node.initialize_targets, vec![report.proxy]);
    assert!(node.polls.values().all(|polls| *polls == 2));
    Ok(())
}

#[tokio::test]
async fn test_chain_id_mismatch() -> Result<()> {
    let (url, _node) = spawn_node(FakeNode::default()).await?;
    let client = new_client(url, CancellationToken::new())?;

    assert_eq!(client.chain_id().await?, CHAIN_ID);
    let result = client.ensure_chain_id(1).await;

    assert!(matches!(
        result,
        Err(Error::ChainIdMismatch {
            expected: 1,
            actual: CHAIN_ID
        })
    ));
    Ok(())
}

#[tokio::test]
async fn test_second_initialize_reverts() -> Result<()> {
    let (url, _node) = spawn_node(FakeNode::default()).await?;
    let client = new_client(url, CancellationToken::new())?;
    let proxy = client.deploy(&Bytes::from_static(&[0x60, 0x80])).await?;
    let binding = Controller::at(proxy.contract_address.unwrap(), client.clone());

    binding.initialize(Address::with_last_byte(2), U256::from(7)).await?;
    let result = binding.initialize(Address::with_last_byte(2), U256::from(8)).await;

    assert!(matches!(result, Err(Error::Reverted(_))));
    assert_eq!(binding.cap().await?, U256::from(7));
    Ok(())
}

#[tokio::test]
async fn test_rpc_error_is_surfaced() -> Result<()> {
    let (url, _node) = spawn_node(FakeNode {
        reject_transactions: true,
        ..Default::default()
    })
    .await?;
    let client = new_client(url, CancellationToken::new())?;

    let result = client.deploy(&Bytes::from_static(&[0x60, 0x80])).await;

    match result {
        Err(Error::Rpc { code, message }) => {
            assert_eq!(code, -32000);
            assert_eq!(message, "insufficient funds for gas");
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_contract_address() -> Result<()> {
    let (url, _node) = spawn_node(FakeNode {
        omit_contract_address: true,
        ..Default::default()
    })
    .await?;
    let client = new_client(url, CancellationToken::new())?;

    let result = client.deploy(&Bytes::from_static(&[0x60, 0x80])).await;

    assert!(matches!(result, Err(Error::MissingContractAddress(_))));
    Ok(())
}

#[tokio::test]
async fn test_unmined_transaction_times_out() -> Result<()> {
    let (url, node) = spawn_node(FakeNode {
        never_mine: true,
        ..Default::default()
    })
    .await?;
    let client = new_client(url, CancellationToken::new())?;

    let result = client.deploy(&Bytes::from_static(&[0x60, 0x80])).await;

    assert!(matches!(result, Err(Error::Timeout(_))));
    // one initial poll plus five retries
    assert!(node.lock().unwrap().polls.values().all(|polls| *polls == 6));
    Ok(())
}

#[tokio::test]
async fn test_cancelled_polling() -> Result<()> {
    let (url, _node) = spawn_node(FakeNode {
        never_mine: true,
        ..Default::default()
    })
    .await?;
    let cancel_token = CancellationToken::new();
    let client = new_client(url, cancel_token.clone())?;
    cancel_token.cancel();

    let result = client.deploy(&Bytes::from_static(&[0x60, 0x80])).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    Ok(())
}

#[tokio::test]
async fn test_cancel_interrupts_backoff_sleep() -> Result<()> {
    let (url, node) = spawn_node(FakeNode {
        never_mine: true,
        ..Default::default()
    })
    .await?;
    let cancel_token = CancellationToken::new();
    let client = Client::new(url, None, Address::with_last_byte(1), cancel_token.clone())?
        .with_polling(Duration::from_secs(30), 5);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_token.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.deploy(&Bytes::from_static(&[0x60, 0x80])),
    )
    .await?;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(node.lock().unwrap().polls.values().all(|polls| *polls == 1));
    Ok(())
}
