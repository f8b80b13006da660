use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use base64::prelude::*;
use reqwest::{Client as HttpClient, ClientBuilder, header::HeaderMap};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chain::Chain;
use crate::config::Config;
use crate::retry;

use super::{
    error::{Error, RpcErrorResponse},
    types::{Receipt, Request, Response, TransactionRequest},
};

#[derive(Clone, Debug)]
pub struct Client {
    client: HttpClient,
    url: String,
    from: Address,
    gas: Option<u64>,
    gas_price: Option<u128>,
    poll_interval: Duration,
    poll_attempts: usize,
    cancel_token: CancellationToken,
}

const JSONRPC: &str = "2.0";

impl Client {
    pub fn new(
        url: String,
        credentials: Option<(String, String)>,
        from: Address,
        cancel_token: CancellationToken,
    ) -> Result<Self, Error> {
        let client = ClientBuilder::new()
            .default_headers({
                let mut headers = HeaderMap::new();
                if let Some((user, password)) = credentials {
                    let auth_str = BASE64_STANDARD.encode(format!("{}:{}", user, password));
                    headers.insert("Authorization", format!("Basic {}", auth_str).parse()?);
                }
                headers.insert("Content-Type", "application/json".parse()?);
                headers.insert("Accept", "application/json".parse()?);
                headers
            })
            .build()?;

        Ok(Client {
            client,
            url,
            from,
            gas: None,
            gas_price: None,
            poll_interval: Duration::from_millis(500),
            poll_attempts: 120,
            cancel_token,
        })
    }

    pub fn new_from_config(config: &Config, cancel_token: CancellationToken) -> Result<Self, Error> {
        let credentials = config
            .rpc_user
            .clone()
            .map(|user| (user, config.rpc_password.clone().unwrap_or_default()));
        Ok(
            Client::new(config.rpc_url.clone(), credentials, config.from, cancel_token)?
                .with_gas(config.gas, config.gas_price)
                .with_polling(
                    Duration::from_millis(config.receipt_poll_interval_ms),
                    config.receipt_poll_attempts,
                ),
        )
    }

    pub fn with_gas(mut self, gas: Option<u64>, gas_price: Option<u128>) -> Self {
        self.gas = gas;
        self.gas_price = gas_price;
        self
    }

    pub fn with_polling(mut self, interval: Duration, attempts: usize) -> Self {
        self.poll_interval = interval;
        self.poll_attempts = attempts;
        self
    }

    fn handle_response<T>(response: Response) -> Result<T, Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        match (response.result, response.error) {
            (Some(result), None) => Ok(serde_json::from_value(result)?),
            // `null` results (e.g. an unmined receipt) arrive without an error
            (None, None) => Ok(serde_json::from_value(Value::Null)?),
            (None, Some(error)) => {
                let detail: RpcErrorResponse = serde_json::from_value(error)?;
                Err(Error::Rpc {
                    code: detail.code,
                    message: detail.message,
                })
            }
            (Some(_), Some(_)) => Err(Error::Unexpected(
                "Both result and error present in RPC response".to_string(),
            )),
        }
    }

    pub async fn call_method<T>(&self, method: &str, params: Vec<Value>) -> Result<T, Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request = Request {
            jsonrpc: JSONRPC.to_owned(),
            id: "0".to_string(),
            method: method.to_string(),
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .json::<Response>()
            .await?;

        Self::handle_response(response)
    }

    pub async fn chain_id(&self) -> Result<u64, Error> {
        let id: U64 = self.call_method("eth_chainId", vec![]).await?;
        Ok(id.to::<u64>())
    }

    pub async fn ensure_chain_id(&self, expected: u64) -> Result<(), Error> {
        let actual = self.chain_id().await?;
        if actual != expected {
            return Err(Error::ChainIdMismatch { expected, actual });
        }
        Ok(())
    }

    fn transaction(&self, to: Option<Address>, data: Bytes) -> TransactionRequest {
        TransactionRequest::builder()
            .from(self.from)
            .maybe_to(to)
            .data(data)
            .maybe_gas(self.gas.map(U64::from))
            .maybe_gas_price(self.gas_price.map(U256::from))
            .build()
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, Error> {
        self.call_method("eth_sendTransaction", vec![serde_json::to_value(tx)?])
            .await
    }

    pub async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, Error> {
        self.call_method("eth_getTransactionReceipt", vec![serde_json::to_value(hash)?])
            .await
    }

    pub async fn wait_for_receipt(&self, hash: B256) -> Result<Receipt, Error> {
        let receipt = retry::poll(
            || async {
                self.get_transaction_receipt(hash)
                    .await?
                    .ok_or(Error::Pending(hash))
            },
            "transaction receipt",
            retry::new_receipt_backoff(self.poll_interval, self.poll_attempts),
            self.cancel_token.clone(),
        )
        .await?;
        if !receipt.succeeded() {
            return Err(Error::Reverted(hash));
        }
        Ok(receipt)
    }

    async fn send_and_confirm(&self, tx: TransactionRequest) -> Result<Receipt, Error> {
        let hash = self.send_transaction(&tx).await?;
        debug!("Sent transaction {}", hash);
        let receipt = self.wait_for_receipt(hash).await?;
        info!(
            "Transaction {} confirmed in block {:?}",
            hash,
            receipt.block_number.map(|n| n.to::<u64>())
        );
        Ok(receipt)
    }
}

impl Chain for Client {
    async fn deploy(&self, bytecode: &Bytes) -> Result<Receipt, Error> {
        let receipt = self
            .send_and_confirm(self.transaction(None, bytecode.clone()))
            .await?;
        if receipt.contract_address.is_none() {
            return Err(Error::MissingContractAddress(receipt.transaction_hash));
        }
        Ok(receipt)
    }

    async fn transact(&self, to: Address, data: Bytes) -> Result<Receipt, Error> {
        self.send_and_confirm(self.transaction(Some(to), data)).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, Error> {
        self.call_method(
            "eth_call",
            vec![
                serde_json::to_value(self.transaction(Some(to), data))?,
                "latest".into(),
            ],
        )
        .await
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, Error> {
        self.call_method(
            "eth_getCode",
            vec![serde_json::to_value(address)?, "latest".into()],
        )
        .await
    }
}
