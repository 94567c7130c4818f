// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC gateway to the TomoChain node.
//!
//! Every call returns the raw `result` payload so callers can decode the same
//! response into more than one shape (the block header and the block body are
//! read from one response). A `null` result is reported as
//! [`GatewayError::NotFound`]. Nothing is retried here.

use std::future::Future;

use alloy::rpc::client::RpcClient;
use serde::de::DeserializeOwned;
use serde_json::{value::RawValue, Value};

// =============================================================================
// Method Names
// =============================================================================

pub const CHAIN_ID: &str = "eth_chainId";
pub const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const GET_BLOCK_BY_HASH: &str = "eth_getBlockByHash";
pub const GET_UNCLE_BY_BLOCK_HASH_AND_INDEX: &str = "eth_getUncleByBlockHashAndIndex";
pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
pub const GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
pub const GAS_PRICE: &str = "eth_gasPrice";
pub const ESTIMATE_GAS: &str = "eth_estimateGas";
pub const GET_BALANCE: &str = "eth_getBalance";
pub const SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";
pub const TRACE_BLOCK_BY_HASH: &str = "debug_traceBlockByHash";
pub const TRACE_TRANSACTION: &str = "debug_traceTransaction";
pub const GET_REWARD_BY_HASH: &str = "eth_getRewardByHash";
pub const PENDING_TRANSACTIONS: &str = "eth_pendingTransactions";
pub const SYNCING: &str = "eth_syncing";
pub const PEERS: &str = "admin_peers";

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while talking to the node or reading its responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("node returned error {code}: {message}")]
    Remote { code: i64, message: String },
}

impl From<alloy::transports::TransportError> for GatewayError {
    fn from(err: alloy::transports::TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => GatewayError::Remote {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => GatewayError::Transport(err.to_string()),
        }
    }
}

// =============================================================================
// Gateway Trait
// =============================================================================

/// One call inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: &'static str,
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(method: &'static str, params: Vec<Value>) -> Self {
        Self { method, params }
    }
}

/// Raw access to the node's JSON-RPC dialect.
pub trait ChainRpc: Clone + Send + Sync + 'static {
    /// Issue a single call and return the raw, non-null result.
    fn call(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Box<RawValue>, GatewayError>> + Send;

    /// Issue `requests` as one batch.
    ///
    /// The outer error covers the batch as a whole; each element carries its
    /// own result, in request order.
    fn batch(
        &self,
        requests: Vec<RpcRequest>,
    ) -> impl Future<Output = Result<Vec<Result<Box<RawValue>, GatewayError>>, GatewayError>> + Send;
}

/// Decode a raw result into `T`, naming the method in the error.
pub fn decode<T: DeserializeOwned>(method: &str, raw: &RawValue) -> Result<T, GatewayError> {
    serde_json::from_str(raw.get())
        .map_err(|e| GatewayError::Decode(format!("{method}: {e}")))
}

fn non_null(method: &str, raw: Box<RawValue>) -> Result<Box<RawValue>, GatewayError> {
    if raw.get().trim() == "null" {
        Err(GatewayError::NotFound(method.to_string()))
    } else {
        Ok(raw)
    }
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// Gateway over an alloy HTTP JSON-RPC client.
#[derive(Clone)]
pub struct HttpRpc {
    client: RpcClient,
}

impl HttpRpc {
    /// Connect to the node at `url`. No request is made until the first call.
    pub fn new(url: &str) -> Result<Self, GatewayError> {
        let url: url::Url = url
            .parse()
            .map_err(|e: url::ParseError| GatewayError::Transport(format!("invalid node url: {e}")))?;
        Ok(Self {
            client: RpcClient::new_http(url),
        })
    }
}

impl ChainRpc for HttpRpc {
    async fn call(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> Result<Box<RawValue>, GatewayError> {
        tracing::trace!(method, "rpc call");
        let raw: Box<RawValue> = self.client.request(method, params).await?;
        non_null(method, raw)
    }

    async fn batch(
        &self,
        requests: Vec<RpcRequest>,
    ) -> Result<Vec<Result<Box<RawValue>, GatewayError>>, GatewayError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        tracing::trace!(size = requests.len(), "rpc batch");

        let mut batch = self.client.new_batch();
        let mut waiters = Vec::with_capacity(requests.len());
        for request in &requests {
            let waiter = batch.add_call::<_, Box<RawValue>>(request.method, &request.params)?;
            waiters.push((request.method, waiter));
        }
        batch.send().await?;

        let mut results = Vec::with_capacity(waiters.len());
        for (method, waiter) in waiters {
            let result = match waiter.await {
                Ok(raw) => non_null(method, raw),
                Err(e) => Err(GatewayError::from(e)),
            };
            results.push(result);
        }
        Ok(results)
    }
}
