// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test fixtures: an in-memory node, an in-memory client and signing helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256};
use k256::ecdsa::SigningKey;
use serde_json::{json, value::RawValue, Value};

use crate::chain::recovery::{seal_hash, EXTRA_SEAL};
use crate::chain::rpc::{self, ChainRpc, GatewayError, RpcRequest};
use crate::chain::types::{
    CallArgs, LoadedTransaction, RpcHeader, RpcTransaction, EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH,
};
use crate::client::{AccountBalance, BlockSelector, Client, ClientError, NodeStatus};
use crate::models::{Block, BlockIdentifier, JsonMap, SyncStatus, Transaction};

// =============================================================================
// Keys and Addresses
// =============================================================================

pub fn addr(n: u8) -> Address {
    Address::repeat_byte(n)
}

/// Deterministic secp256k1 key with scalar `n` (must be non-zero).
pub fn test_key(n: u8) -> SigningKey {
    let mut bytes = [0u8; 32];
    bytes[31] = n;
    SigningKey::from_slice(&bytes).unwrap()
}

/// `r | s | v` signature over `hash`, with `v` in {0, 1}.
pub fn sign_prehash(key: &SigningKey, hash: &B256) -> [u8; 65] {
    let (signature, recovery_id) = key.sign_prehash_recoverable(hash.as_slice()).unwrap();
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte();
    out
}

// =============================================================================
// Chain Fixtures
// =============================================================================

pub fn sample_header(number: u64, extra: Vec<u8>) -> RpcHeader {
    RpcHeader {
        hash: keccak256(number.to_be_bytes()),
        parent_hash: if number == 0 {
            B256::ZERO
        } else {
            keccak256((number - 1).to_be_bytes())
        },
        sha3_uncles: EMPTY_UNCLE_HASH,
        miner: Address::ZERO,
        state_root: B256::repeat_byte(0x01),
        transactions_root: EMPTY_ROOT_HASH,
        receipts_root: EMPTY_ROOT_HASH,
        logs_bloom: Bloom::ZERO,
        difficulty: U256::from(2u64),
        number,
        gas_limit: 84_000_000,
        gas_used: 0,
        timestamp: 1_600_000_000 + number * 2,
        extra_data: Bytes::from(extra),
        mix_hash: B256::ZERO,
        nonce: B64::ZERO,
    }
}

/// Header for block `number` sealed by `key`.
pub fn sealed_header(key: &SigningKey, number: u64, has_transactions: bool) -> RpcHeader {
    let mut header = sample_header(number, vec![0u8; 32 + EXTRA_SEAL]);
    if has_transactions {
        header.transactions_root = B256::repeat_byte(0x42);
    }
    let seal = sign_prehash(key, &seal_hash(&header).unwrap());
    let mut extra = header.extra_data.to_vec();
    let start = extra.len() - EXTRA_SEAL;
    extra[start..].copy_from_slice(&seal);
    header.extra_data = extra.into();
    header
}

/// Block response JSON as returned with full transactions.
pub fn block_json(header: &RpcHeader, transactions: &[RpcTransaction]) -> Value {
    let mut value = serde_json::to_value(header).unwrap();
    let object = value.as_object_mut().unwrap();
    object.insert("transactions".to_string(), json!(transactions));
    object.insert("uncles".to_string(), json!([]));
    value
}

pub fn transfer(hash_byte: u8, from: Address, to: Address, value: u64, gas_price: u64) -> RpcTransaction {
    RpcTransaction {
        hash: B256::repeat_byte(hash_byte),
        from,
        to: Some(to),
        value: U256::from(value),
        gas: 21_000,
        gas_price: U256::from(gas_price),
        input: Bytes::new(),
        nonce: hash_byte as u64,
    }
}

pub fn receipt_json(gas_used: u64) -> Value {
    json!({ "status": "0x1", "gasUsed": format!("{gas_used:#x}") })
}

pub fn call_trace_json(tx: &RpcTransaction) -> Value {
    json!({
        "type": "CALL",
        "from": tx.from,
        "to": tx.to,
        "value": format!("{:#x}", tx.value.to::<u64>()),
        "gasUsed": "0x0",
    })
}

fn raw(value: &Value) -> Box<RawValue> {
    RawValue::from_string(value.to_string()).unwrap()
}

/// A plain value transfer ready for operation derivation.
pub fn loaded_transfer(
    from: Address,
    to: Address,
    miner: Address,
    value: u64,
    gas_used: u64,
    gas_price: u64,
) -> LoadedTransaction {
    let transaction = transfer(0x77, from, to, value, gas_price);
    LoadedTransaction {
        sender: from,
        miner,
        fee: U256::from(gas_used) * U256::from(gas_price),
        receipt: raw(&receipt_json(gas_used)),
        trace: raw(&call_trace_json(&transaction)),
        transaction,
    }
}

// =============================================================================
// In-Memory Node
// =============================================================================

enum Canned {
    Ok(Value),
    Err(GatewayError),
}

#[derive(Default)]
struct NodeState {
    responses: Mutex<HashMap<String, Canned>>,
    calls: Mutex<Vec<&'static str>>,
    trace_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Canned JSON-RPC node.
///
/// Responses are keyed by method plus the string and number parameters, so
/// option objects and boolean flags do not need to be repeated. Unknown calls
/// and `null` responses behave like a node returning `null`, except balance
/// reads, which default to zero.
#[derive(Clone, Default)]
pub struct InMemoryRpc {
    state: Arc<NodeState>,
}

fn key(method: &str, params: &[Value]) -> String {
    let parts: Vec<String> = params
        .iter()
        .filter(|p| p.is_string() || p.is_number())
        .map(|p| p.to_string().to_lowercase())
        .collect();
    format!("{method}({})", parts.join(","))
}

impl InMemoryRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &str, params: Vec<Value>, response: Value) -> &Self {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(key(method, &params), Canned::Ok(response));
        self
    }

    pub fn fail(&self, method: &str, params: Vec<Value>, error: GatewayError) -> &Self {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(key(method, &params), Canned::Err(error));
        self
    }

    /// Hold every trace call for `delay` so overlapping calls can be observed.
    pub fn with_trace_delay(self, delay: Duration) -> Self {
        *self.state.trace_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn max_in_flight_traces(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| **m == method)
            .count()
    }

    /// Register a sealed block with its receipts and traces.
    pub fn add_block(&self, header: &RpcHeader, transactions: &[RpcTransaction], gas_used: u64) {
        let block = block_json(header, transactions);
        self.respond(
            rpc::GET_BLOCK_BY_NUMBER,
            vec![BlockSelector::Number(header.number).tag()],
            block.clone(),
        );
        self.respond(rpc::GET_BLOCK_BY_HASH, vec![json!(header.hash)], block);
        for tx in transactions {
            self.respond(rpc::GET_TRANSACTION_RECEIPT, vec![json!(tx.hash)], receipt_json(gas_used));
            self.respond(rpc::TRACE_TRANSACTION, vec![json!(tx.hash)], call_trace_json(tx));
        }
    }

    fn lookup(&self, method: &'static str, params: &[Value]) -> Result<Box<RawValue>, GatewayError> {
        let responses = self.state.responses.lock().unwrap();
        match responses.get(&key(method, params)) {
            None if method == rpc::GET_BALANCE => Ok(raw(&json!("0x0"))),
            Some(Canned::Ok(Value::Null)) | None => Err(GatewayError::NotFound(method.to_string())),
            Some(Canned::Ok(value)) => Ok(raw(value)),
            Some(Canned::Err(e)) => Err(e.clone()),
        }
    }
}

impl ChainRpc for InMemoryRpc {
    async fn call(&self, method: &'static str, params: Vec<Value>) -> Result<Box<RawValue>, GatewayError> {
        self.state.calls.lock().unwrap().push(method);

        if method == rpc::TRACE_TRANSACTION || method == rpc::TRACE_BLOCK_BY_HASH {
            let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let delay = *self.state.trace_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        self.lookup(method, &params)
    }

    async fn batch(
        &self,
        requests: Vec<RpcRequest>,
    ) -> Result<Vec<Result<Box<RawValue>, GatewayError>>, GatewayError> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.call(request.method, request.params).await);
        }
        Ok(results)
    }
}

// =============================================================================
// In-Memory Client
// =============================================================================

/// Deterministic [`Client`] for handler tests.
pub struct InMemoryClient {
    pub chain_id: u64,
    pub block: Option<Block>,
    pub balance: U256,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_estimate: u64,
    pub mempool: Vec<Transaction>,
    pub submit_error: Option<ClientError>,
    pub submitted: Mutex<Vec<Vec<u8>>>,
    pub estimates: Mutex<Vec<CallArgs>>,
}

impl InMemoryClient {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            block: None,
            balance: U256::ZERO,
            nonce: 0,
            gas_price: U256::from(250_000_000u64),
            gas_estimate: 21_000,
            mempool: Vec::new(),
            submit_error: None,
            submitted: Mutex::new(Vec::new()),
            estimates: Mutex::new(Vec::new()),
        }
    }

    fn head(&self) -> BlockIdentifier {
        self.block
            .as_ref()
            .map(|b| b.block_identifier.clone())
            .unwrap_or(BlockIdentifier {
                index: 0,
                hash: B256::ZERO.to_string(),
            })
    }
}

impl Client for InMemoryClient {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        Ok(self.chain_id)
    }

    async fn status(&self) -> Result<NodeStatus, ClientError> {
        Ok(NodeStatus {
            current_block: self.head(),
            current_timestamp: self.block.as_ref().map(|b| b.timestamp).unwrap_or_default(),
            genesis_block: BlockIdentifier {
                index: 0,
                hash: B256::ZERO.to_string(),
            },
            sync_status: SyncStatus {
                synced: Some(true),
                ..Default::default()
            },
            peers: Vec::new(),
        })
    }

    async fn block(&self, _selector: BlockSelector) -> Result<Block, ClientError> {
        self.block
            .clone()
            .ok_or_else(|| GatewayError::NotFound(rpc::GET_BLOCK_BY_NUMBER.to_string()).into())
    }

    async fn balance(
        &self,
        _account: Address,
        _selector: BlockSelector,
    ) -> Result<AccountBalance, ClientError> {
        Ok(AccountBalance {
            block: self.head(),
            balance: self.balance,
            nonce: self.nonce,
        })
    }

    async fn pending_nonce_at(&self, _account: Address) -> Result<u64, ClientError> {
        Ok(self.nonce)
    }

    async fn suggest_gas_price(&self) -> Result<U256, ClientError> {
        Ok(self.gas_price)
    }

    async fn estimate_gas(&self, args: CallArgs) -> Result<u64, ClientError> {
        self.estimates.lock().unwrap().push(args);
        Ok(self.gas_estimate)
    }

    async fn submit_tx(&self, signed: Vec<u8>) -> Result<B256, ClientError> {
        if let Some(error) = &self.submit_error {
            return Err(error.clone());
        }
        let hash = keccak256(&signed);
        self.submitted.lock().unwrap().push(signed);
        Ok(hash)
    }

    async fn call(&self, method: String, parameters: JsonMap) -> Result<JsonMap, ClientError> {
        if method != rpc::GET_TRANSACTION_RECEIPT {
            return Err(ClientError::CallMethodInvalid(method));
        }
        let hash = parameters
            .get("tx_hash")
            .cloned()
            .ok_or_else(|| ClientError::CallParametersInvalid("tx_hash is required".to_string()))?;
        let mut receipt = JsonMap::new();
        receipt.insert("transactionHash".to_string(), hash);
        receipt.insert("status".to_string(), json!("0x1"));
        Ok(receipt)
    }

    async fn mempool(&self) -> Result<Vec<B256>, ClientError> {
        Ok(self
            .mempool
            .iter()
            .filter_map(|tx| tx.transaction_identifier.hash.parse().ok())
            .collect())
    }

    async fn mempool_transaction(&self, hash: B256) -> Result<Transaction, ClientError> {
        self.mempool
            .iter()
            .find(|tx| tx.transaction_identifier.hash == hash.to_string())
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("pending transaction {hash}")).into())
    }
}
