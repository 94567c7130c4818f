// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Block Assembly
//!
//! Builds one Rosetta block from the node's raw responses:
//!
//! 1. Fetch the block with full transactions and decode it as header and body.
//! 2. Check that the uncle and transaction lists agree with the header roots.
//! 3. Batch-fetch uncle headers.
//! 4. For non-genesis blocks: recover the sealer, batch-fetch receipts, fetch
//!    one trace per transaction and derive the operations.
//! 5. On checkpoint blocks, prepend the synthetic reward transaction.
//! 6. Annotate every operation with its account's running balance, opening
//!    at the parent block.
//!
//! Trace fetches share one semaphore per assembler, so concurrent block
//! requests together never exceed the configured number of in-flight traces.

use std::sync::Arc;

use alloy::primitives::B256;
use serde::Deserialize;
use serde_json::{json, value::RawValue, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::balance::{apply_running_balances, fetch_balances, touched_accounts};
use super::recovery::recover_sealer;
use super::reward::{is_checkpoint, parse_rewards, reward_transaction};
use super::rpc::{self, decode, ChainRpc, GatewayError, RpcRequest};
use super::trace::populate_transaction;
use super::types::{
    BlockTraceEntry, LoadedTransaction, RpcBlockBody, RpcHeader, RpcReceipt, RpcTransaction,
    EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH,
};
use crate::client::{BlockSelector, ClientError};
use crate::models::{Block, BlockIdentifier, JsonMap, Transaction};

/// Default number of trace requests allowed in flight.
pub const DEFAULT_TRACE_CONCURRENCY: usize = 16;

/// How traces are requested from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Tracer name or JavaScript source.
    pub tracer: String,
    /// Tracer timeout, e.g. `120s`.
    pub timeout: String,
    /// Maximum in-flight trace requests.
    pub concurrency: usize,
    /// Fetch all traces of a block with one `debug_traceBlockByHash`.
    pub by_block: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            tracer: "callTracer".to_string(),
            timeout: "120s".to_string(),
            concurrency: DEFAULT_TRACE_CONCURRENCY,
            by_block: false,
        }
    }
}

impl TraceConfig {
    fn params(&self) -> Value {
        json!({ "tracer": self.tracer, "timeout": self.timeout })
    }
}

#[derive(Deserialize)]
struct UncleHeader {
    hash: B256,
}

/// Assembles canonical blocks out of raw node responses.
pub struct BlockAssembler<R> {
    rpc: R,
    trace: TraceConfig,
    permits: Arc<Semaphore>,
}

impl<R: ChainRpc> BlockAssembler<R> {
    pub fn new(rpc: R, trace: TraceConfig) -> Self {
        let permits = Arc::new(Semaphore::new(trace.concurrency.max(1)));
        Self {
            rpc,
            trace,
            permits,
        }
    }

    /// Raw block response for `selector`.
    async fn fetch_raw(
        &self,
        selector: BlockSelector,
        full_transactions: bool,
    ) -> Result<(&'static str, Box<RawValue>), GatewayError> {
        let method = match selector {
            BlockSelector::Hash(_) => rpc::GET_BLOCK_BY_HASH,
            _ => rpc::GET_BLOCK_BY_NUMBER,
        };
        let raw = self
            .rpc
            .call(method, vec![selector.tag(), Value::Bool(full_transactions)])
            .await?;
        Ok((method, raw))
    }

    /// Header of the selected block, without transactions.
    pub async fn header(&self, selector: BlockSelector) -> Result<RpcHeader, GatewayError> {
        let (method, raw) = self.fetch_raw(selector, false).await?;
        decode(method, &raw)
    }

    /// Assemble the selected block.
    pub async fn assemble(&self, selector: BlockSelector) -> Result<Block, ClientError> {
        let (method, raw) = self.fetch_raw(selector, true).await?;
        let header: RpcHeader = decode(method, &raw)?;
        let body: RpcBlockBody = decode(method, &raw)?;
        check_consistency(&header, &body)?;

        let uncles = self.fetch_uncles(&header, &body).await?;
        let identifier = BlockIdentifier {
            index: header.number as i64,
            hash: header.hash.to_string(),
        };
        let mut metadata = JsonMap::new();
        metadata.insert(
            "uncles".to_string(),
            Value::Array(uncles.iter().map(|h| Value::String(h.to_string())).collect()),
        );

        if header.number == 0 {
            return Ok(Block {
                parent_block_identifier: identifier.clone(),
                block_identifier: identifier,
                timestamp: timestamp_ms(header.timestamp),
                transactions: Vec::new(),
                metadata: Some(metadata),
            });
        }

        let miner = recover_sealer(&header)?;
        let receipts = self.fetch_receipts(&body.transactions).await?;
        let traces = self.fetch_traces(header.hash, &body.transactions).await?;

        let mut transactions = Vec::with_capacity(body.transactions.len() + 1);
        if is_checkpoint(header.number) {
            if let Some(reward) = self.fetch_reward(header.hash).await? {
                transactions.push(reward);
            }
        }

        let rows = body.transactions.into_iter().zip(receipts).zip(traces);
        for ((transaction, receipt), trace) in rows {
            let parsed: RpcReceipt = decode(rpc::GET_TRANSACTION_RECEIPT, &receipt)?;
            let price = parsed.effective_gas_price.unwrap_or(transaction.gas_price);
            let loaded = LoadedTransaction {
                sender: transaction.from,
                miner,
                fee: parsed.gas_used.saturating_mul(price),
                transaction,
                receipt,
                trace,
            };
            transactions.push(populate_transaction(&loaded)?);
        }

        let accounts = touched_accounts(&transactions);
        let parent = json!(format!("{:#x}", header.number - 1));
        let opening = fetch_balances(&self.rpc, &accounts, parent).await?;
        apply_running_balances(&mut transactions, opening)?;

        tracing::debug!(
            block = %header.hash,
            number = header.number,
            transactions = transactions.len(),
            "assembled block"
        );

        Ok(Block {
            block_identifier: identifier,
            parent_block_identifier: BlockIdentifier {
                index: header.number as i64 - 1,
                hash: header.parent_hash.to_string(),
            },
            timestamp: timestamp_ms(header.timestamp),
            transactions,
            metadata: Some(metadata),
        })
    }

    async fn fetch_uncles(
        &self,
        header: &RpcHeader,
        body: &RpcBlockBody,
    ) -> Result<Vec<B256>, GatewayError> {
        let requests = (0..body.uncles.len())
            .map(|i| {
                RpcRequest::new(
                    rpc::GET_UNCLE_BY_BLOCK_HASH_AND_INDEX,
                    vec![json!(header.hash), json!(format!("{i:#x}"))],
                )
            })
            .collect();
        self.rpc
            .batch(requests)
            .await?
            .into_iter()
            .map(|result| {
                let raw = result?;
                decode::<UncleHeader>(rpc::GET_UNCLE_BY_BLOCK_HASH_AND_INDEX, &raw).map(|u| u.hash)
            })
            .collect()
    }

    async fn fetch_receipts(
        &self,
        transactions: &[RpcTransaction],
    ) -> Result<Vec<Box<RawValue>>, GatewayError> {
        let requests = transactions
            .iter()
            .map(|tx| RpcRequest::new(rpc::GET_TRANSACTION_RECEIPT, vec![json!(tx.hash)]))
            .collect();
        self.rpc.batch(requests).await?.into_iter().collect()
    }

    async fn fetch_traces(
        &self,
        block_hash: B256,
        transactions: &[RpcTransaction],
    ) -> Result<Vec<Box<RawValue>>, ClientError> {
        if transactions.is_empty() {
            return Ok(Vec::new());
        }
        if self.trace.by_block {
            return self.fetch_block_traces(block_hash, transactions.len()).await;
        }

        let mut tasks = JoinSet::new();
        for (position, tx) in transactions.iter().enumerate() {
            let rpc = self.rpc.clone();
            let permits = Arc::clone(&self.permits);
            let params = vec![json!(tx.hash), self.trace.params()];
            tasks.spawn(async move {
                let permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ClientError::Task(e.to_string()))?;
                let result = rpc.call(rpc::TRACE_TRANSACTION, params).await;
                drop(permit);
                Ok::<_, ClientError>((position, result?))
            });
        }

        // Dropping the set on the first error aborts the remaining fetches.
        let mut traces: Vec<Option<Box<RawValue>>> = vec![None; transactions.len()];
        while let Some(joined) = tasks.join_next().await {
            let (position, raw) = joined.map_err(|e| ClientError::Task(e.to_string()))??;
            traces[position] = Some(raw);
        }
        traces
            .into_iter()
            .map(|t| t.ok_or_else(|| ClientError::Task("trace task did not report".to_string())))
            .collect()
    }

    async fn fetch_block_traces(
        &self,
        block_hash: B256,
        expected: usize,
    ) -> Result<Vec<Box<RawValue>>, ClientError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ClientError::Task(e.to_string()))?;
        let result = self
            .rpc
            .call(rpc::TRACE_BLOCK_BY_HASH, vec![json!(block_hash), self.trace.params()])
            .await;
        drop(permit);

        let entries: Vec<BlockTraceEntry> = decode(rpc::TRACE_BLOCK_BY_HASH, &result?)?;
        if entries.len() != expected {
            return Err(GatewayError::Decode(format!(
                "block {block_hash} has {expected} transactions but {} traces",
                entries.len()
            ))
            .into());
        }
        Ok(entries.into_iter().map(|e| e.result).collect())
    }

    async fn fetch_reward(&self, block_hash: B256) -> Result<Option<Transaction>, ClientError> {
        let raw = match self.rpc.call(rpc::GET_REWARD_BY_HASH, vec![json!(block_hash)]).await {
            Ok(raw) => raw,
            Err(GatewayError::NotFound(_)) => {
                tracing::warn!(block = %block_hash, "no reward breakdown for checkpoint block");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        match parse_rewards(&raw)? {
            Some(rewards) => Ok(Some(reward_transaction(block_hash, &rewards))),
            None => {
                tracing::warn!(block = %block_hash, "empty reward breakdown for checkpoint block");
                Ok(None)
            }
        }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }
}

/// Reject bodies that disagree with the roots committed in the header.
fn check_consistency(header: &RpcHeader, body: &RpcBlockBody) -> Result<(), GatewayError> {
    let no_uncles = header.sha3_uncles == EMPTY_UNCLE_HASH;
    if no_uncles && !body.uncles.is_empty() {
        return Err(GatewayError::Decode(
            "header indicates no uncles but the block lists some".to_string(),
        ));
    }
    if !no_uncles && body.uncles.is_empty() {
        return Err(GatewayError::Decode(
            "header indicates uncles but the block lists none".to_string(),
        ));
    }

    let no_transactions = header.transactions_root == EMPTY_ROOT_HASH;
    if no_transactions && !body.transactions.is_empty() {
        return Err(GatewayError::Decode(
            "header indicates no transactions but the block lists some".to_string(),
        ));
    }
    if !no_transactions && body.transactions.is_empty() {
        return Err(GatewayError::Decode(
            "header indicates transactions but the block lists none".to_string(),
        ));
    }
    Ok(())
}

fn timestamp_ms(seconds: u64) -> i64 {
    (seconds as i64).saturating_mul(1000)
}
