// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The narrow interface the HTTP layer uses to reach the chain.
//!
//! [`crate::chain::TomoClient`] is the production implementation; tests use
//! an in-memory one.

use std::future::Future;

use alloy::primitives::{Address, B256, U256};
use serde_json::Value;

use crate::chain::recovery::RecoveryError;
use crate::chain::trace::TraceError;
use crate::chain::types::CallArgs;
use crate::chain::GatewayError;
use crate::models::{
    Block, BlockIdentifier, JsonMap, PartialBlockIdentifier, Peer, SyncStatus, Transaction,
};

/// Which block a request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSelector {
    Latest,
    Number(u64),
    Hash(B256),
}

impl BlockSelector {
    /// Resolve a client-supplied identifier. The hash wins when both are set.
    pub fn from_partial(partial: &PartialBlockIdentifier) -> Result<Self, ClientError> {
        if let Some(hash) = &partial.hash {
            let hash = hash
                .parse::<B256>()
                .map_err(|e| ClientError::InvalidInput(format!("block hash {hash}: {e}")))?;
            return Ok(Self::Hash(hash));
        }
        match partial.index {
            Some(index) => u64::try_from(index)
                .map(Self::Number)
                .map_err(|_| ClientError::InvalidInput(format!("block index {index}"))),
            None => Ok(Self::Latest),
        }
    }

    /// Block tag for methods that take a block number or tag.
    pub fn tag(&self) -> Value {
        match self {
            Self::Latest => Value::from("latest"),
            Self::Number(n) => Value::from(format!("{n:#x}")),
            Self::Hash(h) => Value::from(h.to_string()),
        }
    }
}

/// Snapshot returned by [`Client::status`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStatus {
    pub current_block: BlockIdentifier,
    /// Milliseconds since the Unix epoch.
    pub current_timestamp: i64,
    pub genesis_block: BlockIdentifier,
    pub sync_status: SyncStatus,
    pub peers: Vec<Peer>,
}

/// Native balance of one account at one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub block: BlockIdentifier,
    pub balance: U256,
    pub nonce: u64,
}

/// Errors surfaced through the [`Client`] interface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("sealer recovery failed: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("operation derivation failed: {0}")]
    Trace(#[from] TraceError),

    #[error("node is not ready: {0}")]
    NodeNotReady(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid call parameters: {0}")]
    CallParametersInvalid(String),

    #[error("unsupported call method: {0}")]
    CallMethodInvalid(String),

    #[error("call output could not be encoded: {0}")]
    CallOutputMarshal(String),

    #[error("worker task failed: {0}")]
    Task(String),
}

/// Chain access used by the Rosetta handlers.
pub trait Client: Send + Sync + 'static {
    fn chain_id(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    fn status(&self) -> impl Future<Output = Result<NodeStatus, ClientError>> + Send;

    fn block(
        &self,
        selector: BlockSelector,
    ) -> impl Future<Output = Result<Block, ClientError>> + Send;

    fn balance(
        &self,
        account: Address,
        selector: BlockSelector,
    ) -> impl Future<Output = Result<AccountBalance, ClientError>> + Send;

    fn pending_nonce_at(
        &self,
        account: Address,
    ) -> impl Future<Output = Result<u64, ClientError>> + Send;

    fn suggest_gas_price(&self) -> impl Future<Output = Result<U256, ClientError>> + Send;

    fn estimate_gas(
        &self,
        args: CallArgs,
    ) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Relay a signed transaction; returns the hash the node reports.
    fn submit_tx(
        &self,
        signed: Vec<u8>,
    ) -> impl Future<Output = Result<B256, ClientError>> + Send;

    fn call(
        &self,
        method: String,
        parameters: JsonMap,
    ) -> impl Future<Output = Result<JsonMap, ClientError>> + Send;

    fn mempool(&self) -> impl Future<Output = Result<Vec<B256>, ClientError>> + Send;

    fn mempool_transaction(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<Transaction, ClientError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_takes_precedence_over_index() {
        let hash = B256::repeat_byte(1);
        let partial = PartialBlockIdentifier {
            index: Some(5),
            hash: Some(hash.to_string()),
        };
        assert_eq!(BlockSelector::from_partial(&partial).unwrap(), BlockSelector::Hash(hash));
    }

    #[test]
    fn empty_identifier_is_latest() {
        let selector = BlockSelector::from_partial(&PartialBlockIdentifier::default()).unwrap();
        assert_eq!(selector, BlockSelector::Latest);
        assert_eq!(selector.tag(), Value::from("latest"));
    }

    #[test]
    fn index_is_encoded_as_quantity() {
        let partial = PartialBlockIdentifier {
            index: Some(900),
            hash: None,
        };
        let selector = BlockSelector::from_partial(&partial).unwrap();
        assert_eq!(selector.tag(), Value::from("0x384"));
    }

    #[test]
    fn negative_index_and_bad_hash_are_rejected() {
        let negative = PartialBlockIdentifier {
            index: Some(-1),
            hash: None,
        };
        assert!(matches!(
            BlockSelector::from_partial(&negative),
            Err(ClientError::InvalidInput(_))
        ));

        let bad_hash = PartialBlockIdentifier {
            index: None,
            hash: Some("0x1234".to_string()),
        };
        assert!(matches!(
            BlockSelector::from_partial(&bad_hash),
            Err(ClientError::InvalidInput(_))
        ));
    }
}
