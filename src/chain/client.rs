// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TomoChain client for the Rosetta handlers.

use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use super::assembler::{BlockAssembler, TraceConfig};
use super::balance::{apply_running_balances, fetch_balances, touched_accounts};
use super::rpc::{self, decode, ChainRpc, GatewayError};
use super::types::{CallArgs, Quantity, RpcTransaction};
use super::{credit, debit, op_types};
use crate::client::{AccountBalance, BlockSelector, Client, ClientError, NodeStatus};
use crate::codec::to_hex;
use crate::models::{
    AccountIdentifier, Block, BlockIdentifier, JsonMap, Operation, OperationIdentifier, Peer,
    SyncStatus, Transaction, TransactionIdentifier,
};

/// Earliest block timestamp accepted as a live chain head (ms).
pub const MIN_BLOCK_TIMESTAMP_MS: i64 = 946_713_600_000;

/// Block tag for state that includes the transaction pool.
const PENDING_TAG: &str = "pending";
const LATEST_TAG: &str = "latest";

/// Call method exposed through `/call`.
pub const CALL_GET_TRANSACTION_RECEIPT: &str = rpc::GET_TRANSACTION_RECEIPT;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncProgress {
    #[serde(with = "super::types::quantity")]
    current_block: u64,
    #[serde(with = "super::types::quantity")]
    highest_block: u64,
}

/// TomoChain client backed by a JSON-RPC gateway.
pub struct TomoClient<R> {
    assembler: BlockAssembler<R>,
    /// Filled once on first use, shared by concurrent callers.
    chain_id: OnceCell<u64>,
}

impl<R: ChainRpc> TomoClient<R> {
    pub fn new(rpc: R, trace: TraceConfig) -> Self {
        Self {
            assembler: BlockAssembler::new(rpc, trace),
            chain_id: OnceCell::new(),
        }
    }

    fn rpc(&self) -> &R {
        self.assembler.rpc()
    }

    async fn sync_status(&self) -> Result<SyncStatus, GatewayError> {
        let raw = self.rpc().call(rpc::SYNCING, Vec::new()).await?;
        if raw.get().trim() == "false" {
            return Ok(SyncStatus {
                current_index: None,
                target_index: None,
                synced: Some(true),
            });
        }
        let progress: SyncProgress = decode(rpc::SYNCING, &raw)?;
        Ok(SyncStatus {
            current_index: Some(progress.current_block as i64),
            target_index: Some(progress.highest_block as i64),
            synced: Some(progress.current_block >= progress.highest_block),
        })
    }

    async fn peers(&self) -> Vec<Peer> {
        let raw = match self.rpc().call(rpc::PEERS, Vec::new()).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "peer lookup failed");
                return Vec::new();
            }
        };
        let entries: Vec<JsonMap> = match decode(rpc::PEERS, &raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "peer list could not be decoded");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .filter_map(|mut entry| {
                let id = entry.remove("id")?.as_str()?.to_string();
                Some(Peer {
                    peer_id: id,
                    metadata: Some(entry),
                })
            })
            .collect()
    }

    async fn pending_transactions(&self) -> Result<Vec<RpcTransaction>, GatewayError> {
        match self.rpc().call(rpc::PENDING_TRANSACTIONS, Vec::new()).await {
            Ok(raw) => decode(rpc::PENDING_TRANSACTIONS, &raw),
            Err(GatewayError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

impl<R: ChainRpc> Client for TomoClient<R> {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        let id = self
            .chain_id
            .get_or_try_init(|| async {
                let raw = self.rpc().call(rpc::CHAIN_ID, Vec::new()).await?;
                let Quantity(id) = decode(rpc::CHAIN_ID, &raw)?;
                tracing::info!(chain_id = id, "resolved chain id");
                Ok::<_, GatewayError>(id)
            })
            .await?;
        Ok(*id)
    }

    async fn status(&self) -> Result<NodeStatus, ClientError> {
        let latest = self.assembler.header(BlockSelector::Latest).await?;
        let timestamp = (latest.timestamp as i64).saturating_mul(1000);
        if timestamp < MIN_BLOCK_TIMESTAMP_MS {
            return Err(ClientError::NodeNotReady(format!(
                "latest block timestamp {timestamp} is before {MIN_BLOCK_TIMESTAMP_MS}"
            )));
        }
        let genesis = self.assembler.header(BlockSelector::Number(0)).await?;

        Ok(NodeStatus {
            current_block: BlockIdentifier {
                index: latest.number as i64,
                hash: latest.hash.to_string(),
            },
            current_timestamp: timestamp,
            genesis_block: BlockIdentifier {
                index: 0,
                hash: genesis.hash.to_string(),
            },
            sync_status: self.sync_status().await?,
            peers: self.peers().await,
        })
    }

    async fn block(&self, selector: BlockSelector) -> Result<Block, ClientError> {
        self.assembler.assemble(selector).await
    }

    async fn balance(
        &self,
        account: Address,
        selector: BlockSelector,
    ) -> Result<AccountBalance, ClientError> {
        let header = self.assembler.header(selector).await?;
        let at = BlockSelector::Number(header.number).tag();

        let raw = self
            .rpc()
            .call(rpc::GET_BALANCE, vec![json!(account), at.clone()])
            .await?;
        let balance: U256 = decode(rpc::GET_BALANCE, &raw)?;
        let raw = self
            .rpc()
            .call(rpc::GET_TRANSACTION_COUNT, vec![json!(account), at])
            .await?;
        let Quantity(nonce) = decode(rpc::GET_TRANSACTION_COUNT, &raw)?;

        Ok(AccountBalance {
            block: BlockIdentifier {
                index: header.number as i64,
                hash: header.hash.to_string(),
            },
            balance,
            nonce,
        })
    }

    async fn pending_nonce_at(&self, account: Address) -> Result<u64, ClientError> {
        let raw = self
            .rpc()
            .call(
                rpc::GET_TRANSACTION_COUNT,
                vec![json!(account), json!(PENDING_TAG)],
            )
            .await?;
        let Quantity(nonce) = decode(rpc::GET_TRANSACTION_COUNT, &raw)?;
        Ok(nonce)
    }

    async fn suggest_gas_price(&self) -> Result<U256, ClientError> {
        let raw = self.rpc().call(rpc::GAS_PRICE, Vec::new()).await?;
        Ok(decode(rpc::GAS_PRICE, &raw)?)
    }

    async fn estimate_gas(&self, args: CallArgs) -> Result<u64, ClientError> {
        let raw = self.rpc().call(rpc::ESTIMATE_GAS, vec![json!(args)]).await?;
        let Quantity(gas) = decode(rpc::ESTIMATE_GAS, &raw)?;
        Ok(gas)
    }

    async fn submit_tx(&self, signed: Vec<u8>) -> Result<B256, ClientError> {
        let raw = self
            .rpc()
            .call(rpc::SEND_RAW_TRANSACTION, vec![json!(to_hex(&signed))])
            .await?;
        let hash: B256 = decode(rpc::SEND_RAW_TRANSACTION, &raw)?;
        tracing::info!(tx = %hash, "transaction submitted");
        Ok(hash)
    }

    async fn call(&self, method: String, parameters: JsonMap) -> Result<JsonMap, ClientError> {
        if method != CALL_GET_TRANSACTION_RECEIPT {
            return Err(ClientError::CallMethodInvalid(method));
        }
        let hash = parameters
            .get("tx_hash")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::CallParametersInvalid("tx_hash is required".to_string()))?;
        let hash = B256::from_str(hash)
            .map_err(|e| ClientError::CallParametersInvalid(format!("tx_hash: {e}")))?;

        let raw = self
            .rpc()
            .call(rpc::GET_TRANSACTION_RECEIPT, vec![json!(hash)])
            .await?;
        match serde_json::from_str::<Value>(raw.get()) {
            Ok(Value::Object(receipt)) => Ok(receipt),
            Ok(other) => Err(ClientError::CallOutputMarshal(format!(
                "expected an object, got {other}"
            ))),
            Err(e) => Err(ClientError::CallOutputMarshal(e.to_string())),
        }
    }

    async fn mempool(&self) -> Result<Vec<B256>, ClientError> {
        Ok(self
            .pending_transactions()
            .await?
            .into_iter()
            .map(|tx| tx.hash)
            .collect())
    }

    async fn mempool_transaction(&self, hash: B256) -> Result<Transaction, ClientError> {
        let tx = self
            .pending_transactions()
            .await?
            .into_iter()
            .find(|tx| tx.hash == hash)
            .ok_or_else(|| GatewayError::NotFound(format!("pending transaction {hash}")))?;

        let mut transaction = pending_view(&tx);
        let accounts = touched_accounts(std::slice::from_ref(&transaction));
        let opening = fetch_balances(self.rpc(), &accounts, json!(LATEST_TAG)).await?;
        apply_running_balances(std::slice::from_mut(&mut transaction), opening)?;
        Ok(transaction)
    }
}

/// Sender debit and recipient credit of a pending transaction.
pub(crate) fn pending_view(tx: &RpcTransaction) -> Transaction {
    let mut operations = vec![Operation {
        operation_identifier: OperationIdentifier { index: 0 },
        related_operations: None,
        kind: op_types::CALL.to_string(),
        status: None,
        account: Some(AccountIdentifier::new(tx.from.to_checksum(None))),
        amount: Some(debit(tx.value)),
        metadata: None,
    }];
    if let Some(to) = tx.to {
        operations.push(Operation {
            operation_identifier: OperationIdentifier { index: 1 },
            related_operations: Some(vec![OperationIdentifier { index: 0 }]),
            kind: op_types::CALL.to_string(),
            status: None,
            account: Some(AccountIdentifier::new(to.to_checksum(None))),
            amount: Some(credit(tx.value)),
            metadata: None,
        });
    }
    Transaction {
        transaction_identifier: TransactionIdentifier {
            hash: tx.hash.to_string(),
        },
        operations,
        metadata: None,
    }
}
