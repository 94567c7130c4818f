// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Trace Flattening and Operation Derivation
//!
//! Turns the nested `callTracer` output of one transaction into the ordered
//! operation list of that transaction:
//!
//! 1. Two `FEE` operations (sender pays, sealer receives), indices 0 and 1.
//! 2. One debit/credit pair per value-moving call frame, in pre-order.
//! 3. One `DESTRUCT` operation per self-destructed account that still holds
//!    funds once every frame has been applied.

use std::collections::BTreeMap;

use alloy::primitives::{Address, I256, U256};
use serde_json::Value;

use super::types::{Call, FlatCall, LoadedTransaction};
use super::{credit, debit, op_types, status, CALL_KINDS, CREATE_KINDS};
use crate::models::{
    AccountIdentifier, JsonMap, Operation, OperationIdentifier, Transaction,
    TransactionIdentifier,
};

/// Errors raised while deriving operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    #[error("negative balance for destroyed account {account}: {balance}")]
    NegativeDestroyedBalance { account: Address, balance: I256 },

    #[error("call value {0} does not fit a signed balance")]
    ValueOverflow(U256),

    #[error("invalid trace: {0}")]
    Decode(String),
}

// =============================================================================
// Flattening
// =============================================================================

/// Pre-order projection of a call tree.
///
/// A reverted frame marks every descendant that is not itself reverted as
/// reverted, carrying the frame's error message down.
pub fn flatten(root: &Call) -> Vec<FlatCall> {
    let mut out = Vec::new();
    visit(root, None, &mut out);
    out
}

fn visit(call: &Call, reverted_parent: Option<&Option<String>>, out: &mut Vec<FlatCall>) {
    let own_revert = call.revert || call.error.is_some();
    let (revert, error) = match reverted_parent {
        Some(parent_error) if !own_revert => (true, parent_error.clone()),
        Some(parent_error) => (true, call.error.clone().or_else(|| parent_error.clone())),
        None => (own_revert, call.error.clone()),
    };

    out.push(FlatCall {
        kind: call.kind.to_ascii_uppercase(),
        from: call.from,
        to: call.to,
        value: call.value.unwrap_or_default(),
        gas_used: call.gas_used.unwrap_or_default(),
        revert,
        error: error.clone(),
    });

    let inherited = revert.then_some(&error);
    for child in &call.calls {
        visit(child, inherited, out);
    }
}

// =============================================================================
// Derivation
// =============================================================================

/// Derive the operations of `calls`, numbering them from `start`.
pub fn derive_operations(calls: &[FlatCall], start: i64) -> Result<Vec<Operation>, TraceError> {
    let mut ops: Vec<Operation> = Vec::new();
    let mut destroyed: BTreeMap<Address, I256> = BTreeMap::new();

    for call in calls {
        let zero_value = call.value.is_zero();
        let succeeded = !call.revert;
        let should_add = !(zero_value && CALL_KINDS.contains(&call.kind.as_str()));
        let signed_value =
            I256::try_from(call.value).map_err(|_| TraceError::ValueOverflow(call.value))?;

        let metadata = call.error.as_ref().filter(|_| call.revert).map(|error| {
            let mut map = JsonMap::new();
            map.insert("error".to_string(), Value::String(error.clone()));
            map
        });
        let op_status = if succeeded { status::SUCCESS } else { status::FAIL };

        if should_add {
            if !zero_value && succeeded {
                if let Some(balance) = destroyed.get_mut(&call.from) {
                    *balance -= signed_value;
                }
            }
            ops.push(Operation {
                operation_identifier: OperationIdentifier {
                    index: start + ops.len() as i64,
                },
                related_operations: None,
                kind: call.kind.clone(),
                status: Some(op_status.to_string()),
                account: Some(AccountIdentifier::new(call.from.to_checksum(None))),
                amount: (!zero_value).then(|| debit(call.value)),
                metadata: metadata.clone(),
            });
        }

        if call.kind == op_types::SELFDESTRUCT {
            // The balance is zeroed after the transfer, so paying oneself moves nothing.
            destroyed.insert(call.from, I256::ZERO);
            if call.to == Some(call.from) {
                continue;
            }
        }

        let Some(to) = call.to else {
            continue;
        };

        if CREATE_KINDS.contains(&call.kind.as_str()) {
            destroyed.remove(&to);
        }

        if should_add {
            if !zero_value && succeeded {
                if let Some(balance) = destroyed.get_mut(&to) {
                    *balance += signed_value;
                }
            }
            let from_index = start + ops.len() as i64 - 1;
            ops.push(Operation {
                operation_identifier: OperationIdentifier {
                    index: from_index + 1,
                },
                related_operations: Some(vec![OperationIdentifier { index: from_index }]),
                kind: call.kind.clone(),
                status: Some(op_status.to_string()),
                account: Some(AccountIdentifier::new(to.to_checksum(None))),
                amount: (!zero_value).then(|| credit(call.value)),
                metadata,
            });
        }
    }

    for (account, balance) in destroyed {
        if balance.is_zero() {
            continue;
        }
        if balance.is_negative() {
            tracing::error!(
                account = %account,
                balance = %balance,
                "negative balance for destroyed account"
            );
            return Err(TraceError::NegativeDestroyedBalance { account, balance });
        }
        ops.push(Operation {
            operation_identifier: OperationIdentifier {
                index: start + ops.len() as i64,
            },
            related_operations: None,
            kind: op_types::DESTRUCT.to_string(),
            status: Some(status::SUCCESS.to_string()),
            account: Some(AccountIdentifier::new(account.to_checksum(None))),
            amount: Some(debit(balance.unsigned_abs())),
            metadata: None,
        });
    }

    Ok(ops)
}

/// The two fee operations every transaction opens with.
pub fn fee_operations(tx: &LoadedTransaction) -> Vec<Operation> {
    vec![
        Operation {
            operation_identifier: OperationIdentifier { index: 0 },
            related_operations: None,
            kind: op_types::FEE.to_string(),
            status: Some(status::SUCCESS.to_string()),
            account: Some(AccountIdentifier::new(tx.sender.to_checksum(None))),
            amount: Some(debit(tx.fee)),
            metadata: None,
        },
        Operation {
            operation_identifier: OperationIdentifier { index: 1 },
            related_operations: Some(vec![OperationIdentifier { index: 0 }]),
            kind: op_types::FEE.to_string(),
            status: Some(status::SUCCESS.to_string()),
            account: Some(AccountIdentifier::new(tx.miner.to_checksum(None))),
            amount: Some(credit(tx.fee)),
            metadata: None,
        },
    ]
}

/// Build the Rosetta transaction for one loaded transaction.
pub fn populate_transaction(tx: &LoadedTransaction) -> Result<Transaction, TraceError> {
    let root: Call = serde_json::from_str(tx.trace.get())
        .map_err(|e| TraceError::Decode(format!("trace of {}: {e}", tx.transaction.hash)))?;
    let receipt: Value = serde_json::from_str(tx.receipt.get())
        .map_err(|e| TraceError::Decode(format!("receipt of {}: {e}", tx.transaction.hash)))?;
    let trace: Value = serde_json::from_str(tx.trace.get())
        .map_err(|e| TraceError::Decode(format!("trace of {}: {e}", tx.transaction.hash)))?;

    let mut operations = fee_operations(tx);
    let flat = flatten(&root);
    operations.extend(derive_operations(&flat, operations.len() as i64)?);

    let mut metadata = JsonMap::new();
    metadata.insert(
        "gas_limit".to_string(),
        Value::String(format!("{:#x}", tx.transaction.gas)),
    );
    metadata.insert(
        "gas_price".to_string(),
        Value::String(format!("0x{:x}", tx.transaction.gas_price)),
    );
    metadata.insert("receipt".to_string(), receipt);
    metadata.insert("trace".to_string(), trace);

    Ok(Transaction {
        transaction_identifier: TransactionIdentifier {
            hash: tx.transaction.hash.to_string(),
        },
        operations,
        metadata: Some(metadata),
    })
}
