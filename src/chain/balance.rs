// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Running post-operation balances.
//!
//! Every operation that names an account carries a `new_balance` metadata
//! entry: the account's balance after the operation is applied. Opening
//! balances are read once per account, then operations are applied in the
//! order they appear in the transaction list. Failed operations leave the
//! balance unchanged but are still annotated.

use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::{I256, U256};
use serde_json::{json, Value};

use super::rpc::{self, decode, ChainRpc, RpcRequest};
use super::status;
use super::trace::TraceError;
use crate::client::ClientError;
use crate::models::Transaction;

/// Metadata key holding the account balance after an operation.
pub const NEW_BALANCE: &str = "new_balance";

/// Running balances keyed by checksummed address.
pub type Balances = BTreeMap<String, I256>;

/// Every account named by an operation in `transactions`, in address order.
pub fn touched_accounts(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .flat_map(|tx| tx.operations.iter())
        .filter_map(|op| op.account.as_ref().map(|a| a.address.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Batch-read the balances of `accounts` at block `tag`.
pub async fn fetch_balances<R: ChainRpc>(
    rpc: &R,
    accounts: &[String],
    tag: Value,
) -> Result<Balances, ClientError> {
    if accounts.is_empty() {
        return Ok(Balances::new());
    }
    let requests = accounts
        .iter()
        .map(|account| RpcRequest::new(rpc::GET_BALANCE, vec![json!(account), tag.clone()]))
        .collect();
    let results = rpc.batch(requests).await?;

    let mut balances = Balances::new();
    for (account, result) in accounts.iter().zip(results) {
        let balance: U256 = decode(rpc::GET_BALANCE, &result?)?;
        let balance = I256::try_from(balance).map_err(|_| TraceError::ValueOverflow(balance))?;
        balances.insert(account.clone(), balance);
    }
    Ok(balances)
}

/// Annotate every operation of `transactions` with its account's new balance.
///
/// Accounts missing from `balances` open at zero.
pub fn apply_running_balances(
    transactions: &mut [Transaction],
    mut balances: Balances,
) -> Result<(), TraceError> {
    for tx in transactions.iter_mut() {
        for op in tx.operations.iter_mut() {
            let Some(account) = &op.account else {
                continue;
            };
            let balance = balances.entry(account.address.clone()).or_default();
            if op.status.as_deref() != Some(status::FAIL) {
                let delta = op.signed_value().ok_or_else(|| {
                    TraceError::Decode(format!(
                        "operation {} of {} has an unreadable amount",
                        op.operation_identifier.index, tx.transaction_identifier.hash
                    ))
                })?;
                *balance += delta;
            }
            op.metadata
                .get_or_insert_with(Default::default)
                .insert(NEW_BALANCE.to_string(), Value::String(balance.to_string()));
        }
    }
    Ok(())
}
