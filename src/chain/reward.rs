// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Checkpoint reward distribution.
//!
//! Every [`EPOCH`] blocks the PoSV engine pays staking rewards out of the
//! rewarding fund. The node reports the split through `eth_getRewardByHash`:
//!
//! ```json
//! {"rewards": {"<signer>": {"<holder>": 1000000, "<holder>": 25}}}
//! ```
//!
//! Amounts are arbitrary-precision JSON numbers, so they are read from the
//! raw text rather than through `f64`.

use std::collections::BTreeMap;
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use serde::Deserialize;
use serde_json::value::RawValue;

use super::rpc::GatewayError;
use super::{credit, op_types, status};
use crate::models::{
    AccountIdentifier, Operation, OperationIdentifier, Transaction, TransactionIdentifier,
};

/// Checkpoint interval in blocks.
pub const EPOCH: u64 = 900;

/// signer -> holder -> amount, both levels in address order.
pub type Rewards = BTreeMap<Address, BTreeMap<Address, U256>>;

/// Whether block `number` distributes rewards.
pub fn is_checkpoint(number: u64) -> bool {
    number > 0 && number % EPOCH == 0
}

#[derive(Deserialize)]
struct RewardResponse {
    #[serde(default)]
    rewards: Option<BTreeMap<String, BTreeMap<String, Box<RawValue>>>>,
}

/// Parse an `eth_getRewardByHash` result. `None` when the node has no split.
pub fn parse_rewards(raw: &RawValue) -> Result<Option<Rewards>, GatewayError> {
    let response: RewardResponse = serde_json::from_str(raw.get())
        .map_err(|e| GatewayError::Decode(format!("rewards: {e}")))?;
    let Some(by_signer) = response.rewards else {
        return Ok(None);
    };

    let mut rewards = Rewards::new();
    for (signer, holders) in by_signer {
        let signer = parse_address(&signer)?;
        let entry = rewards.entry(signer).or_default();
        for (holder, amount) in holders {
            entry.insert(parse_address(&holder)?, parse_amount(&amount)?);
        }
    }
    Ok(Some(rewards))
}

fn parse_address(s: &str) -> Result<Address, GatewayError> {
    Address::from_str(s).map_err(|e| GatewayError::Decode(format!("reward address {s}: {e}")))
}

fn parse_amount(raw: &RawValue) -> Result<U256, GatewayError> {
    let text = raw.get().trim();
    let parsed = if text.starts_with('"') {
        let s: String = serde_json::from_str(text)
            .map_err(|e| GatewayError::Decode(format!("reward amount: {e}")))?;
        U256::from_str(&s).map_err(|e| e.to_string())
    } else {
        U256::from_str_radix(text, 10).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| GatewayError::Decode(format!("reward amount {text}: {e}")))
}

/// Synthetic transaction crediting every holder, identified by the block hash.
pub fn reward_transaction(block_hash: B256, rewards: &Rewards) -> Transaction {
    let operations = rewards
        .values()
        .flat_map(|holders| holders.iter())
        .enumerate()
        .map(|(index, (holder, amount))| Operation {
            operation_identifier: OperationIdentifier {
                index: index as i64,
            },
            related_operations: None,
            kind: op_types::REWARD.to_string(),
            status: Some(status::SUCCESS.to_string()),
            account: Some(AccountIdentifier::new(holder.to_checksum(None))),
            amount: Some(credit(*amount)),
            metadata: None,
        })
        .collect();

    Transaction {
        transaction_identifier: TransactionIdentifier {
            hash: block_hash.to_string(),
        },
        operations,
        metadata: None,
    }
}
