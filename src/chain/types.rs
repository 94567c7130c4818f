// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Raw node response shapes.
//!
//! A block response is decoded twice: once as [`RpcHeader`] (everything the
//! seal covers) and once as [`RpcBlockBody`] (transactions and uncles).

use alloy::primitives::{Address, Bloom, Bytes, B256, B64, U256};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

/// keccak256(rlp([])), the uncle hash of a block without uncles.
pub const EMPTY_UNCLE_HASH: B256 = B256::new([
    0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
    0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
]);

/// Root of an empty trie, the transactions root of a block without transactions.
pub const EMPTY_ROOT_HASH: B256 = B256::new([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

// =============================================================================
// Block
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcHeader {
    /// Final hash as reported by the node, never recomputed.
    pub hash: B256,
    pub parent_hash: B256,
    pub sha3_uncles: B256,
    pub miner: Address,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    #[serde(with = "quantity")]
    pub number: u64,
    #[serde(with = "quantity")]
    pub gas_limit: u64,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    #[serde(with = "quantity")]
    pub timestamp: u64,
    pub extra_data: Bytes,
    #[serde(default)]
    pub mix_hash: B256,
    #[serde(default)]
    pub nonce: B64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcBlockBody {
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
    #[serde(default)]
    pub uncles: Vec<B256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: B256,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    pub value: U256,
    #[serde(with = "quantity")]
    pub gas: u64,
    pub gas_price: U256,
    #[serde(default)]
    pub input: Bytes,
    #[serde(with = "quantity")]
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    #[serde(default, with = "quantity::opt")]
    pub status: Option<u64>,
    pub gas_used: U256,
    #[serde(default)]
    pub effective_gas_price: Option<U256>,
}

// =============================================================================
// Traces
// =============================================================================

/// One frame of a `callTracer` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Call {
    #[serde(rename = "type")]
    pub kind: String,
    pub from: Address,
    #[serde(default, deserialize_with = "empty_address")]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: Option<U256>,
    #[serde(default, rename = "gasUsed")]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub revert: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub calls: Vec<Call>,
}

/// A [`Call`] without its children, with the revert state already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatCall {
    pub kind: String,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub gas_used: U256,
    pub revert: bool,
    pub error: Option<String>,
}

/// Element of a `debug_traceBlockByHash` response.
#[derive(Debug, Deserialize)]
pub struct BlockTraceEntry {
    pub result: Box<RawValue>,
}

/// Everything the operation deriver needs for one transaction.
#[derive(Debug, Clone)]
pub struct LoadedTransaction {
    pub transaction: RpcTransaction,
    pub sender: Address,
    pub miner: Address,
    pub fee: U256,
    pub receipt: Box<RawValue>,
    pub trace: Box<RawValue>,
}

/// Arguments for `eth_estimateGas` and friends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgs {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

/// Bare quantity result such as `eth_chainId` or `eth_estimateGas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Quantity(#[serde(with = "quantity")] pub u64);

fn empty_address<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Address>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    match raw.as_deref() {
        None | Some("") | Some("0x") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

// =============================================================================
// Quantities
// =============================================================================

/// `u64` quantities that arrive as `0x`-hex strings or plain numbers.
pub mod quantity {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    pub fn parse(s: &str) -> Result<u64, String> {
        match s.strip_prefix("0x") {
            Some("") => Ok(0),
            Some(hex) => u64::from_str_radix(hex, 16).map_err(|e| e.to_string()),
            None => s.parse().map_err(|e: std::num::ParseIntError| e.to_string()),
        }
    }

    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{value:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => parse(&s).map_err(de::Error::custom),
        }
    }

    pub mod opt {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
            match Option::<Raw>::deserialize(d)? {
                None => Ok(None),
                Some(Raw::Num(n)) => Ok(Some(n)),
                Some(Raw::Str(s)) => parse(&s).map(Some).map_err(de::Error::custom),
            }
        }
    }
}
