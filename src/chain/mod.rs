// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TomoChain integration.
//!
//! This module provides:
//! - Raw and batched JSON-RPC access to the node (`rpc`)
//! - Sealer and sender recovery for PoSV signatures (`recovery`)
//! - Block assembly with receipts, traces and checkpoint rewards (`assembler`)
//! - Running post-operation balances (`balance`)
//! - The production [`crate::client::Client`] implementation (`client`)

pub mod assembler;
pub mod balance;
pub mod client;
pub mod recovery;
pub mod reward;
pub mod rpc;
pub mod trace;
pub mod types;

pub use client::TomoClient;
pub use rpc::{ChainRpc, GatewayError, HttpRpc};

use alloy::primitives::U256;

use crate::models::{Amount, Currency};

/// Blockchain name in network identifiers.
pub const BLOCKCHAIN: &str = "tomochain";

/// Native currency symbol.
pub const SYMBOL: &str = "TOMO";

/// Native currency decimals.
pub const DECIMALS: u32 = 18;

/// Operation types.
pub mod op_types {
    pub const FEE: &str = "FEE";
    pub const CALL: &str = "CALL";
    pub const CALLCODE: &str = "CALLCODE";
    pub const DELEGATECALL: &str = "DELEGATECALL";
    pub const STATICCALL: &str = "STATICCALL";
    pub const CREATE: &str = "CREATE";
    pub const CREATE2: &str = "CREATE2";
    pub const SELFDESTRUCT: &str = "SELFDESTRUCT";
    pub const DESTRUCT: &str = "DESTRUCT";
    pub const REWARD: &str = "REWARD";

    pub const ALL: [&str; 10] = [
        FEE,
        CALL,
        CALLCODE,
        DELEGATECALL,
        STATICCALL,
        CREATE,
        CREATE2,
        SELFDESTRUCT,
        DESTRUCT,
        REWARD,
    ];
}

/// Operation statuses.
pub mod status {
    pub const SUCCESS: &str = "SUCCESS";
    pub const FAIL: &str = "FAIL";
}

/// Call frames that never change account existence.
pub const CALL_KINDS: [&str; 4] = [
    op_types::CALL,
    op_types::CALLCODE,
    op_types::DELEGATECALL,
    op_types::STATICCALL,
];

/// Call frames that create an account.
pub const CREATE_KINDS: [&str; 2] = [op_types::CREATE, op_types::CREATE2];

pub fn currency() -> Currency {
    Currency {
        symbol: SYMBOL.to_string(),
        decimals: DECIMALS,
    }
}

/// Native amount of `+value`.
pub fn credit(value: U256) -> Amount {
    Amount {
        value: value.to_string(),
        currency: currency(),
    }
}

/// Native amount of `-value`.
pub fn debit(value: U256) -> Amount {
    let value = if value.is_zero() {
        "0".to_string()
    } else {
        format!("-{value}")
    };
    Amount {
        value,
        currency: currency(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_of_zero_has_no_sign() {
        assert_eq!(debit(U256::ZERO).value, "0");
        assert_eq!(debit(U256::from(5u64)).value, "-5");
        assert_eq!(credit(U256::from(5u64)).value, "5");
        assert_eq!(credit(U256::from(5u64)).currency.decimals, 18);
    }
}
