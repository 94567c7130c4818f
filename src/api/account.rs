// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::str::FromStr;

use alloy::primitives::Address;
use axum::{extract::State, Json};
use serde_json::json;

use super::{online, validate_network};
use crate::chain::credit;
use crate::client::{BlockSelector, Client};
use crate::error::{ApiError, ErrorCode};
use crate::models::{AccountBalanceRequest, AccountBalanceResponse, JsonMap};
use crate::state::AppState;

pub async fn balance<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<AccountBalanceRequest>,
) -> Result<Json<AccountBalanceResponse>, ApiError> {
    let client = online(&state)?;
    validate_network(&state, &request.network_identifier).await?;

    let address = Address::from_str(&request.account_identifier.address)
        .map_err(|e| ApiError::with_error(ErrorCode::InvalidInput, e))?;
    let selector = BlockSelector::from_partial(&request.block_identifier.unwrap_or_default())?;

    let balance = client.balance(address, selector).await?;
    let mut metadata = JsonMap::new();
    metadata.insert("nonce".to_string(), json!(balance.nonce));

    Ok(Json(AccountBalanceResponse {
        block_identifier: balance.block,
        balances: vec![credit(balance.balance)],
        metadata: Some(metadata),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{mainnet, offline_state, online_state};
    use crate::models::AccountIdentifier;
    use crate::testing::{addr, InMemoryClient};
    use alloy::primitives::U256;

    fn request(address: &str) -> Json<AccountBalanceRequest> {
        Json(AccountBalanceRequest {
            network_identifier: mainnet(),
            account_identifier: AccountIdentifier::new(address),
            block_identifier: None,
        })
    }

    #[tokio::test]
    async fn balance_returns_native_amount_and_nonce() {
        let mut client = InMemoryClient::new(88);
        client.balance = U256::from(5_000u64);
        client.nonce = 3;

        let Json(response) = balance(
            State(online_state(client)),
            request(&addr(1).to_checksum(None)),
        )
        .await
        .unwrap();
        assert_eq!(response.balances.len(), 1);
        assert_eq!(response.balances[0].value, "5000");
        assert_eq!(response.balances[0].currency.symbol, "TOMO");
        assert_eq!(response.metadata.unwrap()["nonce"], 3);
    }

    #[tokio::test]
    async fn malformed_address_is_invalid_input() {
        let err = balance(State(online_state(InMemoryClient::new(88))), request("0x12"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput as i32);
    }

    #[tokio::test]
    async fn balance_is_unavailable_offline() {
        let err = balance(State(offline_state()), request(&addr(1).to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnavailableOffline as i32);
    }
}
