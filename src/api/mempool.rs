// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::str::FromStr;

use alloy::primitives::B256;
use axum::{extract::State, Json};

use super::{online, validate_network};
use crate::client::Client;
use crate::error::{ApiError, ErrorCode};
use crate::models::{
    MempoolResponse, MempoolTransactionRequest, MempoolTransactionResponse, NetworkRequest,
    TransactionIdentifier,
};
use crate::state::AppState;

pub async fn mempool<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<NetworkRequest>,
) -> Result<Json<MempoolResponse>, ApiError> {
    let client = online(&state)?;
    validate_network(&state, &request.network_identifier).await?;

    let hashes = client.mempool().await?;
    Ok(Json(MempoolResponse {
        transaction_identifiers: hashes
            .into_iter()
            .map(|hash| TransactionIdentifier {
                hash: hash.to_string(),
            })
            .collect(),
    }))
}

pub async fn mempool_transaction<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<MempoolTransactionRequest>,
) -> Result<Json<MempoolTransactionResponse>, ApiError> {
    let client = online(&state)?;
    validate_network(&state, &request.network_identifier).await?;

    let hash = B256::from_str(&request.transaction_identifier.hash)
        .map_err(|e| ApiError::with_error(ErrorCode::InvalidInput, e))?;
    let transaction = client.mempool_transaction(hash).await?;
    Ok(Json(MempoolTransactionResponse { transaction }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{mainnet, online_state};
    use crate::chain::client::pending_view;
    use crate::testing::{addr, transfer, InMemoryClient};

    fn client_with_pending() -> InMemoryClient {
        let mut client = InMemoryClient::new(88);
        client.mempool = vec![
            pending_view(&transfer(0x0a, addr(1), addr(2), 10, 1)),
            pending_view(&transfer(0x0b, addr(3), addr(4), 20, 1)),
        ];
        client
    }

    #[tokio::test]
    async fn mempool_lists_pending_hashes() {
        let Json(response) = mempool(
            State(online_state(client_with_pending())),
            Json(NetworkRequest {
                network_identifier: mainnet(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.transaction_identifiers.len(), 2);
        assert_eq!(
            response.transaction_identifiers[1].hash,
            B256::repeat_byte(0x0b).to_string()
        );
    }

    #[tokio::test]
    async fn mempool_transaction_returns_operations() {
        let Json(response) = mempool_transaction(
            State(online_state(client_with_pending())),
            Json(MempoolTransactionRequest {
                network_identifier: mainnet(),
                transaction_identifier: TransactionIdentifier {
                    hash: B256::repeat_byte(0x0a).to_string(),
                },
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.transaction.operations.len(), 2);
    }

    #[tokio::test]
    async fn unknown_pending_transaction_is_not_found() {
        let err = mempool_transaction(
            State(online_state(client_with_pending())),
            Json(MempoolTransactionRequest {
                network_identifier: mainnet(),
                transaction_identifier: TransactionIdentifier {
                    hash: B256::repeat_byte(0x0c).to_string(),
                },
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound as i32);
    }
}
