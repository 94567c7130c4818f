// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::{online, validate_network};
use crate::client::{BlockSelector, Client};
use crate::error::{ApiError, ErrorCode};
use crate::models::{BlockRequest, BlockResponse, BlockTransactionRequest};
use crate::state::AppState;

pub async fn block<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<BlockRequest>,
) -> Result<Json<BlockResponse>, ApiError> {
    let client = online(&state)?;
    validate_network(&state, &request.network_identifier).await?;

    let selector = BlockSelector::from_partial(&request.block_identifier)?;
    let block = client.block(selector).await.inspect_err(|e| {
        tracing::warn!(selector = ?selector, error = %e, "block assembly failed");
    })?;
    Ok(Json(BlockResponse { block }))
}

/// Every transaction is already returned by `/block`.
pub async fn block_transaction<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<BlockTransactionRequest>,
) -> Result<Json<BlockResponse>, ApiError> {
    online(&state)?;
    validate_network(&state, &request.network_identifier).await?;
    Err(ApiError::new(ErrorCode::NotImplemented))
}
