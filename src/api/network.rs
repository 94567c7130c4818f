// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::{network_identifier, online, validate_network};
use crate::chain::client::CALL_GET_TRANSACTION_RECEIPT;
use crate::chain::{op_types, status as op_status};
use crate::client::Client;
use crate::config::{MIDDLEWARE_VERSION, NODE_VERSION, ROSETTA_VERSION};
use crate::error::ApiError;
use crate::models::{
    Allow, MetadataRequest, NetworkListResponse, NetworkOptionsResponse, NetworkRequest,
    NetworkStatusResponse, OperationStatus, Version,
};
use crate::state::AppState;

pub async fn list<C: Client>(
    State(state): State<AppState<C>>,
    Json(_request): Json<MetadataRequest>,
) -> Result<Json<NetworkListResponse>, ApiError> {
    Ok(Json(NetworkListResponse {
        network_identifiers: vec![network_identifier(state.chain_id())],
    }))
}

pub async fn options<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<NetworkRequest>,
) -> Result<Json<NetworkOptionsResponse>, ApiError> {
    validate_network(&state, &request.network_identifier).await?;

    Ok(Json(NetworkOptionsResponse {
        version: Version {
            rosetta_version: ROSETTA_VERSION.to_string(),
            node_version: NODE_VERSION.to_string(),
            middleware_version: MIDDLEWARE_VERSION.to_string(),
        },
        allow: Allow {
            operation_statuses: vec![
                OperationStatus {
                    status: op_status::SUCCESS.to_string(),
                    successful: true,
                },
                OperationStatus {
                    status: op_status::FAIL.to_string(),
                    successful: false,
                },
            ],
            operation_types: op_types::ALL.iter().map(|t| t.to_string()).collect(),
            errors: ApiError::all(),
            historical_balance_lookup: true,
            call_methods: vec![CALL_GET_TRANSACTION_RECEIPT.to_string()],
        },
    }))
}

pub async fn status<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<NetworkRequest>,
) -> Result<Json<NetworkStatusResponse>, ApiError> {
    let client = online(&state)?;
    validate_network(&state, &request.network_identifier).await?;

    let status = client.status().await?;
    Ok(Json(NetworkStatusResponse {
        current_block_identifier: status.current_block,
        current_block_timestamp: status.current_timestamp,
        genesis_block_identifier: status.genesis_block,
        sync_status: status.sync_status,
        peers: status.peers,
    }))
}
