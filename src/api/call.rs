// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::{online, validate_network};
use crate::client::Client;
use crate::error::ApiError;
use crate::models::{CallRequest, CallResponse};
use crate::state::AppState;

pub async fn call<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<CallRequest>,
) -> Result<Json<CallResponse>, ApiError> {
    let client = online(&state)?;
    validate_network(&state, &request.network_identifier).await?;

    let result = client.call(request.method, request.parameters).await?;
    Ok(Json(CallResponse {
        result,
        idempotent: false,
    }))
}
