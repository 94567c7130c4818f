// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Construction endpoints. Only `/metadata` and `/submit` need the node.

use axum::{extract::State, Json};

use super::{online, validate_network};
use crate::client::Client;
use crate::construction::{self, from_json_map, to_json_map, Metadata, Options};
use crate::error::ApiError;
use crate::models::{
    ConstructionCombineRequest, ConstructionCombineResponse, ConstructionDeriveRequest,
    ConstructionDeriveResponse, ConstructionMetadataRequest, ConstructionMetadataResponse,
    ConstructionParseRequest, ConstructionParseResponse, ConstructionPayloadsRequest,
    ConstructionPayloadsResponse, ConstructionPreprocessRequest, ConstructionPreprocessResponse,
    SignedTransactionRequest, TransactionIdentifierResponse,
};
use crate::state::AppState;

pub async fn derive<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<ConstructionDeriveRequest>,
) -> Result<Json<ConstructionDeriveResponse>, ApiError> {
    validate_network(&state, &request.network_identifier).await?;
    let account_identifier = construction::derive(&request.public_key)?;
    Ok(Json(ConstructionDeriveResponse { account_identifier }))
}

pub async fn preprocess<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<ConstructionPreprocessRequest>,
) -> Result<Json<ConstructionPreprocessResponse>, ApiError> {
    validate_network(&state, &request.network_identifier).await?;
    let options = construction::preprocess(&request.operations, request.metadata.as_ref())?;
    Ok(Json(ConstructionPreprocessResponse {
        options: to_json_map(&options)?,
    }))
}

pub async fn metadata<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<ConstructionMetadataRequest>,
) -> Result<Json<ConstructionMetadataResponse>, ApiError> {
    let client = online(&state)?;
    validate_network(&state, &request.network_identifier).await?;

    let options: Options = from_json_map(request.options)?;
    let (metadata, fee) = construction::metadata(client, &options).await?;
    Ok(Json(ConstructionMetadataResponse {
        metadata: to_json_map(&metadata)?,
        suggested_fee: vec![fee],
    }))
}

pub async fn payloads<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<ConstructionPayloadsRequest>,
) -> Result<Json<ConstructionPayloadsResponse>, ApiError> {
    let chain_id = validate_network(&state, &request.network_identifier).await?;

    let metadata: Metadata = from_json_map(request.metadata)?;
    let (unsigned_transaction, payload) =
        construction::payloads(&request.operations, &metadata, chain_id)?;
    Ok(Json(ConstructionPayloadsResponse {
        unsigned_transaction,
        payloads: vec![payload],
    }))
}

pub async fn combine<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<ConstructionCombineRequest>,
) -> Result<Json<ConstructionCombineResponse>, ApiError> {
    let chain_id = validate_network(&state, &request.network_identifier).await?;
    let signed_transaction =
        construction::combine(&request.unsigned_transaction, &request.signatures, chain_id)?;
    Ok(Json(ConstructionCombineResponse { signed_transaction }))
}

pub async fn parse<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<ConstructionParseRequest>,
) -> Result<Json<ConstructionParseResponse>, ApiError> {
    let chain_id = validate_network(&state, &request.network_identifier).await?;
    Ok(Json(construction::parse(
        &request.transaction,
        request.signed,
        chain_id,
    )?))
}

pub async fn hash<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<SignedTransactionRequest>,
) -> Result<Json<TransactionIdentifierResponse>, ApiError> {
    validate_network(&state, &request.network_identifier).await?;
    let transaction_identifier = construction::hash(&request.signed_transaction)?;
    Ok(Json(TransactionIdentifierResponse {
        transaction_identifier,
    }))
}

pub async fn submit<C: Client>(
    State(state): State<AppState<C>>,
    Json(request): Json<SignedTransactionRequest>,
) -> Result<Json<TransactionIdentifierResponse>, ApiError> {
    let client = online(&state)?;
    validate_network(&state, &request.network_identifier).await?;

    let transaction_identifier = construction::submit(client, &request.signed_transaction)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "transaction submission failed"))?;
    tracing::info!(tx = %transaction_identifier.hash, "transaction relayed");
    Ok(Json(TransactionIdentifierResponse {
        transaction_identifier,
    }))
}
