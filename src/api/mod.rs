// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rosetta HTTP surface.
//!
//! Every endpoint is a `POST` with a JSON body. Handlers validate the network
//! identifier, then forward to the [`Client`] or to the construction steps.

use axum::{routing::post, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::chain::BLOCKCHAIN;
use crate::client::Client;
use crate::error::{ApiError, ErrorCode};
use crate::models::NetworkIdentifier;
use crate::state::AppState;

pub mod account;
pub mod block;
pub mod call;
pub mod construction;
pub mod mempool;
pub mod network;

pub fn router<C: Client>(state: AppState<C>) -> Router {
    Router::new()
        .route("/network/list", post(network::list::<C>))
        .route("/network/options", post(network::options::<C>))
        .route("/network/status", post(network::status::<C>))
        .route("/account/balance", post(account::balance::<C>))
        .route("/block", post(block::block::<C>))
        .route("/block/transaction", post(block::block_transaction::<C>))
        .route("/mempool", post(mempool::mempool::<C>))
        .route("/mempool/transaction", post(mempool::mempool_transaction::<C>))
        .route("/construction/derive", post(construction::derive::<C>))
        .route("/construction/preprocess", post(construction::preprocess::<C>))
        .route("/construction/metadata", post(construction::metadata::<C>))
        .route("/construction/payloads", post(construction::payloads::<C>))
        .route("/construction/combine", post(construction::combine::<C>))
        .route("/construction/parse", post(construction::parse::<C>))
        .route("/construction/hash", post(construction::hash::<C>))
        .route("/construction/submit", post(construction::submit::<C>))
        .route("/call", post(call::call::<C>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// The network identifier this gateway serves.
pub fn network_identifier(chain_id: u64) -> NetworkIdentifier {
    NetworkIdentifier {
        blockchain: BLOCKCHAIN.to_string(),
        network: chain_id.to_string(),
        sub_network_identifier: None,
    }
}

/// The chain client, or `UnavailableOffline` in offline mode.
pub(crate) fn online<C>(state: &AppState<C>) -> Result<&C, ApiError> {
    state
        .client
        .as_deref()
        .ok_or_else(|| ApiError::new(ErrorCode::UnavailableOffline))
}

/// Check `network` against the served chain and return its chain id.
///
/// Online, the chain id comes from the node; offline, from the configured
/// network.
pub(crate) async fn validate_network<C: Client>(
    state: &AppState<C>,
    network: &NetworkIdentifier,
) -> Result<u64, ApiError> {
    if network.blockchain != BLOCKCHAIN {
        return Err(ApiError::with_error(
            ErrorCode::InvalidNetwork,
            format!("unsupported blockchain {}", network.blockchain),
        ));
    }
    if network.sub_network_identifier.is_some() {
        return Err(ApiError::with_error(
            ErrorCode::InvalidNetwork,
            "sub networks are not supported",
        ));
    }
    let requested: u64 = network.network.parse().map_err(|_| {
        ApiError::with_error(
            ErrorCode::InvalidNetwork,
            format!("network {} is not a chain id", network.network),
        )
    })?;

    let served = match &state.client {
        Some(client) => client.chain_id().await?,
        None => state.chain_id(),
    };
    if requested != served {
        return Err(ApiError::with_error(
            ErrorCode::InvalidNetwork,
            format!("network {requested} is not served, expected {served}"),
        ));
    }
    Ok(served)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{Config, LogFormat, Mode, Network};
    use crate::testing::InMemoryClient;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    pub(crate) fn config(mode: Mode) -> Config {
        Config {
            mode,
            network: Network::Mainnet,
            listen: "127.0.0.1:8080".parse().unwrap(),
            node_url: "http://localhost:8545".parse().unwrap(),
            trace: Default::default(),
            log_format: LogFormat::Pretty,
        }
    }

    pub(crate) fn online_state(client: InMemoryClient) -> AppState<InMemoryClient> {
        AppState::online(config(Mode::Online), client)
    }

    pub(crate) fn offline_state() -> AppState<InMemoryClient> {
        AppState::offline(config(Mode::Offline))
    }

    pub(crate) fn mainnet() -> NetworkIdentifier {
        network_identifier(88)
    }

    async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(online_state(InMemoryClient::new(88)));
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn network_list_is_served_over_http() {
        let app = router(online_state(InMemoryClient::new(88)));
        let (status, body) = post_json(app, "/network/list", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"network_identifiers": [{"blockchain": "tomochain", "network": "88"}]})
        );
    }

    #[tokio::test]
    async fn offline_endpoints_fail_with_rosetta_error() {
        let app = router(offline_state());
        let (status, body) = post_json(
            app,
            "/block",
            json!({"network_identifier": mainnet(), "block_identifier": {"index": 1}}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], ErrorCode::UnavailableOffline as i32);
    }

    #[tokio::test]
    async fn network_validation_checks_every_field() {
        let state = online_state(InMemoryClient::new(88));
        assert_eq!(validate_network(&state, &mainnet()).await.unwrap(), 88);

        let mut wrong_chain = mainnet();
        wrong_chain.blockchain = "ethereum".to_string();
        let mut sub_network = mainnet();
        sub_network.sub_network_identifier = Some(json!({"network": "shard"}));
        let mut not_a_number = mainnet();
        not_a_number.network = "mainnet".to_string();
        let mut other_chain = mainnet();
        other_chain.network = "89".to_string();

        for network in [wrong_chain, sub_network, not_a_number, other_chain] {
            let err = validate_network(&state, &network).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidNetwork as i32, "{network:?}");
        }
    }

    #[tokio::test]
    async fn offline_validation_uses_configured_network() {
        let state = offline_state();
        assert_eq!(validate_network(&state, &mainnet()).await.unwrap(), 88);
        assert!(online(&state).is_err());
    }
}
