// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tomochain_rosetta::api::router;
use tomochain_rosetta::chain::{HttpRpc, TomoClient};
use tomochain_rosetta::config::{Config, LogFormat, DEFAULT_LOG_FILTER};
use tomochain_rosetta::state::AppState;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown requested");
    token.cancel();
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    let listen = config.listen;
    let app = if config.is_online() {
        let rpc = match HttpRpc::new(config.node_url.as_str()) {
            Ok(rpc) => rpc,
            Err(e) => {
                tracing::error!(error = %e, node = %config.node_url, "cannot create node client");
                return ExitCode::FAILURE;
            }
        };
        tracing::info!(
            node = %config.node_url,
            network = ?config.network,
            trace_concurrency = config.trace.concurrency,
            "starting online gateway"
        );
        let client = TomoClient::new(rpc, config.trace.clone());
        router(AppState::online(config, client))
    } else {
        tracing::info!(network = ?config.network, "starting offline gateway");
        router(AppState::<TomoClient<HttpRpc>>::offline(config))
    };

    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %listen, "cannot bind listener");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%listen, "rosetta gateway listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;
    match served {
        Ok(()) => {
            tracing::info!("rosetta gateway stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
