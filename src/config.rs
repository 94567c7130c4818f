// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MODE` | `ONLINE` or `OFFLINE` | Required |
//! | `NETWORK` | `MAINNET`, `TESTNET` or `DEVNET` | Required |
//! | `PORT` | Server bind port | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `TOMO` | Node JSON-RPC URL | `http://localhost:8545` |
//! | `TRACE_CONCURRENCY` | Maximum in-flight trace requests | `16` |
//! | `TRACER` | Tracer passed to the debug trace methods | `callTracer` |
//! | `TRACE_TIMEOUT` | Tracer timeout | `120s` |
//! | `TRACE_BY_BLOCK` | One block trace call instead of one per transaction | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use url::Url;

use crate::chain::assembler::TraceConfig;

pub const MODE_ENV: &str = "MODE";
pub const NETWORK_ENV: &str = "NETWORK";
pub const PORT_ENV: &str = "PORT";
pub const HOST_ENV: &str = "HOST";
/// Node JSON-RPC endpoint. Ignored in offline mode.
pub const NODE_URL_ENV: &str = "TOMO";
pub const TRACE_CONCURRENCY_ENV: &str = "TRACE_CONCURRENCY";
pub const TRACER_ENV: &str = "TRACER";
pub const TRACE_TIMEOUT_ENV: &str = "TRACE_TIMEOUT";
pub const TRACE_BY_BLOCK_ENV: &str = "TRACE_BY_BLOCK";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_NODE_URL: &str = "http://localhost:8545";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Node version reported by `/network/options`.
pub const NODE_VERSION: &str = "v2.3.0";
pub const ROSETTA_VERSION: &str = "1.4.10";
pub const MIDDLEWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Online,
    Offline,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(Self::Online),
            "OFFLINE" => Ok(Self::Offline),
            other => Err(format!("expected ONLINE or OFFLINE, got {other}")),
        }
    }
}

/// Supported TomoChain networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl Network {
    pub fn chain_id(self) -> u64 {
        match self {
            Self::Mainnet => 88,
            Self::Testnet => 89,
            Self::Devnet => 1992,
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAINNET" => Ok(Self::Mainnet),
            "TESTNET" => Ok(Self::Testnet),
            "DEVNET" => Ok(Self::Devnet),
            other => Err(format!("expected MAINNET, TESTNET or DEVNET, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("expected json or pretty, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
    pub network: Network,
    pub listen: SocketAddr,
    pub node_url: Url,
    pub trace: TraceConfig,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let mode = {
            let raw = required(MODE_ENV)?;
            Mode::from_str(&raw).map_err(|e| ConfigError::invalid(MODE_ENV, &raw, e))?
        };
        let network = {
            let raw = required(NETWORK_ENV)?;
            Network::from_str(&raw).map_err(|e| ConfigError::invalid(NETWORK_ENV, &raw, e))?
        };
        let port: u16 = {
            let raw = required(PORT_ENV)?;
            raw.parse().map_err(|e| ConfigError::invalid(PORT_ENV, &raw, e))?
        };
        let host: IpAddr = {
            let raw = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
            raw.parse().map_err(|e| ConfigError::invalid(HOST_ENV, &raw, e))?
        };
        let node_url = {
            let raw = lookup(NODE_URL_ENV).unwrap_or_else(|| DEFAULT_NODE_URL.to_string());
            Url::parse(&raw).map_err(|e| ConfigError::invalid(NODE_URL_ENV, &raw, e))?
        };

        let mut trace = TraceConfig::default();
        if let Some(raw) = lookup(TRACE_CONCURRENCY_ENV) {
            trace.concurrency = match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::invalid(
                        TRACE_CONCURRENCY_ENV,
                        &raw,
                        "must be at least 1",
                    ))
                }
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid(TRACE_CONCURRENCY_ENV, &raw, e)),
            };
        }
        if let Some(tracer) = lookup(TRACER_ENV) {
            trace.tracer = tracer;
        }
        if let Some(timeout) = lookup(TRACE_TIMEOUT_ENV) {
            trace.timeout = timeout;
        }
        if let Some(raw) = lookup(TRACE_BY_BLOCK_ENV) {
            trace.by_block = raw
                .parse()
                .map_err(|e| ConfigError::invalid(TRACE_BY_BLOCK_ENV, &raw, e))?;
        }

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(raw) => {
                LogFormat::from_str(&raw).map_err(|e| ConfigError::invalid(LOG_FORMAT_ENV, &raw, e))?
            }
            None => LogFormat::default(),
        };

        Ok(Self {
            mode,
            network,
            listen: SocketAddr::new(host, port),
            node_url,
            trace,
            log_format,
        })
    }

    pub fn is_online(&self) -> bool {
        self.mode == Mode::Online
    }
}
