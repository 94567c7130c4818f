// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TomoChain Rosetta Gateway
//!
//! Serves the Rosetta Data and Construction APIs on top of a TomoChain (PoSV)
//! node's JSON-RPC interface.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `chain` - node access, block assembly and operation derivation
//! - `construction` - offline transaction construction
//! - `client` - the interface between the handlers and the chain

pub mod api;
pub mod chain;
pub mod client;
pub mod codec;
pub mod config;
pub mod construction;
pub mod error;
pub mod models;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
