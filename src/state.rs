// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::client::Client;
use crate::config::Config;

/// Shared handler state. `client` is `None` in offline mode.
pub struct AppState<C> {
    pub config: Arc<Config>,
    pub client: Option<Arc<C>>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            client: self.client.clone(),
        }
    }
}

impl<C: Client> AppState<C> {
    pub fn online(config: Config, client: C) -> Self {
        Self {
            config: Arc::new(config),
            client: Some(Arc::new(client)),
        }
    }

    pub fn offline(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            client: None,
        }
    }

    /// Chain id of the configured network.
    pub fn chain_id(&self) -> u64 {
        self.config.network.chain_id()
    }
}
