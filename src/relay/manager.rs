/**
 * relay/manager.rs
 *
 * Relay selection: try each configured relay in preference order
 */

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::HostConfig;
use crate::lan::{RelayConnection, RelaySelector};
use crate::relay::websocket::WsRelayConnection;

/// Known relay servers, tried in order until one accepts the host
#[derive(Debug, Clone)]
pub struct RelayManager {
    relays: Vec<String>,
    connect_timeout: Duration,
    accept_invalid_certs: bool,
}

impl RelayManager {
    pub fn new(relays: Vec<String>, connect_timeout: Duration) -> Self {
        Self {
            relays,
            connect_timeout,
            accept_invalid_certs: false,
        }
    }

    /// Build from the relay settings of a host configuration
    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            relays: config.relay_urls.clone(),
            connect_timeout: config.connect_timeout,
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }

    /// Allow self-signed relay certificates (development only)
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn relays(&self) -> &[String] {
        &self.relays
    }
}

#[async_trait]
impl RelaySelector for RelayManager {
    async fn find_working_relay(
        &self,
        progress: &mut (dyn for<'p> FnMut(&'p str) + Send),
        preferred_version: u32,
        descriptor: &str,
    ) -> Option<Box<dyn RelayConnection>> {
        for uri in &self.relays {
            progress(uri);

            let attempt = tokio::time::timeout(
                self.connect_timeout,
                WsRelayConnection::connect(
                    uri,
                    preferred_version,
                    descriptor,
                    self.accept_invalid_certs,
                ),
            )
            .await;

            match attempt {
                Ok(Ok(conn)) => {
                    info!(relay = %uri, "relay accepted host connection");
                    return Some(Box::new(conn));
                }
                Ok(Err(e)) => {
                    warn!(relay = %uri, error = %format!("{:#}", e), "relay connection failed");
                }
                Err(_) => {
                    warn!(relay = %uri, timeout_ms = self.connect_timeout.as_millis() as u64, "relay connection timed out");
                }
            }
        }

        None
    }
}
