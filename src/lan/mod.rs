/**
 * lan/mod.rs
 *
 * LAN world hosting through a signalling relay:
 * - session handshake with the relay (negotiator)
 * - per-tick packet routing to peers (router)
 * - peer negotiation state and registry (peer)
 * - open/close lifecycle (this file)
 */

mod backend;
mod error;
mod negotiator;
mod peer;
mod router;
mod types;

pub use backend::{
    ChannelPolicy, DefaultChannelPolicy, PeerTransport, RelayConnection, RelaySelector,
    MAX_CHANNEL_NAME_LEN,
};
pub use error::{AdmitError, HostError, RelayError};
pub use peer::{PeerConnection, PeerRegistry};
pub use types::{IceCredentials, IceServer, IceServerKind, PeerStatus, RelayErrorCode, RelayPacket};

use tracing::info;

use crate::config::HostConfig;

/// Hosting session for one local world.
///
/// Owns the relay connection, the session code, the ICE server list and
/// every peer. Driven from a single thread: `host_session` once, then
/// `tick` once per frame.
pub struct LanHost {
    config: HostConfig,
    selector: Box<dyn RelaySelector>,
    transport: Box<dyn PeerTransport>,
    policy: Box<dyn ChannelPolicy>,
    relay: Option<Box<dyn RelayConnection>>,
    code: Option<String>,
    ice_servers: Vec<String>,
    peers: PeerRegistry,
}

impl LanHost {
    /// Create an idle host using the default channel-name policy
    pub fn new(
        config: HostConfig,
        selector: Box<dyn RelaySelector>,
        transport: Box<dyn PeerTransport>,
    ) -> Self {
        Self::with_policy(config, selector, transport, Box::new(DefaultChannelPolicy))
    }

    pub fn with_policy(
        config: HostConfig,
        selector: Box<dyn RelaySelector>,
        transport: Box<dyn PeerTransport>,
        policy: Box<dyn ChannelPolicy>,
    ) -> Self {
        Self {
            config,
            selector,
            transport,
            policy,
            relay: None,
            code: None,
            ice_servers: Vec::new(),
            peers: PeerRegistry::new(),
        }
    }

    /// Close the relay link, disconnect every peer and shut the transport
    /// server down if it is still up
    pub fn close_session(&mut self) {
        self.close_connection_only();
        self.clear_peers();
        if self.transport.is_server_open() {
            info!("closing peer transport server");
            self.transport.close_server();
        }
    }

    /// Drop the relay connection and session code but keep every peer
    pub fn close_connection_only(&mut self) {
        if let Some(mut relay) = self.relay.take() {
            info!(relay = %relay.address(), "closing relay connection");
            relay.close();
            self.code = None;
        }
    }

    /// Disconnect and forget every registered peer
    pub fn clear_peers(&mut self) {
        self.peers.disconnect_all(self.transport.as_mut());
    }

    /// True while the relay link is up or any peer channel is still live
    pub fn is_session_active(&self) -> bool {
        self.relay.is_some() || self.transport.live_peer_count() > 0
    }

    pub fn is_hosting_supported(&self) -> bool {
        self.transport.is_supported()
    }

    pub fn is_relay_open(&self) -> bool {
        self.relay.is_some()
    }

    pub fn has_peers(&self) -> bool {
        self.transport.live_peer_count() > 0
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn current_code(&self) -> &str {
        self.code.as_deref().unwrap_or("<undefined>")
    }

    pub fn current_uri(&self) -> &str {
        self.relay
            .as_ref()
            .map(|relay| relay.address())
            .unwrap_or("<disconnected>")
    }

    pub fn ice_servers(&self) -> &[String] {
        &self.ice_servers
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Forget the relay connection without closing it
    fn clear_relay(&mut self) {
        self.relay = None;
        self.code = None;
    }
}
