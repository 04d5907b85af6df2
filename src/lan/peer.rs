/**
 * lan/peer.rs
 *
 * Per-peer negotiation state and the registry that owns it
 */

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::lan::backend::{ChannelPolicy, PeerTransport};
use crate::lan::error::AdmitError;
use crate::lan::types::PeerStatus;

/// Negotiation state for one remote peer announced by the relay
#[derive(Debug, Clone)]
pub struct PeerConnection {
    peer_id: String,
    status: PeerStatus,
    dead: bool,
    announced_at: Instant,
}

impl PeerConnection {
    pub fn new(peer_id: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            status: PeerStatus::Announced,
            dead: false,
            announced_at: Instant::now(),
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn status(&self) -> PeerStatus {
        self.status
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn handle_ice_candidate(&mut self, transport: &mut dyn PeerTransport, candidate: &str) {
        self.begin_negotiating();
        transport.signal_ice_candidate(&self.peer_id, candidate);
    }

    pub fn handle_description(&mut self, transport: &mut dyn PeerTransport, description: &str) {
        self.begin_negotiating();
        transport.signal_description(&self.peer_id, description);
    }

    pub fn handle_success(&mut self) {
        if !self.status.is_terminal() {
            self.status = PeerStatus::Connected;
        }
    }

    pub fn handle_failure(&mut self, transport: &mut dyn PeerTransport) {
        if self.status.is_terminal() {
            return;
        }
        self.status = PeerStatus::Failed;
        self.disconnect(transport);
    }

    /// Explicit removal; the registry reaps the peer on its next sweep
    pub fn disconnect(&mut self, transport: &mut dyn PeerTransport) {
        if !self.dead {
            self.dead = true;
            transport.drop_peer(&self.peer_id);
        }
    }

    /// Refresh `dead` from the status and the transport's view of the peer
    pub fn tick(&mut self, transport: &mut dyn PeerTransport, negotiation_timeout: Duration) {
        if self.dead {
            return;
        }

        let dead = match self.status {
            PeerStatus::Failed => true,
            PeerStatus::Connected => !transport.is_peer_alive(&self.peer_id),
            PeerStatus::Announced | PeerStatus::Negotiating => {
                self.announced_at.elapsed() > negotiation_timeout
            }
        };

        if dead {
            self.disconnect(transport);
        }
    }

    fn begin_negotiating(&mut self) {
        if self.status == PeerStatus::Announced {
            self.status = PeerStatus::Negotiating;
        }
    }
}

/// All peers currently known to the host, keyed by relay peer id
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<String, PeerConnection>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly announced peer. The id must pass the policy and must
    /// not already be present.
    pub fn admit(&mut self, peer_id: &str, policy: &dyn ChannelPolicy) -> Result<(), AdmitError> {
        if !policy.is_channel_name_allowed(peer_id) {
            return Err(AdmitError::Disallowed(peer_id.to_string()));
        }
        if self.peers.contains_key(peer_id) {
            return Err(AdmitError::Duplicate(peer_id.to_string()));
        }
        self.peers
            .insert(peer_id.to_string(), PeerConnection::new(peer_id));
        Ok(())
    }

    pub fn get(&self, peer_id: &str) -> Option<&PeerConnection> {
        self.peers.get(peer_id)
    }

    pub fn get_mut(&mut self, peer_id: &str) -> Option<&mut PeerConnection> {
        self.peers.get_mut(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerConnection> {
        self.peers.values()
    }

    /// Tick every peer, then drop the ones that ended up dead
    pub fn sweep(&mut self, transport: &mut dyn PeerTransport, negotiation_timeout: Duration) {
        self.peers.retain(|_, peer| {
            peer.tick(transport, negotiation_timeout);
            !peer.is_dead()
        });
    }

    /// Disconnect every peer and empty the registry
    pub fn disconnect_all(&mut self, transport: &mut dyn PeerTransport) {
        for peer in self.peers.values_mut() {
            peer.disconnect(transport);
        }
        self.peers.clear();
    }
}
