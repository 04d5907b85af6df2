/**
 * lan/router.rs
 *
 * Per-frame relay pump: drain packets, dispatch them to peers, then sweep
 * the peer registry
 */

use tracing::{debug, error, info};

use crate::lan::backend::{ChannelPolicy, PeerTransport, RelayConnection};
use crate::lan::error::AdmitError;
use crate::lan::peer::PeerRegistry;
use crate::lan::types::{RelayErrorCode, RelayPacket};
use crate::lan::LanHost;

impl LanHost {
    /// Advance the session by one frame. Never blocks.
    pub fn tick(&mut self) {
        let mut relay_closed = false;

        if let Some(relay) = self.relay.as_mut() {
            relay.pump();
            while let Some(packet) = relay.try_read_packet() {
                route_packet(
                    relay.as_mut(),
                    &mut self.peers,
                    self.transport.as_mut(),
                    self.policy.as_ref(),
                    packet,
                );
            }
            relay.pump();
            relay_closed = relay.is_closed();
            if relay_closed {
                info!(relay = %relay.address(), "relay connection closed");
            }
        }

        if relay_closed {
            self.clear_relay();
        }

        self.peers
            .sweep(self.transport.as_mut(), self.config.negotiation_timeout);
    }
}

/// Apply one relay packet. Bad or stale packets are logged and dropped.
fn route_packet(
    relay: &mut dyn RelayConnection,
    peers: &mut PeerRegistry,
    transport: &mut dyn PeerTransport,
    policy: &dyn ChannelPolicy,
    packet: RelayPacket,
) {
    let uri = relay.address().to_string();

    match packet {
        RelayPacket::NewPeer { peer_id } => match peers.admit(&peer_id, policy) {
            Ok(()) => debug!(relay = %uri, peer = %peer_id, "new client"),
            Err(AdmitError::Disallowed(id)) => {
                error!(relay = %uri, peer = %id, "relay tried to open disallowed channel name")
            }
            Err(AdmitError::Duplicate(id)) => {
                error!(relay = %uri, peer = %id, "relay provided duplicate client")
            }
        },
        RelayPacket::IceCandidate { peer_id, candidate } => match peers.get_mut(&peer_id) {
            Some(peer) => peer.handle_ice_candidate(transport, &candidate),
            None => unknown_client(&uri, "IceCandidate", &peer_id),
        },
        RelayPacket::Description {
            peer_id,
            description,
        } => match peers.get_mut(&peer_id) {
            Some(peer) => peer.handle_description(transport, &description),
            None => unknown_client(&uri, "Description", &peer_id),
        },
        RelayPacket::PeerSuccess { peer_id } => match peers.get_mut(&peer_id) {
            Some(peer) => peer.handle_success(),
            None => unknown_client(&uri, "PeerSuccess", &peer_id),
        },
        RelayPacket::PeerFailure { peer_id } => match peers.get_mut(&peer_id) {
            Some(peer) => peer.handle_failure(transport),
            None => unknown_client(&uri, "PeerFailure", &peer_id),
        },
        RelayPacket::ErrorCode { code, description } => {
            error!(
                relay = %uri,
                "error code thrown: {}({}): {}",
                RelayErrorCode::from(code),
                code,
                description
            );
            while let Some(err) = relay.drain_exception() {
                error!(relay = %uri, error = %err, "relay exception");
            }
        }
        RelayPacket::Handshake { .. } | RelayPacket::IceServers { .. } | RelayPacket::Unknown => {
            error!(relay = %uri, packet = packet.kind(), "unexpected packet");
        }
    }
}

fn unknown_client(uri: &str, packet: &str, peer_id: &str) {
    error!(relay = %uri, peer = %peer_id, "relay sent {} for unknown client", packet);
}
