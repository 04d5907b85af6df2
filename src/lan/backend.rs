/**
 * lan/backend.rs
 *
 * Collaborators the host controller drives: the relay link, relay
 * selection, the peer-to-peer transport and the channel-name policy
 */

use async_trait::async_trait;

use crate::lan::error::RelayError;
use crate::lan::types::RelayPacket;

/// One live connection to a relay server.
///
/// All methods are non-blocking. `pump` moves whatever the connection has
/// received since the last call into its read queue.
pub trait RelayConnection: Send {
    fn pump(&mut self);

    /// Next buffered packet in delivery order
    fn try_read_packet(&mut self) -> Option<RelayPacket>;

    fn is_closed(&self) -> bool;

    fn address(&self) -> &str;

    /// Next buffered asynchronous failure, oldest first
    fn drain_exception(&mut self) -> Option<RelayError>;

    fn close(&mut self);
}

/// Picks a relay that accepts a hosting connection
#[async_trait]
pub trait RelaySelector: Send + Sync {
    async fn find_working_relay(
        &self,
        progress: &mut (dyn for<'p> FnMut(&'p str) + Send),
        preferred_version: u32,
        descriptor: &str,
    ) -> Option<Box<dyn RelayConnection>>;
}

/// Peer-to-peer data channel backend (WebRTC or similar)
pub trait PeerTransport: Send {
    /// Start accepting peers using the given ICE server strings
    fn initialize_server(&mut self, ice_servers: &[String]);

    fn signal_ice_candidate(&mut self, peer_id: &str, candidate: &str);

    fn signal_description(&mut self, peer_id: &str, description: &str);

    /// Tear down any channel state held for this peer
    fn drop_peer(&mut self, peer_id: &str);

    fn is_peer_alive(&self, peer_id: &str) -> bool;

    fn live_peer_count(&self) -> usize;

    fn is_server_open(&self) -> bool;

    fn close_server(&mut self);

    /// Whether this platform can host at all
    fn is_supported(&self) -> bool;
}

/// Decides which peer identifiers may open a channel
pub trait ChannelPolicy: Send + Sync {
    fn is_channel_name_allowed(&self, name: &str) -> bool;
}

/// Longest peer identifier `DefaultChannelPolicy` accepts
pub const MAX_CHANNEL_NAME_LEN: usize = 64;

/// Accepts short identifiers made of ASCII letters, digits, `-`, `_` and `.`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultChannelPolicy;

impl ChannelPolicy for DefaultChannelPolicy {
    fn is_channel_name_allowed(&self, name: &str) -> bool {
        !name.is_empty()
            && name.len() <= MAX_CHANNEL_NAME_LEN
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }
}
