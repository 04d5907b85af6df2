/**
 * lan/negotiator.rs
 *
 * Opening a hosting session: pick a relay, read its handshake, then wait a
 * bounded time for the ICE server list
 */

use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::lan::backend::RelayConnection;
use crate::lan::error::HostError;
use crate::lan::types::RelayPacket;
use crate::lan::LanHost;

/// Why waiting for the next relay packet stopped without one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitError {
    Closed,
    TimedOut,
}

impl LanHost {
    /// Open a relay session for `world_name` and return its join code.
    ///
    /// Human-readable progress is reported through `progress`. On any error
    /// the host is left without a relay connection or code.
    pub async fn host_session<F>(
        &mut self,
        mut progress: F,
        world_name: &str,
        hidden: bool,
    ) -> Result<String, HostError>
    where
        F: FnMut(&str) + Send,
    {
        self.close_connection_only();
        let descriptor = session_descriptor(world_name, hidden);

        let found = {
            let mut connecting = |msg: &str| progress(&format!("Connecting: {}", msg));
            self.selector
                .find_working_relay(
                    &mut connecting,
                    self.config.preferred_relay_version,
                    &descriptor,
                )
                .await
        };

        let Some(mut relay) = found else {
            warn!(descriptor = %descriptor, "no working relay found");
            self.clear_relay();
            progress("No working relay servers available");
            return Err(HostError::RelayUnavailable);
        };

        let uri = relay.address().to_string();
        progress(&format!("Opening: {}", uri));

        // Step 1: the very first packet must be the handshake
        let code = match next_packet(
            relay.as_mut(),
            self.config.poll_interval,
            self.config.handshake_timeout,
        )
        .await
        {
            Ok(RelayPacket::Handshake { code }) => code,
            Ok(other) => {
                error!(relay = %uri, packet = other.kind(), "expected handshake, got unexpected packet");
                relay.close();
                self.clear_relay();
                return Err(HostError::ProtocolViolation {
                    uri,
                    expected: "Handshake",
                    got: other.kind(),
                });
            }
            Err(WaitError::Closed) => {
                info!(relay = %uri, "connection lost before handshake");
                self.clear_relay();
                return Err(HostError::ConnectionClosed { uri });
            }
            Err(WaitError::TimedOut) => {
                info!(relay = %uri, "handshake timeout");
                relay.close();
                self.clear_relay();
                return Err(HostError::HandshakeTimeout { uri });
            }
        };

        info!(relay = %uri, code = %code, "connected as 'server'");

        // Step 2: the ICE server list, bounded from handshake receipt
        let servers = match next_packet(
            relay.as_mut(),
            self.config.poll_interval,
            self.config.ice_server_timeout,
        )
        .await
        {
            Ok(RelayPacket::IceServers { servers }) => servers,
            Ok(other) => {
                error!(relay = %uri, packet = other.kind(), "unexpected packet");
                relay.close();
                self.close_session();
                return Err(HostError::ProtocolViolation {
                    uri,
                    expected: "IceServers",
                    got: other.kind(),
                });
            }
            Err(WaitError::Closed) => {
                info!(relay = %uri, "connection lost");
                self.clear_relay();
                return Err(HostError::ConnectionClosed { uri });
            }
            Err(WaitError::TimedOut) => {
                info!(relay = %uri, "relay provide ICE servers timeout");
                relay.close();
                self.close_session();
                return Err(HostError::IceServerTimeout { uri });
            }
        };

        info!(relay = %uri, "relay provided ICE servers:");
        self.ice_servers.clear();
        for server in &servers {
            info!(relay = %uri, "    {}: {}", server.kind, server.address);
            self.ice_servers.push(server.ice_string());
        }
        self.transport.initialize_server(&self.ice_servers);

        self.relay = Some(relay);
        self.code = Some(code.clone());
        progress(&format!("Opened '{}' on {}", code, uri));

        Ok(code)
    }
}

/// Descriptor the relay lists the world under: `name;1` when hidden
pub(crate) fn session_descriptor(world_name: &str, hidden: bool) -> String {
    format!("{};{}", world_name, if hidden { 1 } else { 0 })
}

/// Poll `relay` until it yields a packet, closes, or `limit` elapses
async fn next_packet(
    relay: &mut dyn RelayConnection,
    poll_interval: Duration,
    limit: Duration,
) -> Result<RelayPacket, WaitError> {
    let period = poll_interval.max(Duration::from_millis(1));
    let started = Instant::now();
    let mut poll = time::interval_at(started + period, period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        relay.pump();
        if relay.is_closed() {
            return Err(WaitError::Closed);
        }
        if let Some(packet) = relay.try_read_packet() {
            return Ok(packet);
        }

        poll.tick().await;
        if started.elapsed() >= limit {
            return Err(WaitError::TimedOut);
        }
    }
}
