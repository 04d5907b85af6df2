/**
 * lan/error.rs
 *
 * Error types for hosting and relay connections
 */

use thiserror::Error;

/// Reasons `LanHost::host_session` can fail. Every variant leaves the host
/// with no relay connection and no session code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no working relay servers available")]
    RelayUnavailable,

    #[error("relay [{uri}] connection lost")]
    ConnectionClosed { uri: String },

    #[error("relay [{uri}] unexpected packet: expected {expected}, got {got}")]
    ProtocolViolation {
        uri: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("relay [{uri}] did not send a handshake in time")]
    HandshakeTimeout { uri: String },

    #[error("relay [{uri}] did not provide ICE servers in time")]
    IceServerTimeout { uri: String },
}

/// Asynchronous failures buffered by a relay connection until drained
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("failed to decode relay packet: {0}")]
    Decode(String),

    #[error("relay transport error: {0}")]
    Transport(String),
}

/// Why a `NewPeer` announcement was not admitted to the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmitError {
    #[error("disallowed channel name '{0}'")]
    Disallowed(String),

    #[error("duplicate client '{0}'")]
    Duplicate(String),
}
