/**
 * lan/types.rs
 *
 * Relay packets and peer state shared by the host controller
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Packets the relay delivers to a hosting client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayPacket {
    /// First packet of every session, carries the shareable join code
    Handshake {
        code: String,
    },
    /// STUN/TURN servers the host should hand to its peer transport
    IceServers {
        servers: Vec<IceServer>,
    },
    NewPeer {
        peer_id: String,
    },
    IceCandidate {
        peer_id: String,
        candidate: String,
    },
    Description {
        peer_id: String,
        description: String,
    },
    PeerSuccess {
        peer_id: String,
    },
    PeerFailure {
        peer_id: String,
    },
    ErrorCode {
        code: u8,
        description: String,
    },
    /// Any packet type this client does not understand
    #[serde(other)]
    Unknown,
}

impl RelayPacket {
    /// Stable packet name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            RelayPacket::Handshake { .. } => "Handshake",
            RelayPacket::IceServers { .. } => "IceServers",
            RelayPacket::NewPeer { .. } => "NewPeer",
            RelayPacket::IceCandidate { .. } => "IceCandidate",
            RelayPacket::Description { .. } => "Description",
            RelayPacket::PeerSuccess { .. } => "PeerSuccess",
            RelayPacket::PeerFailure { .. } => "PeerFailure",
            RelayPacket::ErrorCode { .. } => "ErrorCode",
            RelayPacket::Unknown => "Unknown",
        }
    }
}

/// Kind of connectivity-assist server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IceServerKind {
    Stun,
    Turn,
}

impl fmt::Display for IceServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IceServerKind::Stun => write!(f, "STUN"),
            IceServerKind::Turn => write!(f, "TURN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCredentials {
    pub username: String,
    pub password: String,
}

/// One connectivity-assist server advertised by the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub kind: IceServerKind,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<IceCredentials>,
}

impl IceServer {
    pub fn stun(address: impl Into<String>) -> Self {
        Self {
            kind: IceServerKind::Stun,
            address: address.into(),
            credentials: None,
        }
    }

    pub fn turn(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            kind: IceServerKind::Turn,
            address: address.into(),
            credentials: Some(IceCredentials {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// String handed to the peer transport: the bare address, or
    /// `address;username;password` when the server needs credentials
    pub fn ice_string(&self) -> String {
        match &self.credentials {
            Some(creds) => format!("{};{};{}", self.address, creds.username, creds.password),
            None => self.address.clone(),
        }
    }
}

/// Relay error codes carried by `RelayPacket::ErrorCode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorCode {
    InternalError,
    ProtocolVersion,
    InvalidPacket,
    IllegalOperation,
    CodeLength,
    IncorrectCode,
    ServerDisconnected,
    UnknownClient,
    Unrecognized(u8),
}

impl From<u8> for RelayErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0 => RelayErrorCode::InternalError,
            1 => RelayErrorCode::ProtocolVersion,
            2 => RelayErrorCode::InvalidPacket,
            3 => RelayErrorCode::IllegalOperation,
            4 => RelayErrorCode::CodeLength,
            5 => RelayErrorCode::IncorrectCode,
            6 => RelayErrorCode::ServerDisconnected,
            7 => RelayErrorCode::UnknownClient,
            other => RelayErrorCode::Unrecognized(other),
        }
    }
}

impl fmt::Display for RelayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayErrorCode::InternalError => "INTERNAL_ERROR",
            RelayErrorCode::ProtocolVersion => "PROTOCOL_VERSION",
            RelayErrorCode::InvalidPacket => "INVALID_PACKET",
            RelayErrorCode::IllegalOperation => "ILLEGAL_OPERATION",
            RelayErrorCode::CodeLength => "CODE_LENGTH",
            RelayErrorCode::IncorrectCode => "INCORRECT_CODE",
            RelayErrorCode::ServerDisconnected => "SERVER_DISCONNECTED",
            RelayErrorCode::UnknownClient => "UNKNOWN_CLIENT",
            RelayErrorCode::Unrecognized(_) => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Negotiation status of a single remote peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    Announced,
    Negotiating,
    Connected,
    Failed,
}

impl PeerStatus {
    /// Connected and Failed end negotiation; nothing moves a peer out of them
    pub fn is_terminal(self) -> bool {
        matches!(self, PeerStatus::Connected | PeerStatus::Failed)
    }
}
