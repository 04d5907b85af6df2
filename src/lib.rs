#![allow(unused_doc_comments)]
/**
 * This style of comments threw out warnings.
 * This allow statement fixes that
 */

/**
 * lib.rs
 */

pub mod config;
pub mod lan;
pub mod relay;

pub use config::HostConfig;
pub use lan::{HostError, LanHost, PeerTransport, RelayConnection, RelayPacket, RelaySelector};
pub use relay::{RelayManager, WsRelayConnection};
