/**
 * relay/mod.rs
 *
 * Concrete relay collaborators:
 * - WebSocket relay connection with a background reader task
 * - Relay manager that picks the first relay accepting a host
 */

mod manager;
mod websocket;

pub use manager::RelayManager;
pub use websocket::{HostRequest, WsRelayConnection};
