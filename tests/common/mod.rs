/*
 * tests/common/mod.rs
 *
 * Scripted relay, selector and transport fakes shared by the integration tests
 */

#![allow(dead_code)]

use async_trait::async_trait;
use lanshare::lan::{
    IceServer, PeerTransport, RelayConnection, RelayError, RelayPacket, RelaySelector,
};
use lanshare::{HostConfig, LanHost};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const RELAY_URI: &str = "wss://relay.test";

#[derive(Default)]
pub struct RelayState {
    scheduled: Vec<(Duration, RelayPacket)>,
    ready: VecDeque<RelayPacket>,
    exceptions: VecDeque<RelayError>,
    close_at: Option<Duration>,
    closed: bool,
    close_calls: usize,
}

/// Test-side handle onto a `ScriptedRelay`
#[derive(Clone)]
pub struct RelayHandle {
    state: Arc<Mutex<RelayState>>,
}

impl RelayHandle {
    /// Deliver `packet` on the next pump
    pub fn push(&self, packet: RelayPacket) {
        self.state.lock().unwrap().ready.push_back(packet);
    }

    /// Deliver `packet` once `at` has elapsed since the relay was opened
    pub fn schedule(&self, at: Duration, packet: RelayPacket) {
        self.state.lock().unwrap().scheduled.push((at, packet));
    }

    pub fn push_exception(&self, err: RelayError) {
        self.state.lock().unwrap().exceptions.push_back(err);
    }

    pub fn close_at(&self, at: Duration) {
        self.state.lock().unwrap().close_at = Some(at);
    }

    pub fn close_remotely(&self) {
        self.state.lock().unwrap().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    pub fn pending_exceptions(&self) -> usize {
        self.state.lock().unwrap().exceptions.len()
    }
}

/// Relay connection whose packets are scripted against the tokio clock
pub struct ScriptedRelay {
    uri: String,
    opened_at: Instant,
    state: Arc<Mutex<RelayState>>,
}

impl ScriptedRelay {
    pub fn new() -> (Self, RelayHandle) {
        let state = Arc::new(Mutex::new(RelayState::default()));
        let relay = Self {
            uri: RELAY_URI.to_string(),
            opened_at: Instant::now(),
            state: Arc::clone(&state),
        };
        (relay, RelayHandle { state })
    }
}

impl RelayConnection for ScriptedRelay {
    fn pump(&mut self) {
        let elapsed = self.opened_at.elapsed();
        let mut state = self.state.lock().unwrap();

        let (due, later): (Vec<_>, Vec<_>) = state
            .scheduled
            .drain(..)
            .partition(|(at, _)| *at <= elapsed);
        state.scheduled = later;
        let mut due = due;
        due.sort_by_key(|(at, _)| *at);
        state.ready.extend(due.into_iter().map(|(_, packet)| packet));

        if matches!(state.close_at, Some(at) if at <= elapsed) {
            state.closed = true;
        }
    }

    fn try_read_packet(&mut self) -> Option<RelayPacket> {
        self.state.lock().unwrap().ready.pop_front()
    }

    fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn address(&self) -> &str {
        &self.uri
    }

    fn drain_exception(&mut self) -> Option<RelayError> {
        self.state.lock().unwrap().exceptions.pop_front()
    }

    fn close(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.close_calls += 1;
    }
}

/// What the host asked the selector for
#[derive(Debug, Clone, Default)]
pub struct SelectorCalls {
    pub descriptors: Vec<String>,
    pub versions: Vec<u32>,
}

/// Hands out one prepared relay, or none at all
pub struct ScriptedSelector {
    relay: Mutex<Option<ScriptedRelay>>,
    calls: Arc<Mutex<SelectorCalls>>,
}

impl ScriptedSelector {
    pub fn with_relay(relay: ScriptedRelay) -> (Self, Arc<Mutex<SelectorCalls>>) {
        Self::build(Some(relay))
    }

    pub fn empty() -> (Self, Arc<Mutex<SelectorCalls>>) {
        Self::build(None)
    }

    fn build(relay: Option<ScriptedRelay>) -> (Self, Arc<Mutex<SelectorCalls>>) {
        let calls = Arc::new(Mutex::new(SelectorCalls::default()));
        let selector = Self {
            relay: Mutex::new(relay),
            calls: Arc::clone(&calls),
        };
        (selector, calls)
    }
}

#[async_trait]
impl RelaySelector for ScriptedSelector {
    async fn find_working_relay(
        &self,
        progress: &mut (dyn for<'p> FnMut(&'p str) + Send),
        preferred_version: u32,
        descriptor: &str,
    ) -> Option<Box<dyn RelayConnection>> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.descriptors.push(descriptor.to_string());
            calls.versions.push(preferred_version);
        }
        progress(RELAY_URI);
        let relay = self.relay.lock().unwrap().take()?;
        Some(Box::new(relay))
    }
}

#[derive(Debug, Default)]
pub struct TransportState {
    pub initialized: Option<Vec<String>>,
    pub signals: Vec<(String, String)>,
    pub alive: HashSet<String>,
    pub dropped: Vec<String>,
    pub server_open: bool,
    pub close_server_calls: usize,
    pub unsupported: bool,
}

/// Records every call. A peer counts as alive once it has sent a
/// description, until it is dropped.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub state: Arc<Mutex<TransportState>>,
}

impl RecordingTransport {
    pub fn initialized(&self) -> Option<Vec<String>> {
        self.state.lock().unwrap().initialized.clone()
    }

    pub fn signals(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().signals.clone()
    }

    pub fn dropped(&self) -> Vec<String> {
        self.state.lock().unwrap().dropped.clone()
    }

    pub fn set_alive(&self, peer_id: &str, alive: bool) {
        let mut state = self.state.lock().unwrap();
        if alive {
            state.alive.insert(peer_id.to_string());
        } else {
            state.alive.remove(peer_id);
        }
    }

    pub fn close_server_calls(&self) -> usize {
        self.state.lock().unwrap().close_server_calls
    }
}

impl PeerTransport for RecordingTransport {
    fn initialize_server(&mut self, ice_servers: &[String]) {
        let mut state = self.state.lock().unwrap();
        state.initialized = Some(ice_servers.to_vec());
        state.server_open = true;
    }

    fn signal_ice_candidate(&mut self, peer_id: &str, candidate: &str) {
        let mut state = self.state.lock().unwrap();
        state.signals.push((peer_id.to_string(), candidate.to_string()));
    }

    fn signal_description(&mut self, peer_id: &str, description: &str) {
        let mut state = self.state.lock().unwrap();
        state.signals.push((peer_id.to_string(), description.to_string()));
        state.alive.insert(peer_id.to_string());
    }

    fn drop_peer(&mut self, peer_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.alive.remove(peer_id);
        state.dropped.push(peer_id.to_string());
    }

    fn is_peer_alive(&self, peer_id: &str) -> bool {
        self.state.lock().unwrap().alive.contains(peer_id)
    }

    fn live_peer_count(&self) -> usize {
        self.state.lock().unwrap().alive.len()
    }

    fn is_server_open(&self) -> bool {
        self.state.lock().unwrap().server_open
    }

    fn close_server(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.server_open = false;
        state.close_server_calls += 1;
    }

    fn is_supported(&self) -> bool {
        !self.state.lock().unwrap().unsupported
    }
}

pub fn handshake(code: &str) -> RelayPacket {
    RelayPacket::Handshake {
        code: code.to_string(),
    }
}

pub fn ice_servers(servers: Vec<IceServer>) -> RelayPacket {
    RelayPacket::IceServers { servers }
}

pub fn new_peer(peer_id: &str) -> RelayPacket {
    RelayPacket::NewPeer {
        peer_id: peer_id.to_string(),
    }
}

pub fn candidate(peer_id: &str, value: &str) -> RelayPacket {
    RelayPacket::IceCandidate {
        peer_id: peer_id.to_string(),
        candidate: value.to_string(),
    }
}

pub fn description(peer_id: &str, value: &str) -> RelayPacket {
    RelayPacket::Description {
        peer_id: peer_id.to_string(),
        description: value.to_string(),
    }
}

pub fn success(peer_id: &str) -> RelayPacket {
    RelayPacket::PeerSuccess {
        peer_id: peer_id.to_string(),
    }
}

pub fn failure(peer_id: &str) -> RelayPacket {
    RelayPacket::PeerFailure {
        peer_id: peer_id.to_string(),
    }
}

/// Host wired to a scripted relay and a recording transport
pub struct Harness {
    pub host: LanHost,
    pub relay: RelayHandle,
    pub transport: RecordingTransport,
    pub selector_calls: Arc<Mutex<SelectorCalls>>,
}

impl Harness {
    pub fn new() -> Self {
        let (relay, handle) = ScriptedRelay::new();
        let (selector, selector_calls) = ScriptedSelector::with_relay(relay);
        let transport = RecordingTransport::default();
        let host = LanHost::new(
            HostConfig::default(),
            Box::new(selector),
            Box::new(transport.clone()),
        );
        Self {
            host,
            relay: handle,
            transport,
            selector_calls,
        }
    }

    /// Harness whose host already holds an open session with code "ABCD"
    pub async fn opened() -> Self {
        let mut harness = Self::new();
        harness.relay.push(handshake("ABCD"));
        harness
            .relay
            .push(ice_servers(vec![IceServer::stun("stun:x")]));
        harness
            .host
            .host_session(|_| {}, "World", false)
            .await
            .expect("session should open");
        harness
    }
}
