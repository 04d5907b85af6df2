/**
 * config.rs
 *
 * Hosting configuration and environment loading
 */

use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

/// Relay protocol version announced when opening a session
pub const DEFAULT_RELAY_VERSION: u32 = 1;

/// Cadence of the handshake polling loops
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long the relay has to send its ICE servers after the handshake
pub const ICE_SERVER_TIMEOUT: Duration = Duration::from_millis(2500);

/// Hosting configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Relay server URLs (ws:// or wss://), most preferred first
    pub relay_urls: Vec<String>,

    pub preferred_relay_version: u32,

    /// Accept self-signed relay certificates
    pub accept_invalid_certs: bool,

    /// Per-relay connect timeout
    pub connect_timeout: Duration,

    /// Wait for the relay's first packet
    pub handshake_timeout: Duration,

    /// Wait for the ICE server list, measured from the handshake
    pub ice_server_timeout: Duration,

    pub poll_interval: Duration,

    /// A peer that has neither connected nor failed by then is dropped
    pub negotiation_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            relay_urls: Vec::new(),
            preferred_relay_version: DEFAULT_RELAY_VERSION,
            accept_invalid_certs: false,
            connect_timeout: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(5),
            ice_server_timeout: ICE_SERVER_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            negotiation_timeout: Duration::from_secs(30),
        }
    }
}

impl HostConfig {
    /// Load from `LANSHARE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let relays = lookup("LANSHARE_RELAYS").context(
            "LANSHARE_RELAYS environment variable not set. Example: wss://relay.example.com:8443",
        )?;
        config.relay_urls = relays
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();
        if config.relay_urls.is_empty() {
            return Err(anyhow!("LANSHARE_RELAYS does not list any relay"));
        }

        if let Some(version) = lookup("LANSHARE_RELAY_VERSION") {
            config.preferred_relay_version = version
                .trim()
                .parse()
                .context("Invalid LANSHARE_RELAY_VERSION. Expected an integer")?;
        }

        if let Some(flag) = lookup("LANSHARE_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        if let Some(ms) = lookup("LANSHARE_ICE_TIMEOUT_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .context("Invalid LANSHARE_ICE_TIMEOUT_MS. Expected milliseconds")?;
            config.ice_server_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }
}
