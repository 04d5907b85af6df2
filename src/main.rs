use anyhow::{Context, Result};
use lanshare::{HostConfig, LanHost, PeerTransport, RelayManager};
use std::env;
use std::time::Duration;
use tracing::info;

/// Frame rate of the demo host loop
const TICK_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "host" => {
            if args.len() < 3 {
                eprintln!("Error: Missing world name");
                eprintln!();
                eprintln!("Usage: {} host <world_name> [--hidden]", args[0]);
                std::process::exit(1);
            }
            let world_name = &args[2];
            let hidden = args[3..].iter().any(|arg| arg == "--hidden");
            run_host(world_name, hidden)?
        }
        "help" | "--help" | "-h" => print_usage(&args[0]),
        _ => {
            eprintln!("Error: Invalid mode '{}'", args[1]);
            eprintln!();
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_usage(program_name: &str) {
    eprintln!("lanshare - Share a local world through a signalling relay");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  {} host <world_name> [--hidden]", program_name);
    eprintln!();
    eprintln!("  Required environment variables:");
    eprintln!("    LANSHARE_RELAYS     Comma-separated relay servers, most preferred first");
    eprintln!("                        Example: wss://relay.example.com:8443");
    eprintln!();
    eprintln!("  Optional environment variables:");
    eprintln!("    LANSHARE_RELAY_VERSION         Relay protocol version (default 1)");
    eprintln!("    LANSHARE_ACCEPT_INVALID_CERTS  Accept self-signed relay certs (default false)");
    eprintln!("    LANSHARE_ICE_TIMEOUT_MS        ICE server wait after handshake (default 2500)");
    eprintln!("    RUST_LOG                       Log filter (default info)");
}

/// Host a world until Ctrl-C, printing peer signals instead of opening
/// real data channels
fn run_host(world_name: &str, hidden: bool) -> Result<()> {
    let config = HostConfig::from_env()?;

    println!("Configuration:");
    for relay in &config.relay_urls {
        println!("  Relay             : {}", relay);
    }
    println!("  World             : {}", world_name);
    println!("  Hidden            : {}", hidden);
    println!();

    let selector = RelayManager::from_config(&config);
    let mut host = LanHost::new(config, Box::new(selector), Box::new(SignalLog::default()));

    if !host.is_hosting_supported() {
        eprintln!("Error: Hosting is not supported on this platform");
        std::process::exit(1);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let code = host
            .host_session(|msg| println!("{}", msg), world_name, hidden)
            .await?;

        println!();
        println!("Share this code with your friends: {}", code);
        println!("Press Ctrl+C to stop hosting.");
        println!();

        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    host.tick();
                    if !host.is_session_active() {
                        println!("Relay connection lost, stopping.");
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                }
            }
        }

        host.close_session();
        println!("Hosting stopped.");
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

/// Transport stand-in that only logs what peers send
#[derive(Default)]
struct SignalLog {
    open: bool,
}

impl PeerTransport for SignalLog {
    fn initialize_server(&mut self, ice_servers: &[String]) {
        info!(servers = ?ice_servers, "peer transport initialized");
        self.open = true;
    }

    fn signal_ice_candidate(&mut self, peer_id: &str, candidate: &str) {
        info!(peer = %peer_id, candidate = %candidate, "ICE candidate");
    }

    fn signal_description(&mut self, peer_id: &str, description: &str) {
        info!(peer = %peer_id, bytes = description.len(), "session description");
    }

    fn drop_peer(&mut self, peer_id: &str) {
        info!(peer = %peer_id, "peer dropped");
    }

    fn is_peer_alive(&self, _peer_id: &str) -> bool {
        false
    }

    fn live_peer_count(&self) -> usize {
        0
    }

    fn is_server_open(&self) -> bool {
        self.open
    }

    fn close_server(&mut self) {
        self.open = false;
    }

    fn is_supported(&self) -> bool {
        true
    }
}
