/**
 * relay/websocket.rs
 *
 * WebSocket relay client (ws:// or wss://, self-signed certs optional)
 */

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use native_tls::TlsConnector;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::net::TcpStream as TokioTcpStream;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::lan::{RelayConnection, RelayError, RelayPacket};

type RelayStream = WebSocketStream<MaybeTlsStream<TokioTcpStream>>;

/// Messages the host sends to the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    /// Open a hosting session
    Host {
        version: u32,
        descriptor: String,
    },
}

/// What the reader task hands to the connection
#[derive(Debug)]
enum Inbound {
    Packet(RelayPacket),
    Error(RelayError),
}

/// Relay connection backed by a WebSocket and a background reader task
pub struct WsRelayConnection {
    uri: String,
    inbound: UnboundedReceiver<Inbound>,
    packets: VecDeque<RelayPacket>,
    exceptions: VecDeque<RelayError>,
    closed: bool,
    shutdown: Option<oneshot::Sender<()>>,
}

impl WsRelayConnection {
    /// Connect, announce ourselves as a host and start reading packets.
    /// Must be called from inside a tokio runtime.
    pub async fn connect(
        uri: &str,
        version: u32,
        descriptor: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let req = uri
            .into_client_request()
            .context("Invalid relay URL")?;

        let mut tls_builder = TlsConnector::builder();
        tls_builder.danger_accept_invalid_certs(accept_invalid_certs);
        let tls = tls_builder
            .build()
            .context("Failed to build TLS connector")?;

        let (mut ws_stream, _resp) = tokio_tungstenite::connect_async_tls_with_config(
            req,
            None,
            false,
            Some(Connector::NativeTls(tls)),
        )
        .await
        .context("WebSocket connection to relay failed")?;

        let hello = HostRequest::Host {
            version,
            descriptor: descriptor.to_string(),
        };
        let json = serde_json::to_string(&hello).context("Message serialization failed")?;
        ws_stream
            .send(Message::Text(json))
            .await
            .context("WebSocket send failed")?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(reader_loop(ws_stream, tx, shutdown_rx, uri.to_string()));

        Ok(Self {
            uri: uri.to_string(),
            inbound: rx,
            packets: VecDeque::new(),
            exceptions: VecDeque::new(),
            closed: false,
            shutdown: Some(shutdown_tx),
        })
    }
}

impl RelayConnection for WsRelayConnection {
    fn pump(&mut self) {
        loop {
            match self.inbound.try_recv() {
                Ok(Inbound::Packet(packet)) => self.packets.push_back(packet),
                Ok(Inbound::Error(err)) => self.exceptions.push_back(err),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
    }

    fn try_read_packet(&mut self) -> Option<RelayPacket> {
        self.packets.pop_front()
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn address(&self) -> &str {
        &self.uri
    }

    fn drain_exception(&mut self) -> Option<RelayError> {
        self.exceptions.pop_front()
    }

    fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.closed = true;
    }
}

impl Drop for WsRelayConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn decode_packet(bytes: &[u8]) -> Result<RelayPacket, RelayError> {
    serde_json::from_slice(bytes).map_err(|e| RelayError::Decode(e.to_string()))
}

/// Reader task: decode frames until the socket ends or the connection is
/// closed. Dropping `tx` on exit marks the connection closed.
async fn reader_loop(
    mut ws_stream: RelayStream,
    tx: UnboundedSender<Inbound>,
    mut shutdown: oneshot::Receiver<()>,
    uri: String,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if let Err(e) = ws_stream.close(None).await {
                    debug!(relay = %uri, error = %e, "failed closing WebSocket");
                }
                break;
            }
            msg = ws_stream.next() => {
                let item = match msg {
                    Some(Ok(Message::Text(text))) => Some(decode_packet(text.as_bytes())),
                    Some(Ok(Message::Binary(bytes))) => Some(decode_packet(&bytes)),
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = ws_stream.send(Message::Pong(data)).await {
                            let _ = tx.send(Inbound::Error(RelayError::Transport(e.to_string())));
                            break;
                        }
                        None
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(relay = %uri, "relay closed WebSocket");
                        break;
                    }
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        warn!(relay = %uri, error = %e, "relay transport error");
                        let _ = tx.send(Inbound::Error(RelayError::Transport(e.to_string())));
                        break;
                    }
                };

                let sent = match item {
                    Some(Ok(packet)) => tx.send(Inbound::Packet(packet)),
                    Some(Err(err)) => tx.send(Inbound::Error(err)),
                    None => Ok(()),
                };
                if sent.is_err() {
                    // Connection dropped its receiver
                    break;
                }
            }
        }
    }
}
