//! WebSocket transport feeding the engine

use crate::engine::Engine;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::accept_hdr_async;

/// Frames queued per connection before new ones are dropped
pub const OUTBOUND_QUEUE_CAPACITY: usize = 32;

/// Longest a single socket write may take before the connection is dropped
pub const SEND_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Accepts WebSocket connections and turns them into players
pub struct Server {
    listener: TcpListener,
    engine: Arc<Engine>,
}

impl Server {
    pub async fn bind(addr: &str, engine: Arc<Engine>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self { listener, engine })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop. Each connection runs in its own task.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };

            let engine = Arc::clone(&self.engine);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(engine, stream, peer).await {
                    warn!("Connection from {} failed: {}", peer, e);
                }
            });
        }
    }
}

/// Identifies the client behind a reverse proxy, if the proxy said who it is.
///
/// `X-Real-IP` wins over the first hop of `X-Forwarded-For`.
pub fn forwarded_source(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(real_ip) = header("x-real-ip") {
        return Some(real_ip.to_string());
    }

    header("x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(str::to_string)
}

async fn handle_connection(
    engine: Arc<Engine>,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<(), ServerError> {
    let mut forwarded = None;
    let capture_source = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        forwarded = forwarded_source(request.headers());
        Ok(response)
    };
    let ws_stream = accept_hdr_async(stream, capture_source).await?;
    let source = forwarded.unwrap_or_else(|| peer.to_string());

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);

    let Some(player_id) = engine.on_open(source.clone(), outbound_tx).await else {
        warn!("Arena full, turning away {}", source);
        ws_sender.send(Message::Close(None)).await?;
        return Ok(());
    };
    info!("Connection from {} is player {}", source, player_id);

    // Ends once the player is dropped from the arena (queue closed), the
    // socket errors, or a write stalls past SEND_TIMEOUT.
    let writer_source = source.clone();
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            match timeout(SEND_TIMEOUT, ws_sender.send(Message::Text(frame))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!("Write to {} failed: {}", writer_source, e);
                    return;
                }
                Err(_) => {
                    warn!("Write to {} timed out, dropping connection", writer_source);
                    return;
                }
            }
        }
        let _ = ws_sender.close().await;
    });

    loop {
        tokio::select! {
            inbound = ws_receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => engine.on_message(player_id, &text).await,
                Some(Ok(Message::Binary(bytes))) => {
                    debug!("Ignoring {} byte binary frame from player {}", bytes.len(), player_id);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Read from player {} failed: {}", player_id, e);
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    engine.on_close(player_id).await;
    info!("Connection from {} (player {}) closed", source, player_id);
    Ok(())
}
