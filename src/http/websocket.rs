//! Live score subscription over WebSocket.
//!
//! # Data Flow
//! ```text
//! GET /ws/scores/{wallet} → admit (optional auth, rate limited)
//!     → upgrade → BroadcastHub::subscribe(wallet)
//!     → every ScoreEvent for the wallet is sent as a JSON text frame
//! ```
//!
//! A slow client that lags behind the channel skips the missed events.
//! The subscription ends when either side closes.

use axum::extract::rejection::PathRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::sync::broadcast::error::RecvError;

use crate::auth::WalletAddress;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::pipeline::RoutePolicy;
use crate::push::ScoreEvent;

pub async fn subscribe_scores(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    wallet: Result<Path<String>, PathRejection>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    state.pipeline.admit(&headers, peer.ip(), RoutePolicy::PUBLIC)?;
    let Path(wallet) = wallet?;
    let wallet: WalletAddress = wallet.parse()?;

    let events = state.hub.subscribe(&wallet);
    tracing::info!(wallet = %wallet, "Score subscription opened");

    Ok(ws.on_upgrade(move |socket| stream_scores(socket, wallet, events)))
}

async fn stream_scores(
    socket: WebSocket,
    wallet: WalletAddress,
    mut events: tokio::sync::broadcast::Receiver<ScoreEvent>,
) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to encode score event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(wallet = %wallet, skipped, "Subscriber lagged, events skipped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!(wallet = %wallet, "Score subscription closed");
}
