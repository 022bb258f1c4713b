use crate::feed_logic::state::FeedState;
use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::StreamExt;
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

pub fn router(state: FeedState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run(port: u16, state: FeedState, cancel: CancellationToken) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Feed server listening on {}", addr);
    serve(listener, state, cancel).await
}

/// Serves on an already bound listener until `cancel` fires.
pub async fn serve(listener: TcpListener, state: FeedState, cancel: CancellationToken) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            log::info!("Feed server shutting down.");
        })
        .await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<FeedState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn health_handler(State(state): State<FeedState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "clients": state.client_count(),
        "history": state.history_len().await,
    }))
}

async fn handle_socket(mut socket: WebSocket, state: FeedState) {
    let clients = state.add_client();
    log::info!("Client connected. Total clients: {}", clients);

    // Subscribe before the welcome so nothing published in between is missed.
    let mut data_rx = state.data_tx.subscribe();

    for message in state.welcome_messages().await {
        match message.to_json() {
            Ok(json) => {
                if socket.send(Message::Text(json.into())).await.is_err() {
                    let clients = state.remove_client();
                    log::info!("Client disconnected. Total clients: {}", clients);
                    return;
                }
            }
            Err(e) => log::error!("Failed to encode welcome {}: {}", message.kind(), e),
        }
    }

    loop {
        tokio::select! {
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    // Clients only listen; anything they send is ignored.
                    Some(Ok(_)) => {}
                }
            }
            outgoing = data_rx.recv() => {
                match outgoing {
                    Ok(frame) => {
                        if socket.send(Message::Text(frame.as_ref().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Client lagging, skipped {} messages", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    let clients = state.remove_client();
    log::info!("Client disconnected. Total clients: {}", clients);
}
