//! HTTP routes and the WebSocket connection driver
//!
//! The router exposes the browser-facing relay endpoint plus health and
//! metrics. Each accepted WebSocket gets a driver loop that owns both
//! directions: inbound frames are decoded and dispatched to the
//! coordinator, outbound messages arrive on the connection's channel
//! and are written to the socket. Disconnect cleanup always runs when
//! the loop exits, whatever ended it.

use crate::config::CorsSettings;
use crate::error::{RelayError, Result};
use crate::protocol::{decode_client_message, encode_server_message};
use crate::service::app::AppState;
use crate::service::health::HealthCheck;
use crate::utils::generate_connection_id;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

/// Build the service router with CORS applied
pub fn create_router(state: Arc<AppState>) -> Result<Router> {
    let cors = build_cors_layer(&state.config().cors)?;

    Ok(Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state))
}

/// CORS allow-list from configuration; origins outside it are rejected
fn build_cors_layer(settings: &CorsSettings) -> Result<CorsLayer> {
    let origins = settings
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|_| {
                RelayError::Configuration {
                    message: format!("Invalid CORS origin: {:?}", origin),
                }
                .into()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Root endpoint handler - shows service information
async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.config().service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/health", "/stats", "/metrics", "/ws"]
    }))
}

/// Static health acknowledgment
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "service": state.config().service.name,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Detailed statistics report
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthCheck::check(&state))
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics().render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to render metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// WebSocket upgrade endpoint
async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| drive_connection(state, socket))
}

/// Per-connection driver loop
async fn drive_connection(state: Arc<AppState>, mut socket: WebSocket) {
    let id = generate_connection_id();
    let (tx, mut rx) = mpsc::unbounded_channel();

    if let Err(e) = state.transport().register(id, tx) {
        warn!("Failed to register connection {}: {}", id, e);
        return;
    }
    state.coordinator().handle_connect(id).await;

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match decode_client_message(text.as_str()) {
                            Some(message) => {
                                state.coordinator().handle_message(id, message).await;
                            }
                            None => {
                                // Unknown event names and malformed frames
                                // are dropped without feedback
                                debug!("Dropping undecodable frame from {}", id);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary, ping and pong frames carry no events
                    Some(Err(e)) => {
                        debug!("WebSocket error on {}: {}", id, e);
                        break;
                    }
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Some(message) => match encode_server_message(&message) {
                        Ok(frame) => {
                            if socket.send(Message::Text(frame.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to encode outbound message: {}", e),
                    },
                    None => break,
                }
            }
        }
    }

    state.coordinator().handle_disconnect(id).await;
    if let Err(e) = state.transport().unregister(id) {
        warn!("Failed to unregister connection {}: {}", id, e);
    }
}
