//! Connection handlers for the Ripple server.
//!
//! This module handles the handshake, the connection lifecycle, and
//! dispatch of decoded client events into the relay core.

use crate::auth::{AuthError, TokenVerifier};
use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use crate::store::PgMessageStore;
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use futures_util::{SinkExt, StreamExt};
use ripple_core::{
    CallRelay, Emitter, Identity, MessageRelay, NullMessageStore, Registry, SocialRelay,
    MALFORMED_NOTICE,
};
use ripple_protocol::{codec, ClientEvent, ServerEvent};
use ripple_transport::Hub;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// Presence, room, and rate-limit bookkeeping.
    pub registry: Arc<Registry>,
    /// Connection and room fan-out.
    pub hub: Arc<Hub>,
    /// Chat message relay.
    pub messages: MessageRelay,
    /// Friend and group signal relay.
    pub social: SocialRelay,
    /// Call-signaling relay.
    pub calls: CallRelay,
    /// Handshake token verifier.
    pub verifier: TokenVerifier,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state around a message store.
    #[must_use]
    pub fn new(config: Config, store: Arc<dyn ripple_core::MessageStore>) -> Self {
        let registry = Arc::new(Registry::new());
        let hub = Arc::new(Hub::new());

        Self {
            messages: MessageRelay::new(registry.clone(), store, config.limits.rate_window_ms),
            social: SocialRelay::new(registry.clone()),
            calls: CallRelay::new(registry.clone()),
            verifier: TokenVerifier::new(&config.auth.jwt_secret),
            registry,
            hub,
            config,
        }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let store: Arc<dyn ripple_core::MessageStore> = match config.store.database_url.as_deref() {
        Some(url) => Arc::new(
            PgMessageStore::connect(url)
                .await
                .context("Failed to connect message store")?,
        ),
        None => {
            warn!("No database configured; messages are delivery-only");
            Arc::new(NullMessageStore)
        }
    };

    let state = Arc::new(AppState::new(config.clone(), store));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let origin: HeaderValue = config
        .cors
        .allowed_origin
        .parse()
        .with_context(|| format!("Invalid allowed origin: {}", config.cors.allowed_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .route(&config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Ripple server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, config.transport.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// WebSocket upgrade handler.
///
/// The credential cookie is verified before the upgrade; a missing or bad
/// token rejects the request with 401 and no socket is opened.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    let identity = match authenticate(&state, &jar) {
        Ok(identity) => identity,
        Err(e) => {
            debug!(error = %e, "Handshake rejected");
            metrics::record_auth_failure();
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Extract and verify the credential cookie.
fn authenticate(state: &AppState, jar: &CookieJar) -> Result<Identity, AuthError> {
    let token = jar
        .get(&state.config.auth.cookie_name)
        .ok_or(AuthError::MissingToken)?
        .value();
    state.verifier.verify(token)
}

/// Register a connection and bind the user's presence to it.
///
/// Last-connect-wins: a previous session for the same user is unregistered
/// and its tracked room is dropped, so the new session starts with no room
/// until the client re-sends `joinRoom`.
fn bind_connection(
    state: &AppState,
    identity: &Identity,
    connection_id: &str,
) -> ripple_transport::ConnectionHandle {
    let outbound = state.hub.register(connection_id);
    if let Some(displaced) = state.registry.connect(identity, connection_id) {
        state.hub.unregister(&displaced.connection_id);
        state.registry.leave_room(&identity.id);
    }
    metrics::set_online_users(state.registry.online_count());
    outbound
}

/// Handle an authenticated WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    // Generate connection ID
    let connection_id = format!(
        "conn_{:x}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    );

    debug!(connection = %connection_id, user = %identity.id, "WebSocket connected");

    let mut outbound = bind_connection(&state, &identity, &connection_id);

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            biased;

            // Events queued for this connection by any handler
            Some(event) = outbound.recv() => {
                match codec::encode(&event) {
                    Ok(frame) => {
                        metrics::record_event(event.name(), "outbound");
                        if sender.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(connection = %connection_id, error = %e, "Failed to encode event");
                    }
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&text, &connection_id, &identity, &state).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        // The wire contract is JSON text frames only
                        metrics::record_malformed_frame();
                        state.hub.emit(&connection_id, ServerEvent::error(MALFORMED_NOTICE));
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %connection_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => {
                        debug!(connection = %connection_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup: the registry eviction is guarded on the connection id, so a
    // reconnect that already displaced this socket is left untouched.
    state.hub.unregister(&connection_id);
    state.registry.disconnect(&identity.id, &connection_id);
    metrics::set_online_users(state.registry.online_count());

    debug!(connection = %connection_id, user = %identity.id, "WebSocket disconnected");
}

/// Decode one inbound frame and dispatch it to the relay core.
async fn handle_frame(frame: &str, connection_id: &str, identity: &Identity, state: &Arc<AppState>) {
    let event = match codec::decode(frame, state.config.limits.max_frame_bytes) {
        Ok(event) => event,
        Err(e) => {
            debug!(connection = %connection_id, error = %e, "Malformed frame");
            metrics::record_malformed_frame();
            state
                .hub
                .emit(connection_id, ServerEvent::error(MALFORMED_NOTICE));
            return;
        }
    };

    metrics::record_event(event.name(), "inbound");
    let emitter: &dyn Emitter = state.hub.as_ref();

    match event {
        ClientEvent::JoinRoom(room) => {
            // One tracked room per user: joining implies leaving the old one
            if let Some(previous) = state.registry.join_room(&identity.id, &room) {
                state.hub.leave(connection_id, &previous);
            }
            state.hub.join(connection_id, &room);
        }
        ClientEvent::LeaveRoom(room) => {
            state.registry.leave_room(&identity.id);
            state.hub.leave(connection_id, &room);
        }
        ClientEvent::NewMessage(inbound) => {
            state
                .messages
                .handle_message(emitter, identity, connection_id, inbound, now_ms())
                .await;
        }
        ClientEvent::Typing(notice) => {
            state
                .messages
                .handle_typing(emitter, identity, connection_id, &notice, false);
        }
        ClientEvent::StopTyping(notice) => {
            state
                .messages
                .handle_typing(emitter, identity, connection_id, &notice, true);
        }
        ClientEvent::FriendRequest(target) => {
            state.social.friend_request(emitter, identity, &target);
        }
        ClientEvent::FriendAccept(target) => {
            state.social.friend_accept(emitter, identity, &target);
        }
        ClientEvent::RefreshChat(target) => {
            state.social.refresh_chat(emitter, identity, &target);
        }
        ClientEvent::GroupAlert(alert) => {
            state.social.group_alert(emitter, identity, &alert);
        }
        ClientEvent::CallRequest(request) => {
            state.calls.request(emitter, identity, request);
        }
        ClientEvent::CallRequestAccept(target) => {
            state.calls.accept_request(emitter, identity, target);
        }
        ClientEvent::DeclineCall(target) => {
            state.calls.decline(emitter, identity, target);
        }
        ClientEvent::CallOffer(offer) => {
            state.calls.offer(emitter, identity, offer);
        }
        ClientEvent::CallAnswer(answer) => {
            state.calls.answer(emitter, answer);
        }
        ClientEvent::IceCandidate(candidate) => {
            state.calls.candidate(emitter, candidate);
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
