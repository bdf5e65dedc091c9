//! Websocket transport for the broadcast hub
//!
//! Server to client only: inbound frames are read to detect liveness and
//! then discarded.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::{
    config::HubConfig,
    error::AppResult,
    services::hub::{HubHandle, HubStats},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Subscriber kind: admin, kiosk or mobile
    #[serde(rename = "type")]
    pub client_type: Option<String>,
}

/// Subscribe to live attendance events
pub async fn dashboard(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let client_type = query
        .client_type
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let hub = state.hub.clone();
    let config = state.config.hub.clone();

    ws.on_upgrade(move |socket| serve_subscriber(socket, hub, client_type, config))
}

async fn serve_subscriber(socket: WebSocket, hub: HubHandle, client_type: String, config: HubConfig) {
    let mut subscription = match hub.register(client_type).await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::warn!("Rejecting websocket subscriber: {}", e);
            return;
        }
    };
    let id = subscription.id;
    let (mut sink, mut stream) = socket.split();

    let idle_timeout = Duration::from_secs(config.idle_timeout_secs.max(1));
    let mut keepalive = interval(Duration::from_secs(config.ping_interval_secs.max(1)));
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    keepalive.tick().await;
    let mut last_heard = Instant::now();

    loop {
        tokio::select! {
            frame = subscription.recv() => match frame {
                Some(frame) => {
                    if sink.send(Message::Text(frame.to_string())).await.is_err() {
                        break;
                    }
                }
                // Evicted as a slow consumer, or the hub shut down
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => last_heard = Instant::now(),
                Some(Err(e)) => {
                    tracing::debug!(subscriber_id = id, "Websocket read error: {}", e);
                    break;
                }
            },
            _ = keepalive.tick() => {
                if last_heard.elapsed() > idle_timeout {
                    tracing::info!(subscriber_id = id, "Websocket idle, closing");
                    break;
                }
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
    hub.unregister(id).await;
}

/// Connected subscriber counts
#[utoipa::path(
    get,
    path = "/ws/stats",
    tag = "realtime",
    responses(
        (status = 200, description = "Connected subscribers", body = HubStats)
    )
)]
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<HubStats>> {
    Ok(Json(state.hub.stats().await?))
}
