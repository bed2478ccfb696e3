//! Realtime change feed over the service's websocket (Phoenix channels).
//!
//! One socket per subscription. The socket joins a topic carrying a
//! `postgres_changes` filter for the reservation, keeps itself alive with
//! heartbeats, and forwards insert/update rows into a [`Subscription`].
//! Delete events are ignored: the client never removes messages.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use orderchat_core::{ChangeEvent, ChatMessage, ReservationNumber};

use crate::config::ServiceConfig;
use crate::error::ClientError;
use crate::subscription::{Subscription, SubscriptionSink};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A Phoenix channel frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixMessage {
    fn to_text(&self) -> Result<Message, ClientError> {
        Ok(Message::Text(serde_json::to_string(self)?.into()))
    }
}

/// Channel topic for a reservation's messages.
pub fn topic_for(config: &ServiceConfig, reservation: &ReservationNumber) -> String {
    format!("realtime:{}_{}", config.messages_table, reservation)
}

/// Join frame subscribing to inserts/updates of one reservation.
pub fn join_message(
    config: &ServiceConfig,
    reservation: &ReservationNumber,
    reference: u64,
) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic_for(config, reservation),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": "*",
                    "schema": "public",
                    "table": config.messages_table,
                    "filter": format!("reservation_number=eq.{}", reservation),
                }],
            },
            "access_token": config.bearer(),
        }),
        reference: Some(reference.to_string()),
    }
}

/// Keep-alive frame.
pub fn heartbeat_message(reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Frame leaving a topic.
pub fn leave_message(topic: &str, reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_string(),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Turn an incoming text frame into a change event.
///
/// Returns `Ok(None)` for frames that are not row changes (replies,
/// presence, system messages) and for delete events.
pub fn parse_change(text: &str) -> Result<Option<ChangeEvent>, ClientError> {
    let frame: PhoenixMessage = serde_json::from_str(text)?;
    change_from_frame(&frame)
}

/// Reason the service refused to join `topic`, if `frame` is that refusal.
pub fn join_refusal(frame: &PhoenixMessage, topic: &str) -> Option<String> {
    if frame.event != "phx_reply" || frame.topic != topic {
        return None;
    }
    if frame.payload["status"].as_str() != Some("error") {
        return None;
    }
    let response = &frame.payload["response"];
    Some(match response["reason"].as_str() {
        Some(reason) => reason.to_string(),
        None => response.to_string(),
    })
}

fn change_from_frame(frame: &PhoenixMessage) -> Result<Option<ChangeEvent>, ClientError> {
    if frame.event != "postgres_changes" {
        return Ok(None);
    }

    let data = &frame.payload["data"];
    let kind = data["type"].as_str().unwrap_or_default();
    let build = |record: &Value| -> Result<ChatMessage, ClientError> {
        Ok(serde_json::from_value(record.clone())?)
    };

    match kind {
        "INSERT" => Ok(Some(ChangeEvent::Insert(build(&data["record"])?))),
        "UPDATE" => Ok(Some(ChangeEvent::Update(build(&data["record"])?))),
        other => {
            debug!(kind = other, "Ignoring change event");
            Ok(None)
        }
    }
}

/// Open a change feed for a reservation.
pub async fn connect(
    config: &ServiceConfig,
    reservation: &ReservationNumber,
) -> Result<Subscription, ClientError> {
    let url = config.realtime_url()?;
    let topic = topic_for(config, reservation);
    info!(topic = %topic, "Connecting change feed");

    let (mut ws, _) = connect_async(url.as_str()).await?;
    ws.send(join_message(config, reservation, 1).to_text()?).await?;

    let (subscription, sink) = Subscription::channel(reservation.clone(), config.event_buffer);
    let heartbeat = Duration::from_secs(config.heartbeat_interval_secs);
    tokio::spawn(run_feed(ws, sink, topic, heartbeat));

    Ok(subscription)
}

async fn run_feed(mut ws: WsStream, sink: SubscriptionSink, topic: String, heartbeat: Duration) {
    let mut reference: u64 = 1;
    let mut interval = tokio::time::interval(heartbeat);
    // First tick fires immediately; the join just went out.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = sink.cancelled() => {
                reference += 1;
                if let Ok(frame) = leave_message(&topic, reference).to_text() {
                    let _ = ws.send(frame).await;
                }
                let _ = ws.close(None).await;
                debug!(topic = %topic, "Change feed closed");
                break;
            }

            _ = interval.tick() => {
                reference += 1;
                let sent = match heartbeat_message(reference).to_text() {
                    Ok(frame) => ws.send(frame).await.map_err(ClientError::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    warn!(topic = %topic, error = %e, "Heartbeat failed, ending change feed");
                    break;
                }
            }

            frame = ws.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let frame: PhoenixMessage = match serde_json::from_str(text.as_str()) {
                            Ok(frame) => frame,
                            Err(e) => {
                                warn!(topic = %topic, error = %e, "Unreadable change frame");
                                continue;
                            }
                        };
                        if let Some(reason) = join_refusal(&frame, &topic) {
                            warn!(topic = %topic, reason = %reason, "Join refused, ending change feed");
                            break;
                        }
                        match change_from_frame(&frame) {
                            Ok(Some(event)) => {
                                debug!(topic = %topic, kind = event.kind(), id = %event.record().id, "Change event");
                                if !sink.send(event).await {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => warn!(topic = %topic, error = %e, "Unreadable change frame"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        warn!(topic = %topic, "Change feed disconnected");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(topic = %topic, error = %e, "Change feed error");
                        break;
                    }
                }
            }
        }
    }
}
