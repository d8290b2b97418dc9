/// WebSocket event streaming for dialer notifications
use crate::domain::notification::Notifier;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// One notification as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub topic: String,
    pub event: String,
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
}

/// In-process pub/sub fan-out
pub struct EventBroadcaster {
    tx: broadcast::Sender<PublishedEvent>,
}

impl EventBroadcaster {
    /// Create new event broadcaster with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl Notifier for EventBroadcaster {
    async fn publish(&self, topic: &str, event_name: &str, payload: serde_json::Value) -> Result<()> {
        let event = PublishedEvent {
            topic: topic.to_string(),
            event: event_name.to_string(),
            payload,
            published_at: Utc::now(),
        };

        // Nobody listening is not a delivery failure
        if self.tx.send(event).is_err() {
            debug!(topic, event = event_name, "No subscribers for event");
        }

        Ok(())
    }
}

/// `?topic=a,b` limits the stream to those topics; absent means everything
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeQuery {
    pub topic: Option<String>,
}

impl SubscribeQuery {
    fn topics(&self) -> Vec<String> {
        self.topic
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn matches_topics(topics: &[String], event: &PublishedEvent) -> bool {
    topics.is_empty() || topics.iter().any(|t| *t == event.topic)
}

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(broadcaster): State<Arc<EventBroadcaster>>,
    Query(query): Query<SubscribeQuery>,
) -> Response {
    let topics = query.topics();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster, topics))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, broadcaster: Arc<EventBroadcaster>, topics: Vec<String>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = broadcaster.subscribe();

    info!(topics = ?topics, "WebSocket client connected");

    let welcome = serde_json::json!({
        "type": "welcome",
        "message": "Connected to predictive dialer event stream",
        "topics": topics,
        "timestamp": Utc::now().timestamp(),
    });

    if let Ok(msg) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(msg)).await.is_err() {
            error!("Failed to send welcome message");
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if !matches_topics(&topics, &event) {
                continue;
            }

            if let Ok(json) = serde_json::to_string(&event) {
                if sender.send(Message::Text(json)).await.is_err() {
                    debug!("Client disconnected");
                    break;
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => {
                    info!("WebSocket client requested close");
                    break;
                }
                Message::Text(text) => {
                    debug!("Received text message: {}", text);
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    info!("WebSocket client disconnected");
}
