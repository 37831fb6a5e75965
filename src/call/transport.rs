use super::events::CallEvent;
use async_trait::async_trait;
use futures::stream::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to open call transport: {0}")]
    Connect(String),

    #[error("call transport closed unexpectedly: {0}")]
    Closed(String),
}

/// Realtime call transport delivering voice-gateway events for one session.
///
/// `open` hands back a channel receiver; events arrive in emission order
/// per speaker turn. Closing stops delivery and releases the underlying
/// connection.
#[async_trait]
pub trait CallTransport: Send + Sync {
    async fn open(&mut self) -> Result<mpsc::Receiver<CallEvent>, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// NATS-backed call transport.
///
/// Subscribes to `call.events.<session_id>` and decodes the JSON event
/// messages the voice gateway publishes there. Undecodable payloads are
/// logged and skipped; they never tear down the stream.
pub struct NatsCallTransport {
    nats_url: String,
    session_id: String,
    /// Kept alive for the duration of the subscription
    client: Option<async_nats::Client>,
    listen_task: Option<JoinHandle<()>>,
}

impl NatsCallTransport {
    pub fn new(nats_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            nats_url: nats_url.into(),
            session_id: session_id.into(),
            client: None,
            listen_task: None,
        }
    }
}

#[async_trait]
impl CallTransport for NatsCallTransport {
    async fn open(&mut self) -> Result<mpsc::Receiver<CallEvent>, TransportError> {
        info!("Connecting to NATS at {}", self.nats_url);

        let client = async_nats::connect(&self.nats_url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let subject = format!("call.events.{}", self.session_id);

        let mut subscriber = client
            .subscribe(subject.clone())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        info!("Subscribed to {}", subject);

        let (event_tx, event_rx) = mpsc::channel(100);
        let session_id = self.session_id.clone();

        let task = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<CallEvent>(&msg.payload) {
                    Ok(event) => {
                        if event_tx.send(event).await.is_err() {
                            // Receiver dropped; the controller is gone
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse call event for {}: {}", session_id, e);
                    }
                }
            }
            info!("Call event stream ended for {}", session_id);
        });

        self.client = Some(client);
        self.listen_task = Some(task);

        Ok(event_rx)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(task) = self.listen_task.take() {
            task.abort();
        }
        self.client = None;
        Ok(())
    }
}
