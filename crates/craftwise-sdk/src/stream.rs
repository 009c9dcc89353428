//! Live progress stream over WebSocket.

use std::pin::Pin;
use std::task::{Context, Poll};

use craftwise_core::{CraftError, ProgressUpdate, Result};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;
use uuid::Uuid;

/// Stream of progress updates for one project.
///
/// Ends after a `Deleted` update or when the server closes the socket.
pub struct ProgressStream {
    project_id: Uuid,
    updates: ReceiverStream<ProgressUpdate>,
    _handle: tokio::task::JoinHandle<()>,
}

impl ProgressStream {
    /// Connect to the progress stream at `ws_url`.
    pub async fn connect(ws_url: &str, project_id: Uuid) -> Result<Self> {
        let (ws_stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| CraftError::Connection(e.to_string()))?;

        let (tx, rx) = mpsc::channel(100);

        let handle = tokio::spawn(async move {
            let (_, mut read) = ws_stream.split();

            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ProgressUpdate>(&text) {
                        Ok(update) => {
                            if tx.send(update).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => debug!(project = %project_id, "ignoring malformed update: {}", e),
                    },
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }
        });

        Ok(Self {
            project_id,
            updates: ReceiverStream::new(rx),
            _handle: handle,
        })
    }

    /// Get the project ID this stream is for.
    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    /// Get the next update.
    pub async fn next_update(&mut self) -> Option<ProgressUpdate> {
        self.updates.next().await
    }
}

impl Stream for ProgressStream {
    type Item = ProgressUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.updates).poll_next(cx)
    }
}
