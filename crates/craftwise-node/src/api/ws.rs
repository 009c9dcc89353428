//! WebSocket endpoints.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use craftwise_core::ProgressUpdate;
use craftwise_store::{ChangeKind, SubscriptionFilter};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Live progress stream for one project.
///
/// Sends the current view on connect and a fresh one after every change
/// that may affect it. Closes once the project is gone.
pub async fn progress_stream(
    ws: WebSocketUpgrade,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_progress_stream(socket, id, state))
}

async fn handle_progress_stream(socket: WebSocket, project_id: Uuid, state: AppState) {
    // Subscribe first so no change between the initial read and the loop is lost
    let mut subscription = state
        .subscriptions
        .subscribe(SubscriptionFilter::project(project_id))
        .await;
    let (mut sender, mut receiver) = socket.split();

    let initial = current_update(&state, project_id).await;
    let closed = send(&mut sender, &initial).await.is_err();

    if !closed && !is_final(&initial) {
        loop {
            tokio::select! {
                event = subscription.next() => {
                    let Some(event) = event else { break };
                    let update = if event.kind == ChangeKind::ProjectDeleted {
                        ProgressUpdate::Deleted { project_id }
                    } else {
                        current_update(&state, project_id).await
                    };
                    if send(&mut sender, &update).await.is_err() || is_final(&update) {
                        break;
                    }
                }
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sender.send(Message::Pong(data)).await;
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    debug!(project = %project_id, "progress stream closed");
    state.subscriptions.unsubscribe(subscription.id).await;
    let _ = sender.close().await;
}

async fn current_update(state: &AppState, project_id: Uuid) -> ProgressUpdate {
    match state.service.progress(project_id).await {
        Ok(view) => ProgressUpdate::Progress { project_id, view },
        Err(err) => ProgressUpdate::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    }
}

/// Whether the stream ends after this update.
fn is_final(update: &ProgressUpdate) -> bool {
    match update {
        ProgressUpdate::Progress { .. } => false,
        ProgressUpdate::Deleted { .. } => true,
        ProgressUpdate::Error { code, .. } => code == "project_not_found",
    }
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    update: &ProgressUpdate,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(update).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}
