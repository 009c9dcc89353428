//! Messages pushed over the live progress socket.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tree::ProgressView;

/// One message on `/ws/projects/:id/progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressUpdate {
    /// Fresh view after a change (and once on connect).
    Progress {
        #[serde(rename = "projectId")]
        project_id: Uuid,
        view: ProgressView,
    },
    /// The project was deleted; the server closes the socket.
    Deleted {
        #[serde(rename = "projectId")]
        project_id: Uuid,
    },
    /// The view could not be produced.
    Error { code: String, message: String },
}
