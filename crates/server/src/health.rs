use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::app::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub conversation: HealthCheck,
    pub checked_at: String,
}

/// Always 200: a relay without a workspace still answers every channel with
/// setup instructions, so it is not an outage.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let conversation = conversation_check(state.runtime.workspace_id());

    let payload = HealthResponse {
        status: conversation.status,
        service: HealthCheck {
            status: "ready",
            detail: "parley-server runtime initialized".to_string(),
        },
        conversation,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn conversation_check(workspace_id: Option<String>) -> HealthCheck {
    match workspace_id {
        Some(workspace_id) => HealthCheck {
            status: "ready",
            detail: format!("workspace `{workspace_id}` configured"),
        },
        None => HealthCheck {
            status: "unconfigured",
            detail: "WORKSPACE_ID is not set; replies carry setup instructions".to_string(),
        },
    }
}
