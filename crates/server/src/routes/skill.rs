//! Skill endpoint
//!
//! The voice platform POSTs one request envelope per turn and expects the
//! response envelope back as JSON. Handler failures are already turned into a
//! spoken apology by the skill, so they still answer 200.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    routing::post,
};
use skill::ResponseEnvelope;
use tracing::{debug, info};

use crate::{AppState, error::ApiError};

pub fn skill_routes() -> Router<AppState> {
    Router::new().route("/skill", post(handle_skill_request))
}

/// POST /api/skill
pub async fn handle_skill_request(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Request body is empty".to_string()));
    }

    debug!(bytes = body.len(), "Skill request received");
    let envelope = state.skill.invoke_json(&body).await?;

    info!(
        should_end_session = envelope.response.should_end_session,
        directives = envelope.response.directives.len(),
        "Skill response sent"
    );
    Ok(Json(envelope))
}
