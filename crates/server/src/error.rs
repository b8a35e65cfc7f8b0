use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use skill::SkillError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Skill(#[from] SkillError),
    #[error("Bad Request: {0}")]
    BadRequest(String),
}

/// JSON body for failed requests
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error_type: &'static str,
    pub message: String,
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Skill(err) => match err {
                SkillError::InvalidEnvelope(_) => (StatusCode::BAD_REQUEST, "InvalidEnvelope"),
                SkillError::Configuration(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "SkillConfiguration")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "SkillError"),
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status_and_type();

        if status_code.is_server_error() {
            tracing::error!(error_type, error = %self, "Request failed");
        } else {
            tracing::warn!(error_type, error = %self, "Request rejected");
        }

        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Skill(SkillError::InvalidEnvelope(e)) => {
                format!("Request body is not a valid request envelope: {}", e)
            }
            // Configuration details stay in the log
            ApiError::Skill(_) => "The skill is not able to handle requests right now.".to_string(),
        };

        let body = ErrorBody {
            success: false,
            error_type,
            message,
        };
        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let invalid: SkillError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(
            ApiError::from(invalid).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SkillError::Configuration("no default".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadRequest("empty body".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
