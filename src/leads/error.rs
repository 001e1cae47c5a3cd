use axum::{response::IntoResponse, Json};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Lead not found: {0}")]
    NotFound(Uuid),
    #[error("Lead {lead_id} is not checked out by agent {agent_id}")]
    LockViolation { lead_id: Uuid, agent_id: Uuid },
    #[error("Lead already converted to a sale: {0}")]
    AlreadyConverted(Uuid),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Sale conversion failed: {0}")]
    Conversion(String),
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Connection error: {0}")]
    Connection(String),
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::LockViolation { .. } | Self::AlreadyConverted(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conversion(_) | Self::Database(_) | Self::Connection(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = self.to_string();
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
