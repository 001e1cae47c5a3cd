//! API Router
//!
//! Combines the lead workflow and sales endpoints into a unified router.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use std::sync::Arc;

use crate::shared::state::AppState;

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = state.conn.get().is_ok();

    let status = if db_ok { "healthy" } else { "degraded" };
    let code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "leadserver",
            "version": env!("CARGO_PKG_VERSION"),
            "database": db_ok
        })),
    )
}

/// Configure all API routes from all modules
pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .merge(crate::leads::handlers::configure_lead_routes())
        .merge(crate::sales::configure_sales_routes())
}
