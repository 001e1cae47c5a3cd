//! HTTP handlers for the lead workflow API
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use log::{error, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::leads::error::WorkflowError;
use crate::leads::types::{
    CreateLeadRequest, DisposeLeadRequest, DisposeLeadResponse, ImportLeadsRequest,
    ImportLeadsResponse, Lead, LeadDetail, LeadDisposition, LeadStats, LeadStatus, ListLeadsQuery,
    NextLeadRequest, NextLeadResponse, RequeueLeadRequest, SkipLeadRequest, SkipLeadResponse,
};
use crate::leads::{checkout, disposition, import, selection, stats};
use crate::shared::schema::{lead_appliance_items, lead_dispositions, leads};
use crate::shared::state::AppState;

/// Handler for the next-lead hand-out
pub async fn next_lead(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NextLeadRequest>,
) -> Result<Json<NextLeadResponse>, WorkflowError> {
    let conn = state.conn.clone();
    let workflow = state.config.workflow.clone();
    let agent_id = payload.agent_id;

    let result = tokio::task::spawn_blocking(move || {
        let mut db_conn = conn
            .get()
            .map_err(|e| WorkflowError::Connection(e.to_string()))?;

        let outcome = selection::next_lead_for_agent(&mut db_conn, agent_id, &workflow)?;
        let stats = stats::agent_stats(&mut db_conn, agent_id, Utc::now())?;

        let lead = match outcome.lead {
            Some(lead) => {
                info!("[LEADS] Lead {} checked out by {}", lead.id, agent_id);
                let appliance_items = lead_appliance_items::table
                    .filter(lead_appliance_items::lead_id.eq(lead.id))
                    .order(lead_appliance_items::created_at.asc())
                    .load(&mut db_conn)?;
                Some(LeadDetail {
                    lead,
                    appliance_items,
                })
            }
            None => None,
        };

        Ok::<NextLeadResponse, WorkflowError>(NextLeadResponse {
            lead,
            has_more: outcome.has_more,
            stats,
        })
    })
    .await;

    match result {
        Ok(Ok(response)) => Ok(Json(response)),
        Ok(Err(e)) => Err(e),
        Err(e) => {
            error!("[LEADS] Join error handing out next lead: {}", e);
            Err(WorkflowError::Connection(format!("task join error: {e}")))
        }
    }
}

/// Handler for reporting a disposition on a checked-out lead
pub async fn dispose_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<DisposeLeadRequest>,
) -> Result<Json<DisposeLeadResponse>, WorkflowError> {
    let conn = state.conn.clone();
    let workflow = state.config.workflow.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut db_conn = conn
            .get()
            .map_err(|e| WorkflowError::Connection(e.to_string()))?;

        let applied = disposition::apply_disposition(
            &mut db_conn,
            lead_id,
            payload.agent_id,
            payload.outcome,
            payload.notes,
            payload.callback_at,
            &workflow,
        )?;

        Ok::<DisposeLeadResponse, WorkflowError>(DisposeLeadResponse {
            lead: applied.lead,
            sale: applied.sale,
        })
    })
    .await;

    match result {
        Ok(Ok(response)) => Ok(Json(response)),
        Ok(Err(e)) => Err(e),
        Err(e) => {
            error!("[LEADS] Join error disposing lead {}: {}", lead_id, e);
            Err(WorkflowError::Connection(format!("task join error: {e}")))
        }
    }
}

/// Handler for skipping a checked-out lead without a disposition
pub async fn skip_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<SkipLeadRequest>,
) -> Result<Json<SkipLeadResponse>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let released = checkout::release(&mut conn, lead_id, payload.agent_id, Utc::now())?;
    if released {
        info!("[LEADS] Lead {} skipped by {}", lead_id, payload.agent_id);
    }

    Ok(Json(SkipLeadResponse { released }))
}

pub async fn get_agent_stats(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<Uuid>,
) -> Result<Json<LeadStats>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let stats = stats::agent_stats(&mut conn, agent_id, Utc::now())?;
    Ok(Json(stats))
}

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<Json<LeadDetail>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let detail = import::create_lead(&mut conn, &payload)?;
    Ok(Json(detail))
}

pub async fn import_leads(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportLeadsRequest>,
) -> Result<Json<ImportLeadsResponse>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let response = import::import_batch(&mut conn, &payload)?;
    Ok(Json(response))
}

pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<Vec<Lead>>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut db_query = leads::table.into_boxed();
    if let Some(filter) = &query.status {
        let status = LeadStatus::parse(filter).ok_or_else(|| {
            WorkflowError::Validation(format!("unknown status filter: {}", filter))
        })?;
        db_query = db_query.filter(leads::status.eq(status.as_str()));
    }
    if let Some(agent_id) = query.agent_id {
        db_query = db_query.filter(leads::assigned_agent_id.eq(agent_id));
    }
    if let Some(batch_id) = query.batch_id {
        db_query = db_query.filter(leads::import_batch_id.eq(batch_id));
    }

    let rows = db_query
        .order(leads::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<Lead>(&mut conn)?;

    Ok(Json(rows))
}

pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<LeadDetail>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let lead: Lead = leads::table
        .filter(leads::id.eq(lead_id))
        .first(&mut conn)
        .optional()?
        .ok_or(WorkflowError::NotFound(lead_id))?;

    let appliance_items = lead_appliance_items::table
        .filter(lead_appliance_items::lead_id.eq(lead_id))
        .order(lead_appliance_items::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(LeadDetail {
        lead,
        appliance_items,
    }))
}

pub async fn lead_history(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<Vec<LeadDisposition>>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let exists: i64 = leads::table
        .filter(leads::id.eq(lead_id))
        .count()
        .get_result(&mut conn)?;
    if exists == 0 {
        return Err(WorkflowError::NotFound(lead_id));
    }

    let rows = lead_dispositions::table
        .filter(lead_dispositions::lead_id.eq(lead_id))
        .order(lead_dispositions::created_at.asc())
        .load::<LeadDisposition>(&mut conn)?;

    Ok(Json(rows))
}

/// Handler for the operator view of failed conversions
pub async fn attention_leads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Lead>>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let rows = leads::table
        .filter(leads::status.eq(LeadStatus::ConversionFailed.as_str()))
        .order(leads::last_disposition_at.desc())
        .load::<Lead>(&mut conn)?;

    Ok(Json(rows))
}

/// Handler for requeueing a failed conversion back into the calling queue
pub async fn requeue_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<RequeueLeadRequest>,
) -> Result<Json<Lead>, WorkflowError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| WorkflowError::Connection(e.to_string()))?;

    let lead = disposition::requeue_conversion_failed(&mut conn, lead_id, payload.requested_by)?;
    Ok(Json(lead))
}

/// Configure lead routes for the Axum router
pub fn configure_lead_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leads", post(create_lead))
        .route("/api/leads", get(list_leads))
        .route("/api/leads/import", post(import_leads))
        .route("/api/leads/next", post(next_lead))
        .route("/api/leads/attention", get(attention_leads))
        .route("/api/leads/stats/:agent_id", get(get_agent_stats))
        .route("/api/leads/:lead_id", get(get_lead))
        .route("/api/leads/:lead_id/history", get(lead_history))
        .route("/api/leads/:lead_id/dispose", post(dispose_lead))
        .route("/api/leads/:lead_id/skip", post(skip_lead))
        .route("/api/leads/:lead_id/requeue", post(requeue_lead))
}
