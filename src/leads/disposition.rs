//! Disposition state machine - applies contact outcomes to checked-out leads
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use log::{info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::leads::conversion;
use crate::leads::error::WorkflowError;
use crate::leads::types::{DispositionOutcome, Lead, LeadDisposition, LeadStatus};
use crate::sales::Sale;
use crate::shared::schema::{lead_dispositions, lead_sale_links, leads};

pub struct DispositionApplied {
    pub lead: Lead,
    pub sale: Option<Sale>,
}

/// Apply a reported outcome to a lead the agent currently holds.
///
/// The status change, its side effects and the history row commit in one
/// transaction. A failed sale conversion is absorbed: the lead lands in
/// `conversion_failed` with the error recorded, and the request still
/// succeeds from the agent's point of view.
pub fn apply_disposition(
    conn: &mut PgConnection,
    lead_id: Uuid,
    agent_id: Uuid,
    outcome: DispositionOutcome,
    notes: Option<String>,
    callback_at: Option<DateTime<Utc>>,
    workflow: &WorkflowConfig,
) -> Result<DispositionApplied, WorkflowError> {
    let now = Utc::now();

    let lead: Lead = leads::table
        .filter(leads::id.eq(lead_id))
        .first(conn)
        .optional()?
        .ok_or(WorkflowError::NotFound(lead_id))?;

    if lead.checked_out_by != Some(agent_id) {
        return Err(WorkflowError::LockViolation { lead_id, agent_id });
    }

    let current = LeadStatus::parse(&lead.status).ok_or_else(|| {
        WorkflowError::Validation(format!("unknown lead status: {}", lead.status))
    })?;
    if current.is_terminal() {
        return Err(WorkflowError::Validation(format!(
            "lead is already closed as {}",
            current.as_str()
        )));
    }

    let linked: i64 = lead_sale_links::table
        .filter(lead_sale_links::lead_id.eq(lead_id))
        .count()
        .get_result(conn)?;
    if linked > 0 {
        return Err(WorkflowError::AlreadyConverted(lead_id));
    }

    match outcome {
        DispositionOutcome::CalledNoAnswer => {
            let updated = conn.transaction::<Lead, WorkflowError, _>(|conn| {
                let updated = diesel::update(
                    leads::table
                        .filter(leads::id.eq(lead_id))
                        .filter(leads::checked_out_by.eq(agent_id)),
                )
                .set((
                    leads::status.eq(LeadStatus::CalledNoAnswer.as_str()),
                    leads::times_contacted.eq(leads::times_contacted + 1),
                    leads::last_contact_attempt_at.eq(now),
                    leads::checked_out_by.eq(None::<Uuid>),
                    leads::checked_out_at.eq(None::<DateTime<Utc>>),
                    leads::last_disposition_at.eq(now),
                    leads::last_disposition_by.eq(agent_id),
                    leads::updated_at.eq(now),
                ))
                .get_result::<Lead>(conn)
                .optional()?
                .ok_or(WorkflowError::LockViolation { lead_id, agent_id })?;

                record_disposition(
                    conn,
                    lead_id,
                    agent_id,
                    LeadStatus::CalledNoAnswer,
                    &notes,
                    None,
                    now,
                )?;
                Ok(updated)
            })?;
            Ok(DispositionApplied {
                lead: updated,
                sale: None,
            })
        }
        DispositionOutcome::Callback => {
            let callback_time = validate_callback_at(callback_at, now, workflow)?;
            let updated = conn.transaction::<Lead, WorkflowError, _>(|conn| {
                let updated = diesel::update(
                    leads::table
                        .filter(leads::id.eq(lead_id))
                        .filter(leads::checked_out_by.eq(agent_id)),
                )
                .set((
                    leads::status.eq(LeadStatus::Callback.as_str()),
                    leads::callback_at.eq(callback_time),
                    leads::checked_out_by.eq(None::<Uuid>),
                    leads::checked_out_at.eq(None::<DateTime<Utc>>),
                    leads::last_disposition_at.eq(now),
                    leads::last_disposition_by.eq(agent_id),
                    leads::updated_at.eq(now),
                ))
                .get_result::<Lead>(conn)
                .optional()?
                .ok_or(WorkflowError::LockViolation { lead_id, agent_id })?;

                record_disposition(
                    conn,
                    lead_id,
                    agent_id,
                    LeadStatus::Callback,
                    &notes,
                    Some(json!({ "callback_at": callback_time })),
                    now,
                )?;
                Ok(updated)
            })?;
            Ok(DispositionApplied {
                lead: updated,
                sale: None,
            })
        }
        DispositionOutcome::Cancelled => {
            let updated = close_lead(conn, lead_id, agent_id, LeadStatus::Cancelled, &notes, now)?;
            Ok(DispositionApplied {
                lead: updated,
                sale: None,
            })
        }
        DispositionOutcome::DoNotCall => {
            let updated = conn.transaction::<Lead, WorkflowError, _>(|conn| {
                let updated = diesel::update(
                    leads::table
                        .filter(leads::id.eq(lead_id))
                        .filter(leads::checked_out_by.eq(agent_id)),
                )
                .set((
                    leads::status.eq(LeadStatus::DoNotCall.as_str()),
                    leads::do_not_call.eq(true),
                    leads::checked_out_by.eq(None::<Uuid>),
                    leads::checked_out_at.eq(None::<DateTime<Utc>>),
                    leads::last_disposition_at.eq(now),
                    leads::last_disposition_by.eq(agent_id),
                    leads::updated_at.eq(now),
                ))
                .get_result::<Lead>(conn)
                .optional()?
                .ok_or(WorkflowError::LockViolation { lead_id, agent_id })?;

                record_disposition(
                    conn,
                    lead_id,
                    agent_id,
                    LeadStatus::DoNotCall,
                    &notes,
                    None,
                    now,
                )?;
                Ok(updated)
            })?;
            Ok(DispositionApplied {
                lead: updated,
                sale: None,
            })
        }
        DispositionOutcome::SaleMade => apply_sale(conn, &lead, agent_id, notes, now),
    }
}

/// Move a failed conversion back into the calling queue. Operator action;
/// does not require a checkout.
pub fn requeue_conversion_failed(
    conn: &mut PgConnection,
    lead_id: Uuid,
    requested_by: Uuid,
) -> Result<Lead, WorkflowError> {
    let now = Utc::now();
    conn.transaction::<Lead, WorkflowError, _>(|conn| {
        let updated = diesel::update(
            leads::table
                .filter(leads::id.eq(lead_id))
                .filter(leads::status.eq(LeadStatus::ConversionFailed.as_str())),
        )
        .set((
            leads::status.eq(LeadStatus::CalledNoAnswer.as_str()),
            leads::checked_out_by.eq(None::<Uuid>),
            leads::checked_out_at.eq(None::<DateTime<Utc>>),
            leads::updated_at.eq(now),
        ))
        .get_result::<Lead>(conn)
        .optional()?;

        let updated = match updated {
            Some(lead) => lead,
            None => {
                let exists: i64 = leads::table
                    .filter(leads::id.eq(lead_id))
                    .count()
                    .get_result(conn)?;
                if exists == 0 {
                    return Err(WorkflowError::NotFound(lead_id));
                }
                return Err(WorkflowError::Validation(
                    "only conversion_failed leads can be requeued".to_string(),
                ));
            }
        };

        record_disposition(
            conn,
            lead_id,
            requested_by,
            LeadStatus::CalledNoAnswer,
            &None,
            Some(json!({ "requeued_from": LeadStatus::ConversionFailed.as_str() })),
            now,
        )?;

        info!("[LEADS] Lead {} requeued by {}", lead_id, requested_by);
        Ok(updated)
    })
}

fn apply_sale(
    conn: &mut PgConnection,
    lead: &Lead,
    agent_id: Uuid,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<DispositionApplied, WorkflowError> {
    let lead_id = lead.id;

    let converted = conn.transaction::<(Lead, Sale), WorkflowError, _>(|conn| {
        let updated = diesel::update(
            leads::table
                .filter(leads::id.eq(lead_id))
                .filter(leads::checked_out_by.eq(agent_id)),
        )
        .set((
            leads::status.eq(LeadStatus::SaleMade.as_str()),
            leads::checked_out_by.eq(None::<Uuid>),
            leads::checked_out_at.eq(None::<DateTime<Utc>>),
            leads::last_disposition_at.eq(now),
            leads::last_disposition_by.eq(agent_id),
            leads::updated_at.eq(now),
        ))
        .get_result::<Lead>(conn)
        .optional()?
        .ok_or(WorkflowError::LockViolation { lead_id, agent_id })?;

        let sale = conversion::convert_lead(conn, lead, agent_id, now)?;

        record_disposition(
            conn,
            lead_id,
            agent_id,
            LeadStatus::SaleMade,
            &notes,
            Some(json!({ "sale_id": sale.id })),
            now,
        )?;
        Ok((updated, sale))
    });

    match converted {
        Ok((updated, sale)) => {
            info!("[LEADS] Lead {} converted to sale {}", lead_id, sale.id);
            Ok(DispositionApplied {
                lead: updated,
                sale: Some(sale),
            })
        }
        Err(WorkflowError::Conversion(reason)) => {
            warn!(
                "[LEADS] Sale conversion failed for lead {}: {}",
                lead_id, reason
            );
            let metadata = json!({ "error": reason });
            let failed = conn.transaction::<Lead, WorkflowError, _>(|conn| {
                let updated = diesel::update(
                    leads::table
                        .filter(leads::id.eq(lead_id))
                        .filter(leads::checked_out_by.eq(agent_id)),
                )
                .set((
                    leads::status.eq(LeadStatus::ConversionFailed.as_str()),
                    leads::checked_out_by.eq(None::<Uuid>),
                    leads::checked_out_at.eq(None::<DateTime<Utc>>),
                    leads::last_disposition_at.eq(now),
                    leads::last_disposition_by.eq(agent_id),
                    leads::updated_at.eq(now),
                ))
                .get_result::<Lead>(conn)
                .optional()?
                .ok_or(WorkflowError::LockViolation { lead_id, agent_id })?;

                record_disposition(
                    conn,
                    lead_id,
                    agent_id,
                    LeadStatus::ConversionFailed,
                    &notes,
                    Some(metadata),
                    now,
                )?;
                Ok(updated)
            })?;
            Ok(DispositionApplied {
                lead: failed,
                sale: None,
            })
        }
        Err(other) => Err(other),
    }
}

fn close_lead(
    conn: &mut PgConnection,
    lead_id: Uuid,
    agent_id: Uuid,
    status: LeadStatus,
    notes: &Option<String>,
    now: DateTime<Utc>,
) -> Result<Lead, WorkflowError> {
    conn.transaction::<Lead, WorkflowError, _>(|conn| {
        let updated = diesel::update(
            leads::table
                .filter(leads::id.eq(lead_id))
                .filter(leads::checked_out_by.eq(agent_id)),
        )
        .set((
            leads::status.eq(status.as_str()),
            leads::checked_out_by.eq(None::<Uuid>),
            leads::checked_out_at.eq(None::<DateTime<Utc>>),
            leads::last_disposition_at.eq(now),
            leads::last_disposition_by.eq(agent_id),
            leads::updated_at.eq(now),
        ))
        .get_result::<Lead>(conn)
        .optional()?
        .ok_or(WorkflowError::LockViolation { lead_id, agent_id })?;

        record_disposition(conn, lead_id, agent_id, status, notes, None, now)?;
        Ok(updated)
    })
}

fn record_disposition(
    conn: &mut PgConnection,
    lead_id: Uuid,
    agent_id: Uuid,
    status: LeadStatus,
    notes: &Option<String>,
    metadata: Option<serde_json::Value>,
    now: DateTime<Utc>,
) -> QueryResult<()> {
    let row = LeadDisposition {
        id: Uuid::new_v4(),
        lead_id,
        agent_id,
        status: status.as_str().to_string(),
        notes: notes.clone(),
        metadata,
        created_at: now,
    };
    diesel::insert_into(lead_dispositions::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

fn validate_callback_at(
    callback_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    workflow: &WorkflowConfig,
) -> Result<DateTime<Utc>, WorkflowError> {
    let callback_time = callback_at.ok_or_else(|| {
        WorkflowError::Validation("callback_at is required for callback dispositions".to_string())
    })?;

    let earliest = now - Duration::minutes(workflow.callback_grace_minutes);
    if callback_time < earliest {
        return Err(WorkflowError::Validation(format!(
            "callback_at {} is in the past",
            callback_time
        )));
    }

    let latest = now + Duration::days(workflow.callback_horizon_days);
    if callback_time > latest {
        return Err(WorkflowError::Validation(format!(
            "callback_at {} is more than {} days ahead",
            callback_time, workflow.callback_horizon_days
        )));
    }

    Ok(callback_time)
}
