use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use log::info;
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::leads::checkout;
use crate::leads::error::WorkflowError;
use crate::leads::types::{Lead, LeadStatus};
use crate::shared::schema::leads;

pub struct SelectionOutcome {
    pub lead: Option<Lead>,
    pub has_more: bool,
}

/// Pick the next workable lead for an agent and check it out.
///
/// Due callbacks always win over fresh leads. Fresh leads are served oldest
/// contact attempt first with never-contacted leads ahead of everything.
/// Candidates claimed by a concurrent request are skipped, not errored.
pub fn next_lead_for_agent(
    conn: &mut PgConnection,
    agent_id: Uuid,
    workflow: &WorkflowConfig,
) -> Result<SelectionOutcome, WorkflowError> {
    let now = Utc::now();

    let swept = checkout::sweep_stale(conn, workflow.checkout_ttl_minutes, now)?;
    if swept > 0 {
        info!("[LEADS] Cleared {} stale checkouts", swept);
    }

    for lead_id in due_callback_candidates(conn, agent_id, now, workflow.selection_batch)? {
        if let Some(lead) = checkout::checkout(conn, lead_id, agent_id, now)? {
            let has_more = eligible_remaining(conn, agent_id, now, Some(lead.id))? > 0;
            return Ok(SelectionOutcome {
                lead: Some(lead),
                has_more,
            });
        }
    }

    for lead_id in fresh_candidates(conn, agent_id, workflow.selection_batch)? {
        if let Some(lead) = checkout::checkout(conn, lead_id, agent_id, now)? {
            let has_more = eligible_remaining(conn, agent_id, now, Some(lead.id))? > 0;
            return Ok(SelectionOutcome {
                lead: Some(lead),
                has_more,
            });
        }
    }

    let has_more = eligible_remaining(conn, agent_id, now, None)? > 0;
    Ok(SelectionOutcome {
        lead: None,
        has_more,
    })
}

fn due_callback_candidates(
    conn: &mut PgConnection,
    agent_id: Uuid,
    now: DateTime<Utc>,
    batch: i64,
) -> QueryResult<Vec<Uuid>> {
    leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::status.eq(LeadStatus::Callback.as_str()))
        .filter(leads::callback_at.le(now))
        .filter(leads::do_not_call.eq(false))
        .filter(leads::checked_out_by.is_null())
        .order(leads::callback_at.asc())
        .limit(batch)
        .select(leads::id)
        .load::<Uuid>(conn)
}

fn fresh_candidates(
    conn: &mut PgConnection,
    agent_id: Uuid,
    batch: i64,
) -> QueryResult<Vec<Uuid>> {
    leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::status.eq_any(vec![
            LeadStatus::New.as_str(),
            LeadStatus::CalledNoAnswer.as_str(),
        ]))
        .filter(leads::do_not_call.eq(false))
        .filter(leads::checked_out_by.is_null())
        .order((
            leads::last_contact_attempt_at.asc().nulls_first(),
            leads::created_at.asc(),
        ))
        .limit(batch)
        .select(leads::id)
        .load::<Uuid>(conn)
}

/// Count leads the agent could still work, regardless of who currently holds
/// a checkout on them.
fn eligible_remaining(
    conn: &mut PgConnection,
    agent_id: Uuid,
    now: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> QueryResult<i64> {
    let query = leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::do_not_call.eq(false))
        .filter(
            leads::status
                .eq(LeadStatus::Callback.as_str())
                .and(leads::callback_at.le(now))
                .or(leads::status.eq_any(vec![
                    LeadStatus::New.as_str(),
                    LeadStatus::CalledNoAnswer.as_str(),
                ])),
        );

    match exclude {
        Some(lead_id) => query
            .filter(leads::id.ne(lead_id))
            .count()
            .get_result(conn),
        None => query.count().get_result(conn),
    }
}
