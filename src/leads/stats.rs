use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::leads::types::{LeadStats, LeadStatus};
use crate::shared::schema::leads;

/// Queue counters shown to an agent alongside every hand-out.
pub fn agent_stats(
    conn: &mut PgConnection,
    agent_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<LeadStats> {
    let total_assigned: i64 = leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::status.ne_all(LeadStatus::terminal_strs().to_vec()))
        .filter(leads::do_not_call.eq(false))
        .count()
        .get_result(conn)?;

    let new_leads: i64 = leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::status.eq(LeadStatus::New.as_str()))
        .count()
        .get_result(conn)?;

    let callbacks_due: i64 = leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::status.eq(LeadStatus::Callback.as_str()))
        .filter(leads::callback_at.le(now))
        .count()
        .get_result(conn)?;

    let callbacks_scheduled: i64 = leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::status.eq(LeadStatus::Callback.as_str()))
        .filter(leads::callback_at.gt(now))
        .count()
        .get_result(conn)?;

    let no_answer: i64 = leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::status.eq(LeadStatus::CalledNoAnswer.as_str()))
        .count()
        .get_result(conn)?;

    let contacted: i64 = leads::table
        .filter(leads::assigned_agent_id.eq(agent_id))
        .filter(leads::last_disposition_at.is_not_null())
        .count()
        .get_result(conn)?;

    Ok(LeadStats {
        total_assigned,
        new_leads,
        callbacks_due,
        callbacks_scheduled,
        no_answer,
        contacted,
    })
}
