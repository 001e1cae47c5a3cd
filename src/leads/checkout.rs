use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::leads::types::{Lead, LeadStatus};
use crate::shared::schema::leads;

/// Oldest acquisition instant that still counts as a live checkout.
pub fn stale_cutoff(now: DateTime<Utc>, ttl_minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(ttl_minutes)
}

pub fn lease_expired(checked_out_at: DateTime<Utc>, now: DateTime<Utc>, ttl_minutes: i64) -> bool {
    checked_out_at < stale_cutoff(now, ttl_minutes)
}

/// Claim a lead for an agent. The update only matches while no checkout is
/// held and the lead is still open, so concurrent claims resolve to a single
/// winner and a candidate closed in the meantime is passed over.
pub fn checkout(
    conn: &mut PgConnection,
    lead_id: Uuid,
    agent_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<Option<Lead>> {
    diesel::update(
        leads::table
            .filter(leads::id.eq(lead_id))
            .filter(leads::checked_out_by.is_null())
            .filter(leads::status.ne_all(LeadStatus::terminal_strs().to_vec())),
    )
    .set((
        leads::checked_out_by.eq(agent_id),
        leads::checked_out_at.eq(now),
        leads::updated_at.eq(now),
    ))
    .get_result::<Lead>(conn)
    .optional()
}

/// Release a checkout held by the given agent. Returns false when the agent
/// no longer holds the lead.
pub fn release(
    conn: &mut PgConnection,
    lead_id: Uuid,
    agent_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<bool> {
    let rows = diesel::update(
        leads::table
            .filter(leads::id.eq(lead_id))
            .filter(leads::checked_out_by.eq(agent_id)),
    )
    .set((
        leads::checked_out_by.eq(None::<Uuid>),
        leads::checked_out_at.eq(None::<DateTime<Utc>>),
        leads::updated_at.eq(now),
    ))
    .execute(conn)?;
    Ok(rows == 1)
}

/// Clear every checkout whose lease lapsed. Runs lazily ahead of selection
/// instead of on a background timer.
pub fn sweep_stale(
    conn: &mut PgConnection,
    ttl_minutes: i64,
    now: DateTime<Utc>,
) -> QueryResult<usize> {
    let cutoff = stale_cutoff(now, ttl_minutes);
    diesel::update(
        leads::table
            .filter(leads::checked_out_by.is_not_null())
            .filter(leads::checked_out_at.lt(cutoff)),
    )
    .set((
        leads::checked_out_by.eq(None::<Uuid>),
        leads::checked_out_at.eq(None::<DateTime<Utc>>),
        leads::updated_at.eq(now),
    ))
    .execute(conn)
}
