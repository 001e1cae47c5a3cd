use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use log::info;
use uuid::Uuid;

use crate::leads::error::WorkflowError;
use crate::leads::types::{
    ApplianceItemInput, CreateLeadRequest, ImportBatch, ImportLeadsRequest, ImportLeadsResponse,
    Lead, LeadApplianceItem, LeadDetail, LeadImportRecord, LeadStatus,
};
use crate::shared::schema::{import_batches, lead_appliance_items, leads};

/// Spread imported leads across agents in arrival order. Callers must pass a
/// non-empty slice.
pub fn assign_round_robin(index: usize, agents: &[Uuid]) -> Uuid {
    agents[index % agents.len()]
}

/// Monthly plan price: appliance item costs plus the boiler price when boiler
/// cover was taken.
pub fn monthly_total(
    boiler_cover: bool,
    boiler_cover_price: &Option<BigDecimal>,
    items: &[ApplianceItemInput],
) -> BigDecimal {
    let mut total = items
        .iter()
        .fold(BigDecimal::from(0), |acc, item| acc + &item.monthly_cost);
    if boiler_cover {
        if let Some(price) = boiler_cover_price {
            total = total + price;
        }
    }
    total
}

pub fn build_lead(
    record: &LeadImportRecord,
    assigned_agent_id: Uuid,
    import_batch_id: Option<Uuid>,
    created_by: Option<Uuid>,
    source: Option<String>,
    now: DateTime<Utc>,
) -> (Lead, Vec<LeadApplianceItem>) {
    let lead_id = Uuid::new_v4();
    let items = record.appliance_items.clone().unwrap_or_default();
    let boiler_cover = record.boiler_cover.unwrap_or(false);

    let lead = Lead {
        id: lead_id,
        first_name: record.first_name.trim().to_string(),
        last_name: record.last_name.trim().to_string(),
        phone: record.phone.trim().to_string(),
        email: record.email.clone(),
        address_line1: record.address_line1.clone(),
        address_line2: record.address_line2.clone(),
        city: record.city.clone(),
        postcode: record.postcode.clone(),
        appliance_cover: !items.is_empty(),
        boiler_cover,
        boiler_cover_price: record.boiler_cover_price.clone(),
        monthly_total: monthly_total(boiler_cover, &record.boiler_cover_price, &items),
        status: LeadStatus::New.as_str().to_string(),
        assigned_agent_id,
        checked_out_by: None,
        checked_out_at: None,
        callback_at: None,
        times_contacted: 0,
        last_contact_attempt_at: None,
        last_disposition_at: None,
        last_disposition_by: None,
        do_not_call: false,
        import_batch_id,
        created_by,
        source,
        created_at: now,
        updated_at: now,
    };

    let appliance_items = items
        .iter()
        .map(|input| LeadApplianceItem {
            id: Uuid::new_v4(),
            lead_id,
            appliance_type: input.appliance_type.clone(),
            brand: input.brand.clone(),
            cover_limit: input.cover_limit.clone(),
            monthly_cost: input.monthly_cost.clone(),
            created_at: now,
        })
        .collect();

    (lead, appliance_items)
}

/// Import a batch of leads in one transaction, spreading them across the
/// given agents round-robin.
pub fn import_batch(
    conn: &mut PgConnection,
    request: &ImportLeadsRequest,
) -> Result<ImportLeadsResponse, WorkflowError> {
    if request.agent_ids.is_empty() {
        return Err(WorkflowError::Validation(
            "at least one agent is required for an import".to_string(),
        ));
    }
    if request.leads.is_empty() {
        return Err(WorkflowError::Validation(
            "import contains no leads".to_string(),
        ));
    }
    for (index, record) in request.leads.iter().enumerate() {
        validate_record(record)
            .map_err(|msg| WorkflowError::Validation(format!("lead {}: {}", index, msg)))?;
    }

    let now = Utc::now();
    let batch_id = Uuid::new_v4();

    conn.transaction::<_, WorkflowError, _>(|conn| {
        let batch = ImportBatch {
            id: batch_id,
            source: request.source.clone(),
            label: request.label.clone(),
            lead_count: request.leads.len() as i32,
            created_by: request.created_by,
            created_at: now,
        };
        diesel::insert_into(import_batches::table)
            .values(&batch)
            .execute(conn)?;

        for (index, record) in request.leads.iter().enumerate() {
            let agent_id = assign_round_robin(index, &request.agent_ids);
            let (lead, items) = build_lead(
                record,
                agent_id,
                Some(batch_id),
                request.created_by,
                Some(request.source.clone()),
                now,
            );
            diesel::insert_into(leads::table)
                .values(&lead)
                .execute(conn)?;
            if !items.is_empty() {
                diesel::insert_into(lead_appliance_items::table)
                    .values(&items)
                    .execute(conn)?;
            }
        }
        Ok(())
    })?;

    info!(
        "[LEADS] Imported {} leads in batch {} from {}",
        request.leads.len(),
        batch_id,
        request.source
    );

    Ok(ImportLeadsResponse {
        batch_id,
        imported: request.leads.len(),
    })
}

/// Create a single lead entered by hand.
pub fn create_lead(
    conn: &mut PgConnection,
    request: &CreateLeadRequest,
) -> Result<LeadDetail, WorkflowError> {
    let record = LeadImportRecord {
        first_name: request.first_name.clone(),
        last_name: request.last_name.clone(),
        phone: request.phone.clone(),
        email: request.email.clone(),
        address_line1: request.address_line1.clone(),
        address_line2: request.address_line2.clone(),
        city: request.city.clone(),
        postcode: request.postcode.clone(),
        boiler_cover: request.boiler_cover,
        boiler_cover_price: request.boiler_cover_price.clone(),
        appliance_items: request.appliance_items.clone(),
    };
    validate_record(&record).map_err(WorkflowError::Validation)?;

    let now = Utc::now();
    let (lead, items) = build_lead(
        &record,
        request.assigned_agent_id,
        None,
        request.created_by,
        request.source.clone(),
        now,
    );

    conn.transaction::<_, WorkflowError, _>(|conn| {
        diesel::insert_into(leads::table)
            .values(&lead)
            .execute(conn)?;
        if !items.is_empty() {
            diesel::insert_into(lead_appliance_items::table)
                .values(&items)
                .execute(conn)?;
        }
        Ok(())
    })?;

    Ok(LeadDetail {
        lead,
        appliance_items: items,
    })
}

fn validate_record(record: &LeadImportRecord) -> Result<(), String> {
    if record.first_name.trim().is_empty() {
        return Err("first_name is required".to_string());
    }
    if record.last_name.trim().is_empty() {
        return Err("last_name is required".to_string());
    }
    if record.phone.trim().is_empty() {
        return Err("phone is required".to_string());
    }
    Ok(())
}
