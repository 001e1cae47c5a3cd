//! Lead to sale conversion
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::leads::error::WorkflowError;
use crate::leads::types::{Lead, LeadApplianceItem, LeadSaleLink};
use crate::sales::{self, Sale, SaleApplianceItem};
use crate::shared::schema::{lead_appliance_items, lead_sale_links};

/// Placeholder for direct debit fields collected later by the payments team.
pub const PENDING_PAYMENT_DETAIL: &str = "PENDING";
pub const INITIAL_PAYMENT_STATUS: &str = "awaiting_details";
/// Days between closing the sale and the first collection.
pub const FIRST_COLLECTION_DELAY_DAYS: i64 = 14;

/// Map a lead and its appliance items onto a new sale record.
pub fn build_sale(
    lead: &Lead,
    items: &[LeadApplianceItem],
    agent_id: Uuid,
    now: DateTime<Utc>,
) -> (Sale, Vec<SaleApplianceItem>) {
    let sale_id = Uuid::new_v4();

    let sale = Sale {
        id: sale_id,
        first_name: lead.first_name.clone(),
        last_name: lead.last_name.clone(),
        phone: lead.phone.clone(),
        email: lead.email.clone(),
        address_line1: lead.address_line1.clone(),
        address_line2: lead.address_line2.clone(),
        city: lead.city.clone(),
        postcode: lead.postcode.clone(),
        appliance_cover: lead.appliance_cover,
        boiler_cover: lead.boiler_cover,
        boiler_cover_price: lead.boiler_cover_price.clone(),
        monthly_total: lead.monthly_total.clone(),
        bank_account: PENDING_PAYMENT_DETAIL.to_string(),
        sort_code: PENDING_PAYMENT_DETAIL.to_string(),
        first_collection_date: (now + Duration::days(FIRST_COLLECTION_DELAY_DAYS)).date_naive(),
        payment_status: INITIAL_PAYMENT_STATUS.to_string(),
        agent_id,
        source: lead.source.clone(),
        created_at: now,
        updated_at: now,
    };

    let sale_items = items
        .iter()
        .map(|item| SaleApplianceItem {
            id: Uuid::new_v4(),
            sale_id,
            appliance_type: item.appliance_type.clone(),
            brand: item.brand.clone(),
            cover_limit: item.cover_limit.clone(),
            monthly_cost: item.monthly_cost.clone(),
            created_at: now,
        })
        .collect();

    (sale, sale_items)
}

/// Create the sale, its appliance items and the lead link inside the caller's
/// transaction. Every failure is reported as `Conversion` so the disposition
/// layer can compensate rather than fail the request.
pub fn convert_lead(
    conn: &mut PgConnection,
    lead: &Lead,
    agent_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Sale, WorkflowError> {
    let items: Vec<LeadApplianceItem> = lead_appliance_items::table
        .filter(lead_appliance_items::lead_id.eq(lead.id))
        .order(lead_appliance_items::created_at.asc())
        .load(conn)
        .map_err(|e| WorkflowError::Conversion(format!("loading appliance items: {e}")))?;

    let (sale, sale_items) = build_sale(lead, &items, agent_id, now);

    sales::insert_sale(conn, &sale, &sale_items)
        .map_err(|e| WorkflowError::Conversion(format!("creating sale: {e}")))?;

    let link = LeadSaleLink {
        id: Uuid::new_v4(),
        lead_id: lead.id,
        sale_id: sale.id,
        agent_id,
        created_at: now,
    };
    diesel::insert_into(lead_sale_links::table)
        .values(&link)
        .execute(conn)
        .map_err(|e| WorkflowError::Conversion(format!("linking sale to lead: {e}")))?;

    Ok(sale)
}
