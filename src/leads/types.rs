//! Types for the lead workflow module
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sales::Sale;
use crate::shared::schema::{
    import_batches, lead_appliance_items, lead_dispositions, lead_sale_links, leads,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    CalledNoAnswer,
    Callback,
    SaleMade,
    Cancelled,
    DoNotCall,
    ConversionFailed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::CalledNoAnswer => "called_no_answer",
            LeadStatus::Callback => "callback",
            LeadStatus::SaleMade => "sale_made",
            LeadStatus::Cancelled => "cancelled",
            LeadStatus::DoNotCall => "do_not_call",
            LeadStatus::ConversionFailed => "conversion_failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(LeadStatus::New),
            "called_no_answer" => Some(LeadStatus::CalledNoAnswer),
            "callback" => Some(LeadStatus::Callback),
            "sale_made" => Some(LeadStatus::SaleMade),
            "cancelled" => Some(LeadStatus::Cancelled),
            "do_not_call" => Some(LeadStatus::DoNotCall),
            "conversion_failed" => Some(LeadStatus::ConversionFailed),
            _ => None,
        }
    }

    /// Terminal statuses never re-enter the calling queue.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeadStatus::SaleMade
                | LeadStatus::Cancelled
                | LeadStatus::DoNotCall
                | LeadStatus::ConversionFailed
        )
    }

    pub fn terminal_strs() -> [&'static str; 4] {
        [
            LeadStatus::SaleMade.as_str(),
            LeadStatus::Cancelled.as_str(),
            LeadStatus::DoNotCall.as_str(),
            LeadStatus::ConversionFailed.as_str(),
        ]
    }
}

/// Outcome an agent reports after working a checked-out lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionOutcome {
    CalledNoAnswer,
    Callback,
    SaleMade,
    Cancelled,
    DoNotCall,
}

impl DispositionOutcome {
    pub fn target_status(&self) -> LeadStatus {
        match self {
            DispositionOutcome::CalledNoAnswer => LeadStatus::CalledNoAnswer,
            DispositionOutcome::Callback => LeadStatus::Callback,
            DispositionOutcome::SaleMade => LeadStatus::SaleMade,
            DispositionOutcome::Cancelled => LeadStatus::Cancelled,
            DispositionOutcome::DoNotCall => LeadStatus::DoNotCall,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = leads)]
pub struct Lead {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub appliance_cover: bool,
    pub boiler_cover: bool,
    pub boiler_cover_price: Option<BigDecimal>,
    pub monthly_total: BigDecimal,
    pub status: String,
    pub assigned_agent_id: Uuid,
    pub checked_out_by: Option<Uuid>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub callback_at: Option<DateTime<Utc>>,
    pub times_contacted: i32,
    pub last_contact_attempt_at: Option<DateTime<Utc>>,
    pub last_disposition_at: Option<DateTime<Utc>>,
    pub last_disposition_by: Option<Uuid>,
    pub do_not_call: bool,
    pub import_batch_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = lead_appliance_items)]
pub struct LeadApplianceItem {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub appliance_type: String,
    pub brand: Option<String>,
    pub cover_limit: Option<BigDecimal>,
    pub monthly_cost: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = lead_dispositions)]
pub struct LeadDisposition {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub agent_id: Uuid,
    pub status: String,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = lead_sale_links)]
pub struct LeadSaleLink {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub sale_id: Uuid,
    pub agent_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = import_batches)]
pub struct ImportBatch {
    pub id: Uuid,
    pub source: String,
    pub label: Option<String>,
    pub lead_count: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextLeadRequest {
    pub agent_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadDetail {
    pub lead: Lead,
    pub appliance_items: Vec<LeadApplianceItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextLeadResponse {
    pub lead: Option<LeadDetail>,
    pub has_more: bool,
    pub stats: LeadStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisposeLeadRequest {
    pub agent_id: Uuid,
    pub outcome: DispositionOutcome,
    pub notes: Option<String>,
    pub callback_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisposeLeadResponse {
    pub lead: Lead,
    pub sale: Option<Sale>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipLeadRequest {
    pub agent_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipLeadResponse {
    pub released: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadStats {
    pub total_assigned: i64,
    pub new_leads: i64,
    pub callbacks_due: i64,
    pub callbacks_scheduled: i64,
    pub no_answer: i64,
    pub contacted: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplianceItemInput {
    pub appliance_type: String,
    pub brand: Option<String>,
    pub cover_limit: Option<BigDecimal>,
    pub monthly_cost: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeadRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub boiler_cover: Option<bool>,
    pub boiler_cover_price: Option<BigDecimal>,
    pub appliance_items: Option<Vec<ApplianceItemInput>>,
    pub assigned_agent_id: Uuid,
    pub created_by: Option<Uuid>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadImportRecord {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub boiler_cover: Option<bool>,
    pub boiler_cover_price: Option<BigDecimal>,
    pub appliance_items: Option<Vec<ApplianceItemInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportLeadsRequest {
    pub source: String,
    pub label: Option<String>,
    pub created_by: Option<Uuid>,
    pub agent_ids: Vec<Uuid>,
    pub leads: Vec<LeadImportRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportLeadsResponse {
    pub batch_id: Uuid,
    pub imported: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequeueLeadRequest {
    pub requested_by: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListLeadsQuery {
    pub status: Option<String>,
    pub agent_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
