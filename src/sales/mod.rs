use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::{sale_appliance_items, sales};
use crate::shared::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = sales)]
pub struct Sale {
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
    pub bank_account: String,
    pub sort_code: String,
    pub first_collection_date: NaiveDate,
    pub payment_status: String,
    pub agent_id: Uuid,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = sale_appliance_items)]
pub struct SaleApplianceItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub appliance_type: String,
    pub brand: Option<String>,
    pub cover_limit: Option<BigDecimal>,
    pub monthly_cost: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub appliance_items: Vec<SaleApplianceItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListSalesQuery {
    pub agent_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub fn insert_sale(
    conn: &mut PgConnection,
    sale: &Sale,
    items: &[SaleApplianceItem],
) -> QueryResult<()> {
    diesel::insert_into(sales::table).values(sale).execute(conn)?;
    if !items.is_empty() {
        diesel::insert_into(sale_appliance_items::table)
            .values(items)
            .execute(conn)?;
    }
    Ok(())
}

pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSalesQuery>,
) -> Result<Json<Vec<Sale>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut db_query = sales::table.into_boxed();
    if let Some(agent_id) = query.agent_id {
        db_query = db_query.filter(sales::agent_id.eq(agent_id));
    }

    let rows = db_query
        .order(sales::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<Sale>(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    Ok(Json(rows))
}

pub async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<SaleDetail>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let sale = sales::table
        .filter(sales::id.eq(sale_id))
        .first::<Sale>(&mut conn)
        .optional()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?
        .ok_or((StatusCode::NOT_FOUND, "Sale not found".to_string()))?;

    let appliance_items = sale_appliance_items::table
        .filter(sale_appliance_items::sale_id.eq(sale_id))
        .order(sale_appliance_items::created_at.asc())
        .load::<SaleApplianceItem>(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    Ok(Json(SaleDetail {
        sale,
        appliance_items,
    }))
}

pub fn configure_sales_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sales", get(list_sales))
        .route("/api/sales/:sale_id", get(get_sale))
}
