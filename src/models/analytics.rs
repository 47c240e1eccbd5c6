// src/models/analytics.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenancePrediction {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub asset_id: Uuid,
    pub failure_probability: Decimal,
    pub predicted_failure_on: Option<NaiveDate>,
    pub model_version: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPrediction {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub department_id: Uuid,
    pub period_start: NaiveDate,
    pub suggested_amount: Decimal,
    pub confidence: Decimal,
    pub generated_at: DateTime<Utc>,
}
