// src/models/procurement.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El valor no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// --- 1. Orçamentos ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    pub department_id: Uuid,
    pub company_id: Uuid,
    pub amount: Decimal,
    pub budget_date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPayload {
    pub department_id: Uuid,
    #[validate(custom(function = "validate_not_negative"))]
    pub amount: Decimal,
    pub budget_date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BudgetFilter {
    pub department_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    pub id: Uuid,
    pub company_id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub line_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLinePayload {
    pub budget_id: Uuid,
    #[validate(length(min = 1, max = 20, message = "El nombre debe tener entre 1 y 20 caracteres."))]
    pub name: String,
    pub line_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLineFilter {
    pub budget_id: Option<Uuid>,
}

// --- 2. Ordens de compra ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "purchase_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PurchaseOrderStatus::Completed | PurchaseOrderStatus::Cancelled)
    }

    /// Transições permitidas: pendente -> aprovada/cancelada, aprovada -> concluída/cancelada.
    pub fn can_transition_to(self, next: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Cancelled) | (Approved, Completed) | (Approved, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub company_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub requested_by: Option<Uuid>,
    pub status: PurchaseOrderStatus,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub terms: Option<String>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderPayload {
    pub supplier_id: Option<Uuid>,
    /// Padrão: o próprio funcionário que cria
    pub requested_by: Option<Uuid>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub terms: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePurchaseOrderStatusPayload {
    pub status: PurchaseOrderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderFilter {
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLine {
    pub id: Uuid,
    pub company_id: Uuid,
    pub order_id: Uuid,
    pub budget_line_id: Uuid,
    pub catalog_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLinePayload {
    pub budget_line_id: Uuid,
    pub catalog_item_id: Uuid,
    #[validate(range(min = 1, message = "La cantidad debe ser mayor a cero."))]
    pub quantity: i32,
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use PurchaseOrderStatus::*;

    #[test]
    fn terminal_states_do_not_move() {
        for next in [Pending, Approved, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn pending_must_be_approved_before_completion() {
        assert!(!Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Completed));
    }
}
