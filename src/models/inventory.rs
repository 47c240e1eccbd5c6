// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// --- 1. Saldo de estoque (um item do catálogo em um local) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub location_id: Uuid,
    pub catalog_item_id: Uuid,
    pub purchase_line_id: Option<Uuid>,
    pub responsible_employee_id: Option<Uuid>,
    pub quantity: i32,
    pub initial_quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockRecordPayload {
    pub location_id: Uuid,
    pub catalog_item_id: Uuid,
    pub purchase_line_id: Option<Uuid>,
    pub responsible_employee_id: Option<Uuid>,
    #[validate(range(min = 0, message = "La cantidad inicial no puede ser negativa."))]
    #[serde(default)]
    pub initial_quantity: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct StockRecordFilter {
    pub location_id: Option<Uuid>,
    pub catalog_item_id: Option<Uuid>,
    pub responsible_employee_id: Option<Uuid>,
}

// --- 2. Movimentações ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "stock_movement_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum StockMovementKind {
    #[serde(alias = "entrada")]
    Inbound,
    #[serde(alias = "salida")]
    Outbound,
    #[serde(alias = "ajuste")]
    Adjustment,
}

impl StockMovementKind {
    /// O sinal do delta precisa combinar com o tipo.
    pub fn check_delta(self, delta: i32) -> Result<(), AppError> {
        let ok = match self {
            StockMovementKind::Inbound => delta > 0,
            StockMovementKind::Outbound => delta < 0,
            StockMovementKind::Adjustment => delta != 0,
        };
        if ok {
            Ok(())
        } else {
            Err(AppError::invalid(
                "quantityDelta",
                "La cantidad no corresponde al tipo de movimiento.",
            ))
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub stock_record_id: Uuid,
    pub kind: StockMovementKind,
    pub quantity_delta: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockMovementPayload {
    pub stock_record_id: Uuid,
    pub kind: StockMovementKind,
    #[schema(example = -3)]
    pub quantity_delta: i32,
    #[validate(length(max = 50, message = "La nota admite hasta 50 caracteres."))]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementFilter {
    pub stock_record_id: Option<Uuid>,
}

/// Saldo resultante de aplicar `delta`; nunca negativo.
pub fn apply_delta(quantity: i32, delta: i32) -> Result<i32, AppError> {
    match quantity.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ => Err(AppError::invalid(
            "quantityDelta",
            "Stock insuficiente para registrar el movimiento.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_sign_must_match_kind() {
        assert!(StockMovementKind::Inbound.check_delta(5).is_ok());
        assert!(StockMovementKind::Inbound.check_delta(-5).is_err());
        assert!(StockMovementKind::Outbound.check_delta(-1).is_ok());
        assert!(StockMovementKind::Outbound.check_delta(1).is_err());
        assert!(StockMovementKind::Adjustment.check_delta(-2).is_ok());
        assert!(StockMovementKind::Adjustment.check_delta(0).is_err());
    }

    #[test]
    fn stock_never_goes_negative() {
        assert_eq!(apply_delta(10, -10).unwrap(), 0);
        assert!(apply_delta(3, -4).is_err());
        assert!(apply_delta(i32::MAX, 1).is_err());
    }
}
