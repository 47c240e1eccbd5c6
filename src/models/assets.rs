// src/models/assets.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;

// --- 1. Ativo fixo ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Laptop Dell Latitude")]
    pub name: String,
    #[schema(example = "AF-0001")]
    pub internal_code: String,
    pub serial_number: Option<String>,
    pub acquired_on: NaiveDate,
    #[schema(example = 1500.00)]
    pub current_value: Decimal,
    pub useful_life_years: i32,
    pub catalog_item_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub state_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Maior valor que cabe em `NUMERIC(12, 2)`.
pub fn max_asset_value() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn validate_asset_value(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El valor no puede ser negativo.".into());
        return Err(err);
    }
    if *val > max_asset_value() {
        let mut err = ValidationError::new("range");
        err.message = Some("El valor excede el máximo permitido.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetPayload {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio."))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "El código interno es obligatorio."))]
    pub internal_code: String,
    #[validate(length(max = 100))]
    pub serial_number: Option<String>,
    pub acquired_on: NaiveDate,
    #[validate(custom(function = "validate_asset_value"))]
    pub current_value: Decimal,
    #[validate(range(min = 0, message = "La vida útil no puede ser negativa."))]
    pub useful_life_years: i32,
    pub catalog_item_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub state_id: Uuid,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AssetFilter {
    /// Busca em nome, código e série
    pub search: Option<String>,
    pub department_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub state_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub catalog_item_id: Option<Uuid>,
    pub acquired_from: Option<NaiveDate>,
    pub acquired_to: Option<NaiveDate>,
    pub min_value: Option<Decimal>,
    pub max_value: Option<Decimal>,
}

// --- 2. Reavaliação ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "revaluation_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum RevaluationMethod {
    Factor,
    Fixed,
    Percentage,
}

impl RevaluationMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "factor" => Some(RevaluationMethod::Factor),
            "fixed" | "fijo" => Some(RevaluationMethod::Fixed),
            "percentage" | "porcentual" => Some(RevaluationMethod::Percentage),
            _ => None,
        }
    }
}

// Registro do histórico. Somente inserção.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Revaluation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub asset_id: Uuid,
    pub method: RevaluationMethod,
    pub previous_value: Decimal,
    pub new_value: Decimal,
    pub factor: Decimal,
    pub notes: Option<String>,
    pub performed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRevaluationPayload {
    pub asset_id: Uuid,
    #[schema(example = "percentage")]
    pub method: String,
    /// Número ou texto decimal
    #[schema(value_type = String, example = "15.5")]
    pub value: Value,
    pub notes: Option<String>,
}

impl ExecuteRevaluationPayload {
    pub fn parsed_method(&self) -> Result<RevaluationMethod, AppError> {
        RevaluationMethod::parse(&self.method).ok_or_else(|| {
            AppError::invalid("method", "Método inválido. Use 'factor', 'fixed' o 'percentage'.")
        })
    }

    pub fn parsed_value(&self) -> Result<Decimal, AppError> {
        let text = match &self.value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return Err(AppError::invalid("value", "El valor debe ser numérico.")),
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| AppError::invalid("value", "El valor debe ser numérico."))
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RevaluationFilter {
    pub asset_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(method: &str, value: Value) -> ExecuteRevaluationPayload {
        ExecuteRevaluationPayload {
            asset_id: Uuid::new_v4(),
            method: method.to_string(),
            value,
            notes: None,
        }
    }

    #[test]
    fn accepts_spanish_method_aliases() {
        assert_eq!(payload("fijo", json!(1)).parsed_method().unwrap(), RevaluationMethod::Fixed);
        assert_eq!(
            payload("Porcentual", json!(1)).parsed_method().unwrap(),
            RevaluationMethod::Percentage
        );
        assert!(payload("linear", json!(1)).parsed_method().is_err());
    }

    #[test]
    fn value_accepts_numbers_and_numeric_text() {
        assert_eq!(payload("factor", json!("1.25")).parsed_value().unwrap(), Decimal::new(125, 2));
        assert_eq!(payload("factor", json!(2)).parsed_value().unwrap(), Decimal::from(2));
    }

    #[test]
    fn value_rejects_garbage() {
        assert!(matches!(
            payload("factor", json!("abc")).parsed_value(),
            Err(AppError::InvalidInput { .. })
        ));
        assert!(payload("factor", json!(null)).parsed_value().is_err());
    }

    #[test]
    fn asset_value_must_fit_the_money_column() {
        assert!(validate_asset_value(&Decimal::new(999_999_999_999, 2)).is_ok());
        assert!(validate_asset_value(&Decimal::new(1_000_000_000_000, 2)).is_err());
        assert!(validate_asset_value(&Decimal::new(-1, 2)).is_err());
    }
}
