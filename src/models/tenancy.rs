// src/models/tenancy.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- 1. Empresa (o tenant) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    #[schema(example = "ACME S.R.L.")]
    pub name: String,
    #[schema(example = "1020304050")]
    pub tax_id: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- 2. Assinatura ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "subscription_plan", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[serde(alias = "basico")]
    Basic,
    #[serde(alias = "profesional")]
    Professional,
    #[serde(alias = "empresarial")]
    Enterprise,
}

/// Limite usado como "ilimitado": não dispara aviso de 90%.
pub const UNLIMITED_SENTINEL: i32 = 9999;

pub const PLAN_VALIDITY_DAYS: i64 = 30;

impl SubscriptionPlan {
    /// (max_users, max_assets)
    pub fn limits(self) -> (i32, i32) {
        match self {
            SubscriptionPlan::Basic => (5, 50),
            SubscriptionPlan::Professional => (20, 200),
            SubscriptionPlan::Enterprise => (9999, 99999),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubscriptionPlan::Basic => "Básico",
            SubscriptionPlan::Professional => "Profesional",
            SubscriptionPlan::Enterprise => "Empresarial",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub company_id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub max_users: i32,
    pub max_assets: i32,
}

/// Recurso contado contra os limites da assinatura.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Employees,
    Assets,
}

impl LimitKind {
    pub fn key(self) -> &'static str {
        match self {
            LimitKind::Employees => "employees",
            LimitKind::Assets => "assets",
        }
    }

    pub fn cap(self, subscription: &Subscription) -> i32 {
        match self {
            LimitKind::Employees => subscription.max_users,
            LimitKind::Assets => subscription.max_assets,
        }
    }
}

// --- 3. Cadastro de nova empresa (onboarding) ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCompanyPayload {
    #[validate(length(min = 1, max = 100, message = "El nombre de la empresa es obligatorio."))]
    #[schema(example = "ACME S.R.L.")]
    pub company_name: String,
    #[validate(length(min = 1, max = 20, message = "El NIT es obligatorio."))]
    pub company_tax_id: String,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    #[validate(email(message = "El correo de la empresa no es válido."))]
    pub company_email: Option<String>,

    #[validate(length(min = 3, max = 150, message = "El usuario debe tener entre 3 y 150 caracteres."))]
    #[schema(example = "admin_acme")]
    pub admin_username: String,
    #[validate(email(message = "El correo no es válido."))]
    pub admin_email: String,
    #[validate(length(min = 8, message = "La contraseña debe tener al menos 8 caracteres."))]
    pub admin_password: String,
    #[validate(length(min = 1, max = 100))]
    pub admin_first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub admin_paternal_surname: String,
    pub admin_maternal_surname: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub admin_national_id: String,

    pub plan: SubscriptionPlan,
}

// --- 4. Globais (moedas e impostos) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id: Uuid,
    pub name: String,
    #[schema(example = "BOB")]
    pub code: String,
    pub symbol: String,
    pub exchange_rate: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyPayload {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(equal = 3, message = "El código debe tener 3 letras."))]
    pub code: String,
    #[validate(length(min = 1, max = 5))]
    pub symbol: String,
    pub exchange_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tax {
    pub id: Uuid,
    pub name: String,
    #[schema(example = 13.0)]
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxPayload {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub rate: Decimal,
}
