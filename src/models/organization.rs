// src/models/organization.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    middleware::rbac::{
        PermAssetStatesManage, PermCatalogManage, PermDepartmentsManage, PermJobTitlesManage,
        PermLocationsManage, PermSuppliersManage, PermissionDef,
    },
};

// =============================================================================
//  DADOS DE REFERÊNCIA DA EMPRESA
// =============================================================================

/// Entidade simples pertencente a uma empresa (departamento, cargo, local...).
///
/// O CRUD genérico em `db::reference_repo` e `handlers::organization` usa
/// estas constantes para montar o SQL; `push_values` emite os binds na mesma
/// ordem de `COLUMNS`.
pub trait ReferenceEntity:
    for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    const ENTITY: &'static str;
    const COLUMNS: &'static str;

    type Payload: DeserializeOwned + Validate + Send + Sync + 'static;
    type Manage: PermissionDef;

    fn push_values(payload: &Self::Payload, qb: &mut QueryBuilder<'_, Postgres>);
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedPayload {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio."))]
    #[schema(example = "Tecnología")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl ReferenceEntity for Department {
    const TABLE: &'static str = "departments";
    const ENTITY: &'static str = "department";
    const COLUMNS: &'static str = "name, description";
    type Payload = NamedPayload;
    type Manage = PermDepartmentsManage;

    fn push_values(p: &NamedPayload, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut s = qb.separated(", ");
        s.push_bind(p.name.trim().to_string());
        s.push_bind(p.description.clone());
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobTitle {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl ReferenceEntity for JobTitle {
    const TABLE: &'static str = "job_titles";
    const ENTITY: &'static str = "job_title";
    const COLUMNS: &'static str = "name, description";
    type Payload = NamedPayload;
    type Manage = PermJobTitlesManage;

    fn push_values(p: &NamedPayload, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut s = qb.separated(", ");
        s.push_bind(p.name.trim().to_string());
        s.push_bind(p.description.clone());
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetState {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Operativo")]
    pub name: String,
    pub description: Option<String>,
}

impl ReferenceEntity for AssetState {
    const TABLE: &'static str = "asset_states";
    const ENTITY: &'static str = "asset_state";
    const COLUMNS: &'static str = "name, description";
    type Payload = NamedPayload;
    type Manage = PermAssetStatesManage;

    fn push_values(p: &NamedPayload, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut s = qb.separated(", ");
        s.push_bind(p.name.trim().to_string());
        s.push_bind(p.description.clone());
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio."))]
    #[schema(example = "Oficina central")]
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub address: Option<String>,
}

impl ReferenceEntity for Location {
    const TABLE: &'static str = "locations";
    const ENTITY: &'static str = "location";
    const COLUMNS: &'static str = "name, address";
    type Payload = LocationPayload;
    type Manage = PermLocationsManage;

    fn push_values(p: &LocationPayload, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut s = qb.separated(", ");
        s.push_bind(p.name.trim().to_string());
        s.push_bind(p.address.clone());
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayload {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio."))]
    pub name: String,
    #[validate(length(max = 20))]
    pub tax_id: Option<String>,
    #[validate(email(message = "El correo no es válido."))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ReferenceEntity for Supplier {
    const TABLE: &'static str = "suppliers";
    const ENTITY: &'static str = "supplier";
    const COLUMNS: &'static str = "name, tax_id, email, phone";
    type Payload = SupplierPayload;
    type Manage = PermSuppliersManage;

    fn push_values(p: &SupplierPayload, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut s = qb.separated(", ");
        s.push_bind(p.name.trim().to_string());
        s.push_bind(p.tax_id.clone());
        s.push_bind(p.email.clone());
        s.push_bind(p.phone.clone());
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemPayload {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio."))]
    #[schema(example = "Laptop 14\"")]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "El tipo es obligatorio."))]
    #[schema(example = "Equipo")]
    pub item_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub item_type: String,
    pub description: Option<String>,
}

impl ReferenceEntity for CatalogItem {
    const TABLE: &'static str = "catalog_items";
    const ENTITY: &'static str = "catalog_item";
    const COLUMNS: &'static str = "name, item_type, description";
    type Payload = CatalogItemPayload;
    type Manage = PermCatalogManage;

    fn push_values(p: &CatalogItemPayload, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut s = qb.separated(", ");
        s.push_bind(p.name.trim().to_string());
        s.push_bind(p.item_type.trim().to_string());
        s.push_bind(p.description.clone());
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Busca parcial pelo nome (sem distinção de maiúsculas)
    pub search: Option<String>,
}

// =============================================================================
//  FUNCIONÁRIOS E TEMA
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "theme_preference", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    Custom,
}

impl ThemePreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            "custom" => Some(ThemePreference::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub job_title_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub national_id: String,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub salary: Decimal,
    pub theme_preference: ThemePreference,
    pub theme_custom_color: String,
    pub theme_glow_enabled: bool,
    pub created_at: DateTime<Utc>,
}

// Funcionário + login + papéis
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: Employee,
    pub username: String,
    pub email: String,
    pub role_ids: Vec<Uuid>,
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El valor no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeePayload {
    #[validate(length(min = 3, max = 150, message = "El usuario debe tener entre 3 y 150 caracteres."))]
    pub username: String,
    #[validate(email(message = "El correo no es válido."))]
    pub email: String,
    #[validate(length(min = 8, message = "La contraseña debe tener al menos 8 caracteres."))]
    pub password: String,

    #[validate(length(min = 1, max = 20))]
    pub national_id: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub paternal_surname: String,
    pub maternal_surname: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub salary: Decimal,
    pub job_title_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeePayload {
    #[validate(email(message = "El correo no es válido."))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "La contraseña debe tener al menos 8 caracteres."))]
    pub password: Option<String>,

    #[validate(length(min = 1, max = 20))]
    pub national_id: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub paternal_surname: String,
    pub maternal_surname: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub salary: Decimal,
    pub job_title_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    /// `None` mantém os papéis atuais
    pub role_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub search: Option<String>,
    pub department_id: Option<Uuid>,
    pub job_title_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSettings {
    pub theme_preference: ThemePreference,
    pub theme_custom_color: String,
    pub theme_glow_enabled: bool,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            theme_preference: ThemePreference::Dark,
            theme_custom_color: "#6366F1".to_string(),
            theme_glow_enabled: false,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateThemePayload {
    #[schema(example = "custom")]
    pub theme_preference: Option<String>,
    #[schema(example = "#0EA5E9")]
    pub theme_custom_color: Option<String>,
    pub theme_glow_enabled: Option<bool>,
}

/// Atualização de tema já validada.
#[derive(Debug, Default, PartialEq)]
pub struct ThemeUpdate {
    pub theme_preference: Option<ThemePreference>,
    pub theme_custom_color: Option<String>,
    pub theme_glow_enabled: Option<bool>,
}

impl UpdateThemePayload {
    pub fn into_update(self) -> Result<ThemeUpdate, AppError> {
        let theme_preference = match self.theme_preference {
            Some(raw) => Some(ThemePreference::parse(&raw).ok_or_else(|| {
                AppError::invalid("themePreference", "Debe ser 'light', 'dark' o 'custom'.")
            })?),
            None => None,
        };

        if let Some(color) = &self.theme_custom_color {
            let well_formed = color.starts_with('#')
                && (color.len() == 4 || color.len() == 7)
                && color[1..].chars().all(|c| c.is_ascii_hexdigit());
            if !well_formed {
                return Err(AppError::invalid(
                    "themeCustomColor",
                    "Debe ser un color hexadecimal (#RGB o #RRGGBB).",
                ));
            }
        }

        Ok(ThemeUpdate {
            theme_preference,
            theme_custom_color: self.theme_custom_color,
            theme_glow_enabled: self.theme_glow_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_update_accepts_short_and_long_hex() {
        for color in ["#FFF", "#6366f1"] {
            let payload = UpdateThemePayload {
                theme_custom_color: Some(color.to_string()),
                ..Default::default()
            };
            assert!(payload.into_update().is_ok(), "{color} should be accepted");
        }
    }

    #[test]
    fn theme_update_rejects_malformed_color() {
        for color in ["6366F1", "#12345", "#GGGGGG"] {
            let payload = UpdateThemePayload {
                theme_custom_color: Some(color.to_string()),
                ..Default::default()
            };
            assert!(matches!(payload.into_update(), Err(AppError::InvalidInput { .. })));
        }
    }

    #[test]
    fn theme_update_rejects_unknown_preference() {
        let payload = UpdateThemePayload {
            theme_preference: Some("neon".into()),
            ..Default::default()
        };
        assert!(payload.into_update().is_err());
    }

    #[test]
    fn theme_update_parses_preference() {
        let payload = UpdateThemePayload {
            theme_preference: Some("light".into()),
            theme_glow_enabled: Some(true),
            ..Default::default()
        };
        let update = payload.into_update().unwrap();
        assert_eq!(update.theme_preference, Some(ThemePreference::Light));
        assert_eq!(update.theme_glow_enabled, Some(true));
    }
}
