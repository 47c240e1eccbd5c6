// src/models/maintenance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "maintenance_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceKind {
    #[serde(alias = "preventivo")]
    Preventive,
    #[serde(alias = "correctivo")]
    Corrective,
}

impl MaintenanceKind {
    pub fn label(self) -> &'static str {
        match self {
            MaintenanceKind::Preventive => "preventive",
            MaintenanceKind::Corrective => "corrective",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "maintenance_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    /// Aceita os nomes da API e os nomes legados em espanhol.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Some(MaintenanceStatus::Pending),
            "in_progress" | "en_progreso" => Some(MaintenanceStatus::InProgress),
            "completed" | "completado" => Some(MaintenanceStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTicket {
    pub id: Uuid,
    pub company_id: Uuid,
    pub asset_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub kind: MaintenanceKind,
    pub status: MaintenanceStatus,
    pub problem_description: String,
    pub resolution_notes: Option<String>,
    pub cost: Decimal,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El costo no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenancePayload {
    pub asset_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub kind: MaintenanceKind,
    #[serde(default = "default_status")]
    pub status: MaintenanceStatus,
    #[validate(length(min = 1, message = "Describa el problema."))]
    pub problem_description: String,
    pub resolution_notes: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub cost: Decimal,
}

fn default_status() -> MaintenanceStatus {
    MaintenanceStatus::Pending
}

// Atualização restrita feita pelo responsável
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatusPayload {
    #[schema(example = "in_progress")]
    pub status: Option<String>,
    pub resolution_notes: Option<String>,
}

/// Resultado de aplicar uma atualização de status a um chamado.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: MaintenanceStatus,
    pub resolution_notes: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub changed: bool,
}

impl MaintenanceTicket {
    /// Calcula os campos novos sem tocar no banco.
    /// Entrar em `Completed` carimba `closed_at` se ainda estiver vazio.
    pub fn apply_status_update(
        &self,
        payload: &MaintenanceStatusPayload,
        now: DateTime<Utc>,
    ) -> Result<StatusChange, AppError> {
        let status = match &payload.status {
            Some(raw) => MaintenanceStatus::parse(raw)
                .ok_or_else(|| AppError::invalid("status", "Estado inválido."))?,
            None => self.status,
        };

        let resolution_notes = match &payload.resolution_notes {
            Some(notes) => Some(notes.clone()),
            None => self.resolution_notes.clone(),
        };

        let closed_at = match (status, self.closed_at) {
            (MaintenanceStatus::Completed, None) if payload.status.is_some() => Some(now),
            (_, existing) => existing,
        };

        let changed = payload.status.is_some() || payload.resolution_notes.is_some();

        Ok(StatusChange { status, resolution_notes, closed_at, changed })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceFilter {
    /// Busca em nome/código do ativo, descrição e notas
    pub search: Option<String>,
    pub asset_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub kind: Option<MaintenanceKind>,
    pub status: Option<MaintenanceStatus>,
    pub opened_from: Option<NaiveDate>,
    pub opened_to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(status: MaintenanceStatus) -> MaintenanceTicket {
        MaintenanceTicket {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            assignee_id: Some(Uuid::new_v4()),
            kind: MaintenanceKind::Corrective,
            status,
            problem_description: "No enciende".into(),
            resolution_notes: None,
            cost: Decimal::ZERO,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn completing_stamps_closed_at() {
        let now = Utc::now();
        let payload = MaintenanceStatusPayload {
            status: Some("completed".into()),
            resolution_notes: Some("Fuente reemplazada".into()),
        };
        let change = ticket(MaintenanceStatus::InProgress).apply_status_update(&payload, now).unwrap();
        assert_eq!(change.status, MaintenanceStatus::Completed);
        assert_eq!(change.closed_at, Some(now));
        assert_eq!(change.resolution_notes.as_deref(), Some("Fuente reemplazada"));
    }

    #[test]
    fn existing_closed_at_is_kept() {
        let earlier = Utc::now() - chrono::Duration::days(2);
        let mut t = ticket(MaintenanceStatus::Completed);
        t.closed_at = Some(earlier);
        let payload = MaintenanceStatusPayload { status: Some("COMPLETADO".into()), resolution_notes: None };
        let change = t.apply_status_update(&payload, Utc::now()).unwrap();
        assert_eq!(change.closed_at, Some(earlier));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let payload = MaintenanceStatusPayload { status: Some("archived".into()), resolution_notes: None };
        assert!(matches!(
            ticket(MaintenanceStatus::Pending).apply_status_update(&payload, Utc::now()),
            Err(AppError::InvalidInput { .. })
        ));
    }

    #[test]
    fn notes_only_update_keeps_status() {
        let payload = MaintenanceStatusPayload { status: None, resolution_notes: Some("Esperando repuesto".into()) };
        let change = ticket(MaintenanceStatus::InProgress).apply_status_update(&payload, Utc::now()).unwrap();
        assert_eq!(change.status, MaintenanceStatus::InProgress);
        assert!(change.closed_at.is_none());
        assert!(change.changed);
    }
}
