// src/services/maintenance_service.rs

use chrono::Utc;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_owned, OwnedTable},
        error::AppError,
        scope::Scope,
    },
    db::MaintenanceRepository,
    models::{
        audit::NewAuditEntry,
        maintenance::{MaintenanceFilter, MaintenancePayload, MaintenanceStatusPayload, MaintenanceTicket},
    },
    services::{audit_service::AuditService, notification_service::NotificationService},
};

/// Só o funcionário responsável pelo chamado pode mexer no status.
pub fn ensure_assignee(ticket: &MaintenanceTicket, scope: &Scope) -> Result<(), AppError> {
    match (ticket.assignee_id, scope.employee_id()) {
        (Some(assignee), Some(me)) if assignee == me => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

#[derive(Clone)]
pub struct MaintenanceService {
    repo: MaintenanceRepository,
    notifications: NotificationService,
    audit: AuditService,
    pool: PgPool,
}

impl MaintenanceService {
    pub fn new(
        repo: MaintenanceRepository,
        notifications: NotificationService,
        audit: AuditService,
        pool: PgPool,
    ) -> Self {
        Self { repo, notifications, audit, pool }
    }

    pub async fn list(&self, scope: &Scope, filter: &MaintenanceFilter) -> Result<Vec<MaintenanceTicket>, AppError> {
        self.repo.list(scope, filter).await
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<MaintenanceTicket, AppError> {
        self.repo.get(&self.pool, scope, id).await
    }

    pub async fn create(&self, company_id: Uuid, p: &MaintenancePayload) -> Result<MaintenanceTicket, AppError> {
        let mut tx = self.pool.begin().await?;
        Self::check_refs(&mut *tx, company_id, p).await?;
        let ticket = self.repo.create(&mut *tx, company_id, p).await?;
        tx.commit().await?;

        self.notify_assignee(&ticket).await;
        Ok(ticket)
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, p: &MaintenancePayload) -> Result<MaintenanceTicket, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.repo.get(&mut *tx, scope, id).await?;
        scope.ensure_can_write(current.company_id)?;
        Self::check_refs(&mut *tx, current.company_id, p).await?;
        let ticket = self.repo.update(&mut *tx, id, p).await?;

        tx.commit().await?;

        if ticket.assignee_id.is_some() {
            self.notify_assignee(&ticket).await;
        }
        Ok(ticket)
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(scope, id).await
    }

    /// Atualização restrita do responsável: só status e notas de resolução.
    pub async fn update_status(
        &self,
        scope: &Scope,
        actor_user_id: Uuid,
        client_ip: Option<String>,
        id: Uuid,
        p: &MaintenanceStatusPayload,
    ) -> Result<MaintenanceTicket, AppError> {
        let mut tx = self.pool.begin().await?;

        let ticket = self.repo.get(&mut *tx, scope, id).await?;
        ensure_assignee(&ticket, scope)?;

        let change = ticket.apply_status_update(p, Utc::now())?;
        if !change.changed {
            return Ok(ticket);
        }
        let updated = self.repo.apply_status_change(&mut *tx, id, &change).await?;

        tx.commit().await?;

        self.audit
            .record_best_effort(NewAuditEntry {
                user_id: Some(actor_user_id),
                client_ip,
                action: "UPDATE_STATUS".to_string(),
                tenant_id: Some(updated.company_id),
                payload: json!({
                    "maintenanceId": updated.id,
                    "from": ticket.status,
                    "to": updated.status,
                }),
            })
            .await;

        Ok(updated)
    }

    async fn check_refs(conn: &mut PgConnection, company_id: Uuid, p: &MaintenancePayload) -> Result<(), AppError> {
        ensure_owned(&mut *conn, OwnedTable::Asset, p.asset_id, company_id, "assetId").await?;
        if let Some(id) = p.assignee_id {
            ensure_owned(&mut *conn, OwnedTable::Employee, id, company_id, "assigneeId").await?;
        }
        Ok(())
    }

    // Notificação "best-effort" para o usuário do responsável
    async fn notify_assignee(&self, ticket: &MaintenanceTicket) {
        let Some(assignee_id) = ticket.assignee_id else {
            return;
        };
        let lookup = async {
            let user_id = self.repo.assignee_user(assignee_id).await?;
            let label = self.repo.asset_label(ticket.asset_id).await?;
            Ok::<_, AppError>((user_id, label))
        };
        match lookup.await {
            Ok((Some(user_id), label)) => {
                self.notifications
                    .notify_maintenance_assigned(user_id, ticket.company_id, ticket.kind, &label)
                    .await;
            }
            Ok((None, _)) => {}
            Err(e) => tracing::warn!(ticket_id = %ticket.id, "⚠️ Falha ao localizar responsável: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::test_support,
        models::maintenance::{MaintenanceKind, MaintenanceStatus},
    };
    use rust_decimal::Decimal;

    fn ticket(assignee_id: Option<Uuid>) -> MaintenanceTicket {
        MaintenanceTicket {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            assignee_id,
            kind: MaintenanceKind::Corrective,
            status: MaintenanceStatus::Pending,
            problem_description: "No enciende".into(),
            resolution_notes: None,
            cost: Decimal::ZERO,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn assignee_may_update_status() {
        let me = Uuid::new_v4();
        let t = ticket(Some(me));
        let scope = Scope::Tenant { company_id: t.company_id, employee_id: me };
        assert!(ensure_assignee(&t, &scope).is_ok());
    }

    #[test]
    fn other_employees_and_platform_are_forbidden() {
        let t = ticket(Some(Uuid::new_v4()));
        let colleague = Scope::Tenant { company_id: t.company_id, employee_id: Uuid::new_v4() };
        assert!(matches!(ensure_assignee(&t, &colleague), Err(AppError::Forbidden)));
        assert!(matches!(ensure_assignee(&t, &Scope::Platform), Err(AppError::Forbidden)));
    }

    #[test]
    fn unassigned_ticket_has_no_one_to_update_it() {
        let t = ticket(None);
        let scope = Scope::Tenant { company_id: t.company_id, employee_id: Uuid::new_v4() };
        assert!(ensure_assignee(&t, &scope).is_err());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_the_assignee_changes_the_ticket(pool: PgPool) {
        let app = test_support::app_state(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 50).await;
        let asset_id = test_support::seed_asset(&pool, &acme, "AF-1", Decimal::from(900), None).await;
        let (tech_user, tech) = test_support::seed_employee(&pool, acme.company_id, "tecnico").await;
        let (colleague_user, colleague) = test_support::seed_employee(&pool, acme.company_id, "colega").await;

        let created = app
            .maintenance_service
            .create(
                acme.company_id,
                &MaintenancePayload {
                    asset_id,
                    assignee_id: Some(tech),
                    kind: MaintenanceKind::Corrective,
                    status: MaintenanceStatus::Pending,
                    problem_description: "No enciende".into(),
                    resolution_notes: None,
                    cost: Decimal::ZERO,
                },
            )
            .await
            .unwrap();

        let payload = MaintenanceStatusPayload {
            status: Some("completed".into()),
            resolution_notes: Some("Fuente reemplazada".into()),
        };
        let colleague_scope = Scope::Tenant { company_id: acme.company_id, employee_id: colleague };
        let err = app
            .maintenance_service
            .update_status(&colleague_scope, colleague_user, None, created.id, &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let unchanged = app.maintenance_service.get(&acme.scope(), created.id).await.unwrap();
        assert_eq!(unchanged.status, MaintenanceStatus::Pending);
        assert_eq!(unchanged.resolution_notes, None);
        assert_eq!(unchanged.closed_at, None);

        let tech_scope = Scope::Tenant { company_id: acme.company_id, employee_id: tech };
        let done = app
            .maintenance_service
            .update_status(&tech_scope, tech_user, Some("10.0.0.7".into()), created.id, &payload)
            .await
            .unwrap();
        assert_eq!(done.status, MaintenanceStatus::Completed);
        assert!(done.closed_at.is_some());
    }
}
