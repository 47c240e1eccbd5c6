// src/services/notification_service.rs

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        i18n::{I18nStore, DEFAULT_LANG},
    },
    db::{NotificationRepository, RbacRepository},
    models::{
        maintenance::MaintenanceKind,
        notifications::{NewNotification, Notification, NotificationKind},
        rbac::PermissionName,
        tenancy::LimitKind,
    },
};

const SUBSCRIPTION_URL: &str = "/app/suscripcion";
const MAINTENANCE_URL: &str = "/app/mantenimientos";

/// Aviso de proximidade do limite do plano, decidido dentro da transação
/// e entregue depois do commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityWarning {
    pub company_id: Uuid,
    pub kind: LimitKind,
    pub used: i64,
    pub limit: i32,
}

impl CapacityWarning {
    /// Uma notificação não lida por (empresa, recurso, dia) e destinatário.
    pub fn dedup_key(&self, day: NaiveDate) -> String {
        format!("capacity:{}:{}:{}", self.company_id, self.kind.key(), day.format("%Y-%m-%d"))
    }
}

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    rbac_repo: RbacRepository,
    i18n: I18nStore,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, rbac_repo: RbacRepository, i18n: I18nStore) -> Self {
        Self { repo, rbac_repo, i18n }
    }

    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        self.repo.list_for(user_id).await
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, AppError> {
        self.repo.mark_read(user_id, id).await
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.repo.mark_all_read(user_id).await
    }

    // ---
    // Efeitos colaterais "best-effort": falhas são só logadas
    // ---

    pub async fn deliver_capacity_warning(&self, warning: &CapacityWarning, actor_user_id: Uuid) {
        if let Err(e) = self.try_capacity_warning(warning, actor_user_id).await {
            tracing::warn!(company_id = %warning.company_id, "⚠️ Falha ao notificar limite do plano: {:?}", e);
        }
    }

    async fn try_capacity_warning(&self, warning: &CapacityWarning, actor_user_id: Uuid) -> Result<(), AppError> {
        let mut recipients = self
            .rbac_repo
            .users_with_permission(warning.company_id, PermissionName::SubscriptionView.slug())
            .await?;
        if recipients.is_empty() {
            recipients.push(actor_user_id);
        }

        let resource = self.i18n.translate(DEFAULT_LANG, &format!("resource.{}", warning.kind.key()));
        let message = self.i18n.format(
            DEFAULT_LANG,
            "notification.capacity_warning",
            &[
                ("resource", &resource),
                ("used", &warning.used.to_string()),
                ("limit", &warning.limit.to_string()),
            ],
        );
        let dedup_key = warning.dedup_key(chrono::Utc::now().date_naive());

        for recipient_id in recipients {
            let created = self
                .repo
                .insert(&NewNotification {
                    recipient_id,
                    company_id: Some(warning.company_id),
                    message: message.clone(),
                    kind: NotificationKind::Warning,
                    target_url: Some(SUBSCRIPTION_URL.to_string()),
                    dedup_key: Some(dedup_key.clone()),
                })
                .await?;
            if created {
                tracing::info!(%recipient_id, "🔔 Aviso de limite enviado");
            }
        }
        Ok(())
    }

    pub async fn notify_maintenance_assigned(
        &self,
        recipient_id: Uuid,
        company_id: Uuid,
        kind: MaintenanceKind,
        asset_label: &str,
    ) {
        let message = self.i18n.format(
            DEFAULT_LANG,
            "notification.maintenance_assigned",
            &[("kind", kind.label()), ("asset", asset_label)],
        );
        let result = self
            .repo
            .insert(&NewNotification {
                recipient_id,
                company_id: Some(company_id),
                message,
                kind: NotificationKind::Info,
                target_url: Some(MAINTENANCE_URL.to_string()),
                dedup_key: None,
            })
            .await;
        if let Err(e) = result {
            tracing::warn!(%recipient_id, "⚠️ Falha ao notificar responsável: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_is_per_company_kind_and_day() {
        let company_id = Uuid::nil();
        let warning = CapacityWarning { company_id, kind: LimitKind::Assets, used: 46, limit: 50 };
        let day = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            warning.dedup_key(day),
            format!("capacity:{company_id}:assets:2025-03-07")
        );
        let next_day = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        assert_ne!(warning.dedup_key(day), warning.dedup_key(next_day));
    }
}
