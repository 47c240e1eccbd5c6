// src/db/notification_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notifications::{NewNotification, Notification},
};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere a notificação. Com `dedup_key`, uma duplicata não lida é ignorada.
    /// Retorna `true` se uma linha nova foi criada.
    pub async fn insert(&self, n: &NewNotification) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, company_id, message, kind, target_url, dedup_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (recipient_id, dedup_key) WHERE dedup_key IS NOT NULL AND NOT is_read
            DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(n.recipient_id)
        .bind(n.company_id)
        .bind(&n.message)
        .bind(n.kind)
        .bind(n.target_url.as_deref())
        .bind(n.dedup_key.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // Não lidas primeiro, depois as mais recentes
    pub async fn list_for(&self, recipient_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = $1
            ORDER BY is_read ASC, created_at DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_read(&self, recipient_id: Uuid, id: Uuid) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("notification"))
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read")
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::test_support, models::notifications::NotificationKind};

    fn info(recipient_id: Uuid, company_id: Uuid, message: String) -> NewNotification {
        NewNotification {
            recipient_id,
            company_id: Some(company_id),
            message,
            kind: NotificationKind::Info,
            target_url: None,
            dedup_key: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn listing_returns_every_notification_unread_first(pool: PgPool) {
        let repo = NotificationRepository::new(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 50).await;

        for i in 0..130 {
            let created = repo.insert(&info(acme.user_id, acme.company_id, format!("Aviso {i}"))).await.unwrap();
            assert!(created);
        }
        assert_eq!(repo.mark_all_read(acme.user_id).await.unwrap(), 130);
        repo.insert(&info(acme.user_id, acme.company_id, "Pendente".into())).await.unwrap();

        let listed = repo.list_for(acme.user_id).await.unwrap();
        assert_eq!(listed.len(), 131);
        assert_eq!(listed[0].message, "Pendente");
        assert!(!listed[0].is_read);
        assert!(listed[1..].iter().all(|n| n.is_read));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unread_duplicate_with_same_key_is_ignored(pool: PgPool) {
        let repo = NotificationRepository::new(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 50).await;
        let mut warning = info(acme.user_id, acme.company_id, "Capacidad".into());
        warning.dedup_key = Some("capacity:assets".into());

        assert!(repo.insert(&warning).await.unwrap());
        assert!(!repo.insert(&warning).await.unwrap());

        // Depois de lida, a mesma chave volta a ser aceita
        repo.mark_all_read(acme.user_id).await.unwrap();
        assert!(repo.insert(&warning).await.unwrap());
        assert_eq!(repo.list_for(acme.user_id).await.unwrap().len(), 2);
    }
}
