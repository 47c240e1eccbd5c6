// src/db/maintenance_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{contains_pattern, map_write_error, push_scope},
        error::AppError,
        scope::Scope,
    },
    models::maintenance::{MaintenanceFilter, MaintenancePayload, MaintenanceTicket, StatusChange},
};

#[derive(Clone)]
pub struct MaintenanceRepository {
    pool: PgPool,
}

impl MaintenanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, scope: &Scope, filter: &MaintenanceFilter) -> Result<Vec<MaintenanceTicket>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT m.* FROM maintenance_tickets m JOIN assets a ON a.id = m.asset_id WHERE ",
        );
        push_scope(&mut qb, scope, "m.company_id");

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            qb.push(" AND (a.name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR a.internal_code ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR m.problem_description ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR m.resolution_notes ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        if let Some(asset_id) = filter.asset_id {
            qb.push(" AND m.asset_id = ");
            qb.push_bind(asset_id);
        }
        if let Some(assignee_id) = filter.assignee_id {
            qb.push(" AND m.assignee_id = ");
            qb.push_bind(assignee_id);
        }
        if let Some(kind) = filter.kind {
            qb.push(" AND m.kind = ");
            qb.push_bind(kind);
        }
        if let Some(status) = filter.status {
            qb.push(" AND m.status = ");
            qb.push_bind(status);
        }
        if let Some(from) = filter.opened_from {
            qb.push(" AND m.opened_at::date >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filter.opened_to {
            qb.push(" AND m.opened_at::date <= ");
            qb.push_bind(to);
        }
        qb.push(" ORDER BY m.opened_at DESC");

        let rows = qb.build_query_as::<MaintenanceTicket>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn get<'e, E>(&self, executor: E, scope: &Scope, id: Uuid) -> Result<MaintenanceTicket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MaintenanceTicket>(
            "SELECT * FROM maintenance_tickets WHERE id = $1 AND ($2 OR company_id = $3)",
        )
        .bind(id)
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("maintenance_ticket"))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        p: &MaintenancePayload,
    ) -> Result<MaintenanceTicket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MaintenanceTicket>(
            r#"
            INSERT INTO maintenance_tickets (
                id, company_id, asset_id, assignee_id, kind, status,
                problem_description, resolution_notes, cost, closed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9,
                    CASE WHEN $6 = 'COMPLETED'::maintenance_status THEN NOW() END)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(p.asset_id)
        .bind(p.assignee_id)
        .bind(p.kind)
        .bind(p.status)
        .bind(p.problem_description.trim())
        .bind(p.resolution_notes.as_deref())
        .bind(p.cost)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "maintenance_ticket"))
    }

    /// Edição completa (gestores). `closed_at` é carimbado ao entrar em COMPLETED.
    pub async fn update<'e, E>(&self, executor: E, id: Uuid, p: &MaintenancePayload) -> Result<MaintenanceTicket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MaintenanceTicket>(
            r#"
            UPDATE maintenance_tickets
            SET asset_id = $2,
                assignee_id = $3,
                kind = $4,
                status = $5,
                problem_description = $6,
                resolution_notes = $7,
                cost = $8,
                closed_at = CASE
                    WHEN $5 = 'COMPLETED'::maintenance_status THEN COALESCE(closed_at, NOW())
                    ELSE closed_at
                END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(p.asset_id)
        .bind(p.assignee_id)
        .bind(p.kind)
        .bind(p.status)
        .bind(p.problem_description.trim())
        .bind(p.resolution_notes.as_deref())
        .bind(p.cost)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_write_error(e, "maintenance_ticket"))?
        .ok_or(AppError::NotFound("maintenance_ticket"))
    }

    pub async fn apply_status_change<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        change: &StatusChange,
    ) -> Result<MaintenanceTicket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MaintenanceTicket>(
            r#"
            UPDATE maintenance_tickets
            SET status = $2, resolution_notes = $3, closed_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(change.status)
        .bind(change.resolution_notes.as_deref())
        .bind(change.closed_at)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("maintenance_ticket"))
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM maintenance_tickets WHERE id = $1 AND ($2 OR company_id = $3)")
            .bind(id)
            .bind(scope.is_platform())
            .bind(scope.company_id())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("maintenance_ticket"));
        }
        Ok(())
    }

    /// Usuário vinculado ao funcionário responsável (destinatário das notificações).
    pub async fn assignee_user(&self, employee_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let user_id: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM employees WHERE id = $1")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user_id)
    }

    pub async fn asset_label(&self, asset_id: Uuid) -> Result<String, AppError> {
        let label: Option<String> =
            sqlx::query_scalar("SELECT internal_code || ' - ' || name FROM assets WHERE id = $1")
                .bind(asset_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(label.unwrap_or_default())
    }
}
