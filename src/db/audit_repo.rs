// src/db/audit_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    models::audit::{AuditLogEntry, AuditLogFilter, NewAuditEntry},
};

const DEFAULT_LIMIT: i64 = 200;
const MAX_LIMIT: i64 = 1000;

// Bitácora no banco de auditoria (pool próprio, somente-inserção)
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, AppError> {
        let row = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            INSERT INTO audit_log (id, user_id, client_ip, action, tenant_id, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.client_ip.as_deref())
        .bind(&entry.action)
        .bind(entry.tenant_id)
        .bind(&entry.payload)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&self, scope: &Scope, filter: &AuditLogFilter) -> Result<Vec<AuditLogEntry>, AppError> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let rows = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT * FROM audit_log
            WHERE ($1 OR tenant_id = $2)
              AND ($3::uuid IS NULL OR user_id = $3)
              AND ($4::text IS NULL OR action = $4)
            ORDER BY created_at DESC
            LIMIT $5
            "#,
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .bind(filter.user_id)
        .bind(filter.action.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
