// src/db/analytics_repo.rs

use sqlx::PgPool;

use crate::{
    common::{error::AppError, scope::Scope},
    models::analytics::{BudgetPrediction, MaintenancePrediction},
};

// Banco analítico: somente leitura
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn maintenance_predictions(&self, scope: &Scope) -> Result<Vec<MaintenancePrediction>, AppError> {
        let rows = sqlx::query_as::<_, MaintenancePrediction>(
            r#"
            SELECT * FROM maintenance_predictions
            WHERE ($1 OR tenant_id = $2)
            ORDER BY generated_at DESC, failure_probability DESC
            LIMIT 500
            "#,
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn budget_predictions(&self, scope: &Scope) -> Result<Vec<BudgetPrediction>, AppError> {
        let rows = sqlx::query_as::<_, BudgetPrediction>(
            r#"
            SELECT * FROM budget_predictions
            WHERE ($1 OR tenant_id = $2)
            ORDER BY period_start DESC, generated_at DESC
            LIMIT 500
            "#,
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
