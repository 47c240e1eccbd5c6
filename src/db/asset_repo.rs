// src/db/asset_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{contains_pattern, map_write_error, push_scope},
        error::AppError,
        scope::Scope,
    },
    models::assets::{Asset, AssetFilter, AssetPayload, Revaluation, RevaluationFilter, RevaluationMethod},
};

// Registro de reavaliação já calculado
pub struct NewRevaluation<'a> {
    pub company_id: Uuid,
    pub asset_id: Uuid,
    pub method: RevaluationMethod,
    pub previous_value: Decimal,
    pub new_value: Decimal,
    pub factor: Decimal,
    pub notes: Option<&'a str>,
    pub performed_by: Uuid,
}

#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, company_id: Uuid, p: &AssetPayload) -> Result<Asset, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets (
                id, company_id, name, internal_code, serial_number, acquired_on, current_value,
                useful_life_years, catalog_item_id, department_id, location_id, supplier_id, state_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(p.name.trim())
        .bind(p.internal_code.trim())
        .bind(p.serial_number.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(p.acquired_on)
        .bind(p.current_value)
        .bind(p.useful_life_years)
        .bind(p.catalog_item_id)
        .bind(p.department_id)
        .bind(p.location_id)
        .bind(p.supplier_id)
        .bind(p.state_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "asset"))
    }

    pub async fn update<'e, E>(&self, executor: E, scope: &Scope, id: Uuid, p: &AssetPayload) -> Result<Asset, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Asset>(
            r#"
            UPDATE assets
            SET name = $4,
                internal_code = $5,
                serial_number = $6,
                acquired_on = $7,
                current_value = $8,
                useful_life_years = $9,
                catalog_item_id = $10,
                department_id = $11,
                location_id = $12,
                supplier_id = $13,
                state_id = $14
            WHERE id = $1 AND ($2 OR company_id = $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .bind(p.name.trim())
        .bind(p.internal_code.trim())
        .bind(p.serial_number.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(p.acquired_on)
        .bind(p.current_value)
        .bind(p.useful_life_years)
        .bind(p.catalog_item_id)
        .bind(p.department_id)
        .bind(p.location_id)
        .bind(p.supplier_id)
        .bind(p.state_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_write_error(e, "asset"))?
        .ok_or(AppError::NotFound("asset"))
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<Asset, AppError> {
        sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1 AND ($2 OR company_id = $3)")
            .bind(id)
            .bind(scope.is_platform())
            .bind(scope.company_id())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("asset"))
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1 AND ($2 OR company_id = $3)")
            .bind(id)
            .bind(scope.is_platform())
            .bind(scope.company_id())
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "asset"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("asset"));
        }
        Ok(())
    }

    pub async fn list(&self, scope: &Scope, filter: &AssetFilter) -> Result<Vec<Asset>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT a.* FROM assets a WHERE ");
        push_scope(&mut qb, scope, "a.company_id");

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            qb.push(" AND (a.name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR a.internal_code ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR a.serial_number ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        let equals = [
            ("a.department_id", filter.department_id),
            ("a.location_id", filter.location_id),
            ("a.state_id", filter.state_id),
            ("a.supplier_id", filter.supplier_id),
            ("a.catalog_item_id", filter.catalog_item_id),
        ];
        for (column, value) in equals {
            if let Some(value) = value {
                qb.push(format!(" AND {column} = "));
                qb.push_bind(value);
            }
        }

        if let Some(from) = filter.acquired_from {
            qb.push(" AND a.acquired_on >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filter.acquired_to {
            qb.push(" AND a.acquired_on <= ");
            qb.push_bind(to);
        }
        if let Some(min) = filter.min_value {
            qb.push(" AND a.current_value >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.max_value {
            qb.push(" AND a.current_value <= ");
            qb.push_bind(max);
        }
        qb.push(" ORDER BY a.internal_code");

        let rows = qb.build_query_as::<Asset>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    // ---
    // Reavaliação
    // ---

    /// Trava o ativo até o fim da transação. Reavaliações simultâneas do mesmo
    /// ativo ficam em fila e cada uma lê o valor gravado pela anterior.
    pub async fn lock_for_update<'e, E>(&self, executor: E, scope: &Scope, id: Uuid) -> Result<Asset, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Asset>(
            "SELECT * FROM assets WHERE id = $1 AND ($2 OR company_id = $3) FOR UPDATE",
        )
        .bind(id)
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("asset"))
    }

    pub async fn set_current_value<'e, E>(&self, executor: E, id: Uuid, value: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE assets SET current_value = $2 WHERE id = $1")
            .bind(id)
            .bind(value)
            .execute(executor)
            .await
            .map_err(|e| map_write_error(e, "asset"))?;
        Ok(())
    }

    pub async fn insert_revaluation<'e, E>(&self, executor: E, r: &NewRevaluation<'_>) -> Result<Revaluation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, Revaluation>(
            r#"
            INSERT INTO revaluations (
                id, company_id, asset_id, method, previous_value, new_value, factor, notes, performed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(r.company_id)
        .bind(r.asset_id)
        .bind(r.method)
        .bind(r.previous_value)
        .bind(r.new_value)
        .bind(r.factor)
        .bind(r.notes)
        .bind(r.performed_by)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    pub async fn list_revaluations(&self, scope: &Scope, filter: &RevaluationFilter) -> Result<Vec<Revaluation>, AppError> {
        let rows = sqlx::query_as::<_, Revaluation>(
            r#"
            SELECT * FROM revaluations
            WHERE ($1 OR company_id = $2)
              AND ($3::uuid IS NULL OR asset_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .bind(filter.asset_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
