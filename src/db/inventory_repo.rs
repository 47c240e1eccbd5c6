// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_write_error, error::AppError, scope::Scope},
    models::inventory::{
        CreateStockRecordPayload, StockMovement, StockMovementKind, StockMovementFilter, StockRecord,
        StockRecordFilter,
    },
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn list_records(&self, scope: &Scope, filter: &StockRecordFilter) -> Result<Vec<StockRecord>, AppError> {
        let rows = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT * FROM stock_records
            WHERE ($1 OR company_id = $2)
              AND ($3::uuid IS NULL OR location_id = $3)
              AND ($4::uuid IS NULL OR catalog_item_id = $4)
              AND ($5::uuid IS NULL OR responsible_employee_id = $5)
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .bind(filter.location_id)
        .bind(filter.catalog_item_id)
        .bind(filter.responsible_employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_record(&self, scope: &Scope, id: Uuid) -> Result<StockRecord, AppError> {
        sqlx::query_as::<_, StockRecord>(
            "SELECT * FROM stock_records WHERE id = $1 AND ($2 OR company_id = $3)",
        )
        .bind(id)
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("stock_record"))
    }

    pub async fn list_movements(&self, scope: &Scope, filter: &StockMovementFilter) -> Result<Vec<StockMovement>, AppError> {
        let rows = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT m.* FROM stock_movements m
            JOIN stock_records r ON r.id = m.stock_record_id
            WHERE ($1 OR r.company_id = $2)
              AND ($3::uuid IS NULL OR m.stock_record_id = $3)
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .bind(filter.stock_record_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Escrita (transacional)
    // ---

    pub async fn create_record<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        p: &CreateStockRecordPayload,
    ) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StockRecord>(
            r#"
            INSERT INTO stock_records (
                id, company_id, location_id, catalog_item_id, purchase_line_id,
                responsible_employee_id, quantity, initial_quantity
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(p.location_id)
        .bind(p.catalog_item_id)
        .bind(p.purchase_line_id)
        .bind(p.responsible_employee_id)
        .bind(p.initial_quantity)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "stock_record"))
    }

    /// Trava o registro para o ajuste de saldo.
    pub async fn lock_record<'e, E>(&self, executor: E, scope: &Scope, id: Uuid) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StockRecord>(
            "SELECT * FROM stock_records WHERE id = $1 AND ($2 OR company_id = $3) FOR UPDATE",
        )
        .bind(id)
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("stock_record"))
    }

    pub async fn set_quantity<'e, E>(&self, executor: E, id: Uuid, quantity: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE stock_records SET quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        stock_record_id: Uuid,
        kind: StockMovementKind,
        quantity_delta: i32,
        note: Option<&str>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (id, stock_record_id, kind, quantity_delta, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(stock_record_id)
        .bind(kind)
        .bind(quantity_delta)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }
}
