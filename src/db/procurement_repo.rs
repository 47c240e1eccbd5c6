// src/db/procurement_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_write_error, error::AppError, scope::Scope},
    models::procurement::{
        Budget, BudgetFilter, BudgetLine, BudgetLinePayload, BudgetPayload, CreatePurchaseOrderPayload,
        PurchaseOrder, PurchaseOrderFilter, PurchaseOrderLine, PurchaseOrderLinePayload, PurchaseOrderStatus,
    },
};

// Orçamentos não têm company_id próprio: a empresa vem do departamento
const BUDGET_SELECT: &str = r#"
    SELECT b.id, b.department_id, d.company_id, b.amount, b.budget_date, b.description
    FROM budgets b
    JOIN departments d ON d.id = b.department_id
"#;

#[derive(Clone)]
pub struct ProcurementRepository {
    pool: PgPool,
}

impl ProcurementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Orçamentos
    // ---

    pub async fn list_budgets(&self, scope: &Scope, filter: &BudgetFilter) -> Result<Vec<Budget>, AppError> {
        let sql = format!(
            r#"{BUDGET_SELECT}
            WHERE ($1 OR d.company_id = $2)
              AND ($3::uuid IS NULL OR b.department_id = $3)
              AND ($4::date IS NULL OR b.budget_date >= $4)
              AND ($5::date IS NULL OR b.budget_date <= $5)
            ORDER BY b.budget_date DESC"#
        );
        let rows = sqlx::query_as::<_, Budget>(&sql)
            .bind(scope.is_platform())
            .bind(scope.company_id())
            .bind(filter.department_id)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_budget<'e, E>(&self, executor: E, p: &BudgetPayload) -> Result<Budget, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Budget>(
            r#"
            WITH inserted AS (
                INSERT INTO budgets (id, department_id, amount, budget_date, description)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT i.id, i.department_id, d.company_id, i.amount, i.budget_date, i.description
            FROM inserted i
            JOIN departments d ON d.id = i.department_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(p.department_id)
        .bind(p.amount)
        .bind(p.budget_date)
        .bind(p.description.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "budget"))
    }

    pub async fn list_budget_lines(&self, scope: &Scope, budget_id: Option<Uuid>) -> Result<Vec<BudgetLine>, AppError> {
        let rows = sqlx::query_as::<_, BudgetLine>(
            r#"
            SELECT * FROM budget_lines
            WHERE ($1 OR company_id = $2)
              AND ($3::uuid IS NULL OR budget_id = $3)
            ORDER BY line_date DESC, name
            "#,
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .bind(budget_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_budget_line<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        p: &BudgetLinePayload,
    ) -> Result<BudgetLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, BudgetLine>(
            r#"
            INSERT INTO budget_lines (id, company_id, budget_id, name, line_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(p.budget_id)
        .bind(p.name.trim())
        .bind(p.line_date)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "budget_line"))
    }

    // ---
    // Ordens de compra
    // ---

    pub async fn list_orders(&self, scope: &Scope, filter: &PurchaseOrderFilter) -> Result<Vec<PurchaseOrder>, AppError> {
        let rows = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT * FROM purchase_orders
            WHERE ($1 OR company_id = $2)
              AND ($3::purchase_order_status IS NULL OR status = $3)
              AND ($4::uuid IS NULL OR supplier_id = $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .bind(filter.status)
        .bind(filter.supplier_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_order<'e, E>(&self, executor: E, scope: &Scope, id: Uuid) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE id = $1 AND ($2 OR company_id = $3)",
        )
        .bind(id)
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("purchase_order"))
    }

    /// Mesma consulta com `FOR UPDATE`, para mudanças de status e linhas.
    pub async fn lock_order<'e, E>(&self, executor: E, scope: &Scope, id: Uuid) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE id = $1 AND ($2 OR company_id = $3) FOR UPDATE",
        )
        .bind(id)
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("purchase_order"))
    }

    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        requested_by: Option<Uuid>,
        p: &CreatePurchaseOrderPayload,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (id, company_id, supplier_id, requested_by, starts_on, ends_on, terms)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(p.supplier_id)
        .bind(requested_by)
        .bind(p.starts_on)
        .bind(p.ends_on)
        .bind(p.terms.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "purchase_order"))
    }

    pub async fn set_order_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            "UPDATE purchase_orders SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    // ---
    // Linhas da ordem
    // ---

    pub async fn list_order_lines(&self, order_id: Uuid) -> Result<Vec<PurchaseOrderLine>, AppError> {
        let rows = sqlx::query_as::<_, PurchaseOrderLine>(
            "SELECT * FROM purchase_order_lines WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert_order_line<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        order_id: Uuid,
        p: &PurchaseOrderLinePayload,
    ) -> Result<PurchaseOrderLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PurchaseOrderLine>(
            r#"
            INSERT INTO purchase_order_lines (id, company_id, order_id, budget_line_id, catalog_item_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(order_id)
        .bind(p.budget_line_id)
        .bind(p.catalog_item_id)
        .bind(p.quantity)
        .bind(p.unit_price)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "purchase_order_line"))
    }

    /// Recalcula o total da ordem a partir das linhas.
    pub async fn recalculate_order_total<'e, E>(&self, executor: E, order_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE purchase_orders
            SET total_amount = (
                SELECT COALESCE(SUM(quantity * unit_price), 0)
                FROM purchase_order_lines
                WHERE order_id = $1
            )
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
