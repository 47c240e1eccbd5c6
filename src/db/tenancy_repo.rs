// src/db/tenancy_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_write_error, error::AppError, scope::Scope},
    models::tenancy::{
        Company, Currency, CurrencyPayload, LimitKind, Subscription, SubscriptionPlan, Tax, TaxPayload,
    },
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Empresas
    // ---

    /// Duplicidade de nome ou NIT (sem distinção de maiúsculas).
    /// Retorna (nome_existe, nit_existe).
    pub async fn company_duplicates<'e, E>(
        &self,
        executor: E,
        name: &str,
        tax_id: &str,
    ) -> Result<(bool, bool), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM companies WHERE LOWER(name) = LOWER($1)),
                EXISTS (SELECT 1 FROM companies WHERE LOWER(tax_id) = LOWER($2))
            "#,
        )
        .bind(name.trim())
        .bind(tax_id.trim())
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        name: &str,
        tax_id: &str,
        address: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (id, name, tax_id, address, phone, email)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name.trim())
        .bind(tax_id.trim())
        .bind(address)
        .bind(phone)
        .bind(email)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "company"))
    }

    // ---
    // Assinaturas
    // ---

    pub async fn create_subscription<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        plan: SubscriptionPlan,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> Result<Subscription, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (max_users, max_assets) = plan.limits();
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (id, company_id, plan, status, starts_on, ends_on, max_users, max_assets)
            VALUES ($1, $2, $3, 'ACTIVE', $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(plan)
        .bind(starts_on)
        .bind(ends_on)
        .bind(max_users)
        .bind(max_assets)
        .fetch_one(executor)
        .await?;
        Ok(subscription)
    }

    /// Trava a linha da assinatura até o fim da transação.
    /// Criações concorrentes contra o mesmo limite ficam serializadas.
    pub async fn lock_subscription<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Option<Subscription>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subscription = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE company_id = $1 FOR UPDATE",
        )
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(subscription)
    }

    pub async fn count_for_limit<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        kind: LimitKind,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match kind {
            LimitKind::Employees => "SELECT COUNT(*) FROM employees WHERE company_id = $1",
            LimitKind::Assets => "SELECT COUNT(*) FROM assets WHERE company_id = $1",
        };
        let count: i64 = sqlx::query_scalar(sql).bind(company_id).fetch_one(executor).await?;
        Ok(count)
    }

    pub async fn list_subscriptions(&self, scope: &Scope) -> Result<Vec<Subscription>, AppError> {
        let rows = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE ($1 OR company_id = $2) ORDER BY starts_on DESC",
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Globais: moedas e impostos
    // ---

    pub async fn list_currencies(&self) -> Result<Vec<Currency>, AppError> {
        let rows = sqlx::query_as::<_, Currency>("SELECT * FROM currencies ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_currency(&self, payload: &CurrencyPayload) -> Result<Currency, AppError> {
        sqlx::query_as::<_, Currency>(
            r#"
            INSERT INTO currencies (id, name, code, symbol, exchange_rate)
            VALUES ($1, $2, UPPER($3), $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&payload.name)
        .bind(&payload.code)
        .bind(&payload.symbol)
        .bind(payload.exchange_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "currency"))
    }

    pub async fn list_taxes(&self) -> Result<Vec<Tax>, AppError> {
        let rows = sqlx::query_as::<_, Tax>("SELECT * FROM taxes ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_tax(&self, payload: &TaxPayload) -> Result<Tax, AppError> {
        sqlx::query_as::<_, Tax>(
            "INSERT INTO taxes (id, name, rate) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&payload.name)
        .bind(payload.rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "tax"))
    }
}
