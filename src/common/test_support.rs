// src/common/test_support.rs
// Dados mínimos para os testes que rodam contra o Postgres (`#[sqlx::test]`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::scope::Scope,
    config::{AppState, Settings},
};

/// Monta o estado completo sobre um único banco de teste.
/// A bitácora aponta para o mesmo pool; sem as migrações de auditoria,
/// as gravações "best-effort" só geram um aviso no log.
pub fn app_state(pool: PgPool) -> AppState {
    let settings = Settings {
        database_url: String::new(),
        audit_database_url: String::new(),
        analytics_database_url: String::new(),
        jwt_secret: "segredo-de-teste".to_string(),
        access_token_minutes: 60,
        refresh_token_days: 7,
        db_max_connections: 5,
        bind_addr: "127.0.0.1:0".to_string(),
        report_fonts_dir: "./fonts".to_string(),
    };
    AppState::assemble(settings, pool.clone(), pool.clone(), pool)
}

/// Empresa com assinatura ativa, um funcionário (sem papéis) e um estado de ativo.
pub struct SeededCompany {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub employee_id: Uuid,
    pub state_id: Uuid,
}

impl SeededCompany {
    pub fn scope(&self) -> Scope {
        Scope::Tenant { company_id: self.company_id, employee_id: self.employee_id }
    }
}

pub async fn seed_company(pool: &PgPool, name: &str, max_users: i32, max_assets: i32) -> SeededCompany {
    let company_id = Uuid::new_v4();
    sqlx::query("INSERT INTO companies (id, name, tax_id) VALUES ($1, $2, $3)")
        .bind(company_id)
        .bind(name)
        .bind(&company_id.simple().to_string()[..12])
        .execute(pool)
        .await
        .unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    sqlx::query(
        r#"
        INSERT INTO subscriptions (id, company_id, plan, status, starts_on, ends_on, max_users, max_assets)
        VALUES ($1, $2, 'BASIC', 'ACTIVE', $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company_id)
    .bind(today)
    .bind(today + chrono::Duration::days(3650))
    .bind(max_users)
    .bind(max_assets)
    .execute(pool)
    .await
    .unwrap();

    let state_id = Uuid::new_v4();
    sqlx::query("INSERT INTO asset_states (id, company_id, name) VALUES ($1, $2, 'Operativo')")
        .bind(state_id)
        .bind(company_id)
        .execute(pool)
        .await
        .unwrap();

    let (user_id, employee_id) = seed_employee(pool, company_id, &format!("admin_{}", name.to_lowercase())).await;
    SeededCompany { company_id, user_id, employee_id, state_id }
}

/// Cria usuário + funcionário. Retorna `(user_id, employee_id)`.
pub async fn seed_employee(pool: &PgPool, company_id: Uuid, username: &str) -> (Uuid, Uuid) {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, 'sem-login')")
        .bind(user_id)
        .bind(username)
        .execute(pool)
        .await
        .unwrap();

    let employee_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO employees (id, user_id, company_id, national_id, first_name, paternal_surname)
        VALUES ($1, $2, $3, '1234567', $4, 'Prueba')
        "#,
    )
    .bind(employee_id)
    .bind(user_id)
    .bind(company_id)
    .bind(username)
    .execute(pool)
    .await
    .unwrap();

    (user_id, employee_id)
}

pub async fn seed_department(pool: &PgPool, company_id: Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO departments (id, company_id, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(company_id)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn seed_asset(
    pool: &PgPool,
    company: &SeededCompany,
    code: &str,
    value: Decimal,
    department_id: Option<Uuid>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO assets (id, company_id, name, internal_code, acquired_on, current_value,
                            useful_life_years, department_id, state_id)
        VALUES ($1, $2, $3, $4, $5, $6, 5, $7, $8)
        "#,
    )
    .bind(id)
    .bind(company.company_id)
    .bind(format!("Activo {code}"))
    .bind(code)
    .bind(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    .bind(value)
    .bind(department_id)
    .bind(company.state_id)
    .execute(pool)
    .await
    .unwrap();
    id
}

pub async fn count(pool: &PgPool, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).bind(id).fetch_one(pool).await.unwrap()
}
