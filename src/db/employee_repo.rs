// src/db/employee_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{contains_pattern, map_write_error, push_scope},
        error::AppError,
        scope::Scope,
    },
    models::organization::{Employee, EmployeeFilter, ThemeSettings, ThemeUpdate},
};

// Campos de ficha comuns a criação e atualização
pub struct EmployeeFields<'a> {
    pub national_id: &'a str,
    pub first_name: &'a str,
    pub paternal_surname: &'a str,
    pub maternal_surname: Option<&'a str>,
    pub address: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub salary: rust_decimal::Decimal,
    pub job_title_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
        fields: &EmployeeFields<'_>,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (
                id, user_id, company_id, job_title_id, department_id, national_id,
                first_name, paternal_surname, maternal_surname, address, phone, salary
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(company_id)
        .bind(fields.job_title_id)
        .bind(fields.department_id)
        .bind(fields.national_id.trim())
        .bind(fields.first_name.trim())
        .bind(fields.paternal_surname.trim())
        .bind(fields.maternal_surname)
        .bind(fields.address)
        .bind(fields.phone)
        .bind(fields.salary)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "employee"))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &EmployeeFields<'_>,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees
            SET job_title_id = $2,
                department_id = $3,
                national_id = $4,
                first_name = $5,
                paternal_surname = $6,
                maternal_surname = $7,
                address = $8,
                phone = $9,
                salary = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.job_title_id)
        .bind(fields.department_id)
        .bind(fields.national_id.trim())
        .bind(fields.first_name.trim())
        .bind(fields.paternal_surname.trim())
        .bind(fields.maternal_surname)
        .bind(fields.address)
        .bind(fields.phone)
        .bind(fields.salary)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_write_error(e, "employee"))?
        .ok_or(AppError::NotFound("employee"))
    }

    pub async fn find<'e, E>(&self, executor: E, scope: &Scope, id: Uuid) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE id = $1 AND ($2 OR company_id = $3)",
        )
        .bind(id)
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("employee"))
    }

    pub async fn list(&self, scope: &Scope, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT e.* FROM employees e WHERE ");
        push_scope(&mut qb, scope, "e.company_id");

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            qb.push(" AND (e.first_name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR e.paternal_surname ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR e.national_id ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        if let Some(department_id) = filter.department_id {
            qb.push(" AND e.department_id = ");
            qb.push_bind(department_id);
        }
        if let Some(job_title_id) = filter.job_title_id {
            qb.push(" AND e.job_title_id = ");
            qb.push_bind(job_title_id);
        }
        if let Some(role_id) = filter.role_id {
            qb.push(" AND EXISTS (SELECT 1 FROM employee_roles er WHERE er.employee_id = e.id AND er.role_id = ");
            qb.push_bind(role_id);
            qb.push(")");
        }
        qb.push(" ORDER BY e.paternal_surname, e.first_name");

        let rows = qb.build_query_as::<Employee>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// (username, email) do login vinculado.
    pub async fn login_of(&self, user_id: Uuid) -> Result<(String, String), AppError> {
        let row: (String, String) = sqlx::query_as("SELECT username, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn role_ids(&self, employee_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT role_id FROM employee_roles WHERE employee_id = $1")
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    // O login (users) é mantido
    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1 AND ($2 OR company_id = $3)")
            .bind(id)
            .bind(scope.is_platform())
            .bind(scope.company_id())
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "employee"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("employee"));
        }
        Ok(())
    }

    // ---
    // Tema
    // ---

    pub async fn theme(&self, employee_id: Uuid) -> Result<ThemeSettings, AppError> {
        sqlx::query_as::<_, ThemeSettings>(
            "SELECT theme_preference, theme_custom_color, theme_glow_enabled FROM employees WHERE id = $1",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("employee"))
    }

    /// Campos ausentes mantêm o valor atual.
    pub async fn update_theme(&self, employee_id: Uuid, update: &ThemeUpdate) -> Result<ThemeSettings, AppError> {
        sqlx::query_as::<_, ThemeSettings>(
            r#"
            UPDATE employees
            SET theme_preference = COALESCE($2, theme_preference),
                theme_custom_color = COALESCE($3, theme_custom_color),
                theme_glow_enabled = COALESCE($4, theme_glow_enabled)
            WHERE id = $1
            RETURNING theme_preference, theme_custom_color, theme_glow_enabled
            "#,
        )
        .bind(employee_id)
        .bind(update.theme_preference)
        .bind(update.theme_custom_color.as_deref())
        .bind(update.theme_glow_enabled)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("employee"))
    }
}
