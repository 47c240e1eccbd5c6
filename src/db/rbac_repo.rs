// src/db/rbac_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_write_error, error::AppError, scope::Scope},
    models::rbac::{Permission, PermissionName, Role},
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Catálogo global
    // ---

    /// Sincroniza a tabela com o catálogo do código.
    /// Retorna (inseridas_ou_atualizadas, removidas).
    pub async fn sync_permissions(&self, catalog: &[PermissionName]) -> Result<(u64, u64), AppError> {
        let mut tx = self.pool.begin().await?;

        let mut upserted = 0;
        for permission in catalog {
            let result = sqlx::query(
                r#"
                INSERT INTO permissions (id, name, description)
                VALUES ($1, $2, $3)
                ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
                WHERE permissions.description IS DISTINCT FROM EXCLUDED.description
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(permission.slug())
            .bind(permission.description())
            .execute(&mut *tx)
            .await?;
            upserted += result.rows_affected();
        }

        let names: Vec<String> = catalog.iter().map(|p| p.slug().to_string()).collect();
        let removed = sqlx::query("DELETE FROM permissions WHERE name <> ALL($1)")
            .bind(&names)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok((upserted, removed))
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(permissions)
    }

    // Busca IDs das permissões pelos nomes ("assets:manage" -> UUID)
    pub async fn find_permissions_by_names<'e, E>(
        &self,
        executor: E,
        names: &[String],
    ) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE name = ANY($1)")
            .bind(names)
            .fetch_all(executor)
            .await?;
        Ok(permissions)
    }

    /// Nomes de permissão concedidos a um funcionário por qualquer um dos seus papéis.
    pub async fn permission_names_for_employee(&self, employee_id: Uuid) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.name
            FROM employee_roles er
            JOIN role_permissions rp ON rp.role_id = er.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE er.employee_id = $1
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn role_names_for_employee(&self, employee_id: Uuid) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name FROM employee_roles er
            JOIN roles r ON r.id = er.role_id
            WHERE er.employee_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Usuários de uma empresa que possuem a permissão.
    pub async fn users_with_permission(&self, company_id: Uuid, permission: &str) -> Result<Vec<Uuid>, AppError> {
        let users: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT e.user_id
            FROM employees e
            JOIN employee_roles er ON er.employee_id = e.id
            JOIN role_permissions rp ON rp.role_id = er.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE e.company_id = $1 AND p.name = $2
            "#,
        )
        .bind(company_id)
        .bind(permission)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // ---
    // Papéis
    // ---

    pub async fn list_roles(&self, scope: &Scope) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE ($1 OR company_id = $2) ORDER BY name",
        )
        .bind(scope.is_platform())
        .bind(scope.company_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn get_role<'e, E>(&self, executor: E, scope: &Scope, id: Uuid) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1 AND ($2 OR company_id = $3)")
            .bind(id)
            .bind(scope.is_platform())
            .bind(scope.company_id())
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("role"))
    }

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, company_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(name.trim())
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "role"))
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            "UPDATE roles SET name = $2, description = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name.trim())
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_write_error(e, "role"))?
        .ok_or(AppError::NotFound("role"))
    }

    pub async fn delete_role(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1 AND ($2 OR company_id = $3)")
            .bind(id)
            .bind(scope.is_platform())
            .bind(scope.company_id())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("role"));
        }
        Ok(())
    }

    // Substitui o conjunto de permissões do papel (dois comandos na mesma conexão/transação)
    pub async fn replace_role_permissions(
        &self,
        conn: &mut PgConnection,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// (role_id, nome_da_permissão) para os papéis pedidos.
    pub async fn permission_names_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, AppError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT rp.role_id, p.name
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1)
            ORDER BY p.name
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Papéis do funcionário
    // ---

    pub async fn replace_employee_roles(
        &self,
        conn: &mut PgConnection,
        employee_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM employee_roles WHERE employee_id = $1")
            .bind(employee_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO employee_roles (employee_id, role_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(employee_id)
        .bind(role_ids)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Quantos dos `role_ids` pertencem à empresa.
    pub async fn count_company_roles<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT id) FROM roles WHERE company_id = $1 AND id = ANY($2)",
        )
        .bind(company_id)
        .bind(role_ids)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}
