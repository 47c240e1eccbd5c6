// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_write_error, error::AppError},
    models::auth::User,
};

// Contexto do usuário: vínculo de funcionário + empresa, quando existir
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployeeLink {
    pub employee_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
}

// O repositório de usuários, responsável pela tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca pelo nome de usuário, sem distinção de maiúsculas
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn username_exists<'e, E>(&self, executor: E, username: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))")
                .bind(username)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    pub async fn find_employee_link(&self, user_id: Uuid) -> Result<Option<EmployeeLink>, AppError> {
        let link = sqlx::query_as::<_, EmployeeLink>(
            r#"
            SELECT e.id AS employee_id, e.company_id, c.name AS company_name
            FROM employees e
            JOIN companies c ON c.id = e.company_id
            WHERE e.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    // Cria um novo usuário (dentro da transação do chamador)
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username.trim())
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "username"))
    }

    pub async fn update_credentials<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        email: Option<&str>,
        first_name: &str,
        last_name: &str,
        password_hash: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                first_name = $3,
                last_name = $4,
                password_hash = COALESCE($5, password_hash)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .execute(executor)
        .await?;
        Ok(())
    }
}
