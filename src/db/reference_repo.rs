// src/db/reference_repo.rs

use std::marker::PhantomData;

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{contains_pattern, map_write_error, push_scope},
        error::AppError,
        scope::Scope,
    },
    models::organization::ReferenceEntity,
};

/// CRUD de dados de referência (departamentos, cargos, locais, estados,
/// fornecedores e itens de catálogo). Todas as consultas passam pelo escopo.
pub struct ReferenceRepository<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

// Derive exigiria `T: Clone`
impl<T> Clone for ReferenceRepository<T> {
    fn clone(&self) -> Self {
        Self { pool: self.pool.clone(), _entity: PhantomData }
    }
}

impl<T: ReferenceEntity> ReferenceRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _entity: PhantomData }
    }

    pub async fn list(&self, scope: &Scope, search: Option<&str>) -> Result<Vec<T>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT * FROM {} WHERE ", T::TABLE));
        push_scope(&mut qb, scope, "company_id");

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            qb.push(" AND name ILIKE ");
            qb.push_bind(contains_pattern(term));
        }
        qb.push(" ORDER BY name");

        let rows = qb.build_query_as::<T>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<T, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT * FROM {} WHERE id = ", T::TABLE));
        qb.push_bind(id);
        qb.push(" AND ");
        push_scope(&mut qb, scope, "company_id");

        qb.build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound(T::ENTITY))
    }

    pub async fn create(&self, company_id: Uuid, payload: &T::Payload) -> Result<T, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} (id, company_id, {}) VALUES (", T::TABLE, T::COLUMNS));
        qb.push_bind(Uuid::new_v4());
        qb.push(", ");
        qb.push_bind(company_id);
        qb.push(", ");
        T::push_values(payload, &mut qb);
        qb.push(") RETURNING *");

        qb.build_query_as::<T>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, T::ENTITY))
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, payload: &T::Payload) -> Result<T, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET ({}) = ROW(", T::TABLE, T::COLUMNS));
        T::push_values(payload, &mut qb);
        qb.push(") WHERE id = ");
        qb.push_bind(id);
        qb.push(" AND ");
        push_scope(&mut qb, scope, "company_id");
        qb.push(" RETURNING *");

        qb.build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, T::ENTITY))?
            .ok_or(AppError::NotFound(T::ENTITY))
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", T::TABLE));
        qb.push_bind(id);
        qb.push(" AND ");
        push_scope(&mut qb, scope, "company_id");

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, T::ENTITY))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(T::ENTITY));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::organization::{Location, LocationPayload, ReferenceEntity};

    #[test]
    fn update_statement_sets_all_columns_in_order() {
        let payload = LocationPayload { name: " Almacén ".into(), address: None };
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET ({}) = ROW(", Location::TABLE, Location::COLUMNS));
        Location::push_values(&payload, &mut qb);
        qb.push(")");
        assert_eq!(qb.sql(), "UPDATE locations SET (name, address) = ROW($1, $2)");
    }
}
