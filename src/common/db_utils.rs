// src/common/db_utils.rs

use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::{error::AppError, scope::Scope};

// ---
// Helper de escopo para consultas dinâmicas
// ---
/// Acrescenta o predicado de tenant a um `QueryBuilder`.
/// `column` é a coluna `company_id` qualificada (ex.: `a.company_id`).
pub(crate) fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: &Scope, column: &str) {
    match scope {
        Scope::Platform => {
            qb.push("TRUE");
        }
        Scope::Tenant { company_id, .. } => {
            qb.push(column);
            qb.push(" = ");
            qb.push_bind(*company_id);
        }
        Scope::Unlinked => {
            qb.push("FALSE");
        }
    }
}

/// Escapa `%`, `_` e `\` e envolve o termo para um `ILIKE` de "contém".
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

// ---
// Mapeamento de erros de escrita
// ---
/// Converte violações de constraint em erros de domínio.
pub(crate) fn map_write_error(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(format!(
                "{what} ({})",
                db_err.constraint().unwrap_or_default()
            ));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::ReferenceInUse(what.to_string());
        }
        if db_err.is_check_violation() {
            return AppError::invalid(what, db_err.constraint().unwrap_or("check").to_string());
        }
    }
    e.into()
}

// ---
// Validação de referências entre tenants
// ---
/// Tabelas que pertencem a uma empresa e podem ser referenciadas em escritas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedTable {
    Department,
    JobTitle,
    Location,
    AssetState,
    Supplier,
    CatalogItem,
    Asset,
    Employee,
    Budget,
    BudgetLine,
    PurchaseOrderLine,
}

impl OwnedTable {
    fn ownership_sql(self) -> &'static str {
        match self {
            OwnedTable::Department => "SELECT company_id FROM departments WHERE id = $1",
            OwnedTable::JobTitle => "SELECT company_id FROM job_titles WHERE id = $1",
            OwnedTable::Location => "SELECT company_id FROM locations WHERE id = $1",
            OwnedTable::AssetState => "SELECT company_id FROM asset_states WHERE id = $1",
            OwnedTable::Supplier => "SELECT company_id FROM suppliers WHERE id = $1",
            OwnedTable::CatalogItem => "SELECT company_id FROM catalog_items WHERE id = $1",
            OwnedTable::Asset => "SELECT company_id FROM assets WHERE id = $1",
            OwnedTable::Employee => "SELECT company_id FROM employees WHERE id = $1",
            OwnedTable::Budget => {
                "SELECT d.company_id FROM budgets b JOIN departments d ON d.id = b.department_id WHERE b.id = $1"
            }
            OwnedTable::BudgetLine => "SELECT company_id FROM budget_lines WHERE id = $1",
            OwnedTable::PurchaseOrderLine => "SELECT company_id FROM purchase_order_lines WHERE id = $1",
        }
    }
}

/// Garante que `id` existe e pertence a `company_id`.
/// Referência ausente ou de outra empresa é o mesmo erro de validação no campo.
pub(crate) async fn ensure_owned<'e, E>(
    executor: E,
    table: OwnedTable,
    id: Uuid,
    company_id: Uuid,
    field: &str,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let owner: Option<Uuid> = sqlx::query_scalar(table.ownership_sql())
        .bind(id)
        .fetch_optional(executor)
        .await?;

    match owner {
        Some(owner) if owner == company_id => Ok(()),
        _ => Err(AppError::invalid(field, "Referencia inválida para esta empresa.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("TI"), "%TI%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn push_scope_binds_company_for_tenant() {
        let company_id = Uuid::new_v4();
        let scope = Scope::Tenant { company_id, employee_id: Uuid::new_v4() };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM assets a WHERE ");
        push_scope(&mut qb, &scope, "a.company_id");
        assert_eq!(qb.sql(), "SELECT * FROM assets a WHERE a.company_id = $1");
    }

    #[test]
    fn push_scope_is_constant_for_platform_and_unlinked() {
        let mut qb = QueryBuilder::<Postgres>::new("WHERE ");
        push_scope(&mut qb, &Scope::Platform, "a.company_id");
        assert_eq!(qb.sql(), "WHERE TRUE");

        let mut qb = QueryBuilder::<Postgres>::new("WHERE ");
        push_scope(&mut qb, &Scope::Unlinked, "a.company_id");
        assert_eq!(qb.sql(), "WHERE FALSE");
    }
}
