// src/db/report_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::{db_utils::push_scope, error::AppError, scope::Scope},
    models::reports::{AssetReportRow, FormReportParams},
    services::report_filter::{push_clauses, FilterClause},
};

const REPORT_BASE: &str = r#"
    SELECT DISTINCT
        a.id, a.name, a.internal_code, a.acquired_on, a.current_value,
        d.name AS department_name,
        ci.name AS category_name,
        l.name AS location_name,
        s.name AS state_name,
        sp.name AS supplier_name
    FROM assets a
    LEFT JOIN departments d ON d.id = a.department_id
    LEFT JOIN catalog_items ci ON ci.id = a.catalog_item_id
    LEFT JOIN locations l ON l.id = a.location_id
    LEFT JOIN asset_states s ON s.id = a.state_id
    LEFT JOIN suppliers sp ON sp.id = a.supplier_id
    WHERE "#;

const REPORT_ORDER: &str = " ORDER BY a.acquired_on, a.internal_code";

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Relatório de formulário: local e intervalo de datas de aquisição.
    pub async fn asset_report(&self, scope: &Scope, params: &FormReportParams) -> Result<Vec<AssetReportRow>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(REPORT_BASE);
        push_scope(&mut qb, scope, "a.company_id");

        if let Some(location_id) = params.location_id {
            qb.push(" AND a.location_id = ");
            qb.push_bind(location_id);
        }
        if let Some(from) = params.date_from {
            qb.push(" AND a.acquired_on >= ");
            qb.push_bind(from);
        }
        if let Some(to) = params.date_to {
            qb.push(" AND a.acquired_on <= ");
            qb.push_bind(to);
        }
        qb.push(REPORT_ORDER);

        let rows = qb.build_query_as::<AssetReportRow>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Relatório por consulta livre (cláusulas já interpretadas).
    pub async fn query_report(&self, scope: &Scope, clauses: &[FilterClause]) -> Result<Vec<AssetReportRow>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(REPORT_BASE);
        push_scope(&mut qb, scope, "a.company_id");
        push_clauses(&mut qb, clauses);
        qb.push(REPORT_ORDER);

        let rows = qb.build_query_as::<AssetReportRow>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::test_support, services::report_filter::parse_filters};
    use rust_decimal::Decimal;

    fn codes(rows: &[AssetReportRow]) -> Vec<&str> {
        let mut codes: Vec<&str> = rows.iter().map(|r| r.internal_code.as_str()).collect();
        codes.sort();
        codes
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn department_and_value_clauses_are_anded(pool: PgPool) {
        let repo = ReportRepository::new(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 50).await;
        let beta = test_support::seed_company(&pool, "Beta", 5, 50).await;

        let soporte = test_support::seed_department(&pool, acme.company_id, "Soporte TI").await;
        let central = test_support::seed_department(&pool, acme.company_id, "ti central").await;
        let finanzas = test_support::seed_department(&pool, acme.company_id, "Finanzas").await;
        let beta_ti = test_support::seed_department(&pool, beta.company_id, "TI").await;

        test_support::seed_asset(&pool, &acme, "AF-1", Decimal::from(900), Some(soporte)).await;
        test_support::seed_asset(&pool, &acme, "AF-2", Decimal::from(500), Some(soporte)).await;
        test_support::seed_asset(&pool, &acme, "AF-3", Decimal::from(900), Some(finanzas)).await;
        test_support::seed_asset(&pool, &acme, "AF-4", Decimal::from(900), None).await;
        test_support::seed_asset(&pool, &acme, "AF-5", Decimal::new(50001, 2), Some(central)).await;
        test_support::seed_asset(&pool, &beta, "BF-1", Decimal::from(900), Some(beta_ti)).await;

        let rows = repo
            .query_report(&acme.scope(), &parse_filters(&["depto:TI", "valor>500"]))
            .await
            .unwrap();
        assert_eq!(codes(&rows), ["AF-1", "AF-5"]);

        // Cláusula numérica inválida é descartada: sobra só o filtro de departamento
        let rows = repo
            .query_report(&acme.scope(), &parse_filters(&["depto:ti", "valor>abc"]))
            .await
            .unwrap();
        assert_eq!(codes(&rows), ["AF-1", "AF-2", "AF-5"]);

        let rows = repo
            .query_report(&Scope::Platform, &parse_filters(&["depto:TI", "valor>500"]))
            .await
            .unwrap();
        assert_eq!(codes(&rows), ["AF-1", "AF-5", "BF-1"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn free_text_and_exact_clauses_hit_the_joined_names(pool: PgPool) {
        let repo = ReportRepository::new(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 50).await;
        let finanzas = test_support::seed_department(&pool, acme.company_id, "Finanzas").await;
        test_support::seed_asset(&pool, &acme, "AF-1", Decimal::from(100), Some(finanzas)).await;
        test_support::seed_asset(&pool, &acme, "AF-2", Decimal::from(250), None).await;

        let rows = repo.query_report(&acme.scope(), &parse_filters(&["FINANZAS"])).await.unwrap();
        assert_eq!(codes(&rows), ["AF-1"]);

        // Todos os ativos semeados usam o estado "Operativo"
        let rows = repo.query_report(&acme.scope(), &parse_filters(&["operativo"])).await.unwrap();
        assert_eq!(codes(&rows), ["AF-1", "AF-2"]);

        let rows = repo.query_report(&acme.scope(), &parse_filters(&["codigo=AF-2"])).await.unwrap();
        assert_eq!(codes(&rows), ["AF-2"]);

        let rows = repo
            .query_report(&acme.scope(), &parse_filters(&["valor<250", "fecha_adq=2024-03-15"]))
            .await
            .unwrap();
        assert_eq!(codes(&rows), ["AF-1"]);

        assert!(repo.query_report(&Scope::Unlinked, &[]).await.unwrap().is_empty());
    }
}
