// src/services/report_service.rs

use crate::{
    common::{error::AppError, scope::Scope},
    db::ReportRepository,
    models::reports::{AssetReportRow, ExportFormat, FormReportParams, ReportQueryPayload},
    services::{
        document_service::{DocumentService, RenderedReport},
        report_filter::{parse_filters, FilterClause},
    },
};

/// Remove cláusulas repetidas mantendo a ordem de chegada.
fn dedup_clauses(clauses: Vec<FilterClause>) -> Vec<FilterClause> {
    let mut unique: Vec<FilterClause> = Vec::with_capacity(clauses.len());
    for clause in clauses {
        if !unique.contains(&clause) {
            unique.push(clause);
        }
    }
    unique
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    documents: DocumentService,
}

impl ReportService {
    pub fn new(repo: ReportRepository, documents: DocumentService) -> Self {
        Self { repo, documents }
    }

    pub async fn asset_report(&self, scope: &Scope, params: &FormReportParams) -> Result<Vec<AssetReportRow>, AppError> {
        self.repo.asset_report(scope, params).await
    }

    pub async fn query_report(&self, scope: &Scope, filters: &[String]) -> Result<Vec<AssetReportRow>, AppError> {
        let clauses = dedup_clauses(parse_filters(filters));
        tracing::debug!(received = filters.len(), kept = clauses.len(), "Filtros do relatório interpretados");
        self.repo.query_report(scope, &clauses).await
    }

    pub async fn export_asset_report(&self, scope: &Scope, params: &FormReportParams) -> Result<RenderedReport, AppError> {
        let rows = self.asset_report(scope, params).await?;
        self.render(rows, "Reporte de activos", params.format).await
    }

    pub async fn export_query_report(&self, scope: &Scope, payload: &ReportQueryPayload) -> Result<RenderedReport, AppError> {
        let rows = self.query_report(scope, &payload.filters).await?;
        self.render(rows, "Reporte de activos (consulta)", payload.format).await
    }

    async fn render(
        &self,
        rows: Vec<AssetReportRow>,
        title: &str,
        format: ExportFormat,
    ) -> Result<RenderedReport, AppError> {
        // Nada para exportar: 404 em vez de um arquivo vazio
        if rows.is_empty() {
            return Err(AppError::NotFound("asset"));
        }
        let stem = format!("reporte_activos_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"));
        self.documents.render_assets(title.to_string(), &stem, rows, format).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_filters_collapse_to_one_clause() {
        let clauses = parse_filters(&["depto:TI", "laptop", "depto:TI", "valor>500"]);
        assert_eq!(clauses.len(), 4);
        let unique = dedup_clauses(clauses);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0], parse_filters(&["depto:TI"])[0]);
    }
}
