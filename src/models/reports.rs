// src/models/reports.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// Linha do relatório de ativos (ativo + nomes das referências)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetReportRow {
    pub id: Uuid,
    pub name: String,
    pub internal_code: String,
    pub acquired_on: NaiveDate,
    pub current_value: Decimal,
    pub department_name: Option<String>,
    pub category_name: Option<String>,
    pub location_name: Option<String>,
    pub state_name: Option<String>,
    pub supplier_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    // "excel" é aceito por compatibilidade e gera CSV
    #[serde(alias = "excel")]
    Csv,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
        }
    }
}

// Relatório de formulário: local + intervalo de aquisição
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FormReportParams {
    #[serde(alias = "ubicacion_id")]
    pub location_id: Option<Uuid>,
    #[serde(alias = "fecha_min")]
    pub date_from: Option<NaiveDate>,
    #[serde(alias = "fecha_max")]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub format: ExportFormat,
}

// Relatório por consulta livre: ["depto:TI", "laptop", "valor>500"]
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportQueryPayload {
    #[serde(default)]
    #[schema(example = json!(["depto:TI", "valor>500"]))]
    pub filters: Vec<String>,
    #[serde(default)]
    pub format: ExportFormat,
}
