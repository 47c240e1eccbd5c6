// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermReportsExport, PermReportsView, RequirePermission},
    },
    models::reports::{AssetReportRow, FormReportParams, ReportQueryPayload},
    services::document_service::RenderedReport,
};

// Configura os Headers para o navegador baixar o arquivo
fn attachment(report: RenderedReport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    let headers = [
        (header::CONTENT_TYPE, report.content_type),
        (header::CONTENT_DISPOSITION, disposition.as_str()),
    ];
    (headers, report.bytes).into_response()
}

// GET /api/reports/assets
#[utoipa::path(
    get,
    path = "/api/reports/assets",
    tag = "Reports",
    params(FormReportParams),
    responses((status = 200, description = "Prévia do relatório de ativos", body = Vec<AssetReportRow>)),
    security(("api_jwt" = []))
)]
pub async fn asset_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<FormReportParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .asset_report(&user.scope, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

// GET /api/reports/assets/export
#[utoipa::path(
    get,
    path = "/api/reports/assets/export",
    tag = "Reports",
    params(FormReportParams),
    responses(
        (status = 200, description = "Arquivo PDF ou CSV", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 403, description = "Falta a permissão reports:export"),
        (status = 404, description = "Nenhum ativo corresponde aos filtros")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_asset_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermReportsExport>,
    Query(params): Query<FormReportParams>,
) -> Result<Response, ApiError> {
    let report = app_state
        .report_service
        .export_asset_report(&user.scope, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment(report))
}

// POST /api/reports/query
#[utoipa::path(
    post,
    path = "/api/reports/query",
    tag = "Reports",
    request_body = ReportQueryPayload,
    responses((status = 200, description = "Ativos que atendem a todas as cláusulas", body = Vec<AssetReportRow>)),
    security(("api_jwt" = []))
)]
pub async fn query_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermReportsView>,
    Json(payload): Json<ReportQueryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .query_report(&user.scope, &payload.filters)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

// POST /api/reports/query/export
#[utoipa::path(
    post,
    path = "/api/reports/query/export",
    tag = "Reports",
    request_body = ReportQueryPayload,
    responses(
        (status = 200, description = "Arquivo PDF ou CSV", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, description = "Nenhum ativo corresponde aos filtros")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_query_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermReportsExport>,
    Json(payload): Json<ReportQueryPayload>,
) -> Result<Response, ApiError> {
    let report = app_state
        .report_service
        .export_query_report(&user.scope, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment(report))
}
