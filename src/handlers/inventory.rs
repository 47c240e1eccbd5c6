// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

// Importa os nossos extratores e erros
use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermInventoryManage, RequirePermission},
        tenancy::CompanyOverride,
    },
    models::inventory::{
        CreateStockMovementPayload, CreateStockRecordPayload, StockMovement, StockMovementFilter, StockRecord,
        StockRecordFilter,
    },
};

// GET /api/stock-records
#[utoipa::path(
    get,
    path = "/api/stock-records",
    tag = "Inventory",
    params(StockRecordFilter),
    responses((status = 200, description = "Registros de estoque", body = Vec<StockRecord>)),
    security(("api_jwt" = []))
)]
pub async fn list_records(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<StockRecordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let records = app_state
        .inventory_service
        .list_records(&user.scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(records))
}

// POST /api/stock-records
#[utoipa::path(
    post,
    path = "/api/stock-records",
    tag = "Inventory",
    request_body = CreateStockRecordPayload,
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa destino (operadores da plataforma)")),
    responses(
        (status = 201, description = "Registro criado com a quantidade inicial", body = StockRecord),
        (status = 400, description = "Local, item ou responsável de outra empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_record(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyOverride,
    _guard: RequirePermission<PermInventoryManage>,
    Json(payload): Json<CreateStockRecordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company_id = user
        .write_target(&company)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let record = app_state
        .inventory_service
        .create_record(company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(record)))
}

// GET /api/stock-records/{id}
#[utoipa::path(
    get,
    path = "/api/stock-records/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do registro")),
    responses(
        (status = 200, description = "Registro encontrado", body = StockRecord),
        (status = 404, description = "Registro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_record(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .inventory_service
        .get_record(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}

// GET /api/stock-movements
#[utoipa::path(
    get,
    path = "/api/stock-movements",
    tag = "Inventory",
    params(StockMovementFilter),
    responses((status = 200, description = "Movimentos de estoque", body = Vec<StockMovement>)),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<StockMovementFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .list_movements(&user.scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}

// POST /api/stock-movements
// A quantidade do registro muda na mesma transação do movimento
#[utoipa::path(
    post,
    path = "/api/stock-movements",
    tag = "Inventory",
    request_body = CreateStockMovementPayload,
    responses(
        (status = 201, description = "Movimento registrado", body = StockMovement),
        (status = 400, description = "Sinal incompatível com o tipo ou estoque insuficiente"),
        (status = 404, description = "Registro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_movement(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryManage>,
    Json(payload): Json<CreateStockMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let movement = app_state
        .inventory_service
        .record_movement(&user.scope, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movement)))
}
