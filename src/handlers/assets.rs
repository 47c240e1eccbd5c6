// src/handlers/assets.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermAssetsManage, PermRevaluationsManage, RequirePermission},
        tenancy::CompanyOverride,
    },
    models::assets::{Asset, AssetFilter, AssetPayload, ExecuteRevaluationPayload, Revaluation, RevaluationFilter},
};

// GET /api/assets
#[utoipa::path(
    get,
    path = "/api/assets",
    tag = "Assets",
    params(AssetFilter),
    responses((status = 200, description = "Ativos visíveis ao chamador", body = Vec<Asset>)),
    security(("api_jwt" = []))
)]
pub async fn list_assets(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<AssetFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let assets = app_state
        .asset_service
        .list(&user.scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(assets))
}

// POST /api/assets
#[utoipa::path(
    post,
    path = "/api/assets",
    tag = "Assets",
    request_body = AssetPayload,
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa destino (operadores da plataforma)")),
    responses(
        (status = 201, description = "Ativo criado", body = Asset),
        (status = 403, description = "Limite de ativos do plano atingido"),
        (status = 409, description = "Código interno já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyOverride,
    _guard: RequirePermission<PermAssetsManage>,
    Json(payload): Json<AssetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company_id = user
        .write_target(&company)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let asset = app_state
        .asset_service
        .create(company_id, user.user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(asset)))
}

// GET /api/assets/{id}
#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    tag = "Assets",
    params(("id" = Uuid, Path, description = "ID do ativo")),
    responses(
        (status = 200, description = "Ativo encontrado", body = Asset),
        (status = 404, description = "Ativo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let asset = app_state
        .asset_service
        .get(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(asset))
}

// PUT /api/assets/{id}
#[utoipa::path(
    put,
    path = "/api/assets/{id}",
    tag = "Assets",
    request_body = AssetPayload,
    params(("id" = Uuid, Path, description = "ID do ativo")),
    responses(
        (status = 200, description = "Ativo atualizado", body = Asset),
        (status = 404, description = "Ativo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermAssetsManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let asset = app_state
        .asset_service
        .update(&user.scope, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(asset))
}

// DELETE /api/assets/{id}
#[utoipa::path(
    delete,
    path = "/api/assets/{id}",
    tag = "Assets",
    params(("id" = Uuid, Path, description = "ID do ativo")),
    responses(
        (status = 204, description = "Ativo removido"),
        (status = 404, description = "Ativo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_asset(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermAssetsManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .asset_service
        .delete(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Revalorizações
// ---

// GET /api/revaluations
#[utoipa::path(
    get,
    path = "/api/revaluations",
    tag = "Assets",
    params(RevaluationFilter),
    responses((status = 200, description = "Histórico de revalorizações", body = Vec<Revaluation>)),
    security(("api_jwt" = []))
)]
pub async fn list_revaluations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<RevaluationFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let revaluations = app_state
        .asset_service
        .list_revaluations(&user.scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(revaluations))
}

// POST /api/revaluations/execute
#[utoipa::path(
    post,
    path = "/api/revaluations/execute",
    tag = "Assets",
    request_body = ExecuteRevaluationPayload,
    responses(
        (status = 201, description = "Revalorização aplicada e registrada", body = Revaluation),
        (status = 400, description = "Método ou valor inválido"),
        (status = 404, description = "Ativo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn execute_revaluation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermRevaluationsManage>,
    Json(payload): Json<ExecuteRevaluationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let revaluation = app_state
        .asset_service
        .execute_revaluation(&user.scope, user.user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(revaluation)))
}
