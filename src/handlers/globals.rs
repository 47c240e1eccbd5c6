// src/handlers/globals.rs
// Moedas e impostos: leitura para qualquer autenticado, escrita só da plataforma

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermCurrenciesManage, PermTaxesManage, RequirePermission},
    },
    models::tenancy::{Currency, CurrencyPayload, Tax, TaxPayload},
};

// GET /api/currencies
#[utoipa::path(
    get,
    path = "/api/currencies",
    tag = "Globals",
    responses((status = 200, description = "Divisas cadastradas", body = Vec<Currency>)),
    security(("api_jwt" = []))
)]
pub async fn list_currencies(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let currencies = app_state
        .tenant_service
        .list_currencies()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(currencies))
}

// POST /api/currencies
#[utoipa::path(
    post,
    path = "/api/currencies",
    tag = "Globals",
    request_body = CurrencyPayload,
    responses(
        (status = 201, description = "Divisa criada", body = Currency),
        (status = 403, description = "Somente operadores da plataforma"),
        (status = 409, description = "Código já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_currency(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCurrenciesManage>,
    Json(payload): Json<CurrencyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let currency = app_state
        .tenant_service
        .create_currency(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(currency)))
}

// GET /api/taxes
#[utoipa::path(
    get,
    path = "/api/taxes",
    tag = "Globals",
    responses((status = 200, description = "Impostos cadastrados", body = Vec<Tax>)),
    security(("api_jwt" = []))
)]
pub async fn list_taxes(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let taxes = app_state
        .tenant_service
        .list_taxes()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(taxes))
}

// POST /api/taxes
#[utoipa::path(
    post,
    path = "/api/taxes",
    tag = "Globals",
    request_body = TaxPayload,
    responses(
        (status = 201, description = "Imposto criado", body = Tax),
        (status = 403, description = "Somente operadores da plataforma")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tax(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermTaxesManage>,
    Json(payload): Json<TaxPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tax = app_state
        .tenant_service
        .create_tax(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(tax)))
}
