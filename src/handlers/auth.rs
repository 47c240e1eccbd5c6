// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        auth::{LoginPayload, RefreshPayload, TokenPair},
        tenancy::RegisterCompanyPayload,
    },
};

// POST /api/register
// Cadastro público: empresa + administrador + assinatura, tudo de uma vez
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Auth",
    request_body = RegisterCompanyPayload,
    responses(
        (status = 201, description = "Empresa registrada; devolve o par de tokens", body = TokenPair),
        (status = 400, description = "Dados inválidos ou empresa/usuário já existentes")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let admin = app_state
        .tenant_service
        .register_company(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tokens = app_state
        .auth_service
        .issue_pair(&admin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

// POST /api/token
#[utoipa::path(
    post,
    path = "/api/token",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Credenciais válidas", body = TokenPair),
        (status = 401, description = "Usuário ou senha incorretos")
    )
)]
pub async fn token(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tokens = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tokens))
}

// POST /api/token/refresh
#[utoipa::path(
    post,
    path = "/api/token/refresh",
    tag = "Auth",
    request_body = RefreshPayload,
    responses(
        (status = 200, description = "Novo par de tokens", body = TokenPair),
        (status = 401, description = "Token de refresh inválido ou expirado")
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tokens = app_state
        .auth_service
        .refresh(&payload.refresh)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tokens))
}
