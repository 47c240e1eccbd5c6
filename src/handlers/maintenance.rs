// src/handlers/maintenance.rs

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
    handlers::audit::ClientIp,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermMaintenanceManage, PermMaintenanceUpdateAssigned, RequirePermission},
        tenancy::CompanyOverride,
    },
    models::maintenance::{MaintenanceFilter, MaintenancePayload, MaintenanceStatusPayload, MaintenanceTicket},
};

// GET /api/maintenance
#[utoipa::path(
    get,
    path = "/api/maintenance",
    tag = "Maintenance",
    params(MaintenanceFilter),
    responses((status = 200, description = "Chamados de manutenção", body = Vec<MaintenanceTicket>)),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<MaintenanceFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let tickets = app_state
        .maintenance_service
        .list(&user.scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tickets))
}

// POST /api/maintenance
#[utoipa::path(
    post,
    path = "/api/maintenance",
    tag = "Maintenance",
    request_body = MaintenancePayload,
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa destino (operadores da plataforma)")),
    responses(
        (status = 201, description = "Chamado aberto; o responsável é notificado", body = MaintenanceTicket),
        (status = 400, description = "Ativo ou responsável de outra empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyOverride,
    _guard: RequirePermission<PermMaintenanceManage>,
    Json(payload): Json<MaintenancePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company_id = user
        .write_target(&company)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .maintenance_service
        .create(company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

// GET /api/maintenance/{id}
#[utoipa::path(
    get,
    path = "/api/maintenance/{id}",
    tag = "Maintenance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Chamado encontrado", body = MaintenanceTicket),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = app_state
        .maintenance_service
        .get(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ticket))
}

// PUT /api/maintenance/{id}
#[utoipa::path(
    put,
    path = "/api/maintenance/{id}",
    tag = "Maintenance",
    request_body = MaintenancePayload,
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Chamado atualizado", body = MaintenanceTicket),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermMaintenanceManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaintenancePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .maintenance_service
        .update(&user.scope, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ticket))
}

// DELETE /api/maintenance/{id}
#[utoipa::path(
    delete,
    path = "/api/maintenance/{id}",
    tag = "Maintenance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 204, description = "Chamado removido"),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermMaintenanceManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .maintenance_service
        .delete(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/maintenance/{id}/status
// Só o responsável pelo chamado; gera uma entrada na bitácora
#[utoipa::path(
    patch,
    path = "/api/maintenance/{id}/status",
    tag = "Maintenance",
    request_body = MaintenanceStatusPayload,
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Status e notas atualizados", body = MaintenanceTicket),
        (status = 400, description = "Status desconhecido"),
        (status = 403, description = "O chamador não é o responsável"),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ClientIp(client_ip): ClientIp,
    _guard: RequirePermission<PermMaintenanceUpdateAssigned>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaintenanceStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = app_state
        .maintenance_service
        .update_status(&user.scope, user.user.id, client_ip, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ticket))
}
