// src/handlers/me.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        organization::{ThemeSettings, UpdateThemePayload},
        rbac::MyPermissions,
    },
};

// Marcador devolvido aos operadores da plataforma no lugar da lista completa
const SUPERUSER_MARKER: &str = "is_superuser";

// GET /api/me/theme
#[utoipa::path(
    get,
    path = "/api/me/theme",
    tag = "Me",
    responses((status = 200, description = "Preferências de tema do funcionário", body = ThemeSettings)),
    security(("api_jwt" = []))
)]
pub async fn get_theme(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let theme = app_state
        .employee_service
        .theme(&user.scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(theme))
}

// PATCH /api/me/theme
#[utoipa::path(
    patch,
    path = "/api/me/theme",
    tag = "Me",
    request_body = UpdateThemePayload,
    responses(
        (status = 200, description = "Tema atualizado", body = ThemeSettings),
        (status = 403, description = "Usuário sem vínculo de funcionário")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_theme(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateThemePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let update = payload
        .into_update()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let theme = app_state
        .employee_service
        .update_theme(&user.scope, &update)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(theme))
}

// GET /api/me/permissions
#[utoipa::path(
    get,
    path = "/api/me/permissions",
    tag = "Me",
    responses((status = 200, description = "Permissões efetivas do chamador", body = MyPermissions)),
    security(("api_jwt" = []))
)]
pub async fn my_permissions(user: AuthenticatedUser) -> Json<MyPermissions> {
    let mut permissions = user.permissions.sorted_names();
    if user.permissions.is_platform() {
        permissions.push(SUPERUSER_MARKER.to_string());
    }
    Json(MyPermissions { permissions })
}
