// src/handlers/tenancy.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::tenancy::Subscription,
};

// GET /api/subscription
// Funcionário: a assinatura da própria empresa. Plataforma: todas.
#[utoipa::path(
    get,
    path = "/api/subscription",
    tag = "Tenancy",
    responses((status = 200, description = "Assinaturas visíveis ao chamador", body = Vec<Subscription>)),
    security(("api_jwt" = []))
)]
pub async fn list_subscriptions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = app_state
        .tenant_service
        .list_subscriptions(&user.scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(subscriptions))
}
