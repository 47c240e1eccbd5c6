// src/handlers/analytics.rs
// Leitura das previsões geradas fora desta API (banco analítico)

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::analytics::{BudgetPrediction, MaintenancePrediction},
};

// GET /api/analytics/maintenance-predictions
#[utoipa::path(
    get,
    path = "/api/analytics/maintenance-predictions",
    tag = "Analytics",
    responses((status = 200, description = "Probabilidade de falha por ativo", body = Vec<MaintenancePrediction>)),
    security(("api_jwt" = []))
)]
pub async fn maintenance_predictions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .analytics_repo
        .maintenance_predictions(&user.scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

// GET /api/analytics/budget-predictions
#[utoipa::path(
    get,
    path = "/api/analytics/budget-predictions",
    tag = "Analytics",
    responses((status = 200, description = "Sugestões de orçamento por período", body = Vec<BudgetPrediction>)),
    security(("api_jwt" = []))
)]
pub async fn budget_predictions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .analytics_repo
        .budget_predictions(&user.scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}
