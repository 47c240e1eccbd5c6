// src/handlers/procurement.rs

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
        rbac::{PermBudgetsManage, PermPurchaseOrdersManage, RequirePermission},
        tenancy::CompanyOverride,
    },
    models::procurement::{
        Budget, BudgetFilter, BudgetLine, BudgetLineFilter, BudgetLinePayload, BudgetPayload,
        CreatePurchaseOrderPayload, PurchaseOrder, PurchaseOrderFilter, PurchaseOrderLine, PurchaseOrderLinePayload,
        UpdatePurchaseOrderStatusPayload,
    },
};

// ---
// Orçamentos
// ---

// GET /api/budgets
#[utoipa::path(
    get,
    path = "/api/budgets",
    tag = "Procurement",
    params(BudgetFilter),
    responses((status = 200, description = "Orçamentos", body = Vec<Budget>)),
    security(("api_jwt" = []))
)]
pub async fn list_budgets(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<BudgetFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let budgets = app_state
        .procurement_service
        .list_budgets(&user.scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(budgets))
}

// POST /api/budgets
#[utoipa::path(
    post,
    path = "/api/budgets",
    tag = "Procurement",
    request_body = BudgetPayload,
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa destino (operadores da plataforma)")),
    responses(
        (status = 201, description = "Orçamento criado", body = Budget),
        (status = 400, description = "Departamento de outra empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_budget(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyOverride,
    _guard: RequirePermission<PermBudgetsManage>,
    Json(payload): Json<BudgetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company_id = user
        .write_target(&company)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let budget = app_state
        .procurement_service
        .create_budget(company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(budget)))
}

// GET /api/budget-lines
#[utoipa::path(
    get,
    path = "/api/budget-lines",
    tag = "Procurement",
    params(BudgetLineFilter),
    responses((status = 200, description = "Linhas de orçamento", body = Vec<BudgetLine>)),
    security(("api_jwt" = []))
)]
pub async fn list_budget_lines(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<BudgetLineFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = app_state
        .procurement_service
        .list_budget_lines(&user.scope, filter.budget_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lines))
}

// POST /api/budget-lines
#[utoipa::path(
    post,
    path = "/api/budget-lines",
    tag = "Procurement",
    request_body = BudgetLinePayload,
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa destino (operadores da plataforma)")),
    responses(
        (status = 201, description = "Linha criada", body = BudgetLine),
        (status = 400, description = "Orçamento de outra empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_budget_line(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyOverride,
    _guard: RequirePermission<PermBudgetsManage>,
    Json(payload): Json<BudgetLinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company_id = user
        .write_target(&company)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let line = app_state
        .procurement_service
        .create_budget_line(company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(line)))
}

// ---
// Ordens de compra
// ---

// GET /api/purchase-orders
#[utoipa::path(
    get,
    path = "/api/purchase-orders",
    tag = "Procurement",
    params(PurchaseOrderFilter),
    responses((status = 200, description = "Ordens de compra", body = Vec<PurchaseOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<PurchaseOrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .procurement_service
        .list_orders(&user.scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

// POST /api/purchase-orders
#[utoipa::path(
    post,
    path = "/api/purchase-orders",
    tag = "Procurement",
    request_body = CreatePurchaseOrderPayload,
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa destino (operadores da plataforma)")),
    responses(
        (status = 201, description = "Ordem criada em estado pendente", body = PurchaseOrder),
        (status = 400, description = "Datas inválidas ou referências de outra empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyOverride,
    _guard: RequirePermission<PermPurchaseOrdersManage>,
    Json(payload): Json<CreatePurchaseOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company_id = user
        .write_target(&company)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .procurement_service
        .create_order(&user.scope, company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/purchase-orders/{id}
#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}",
    tag = "Procurement",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 200, description = "Ordem encontrada", body = PurchaseOrder),
        (status = 404, description = "Ordem não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .procurement_service
        .get_order(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// PATCH /api/purchase-orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/purchase-orders/{id}/status",
    tag = "Procurement",
    request_body = UpdatePurchaseOrderStatusPayload,
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 200, description = "Estado alterado", body = PurchaseOrder),
        (status = 400, description = "Transição não permitida"),
        (status = 404, description = "Ordem não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchaseOrdersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseOrderStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .procurement_service
        .change_status(&user.scope, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// GET /api/purchase-orders/{id}/lines
#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}/lines",
    tag = "Procurement",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 200, description = "Linhas da ordem", body = Vec<PurchaseOrderLine>),
        (status = 404, description = "Ordem não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_lines(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = app_state
        .procurement_service
        .list_lines(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lines))
}

// POST /api/purchase-orders/{id}/lines
// O total da ordem é recalculado na mesma transação
#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/lines",
    tag = "Procurement",
    request_body = PurchaseOrderLinePayload,
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 201, description = "Linha adicionada", body = PurchaseOrderLine),
        (status = 400, description = "Ordem encerrada ou referências de outra empresa"),
        (status = 404, description = "Ordem não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_line(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchaseOrdersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PurchaseOrderLinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let line = app_state
        .procurement_service
        .add_line(&user.scope, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(line)))
}
