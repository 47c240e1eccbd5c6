//src/main.rs

use std::net::SocketAddr;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::handlers::organization;
use crate::middleware::auth::auth_guard;

fn protected_routes() -> Router<AppState> {
    Router::new()
        // Próprio usuário
        .route(
            "/me/theme",
            get(handlers::me::get_theme).patch(handlers::me::update_theme),
        )
        .route("/me/permissions", get(handlers::me::my_permissions))

        // RBAC
        .route("/permissions", get(handlers::rbac::list_permissions))
        .route(
            "/roles",
            get(handlers::rbac::list_roles).post(handlers::rbac::create_role),
        )
        .route(
            "/roles/{id}",
            get(handlers::rbac::get_role)
                .put(handlers::rbac::update_role)
                .delete(handlers::rbac::delete_role),
        )

        // Dados de referência da empresa
        .nest("/departments", organization::departments::router())
        .nest("/job-titles", organization::job_titles::router())
        .nest("/locations", organization::locations::router())
        .nest("/asset-states", organization::asset_states::router())
        .nest("/suppliers", organization::suppliers::router())
        .nest("/catalog-items", organization::catalog_items::router())

        // Globais
        .route(
            "/currencies",
            get(handlers::globals::list_currencies).post(handlers::globals::create_currency),
        )
        .route(
            "/taxes",
            get(handlers::globals::list_taxes).post(handlers::globals::create_tax),
        )

        // Funcionários
        .route(
            "/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/employees/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )

        // Ativos e revalorizações
        .route(
            "/assets",
            get(handlers::assets::list_assets).post(handlers::assets::create_asset),
        )
        .route(
            "/assets/{id}",
            get(handlers::assets::get_asset)
                .put(handlers::assets::update_asset)
                .delete(handlers::assets::delete_asset),
        )
        .route("/revaluations", get(handlers::assets::list_revaluations))
        .route("/revaluations/execute", post(handlers::assets::execute_revaluation))

        // Estoque
        .route(
            "/stock-records",
            get(handlers::inventory::list_records).post(handlers::inventory::create_record),
        )
        .route("/stock-records/{id}", get(handlers::inventory::get_record))
        .route(
            "/stock-movements",
            get(handlers::inventory::list_movements).post(handlers::inventory::record_movement),
        )

        // Compras
        .route(
            "/budgets",
            get(handlers::procurement::list_budgets).post(handlers::procurement::create_budget),
        )
        .route(
            "/budget-lines",
            get(handlers::procurement::list_budget_lines).post(handlers::procurement::create_budget_line),
        )
        .route(
            "/purchase-orders",
            get(handlers::procurement::list_orders).post(handlers::procurement::create_order),
        )
        .route("/purchase-orders/{id}", get(handlers::procurement::get_order))
        .route("/purchase-orders/{id}/status", patch(handlers::procurement::change_status))
        .route(
            "/purchase-orders/{id}/lines",
            get(handlers::procurement::list_lines).post(handlers::procurement::add_line),
        )

        // Manutenção
        .route(
            "/maintenance",
            get(handlers::maintenance::list_tickets).post(handlers::maintenance::create_ticket),
        )
        .route(
            "/maintenance/{id}",
            get(handlers::maintenance::get_ticket)
                .put(handlers::maintenance::update_ticket)
                .delete(handlers::maintenance::delete_ticket),
        )
        .route("/maintenance/{id}/status", patch(handlers::maintenance::update_status))

        // Assinatura, notificações e bitácora
        .route("/subscription", get(handlers::tenancy::list_subscriptions))
        .route("/notifications", get(handlers::notifications::list_mine))
        .route("/notifications/{id}/read", post(handlers::notifications::mark_read))
        .route("/notifications/read-all", post(handlers::notifications::mark_all_read))
        .route(
            "/logs",
            get(handlers::audit::list_logs).post(handlers::audit::create_log),
        )

        // Relatórios e analytics
        .route("/reports/assets", get(handlers::reports::asset_report))
        .route("/reports/assets/export", get(handlers::reports::export_asset_report))
        .route("/reports/query", post(handlers::reports::query_report))
        .route("/reports/query/export", post(handlers::reports::export_query_report))
        .route(
            "/analytics/maintenance-predictions",
            get(handlers::analytics::maintenance_predictions),
        )
        .route(
            "/analytics/budget-predictions",
            get(handlers::analytics::budget_predictions),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new().await?;

    // Cada banco tem o seu diretório de migrações
    sqlx::migrate!("./migrations").run(&app_state.db_pool).await?;
    sqlx::migrate!("./migrations_audit").run(&app_state.audit_pool).await?;
    sqlx::migrate!("./migrations_analytics").run(&app_state.analytics_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Catálogo de permissões alinhado com o código
    app_state.rbac_service.sync_catalog().await?;

    // Rotas públicas
    let public_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/token", post(handlers::auth::token))
        .route("/token/refresh", post(handlers::auth::refresh));

    // Rotas protegidas pelo middleware
    let api_routes = protected_routes().layer(axum_middleware::from_fn_with_state(
        app_state.clone(),
        auth_guard,
    ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api", public_routes.merge(api_routes))
        .with_state(app_state.clone());

    // Inicia o servidor
    let listener = TcpListener::bind(&app_state.settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    // ConnectInfo alimenta o IP da bitácora quando não há X-Forwarded-For
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
