// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::handlers::organization::{asset_states, catalog_items, departments, job_titles, locations, suppliers};
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::token,
        handlers::auth::refresh,

        // --- Me ---
        handlers::me::get_theme,
        handlers::me::update_theme,
        handlers::me::my_permissions,

        // --- RBAC ---
        handlers::rbac::list_permissions,
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::get_role,
        handlers::rbac::update_role,
        handlers::rbac::delete_role,

        // --- Organization ---
        departments::list, departments::create, departments::get_one, departments::update, departments::remove,
        job_titles::list, job_titles::create, job_titles::get_one, job_titles::update, job_titles::remove,
        locations::list, locations::create, locations::get_one, locations::update, locations::remove,
        asset_states::list, asset_states::create, asset_states::get_one, asset_states::update, asset_states::remove,
        suppliers::list, suppliers::create, suppliers::get_one, suppliers::update, suppliers::remove,
        catalog_items::list, catalog_items::create, catalog_items::get_one, catalog_items::update, catalog_items::remove,

        // --- Globals ---
        handlers::globals::list_currencies,
        handlers::globals::create_currency,
        handlers::globals::list_taxes,
        handlers::globals::create_tax,

        // --- Employees ---
        handlers::employees::list_employees,
        handlers::employees::create_employee,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::delete_employee,

        // --- Assets ---
        handlers::assets::list_assets,
        handlers::assets::create_asset,
        handlers::assets::get_asset,
        handlers::assets::update_asset,
        handlers::assets::delete_asset,
        handlers::assets::list_revaluations,
        handlers::assets::execute_revaluation,

        // --- Inventory ---
        handlers::inventory::list_records,
        handlers::inventory::create_record,
        handlers::inventory::get_record,
        handlers::inventory::list_movements,
        handlers::inventory::record_movement,

        // --- Procurement ---
        handlers::procurement::list_budgets,
        handlers::procurement::create_budget,
        handlers::procurement::list_budget_lines,
        handlers::procurement::create_budget_line,
        handlers::procurement::list_orders,
        handlers::procurement::create_order,
        handlers::procurement::get_order,
        handlers::procurement::change_status,
        handlers::procurement::list_lines,
        handlers::procurement::add_line,

        // --- Maintenance ---
        handlers::maintenance::list_tickets,
        handlers::maintenance::create_ticket,
        handlers::maintenance::get_ticket,
        handlers::maintenance::update_ticket,
        handlers::maintenance::delete_ticket,
        handlers::maintenance::update_status,

        // --- Tenancy / Notifications / Audit ---
        handlers::tenancy::list_subscriptions,
        handlers::notifications::list_mine,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,
        handlers::audit::list_logs,
        handlers::audit::create_log,

        // --- Reports / Analytics ---
        handlers::reports::asset_report,
        handlers::reports::export_asset_report,
        handlers::reports::query_report,
        handlers::reports::export_query_report,
        handlers::analytics::maintenance_predictions,
        handlers::analytics::budget_predictions,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::RefreshPayload,
            models::auth::TokenPair,

            // --- Tenancy ---
            models::tenancy::Company,
            models::tenancy::SubscriptionPlan,
            models::tenancy::SubscriptionStatus,
            models::tenancy::Subscription,
            models::tenancy::RegisterCompanyPayload,
            models::tenancy::Currency,
            models::tenancy::CurrencyPayload,
            models::tenancy::Tax,
            models::tenancy::TaxPayload,

            // --- RBAC ---
            models::rbac::Permission,
            models::rbac::Role,
            models::rbac::RoleResponse,
            models::rbac::RolePayload,
            models::rbac::MyPermissions,

            // --- Organization ---
            models::organization::NamedPayload,
            models::organization::Department,
            models::organization::JobTitle,
            models::organization::AssetState,
            models::organization::Location,
            models::organization::LocationPayload,
            models::organization::Supplier,
            models::organization::SupplierPayload,
            models::organization::CatalogItem,
            models::organization::CatalogItemPayload,
            models::organization::ThemePreference,
            models::organization::ThemeSettings,
            models::organization::UpdateThemePayload,
            models::organization::Employee,
            models::organization::EmployeeDetail,
            models::organization::CreateEmployeePayload,
            models::organization::UpdateEmployeePayload,

            // --- Assets ---
            models::assets::Asset,
            models::assets::AssetPayload,
            models::assets::RevaluationMethod,
            models::assets::Revaluation,
            models::assets::ExecuteRevaluationPayload,

            // --- Inventory ---
            models::inventory::StockRecord,
            models::inventory::CreateStockRecordPayload,
            models::inventory::StockMovementKind,
            models::inventory::StockMovement,
            models::inventory::CreateStockMovementPayload,

            // --- Procurement ---
            models::procurement::Budget,
            models::procurement::BudgetPayload,
            models::procurement::BudgetLine,
            models::procurement::BudgetLinePayload,
            models::procurement::PurchaseOrderStatus,
            models::procurement::PurchaseOrder,
            models::procurement::CreatePurchaseOrderPayload,
            models::procurement::UpdatePurchaseOrderStatusPayload,
            models::procurement::PurchaseOrderLine,
            models::procurement::PurchaseOrderLinePayload,

            // --- Maintenance ---
            models::maintenance::MaintenanceKind,
            models::maintenance::MaintenanceStatus,
            models::maintenance::MaintenanceTicket,
            models::maintenance::MaintenancePayload,
            models::maintenance::MaintenanceStatusPayload,

            // --- Notifications / Audit ---
            models::notifications::NotificationKind,
            models::notifications::Notification,
            models::notifications::MarkAllReadResponse,
            models::audit::AuditLogEntry,
            models::audit::CreateLogPayload,

            // --- Reports / Analytics ---
            models::reports::AssetReportRow,
            models::reports::ExportFormat,
            models::reports::ReportQueryPayload,
            models::analytics::MaintenancePrediction,
            models::analytics::BudgetPrediction,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro de empresas e emissão de tokens"),
        (name = "Me", description = "Preferências e permissões do próprio usuário"),
        (name = "RBAC", description = "Controle de Acesso (Papéis e Permissões)"),
        (name = "Organization", description = "Departamentos, cargos e locais"),
        (name = "Globals", description = "Divisas e impostos da plataforma"),
        (name = "Employees", description = "Funcionários e seus logins"),
        (name = "Assets", description = "Ativos fixos, estados e revalorizações"),
        (name = "Inventory", description = "Catálogo, registros e movimentos de estoque"),
        (name = "Procurement", description = "Fornecedores, orçamentos e ordens de compra"),
        (name = "Maintenance", description = "Chamados de manutenção"),
        (name = "Tenancy", description = "Assinatura da empresa"),
        (name = "Notifications", description = "Notificações do usuário"),
        (name = "Audit", description = "Bitácora de ações"),
        (name = "Reports", description = "Relatórios e exportação PDF/CSV"),
        (name = "Analytics", description = "Previsões de manutenção e orçamento")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_generated_reference_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/departments/{id}"));
        assert!(doc.paths.paths.contains_key("/api/revaluations/execute"));
        assert!(doc.components.is_some_and(|c| c.security_schemes.contains_key("api_jwt")));
    }
}
