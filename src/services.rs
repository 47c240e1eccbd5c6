pub mod auth;
pub mod tenancy_service;
pub mod rbac_service;
pub mod employee_service;
pub mod notification_service;
pub mod asset_service;
pub mod inventory_service;
pub mod procurement_service;
pub mod maintenance_service;
pub mod audit_service;

// Relatórios
pub mod report_filter;
pub mod report_service;
pub mod document_service;
