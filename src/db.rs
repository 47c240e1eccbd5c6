pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod reference_repo;
pub use reference_repo::ReferenceRepository;
pub mod asset_repo;
pub use asset_repo::AssetRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod procurement_repo;
pub use procurement_repo::ProcurementRepository;
pub mod maintenance_repo;
pub use maintenance_repo::MaintenanceRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;

// Bancos secundários (pools próprios)
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod analytics_repo;
pub use analytics_repo::AnalyticsRepository;

pub mod report_repo;
pub use report_repo::ReportRepository;
