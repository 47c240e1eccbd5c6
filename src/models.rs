pub mod analytics;
pub mod assets;
pub mod audit;
pub mod auth;
pub mod inventory;
pub mod maintenance;
pub mod notifications;
pub mod organization;
pub mod procurement;
pub mod rbac;
pub mod reports;
pub mod tenancy;
