pub mod auth;
pub mod me;
pub mod rbac;
pub mod organization;
pub mod globals;
pub mod tenancy;
pub mod employees;
pub mod assets;
pub mod inventory;
pub mod procurement;
pub mod maintenance;
pub mod notifications;
pub mod audit;
pub mod reports;
pub mod analytics;
