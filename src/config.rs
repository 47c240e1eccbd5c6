// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        AnalyticsRepository, AssetRepository, AuditRepository, EmployeeRepository, InventoryRepository,
        MaintenanceRepository, NotificationRepository, ProcurementRepository, RbacRepository, ReportRepository,
        TenantRepository, UserRepository,
    },
    services::{
        asset_service::AssetService,
        audit_service::AuditService,
        auth::{AuthService, TokenKeys},
        document_service::DocumentService,
        employee_service::EmployeeService,
        inventory_service::InventoryService,
        maintenance_service::MaintenanceService,
        notification_service::NotificationService,
        procurement_service::ProcurementService,
        rbac_service::RbacService,
        report_service::ReportService,
        tenancy_service::TenantService,
    },
};

/// Configuração lida do ambiente (e do `.env`, quando existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub audit_database_url: String,
    pub analytics_database_url: String,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub report_fonts_dir: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} deve ser definida"));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = required("DATABASE_URL")?;
        let audit_database_url = lookup("AUDIT_DATABASE_URL").unwrap_or_else(|| database_url.clone());
        let analytics_database_url = lookup("ANALYTICS_DATABASE_URL").unwrap_or_else(|| database_url.clone());

        Ok(Self {
            jwt_secret: required("JWT_SECRET")?,
            access_token_minutes: or_default("ACCESS_TOKEN_MINUTES", "60")
                .parse()
                .context("ACCESS_TOKEN_MINUTES inválido")?,
            refresh_token_days: or_default("REFRESH_TOKEN_DAYS", "7")
                .parse()
                .context("REFRESH_TOKEN_DAYS inválido")?,
            db_max_connections: or_default("DB_MAX_CONNECTIONS", "5")
                .parse()
                .context("DB_MAX_CONNECTIONS inválido")?,
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:3000"),
            report_fonts_dir: or_default("REPORT_FONTS_DIR", "./fonts"),
            database_url,
            audit_database_url,
            analytics_database_url,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,

    // Três bancos: principal, auditoria e analytics
    pub db_pool: PgPool,
    pub audit_pool: PgPool,
    pub analytics_pool: PgPool,

    pub i18n_store: I18nStore,

    pub user_repo: UserRepository,
    pub analytics_repo: AnalyticsRepository,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub rbac_service: RbacService,
    pub employee_service: EmployeeService,
    pub notification_service: NotificationService,
    pub asset_service: AssetService,
    pub inventory_service: InventoryService,
    pub procurement_service: ProcurementService,
    pub maintenance_service: MaintenanceService,
    pub audit_service: AuditService,
    pub report_service: ReportService,
}

async fn connect(url: &str, max_connections: u32, label: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(url)
        .await
        .with_context(|| format!("Falha ao conectar no banco {label}"))?;

    tracing::info!("✅ Conexão com o banco {} estabelecida com sucesso!", label);
    Ok(pool)
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        let db_pool = connect(&settings.database_url, settings.db_max_connections, "principal").await?;
        let audit_pool = connect(&settings.audit_database_url, settings.db_max_connections, "de auditoria").await?;
        let analytics_pool =
            connect(&settings.analytics_database_url, settings.db_max_connections, "de analytics").await?;

        Ok(Self::assemble(settings, db_pool, audit_pool, analytics_pool))
    }

    // --- Monta o gráfico de dependências ---
    pub(crate) fn assemble(settings: Settings, db_pool: PgPool, audit_pool: PgPool, analytics_pool: PgPool) -> Self {
        let i18n_store = I18nStore::new();

        let user_repo = UserRepository::new(db_pool.clone());
        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(audit_pool.clone());

        let keys = TokenKeys::new(
            settings.jwt_secret.clone(),
            settings.access_token_minutes,
            settings.refresh_token_days,
        );
        let auth_service = AuthService::new(user_repo.clone(), employee_repo.clone(), rbac_repo.clone(), keys);

        let tenant_service = TenantService::new(
            tenant_repo,
            user_repo.clone(),
            employee_repo.clone(),
            rbac_repo.clone(),
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo.clone(), db_pool.clone());
        let notification_service = NotificationService::new(
            NotificationRepository::new(db_pool.clone()),
            rbac_repo.clone(),
            i18n_store.clone(),
        );
        let employee_service = EmployeeService::new(
            employee_repo,
            user_repo.clone(),
            rbac_repo,
            tenant_service.clone(),
            notification_service.clone(),
            db_pool.clone(),
        );
        let asset_service = AssetService::new(
            AssetRepository::new(db_pool.clone()),
            tenant_service.clone(),
            notification_service.clone(),
            db_pool.clone(),
        );
        let inventory_service = InventoryService::new(InventoryRepository::new(db_pool.clone()), db_pool.clone());
        let procurement_service = ProcurementService::new(ProcurementRepository::new(db_pool.clone()), db_pool.clone());

        // A auditoria grava no próprio banco; as referências são validadas no principal
        let audit_service = AuditService::new(Arc::new(audit_repo.clone()), audit_repo, user_repo.clone());
        let maintenance_service = MaintenanceService::new(
            MaintenanceRepository::new(db_pool.clone()),
            notification_service.clone(),
            audit_service.clone(),
            db_pool.clone(),
        );
        let report_service = ReportService::new(
            ReportRepository::new(db_pool.clone()),
            DocumentService::new(settings.report_fonts_dir.clone()),
        );

        Self {
            settings: Arc::new(settings),
            analytics_repo: AnalyticsRepository::new(analytics_pool.clone()),
            db_pool,
            audit_pool,
            analytics_pool,
            i18n_store,
            user_repo,
            auth_service,
            tenant_service,
            rbac_service,
            employee_service,
            notification_service,
            asset_service,
            inventory_service,
            procurement_service,
            maintenance_service,
            audit_service,
            report_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn secondary_stores_default_to_main_database() {
        let settings =
            Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://main"), ("JWT_SECRET", "s")])).unwrap();
        assert_eq!(settings.audit_database_url, "postgres://main");
        assert_eq!(settings.analytics_database_url, "postgres://main");
        assert_eq!(settings.access_token_minutes, 60);
        assert_eq!(settings.refresh_token_days, 7);
        assert_eq!(settings.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://main")])).is_err());
    }

    #[test]
    fn malformed_number_is_an_error() {
        let result = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://main"),
            ("JWT_SECRET", "s"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]));
        assert!(result.is_err());
    }
}
