// src/services/tenancy_service.rs

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    db::{employee_repo::EmployeeFields, EmployeeRepository, RbacRepository, TenantRepository, UserRepository},
    models::{
        auth::User,
        rbac::PermissionName,
        tenancy::{
            Currency, CurrencyPayload, LimitKind, RegisterCompanyPayload, Subscription, SubscriptionStatus, Tax,
            TaxPayload, PLAN_VALIDITY_DAYS, UNLIMITED_SENTINEL,
        },
    },
    services::{auth::hash_password, notification_service::CapacityWarning},
};

const ADMIN_ROLE_NAME: &str = "Admin";

/// Decide se mais uma entidade cabe no plano.
///
/// `count` é o total atual (antes da criação). Retorna o aviso a emitir
/// quando a criação ultrapassa 90% do limite; planos "ilimitados" nunca avisam.
pub fn evaluate_capacity(
    subscription: &Subscription,
    kind: LimitKind,
    count: i64,
) -> Result<Option<CapacityWarning>, AppError> {
    if subscription.status != SubscriptionStatus::Active {
        return Err(AppError::SubscriptionInactive);
    }

    let cap = kind.cap(subscription);
    if count >= i64::from(cap) {
        return Err(AppError::CapacityExceeded {
            resource: kind.key(),
            limit: cap,
            plan: subscription.plan.label().to_string(),
        });
    }

    let used = count + 1;
    let crosses_threshold = used * 10 > i64::from(cap) * 9;
    if crosses_threshold && cap < UNLIMITED_SENTINEL {
        return Ok(Some(CapacityWarning {
            company_id: subscription.company_id,
            kind,
            used,
            limit: cap,
        }));
    }
    Ok(None)
}

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    employee_repo: EmployeeRepository,
    rbac_repo: RbacRepository,
    pool: PgPool,
}

impl TenantService {
    pub fn new(
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        employee_repo: EmployeeRepository,
        rbac_repo: RbacRepository,
        pool: PgPool,
    ) -> Self {
        Self { tenant_repo, user_repo, employee_repo, rbac_repo, pool }
    }

    /// Trava a assinatura da empresa e aplica o limite do plano.
    /// Deve rodar na mesma transação que insere a entidade.
    pub async fn reserve_capacity(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        kind: LimitKind,
    ) -> Result<Option<CapacityWarning>, AppError> {
        let subscription = self
            .tenant_repo
            .lock_subscription(&mut *conn, company_id)
            .await?
            .ok_or(AppError::SubscriptionInactive)?;

        let count = self.tenant_repo.count_for_limit(&mut *conn, company_id, kind).await?;
        evaluate_capacity(&subscription, kind, count)
    }

    /// Cadastro público de uma nova empresa com o seu administrador.
    /// Tudo ou nada: empresa, usuário, funcionário, assinatura, papel Admin e vínculo.
    pub async fn register_company(&self, p: &RegisterCompanyPayload) -> Result<User, AppError> {
        // Duplicidades antes de qualquer escrita
        let (name_taken, tax_id_taken) = self
            .tenant_repo
            .company_duplicates(&self.pool, &p.company_name, &p.company_tax_id)
            .await?;
        if name_taken {
            return Err(AppError::invalid("companyName", "Ya existe una empresa con este nombre."));
        }
        if tax_id_taken {
            return Err(AppError::invalid("companyTaxId", "Ya existe una empresa con este NIT."));
        }
        if self.user_repo.username_exists(&self.pool, p.admin_username.trim()).await? {
            return Err(AppError::invalid("adminUsername", "Este nombre de usuario ya está en uso."));
        }

        let hashed_password = hash_password(&p.admin_password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let company = self
            .tenant_repo
            .create_company(
                &mut *tx,
                &p.company_name,
                &p.company_tax_id,
                p.company_address.as_deref(),
                p.company_phone.as_deref(),
                p.company_email.as_deref(),
            )
            .await?;

        let last_name = match p.admin_maternal_surname.as_deref() {
            Some(maternal) => format!("{} {}", p.admin_paternal_surname.trim(), maternal.trim()),
            None => p.admin_paternal_surname.trim().to_string(),
        };
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                &p.admin_username,
                &p.admin_email,
                p.admin_first_name.trim(),
                &last_name,
                &hashed_password,
            )
            .await?;

        let employee = self
            .employee_repo
            .create(
                &mut *tx,
                company.id,
                user.id,
                &EmployeeFields {
                    national_id: &p.admin_national_id,
                    first_name: &p.admin_first_name,
                    paternal_surname: &p.admin_paternal_surname,
                    maternal_surname: p.admin_maternal_surname.as_deref(),
                    address: None,
                    phone: None,
                    salary: Decimal::ZERO,
                    job_title_id: None,
                    department_id: None,
                },
            )
            .await?;

        let today = Utc::now().date_naive();
        self.tenant_repo
            .create_subscription(&mut *tx, company.id, p.plan, today, today + Duration::days(PLAN_VALIDITY_DAYS))
            .await?;

        // Papel Admin: todas as permissões, exceto as reservadas à plataforma
        let admin_role = self
            .rbac_repo
            .create_role(&mut *tx, company.id, ADMIN_ROLE_NAME, Some("Acceso total a la empresa"))
            .await?;
        let grantable: Vec<String> = PermissionName::ALL
            .iter()
            .filter(|p| !p.is_reserved())
            .map(|p| p.slug().to_string())
            .collect();
        let permissions = self.rbac_repo.find_permissions_by_names(&mut *tx, &grantable).await?;
        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        self.rbac_repo.replace_role_permissions(&mut *tx, admin_role.id, &permission_ids).await?;
        self.rbac_repo.replace_employee_roles(&mut *tx, employee.id, &[admin_role.id]).await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(company_id = %company.id, plan = ?p.plan, "🏢 Nova empresa registrada");
        Ok(user)
    }

    pub async fn list_subscriptions(&self, scope: &Scope) -> Result<Vec<Subscription>, AppError> {
        self.tenant_repo.list_subscriptions(scope).await
    }

    // ---
    // Globais
    // ---

    pub async fn list_currencies(&self) -> Result<Vec<Currency>, AppError> {
        self.tenant_repo.list_currencies().await
    }

    pub async fn create_currency(&self, payload: &CurrencyPayload) -> Result<Currency, AppError> {
        self.tenant_repo.create_currency(payload).await
    }

    pub async fn list_taxes(&self) -> Result<Vec<Tax>, AppError> {
        self.tenant_repo.list_taxes().await
    }

    pub async fn create_tax(&self, payload: &TaxPayload) -> Result<Tax, AppError> {
        if payload.rate.is_sign_negative() {
            return Err(AppError::invalid("rate", "La tasa no puede ser negativa."));
        }
        self.tenant_repo.create_tax(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::test_support, models::tenancy::SubscriptionPlan};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn subscription(plan: SubscriptionPlan, status: SubscriptionStatus) -> Subscription {
        let (max_users, max_assets) = plan.limits();
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        Subscription {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            plan,
            status,
            starts_on: day,
            ends_on: day,
            max_users,
            max_assets,
        }
    }

    #[test]
    fn last_slot_is_accepted_and_next_is_rejected() {
        let sub = subscription(SubscriptionPlan::Basic, SubscriptionStatus::Active);
        assert!(evaluate_capacity(&sub, LimitKind::Assets, 49).is_ok());
        assert!(matches!(
            evaluate_capacity(&sub, LimitKind::Assets, 50),
            Err(AppError::CapacityExceeded { limit: 50, .. })
        ));
    }

    #[test]
    fn inactive_subscription_blocks_creation() {
        let sub = subscription(SubscriptionPlan::Enterprise, SubscriptionStatus::Expired);
        assert!(matches!(
            evaluate_capacity(&sub, LimitKind::Employees, 0),
            Err(AppError::SubscriptionInactive)
        ));
    }

    #[test]
    fn warning_starts_above_ninety_percent() {
        let sub = subscription(SubscriptionPlan::Basic, SubscriptionStatus::Active);
        // 45/50 = 90% exato: sem aviso; 46/50: aviso
        assert_eq!(evaluate_capacity(&sub, LimitKind::Assets, 44).unwrap(), None);
        let warning = evaluate_capacity(&sub, LimitKind::Assets, 45).unwrap().unwrap();
        assert_eq!(warning.used, 46);
        assert_eq!(warning.limit, 50);
    }

    #[test]
    fn unlimited_plan_never_warns() {
        let sub = subscription(SubscriptionPlan::Enterprise, SubscriptionStatus::Active);
        assert_eq!(evaluate_capacity(&sub, LimitKind::Employees, 9997).unwrap(), None);
    }

    proptest! {
        #[test]
        fn never_admits_beyond_cap(count in 0i64..300) {
            let sub = subscription(SubscriptionPlan::Professional, SubscriptionStatus::Active);
            let result = evaluate_capacity(&sub, LimitKind::Assets, count);
            prop_assert_eq!(result.is_ok(), count < 200);
        }
    }

    fn registration(company: &str, tax_id: &str, username: &str) -> RegisterCompanyPayload {
        RegisterCompanyPayload {
            company_name: company.to_string(),
            company_tax_id: tax_id.to_string(),
            company_address: None,
            company_phone: None,
            company_email: None,
            admin_username: username.to_string(),
            admin_email: format!("{username}@example.com"),
            admin_password: "clave-segura-123".to_string(),
            admin_first_name: "Ana".to_string(),
            admin_paternal_surname: "Rojas".to_string(),
            admin_maternal_surname: None,
            admin_national_id: "4455667".to_string(),
            plan: SubscriptionPlan::Basic,
        }
    }

    async fn total(pool: &PgPool, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_company_name_in_any_case_writes_nothing(pool: PgPool) {
        let app = test_support::app_state(pool.clone());
        let admin = app
            .tenant_service
            .register_company(&registration("Acme Ltda", "1001", "admin_acme"))
            .await
            .unwrap();

        let subscriptions = app.tenant_service.list_subscriptions(&Scope::Platform).await.unwrap();
        assert_eq!(subscriptions.len(), 1);
        assert_eq!((subscriptions[0].max_users, subscriptions[0].max_assets), (5, 50));
        assert!(app.user_repo.find_employee_link(admin.id).await.unwrap().is_some());

        let before = [total(&pool, "companies").await, total(&pool, "users").await, total(&pool, "employees").await];
        let err = app
            .tenant_service
            .register_company(&registration("ACME LTDA", "2002", "otro_admin"))
            .await
            .unwrap_err();
        let after = [total(&pool, "companies").await, total(&pool, "users").await, total(&pool, "employees").await];

        assert!(matches!(err, AppError::InvalidInput { ref field, .. } if field == "companyName"));
        assert_eq!(before, after);
    }
}
