// src/services/employee_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_owned, OwnedTable},
        error::AppError,
        scope::Scope,
    },
    db::{employee_repo::EmployeeFields, EmployeeRepository, RbacRepository, UserRepository},
    models::{
        organization::{
            CreateEmployeePayload, Employee, EmployeeDetail, EmployeeFilter, ThemeSettings, ThemeUpdate,
            UpdateEmployeePayload,
        },
        tenancy::LimitKind,
    },
    services::{auth::hash_password, notification_service::NotificationService, tenancy_service::TenantService},
};

fn last_name(paternal: &str, maternal: Option<&str>) -> String {
    match maternal.map(str::trim).filter(|m| !m.is_empty()) {
        Some(maternal) => format!("{} {}", paternal.trim(), maternal),
        None => paternal.trim().to_string(),
    }
}

#[derive(Clone)]
pub struct EmployeeService {
    repo: EmployeeRepository,
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    tenant_service: TenantService,
    notifications: NotificationService,
    pool: PgPool,
}

impl EmployeeService {
    pub fn new(
        repo: EmployeeRepository,
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        tenant_service: TenantService,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self { repo, user_repo, rbac_repo, tenant_service, notifications, pool }
    }

    /// Cria login + ficha + papéis numa transação, respeitando o limite de usuários.
    pub async fn create(
        &self,
        company_id: Uuid,
        actor_user_id: Uuid,
        p: &CreateEmployeePayload,
    ) -> Result<EmployeeDetail, AppError> {
        let username = p.username.trim();
        if self.user_repo.username_exists(&self.pool, username).await? {
            return Err(AppError::invalid("username", "Este nombre de usuario ya está en uso."));
        }
        let hashed_password = hash_password(&p.password).await?;

        let mut tx = self.pool.begin().await?;

        let warning = self
            .tenant_service
            .reserve_capacity(&mut *tx, company_id, LimitKind::Employees)
            .await?;

        Self::check_refs(&mut *tx, company_id, p.department_id, p.job_title_id).await?;

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                username,
                &p.email,
                p.first_name.trim(),
                &last_name(&p.paternal_surname, p.maternal_surname.as_deref()),
                &hashed_password,
            )
            .await?;

        let employee = self
            .repo
            .create(
                &mut *tx,
                company_id,
                user.id,
                &EmployeeFields {
                    national_id: p.national_id.trim(),
                    first_name: p.first_name.trim(),
                    paternal_surname: p.paternal_surname.trim(),
                    maternal_surname: p.maternal_surname.as_deref(),
                    address: p.address.as_deref(),
                    phone: p.phone.as_deref(),
                    salary: p.salary,
                    job_title_id: p.job_title_id,
                    department_id: p.department_id,
                },
            )
            .await?;

        self.assign_roles(&mut *tx, company_id, employee.id, &p.role_ids).await?;

        tx.commit().await?;

        tracing::info!(employee_id = %employee.id, %company_id, "👤 Funcionário criado");
        if let Some(warning) = warning {
            self.notifications.deliver_capacity_warning(&warning, actor_user_id).await;
        }

        Ok(EmployeeDetail {
            employee,
            username: user.username,
            email: user.email,
            role_ids: p.role_ids.clone(),
        })
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, p: &UpdateEmployeePayload) -> Result<EmployeeDetail, AppError> {
        let hashed_password = match &p.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let current = self.repo.find(&mut *tx, scope, id).await?;
        scope.ensure_can_write(current.company_id)?;
        Self::check_refs(&mut *tx, current.company_id, p.department_id, p.job_title_id).await?;

        let employee = self
            .repo
            .update(
                &mut *tx,
                id,
                &EmployeeFields {
                    national_id: p.national_id.trim(),
                    first_name: p.first_name.trim(),
                    paternal_surname: p.paternal_surname.trim(),
                    maternal_surname: p.maternal_surname.as_deref(),
                    address: p.address.as_deref(),
                    phone: p.phone.as_deref(),
                    salary: p.salary,
                    job_title_id: p.job_title_id,
                    department_id: p.department_id,
                },
            )
            .await?;

        self.user_repo
            .update_credentials(
                &mut *tx,
                employee.user_id,
                p.email.as_deref(),
                p.first_name.trim(),
                &last_name(&p.paternal_surname, p.maternal_surname.as_deref()),
                hashed_password.as_deref(),
            )
            .await?;

        if let Some(role_ids) = &p.role_ids {
            self.assign_roles(&mut *tx, employee.company_id, employee.id, role_ids).await?;
        }

        tx.commit().await?;

        self.detail_of(employee).await
    }

    pub async fn list(&self, scope: &Scope, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        self.repo.list(scope, filter).await
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<EmployeeDetail, AppError> {
        let employee = self.repo.find(&self.pool, scope, id).await?;
        self.detail_of(employee).await
    }

    /// Remove a ficha; o login continua existindo, agora sem vínculo.
    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(scope, id).await
    }

    // ---
    // Tema do próprio usuário
    // ---

    pub async fn theme(&self, scope: &Scope) -> Result<ThemeSettings, AppError> {
        match scope.employee_id() {
            Some(employee_id) => self.repo.theme(employee_id).await,
            None => Ok(ThemeSettings::default()),
        }
    }

    pub async fn update_theme(&self, scope: &Scope, update: &ThemeUpdate) -> Result<ThemeSettings, AppError> {
        let employee_id = scope.employee_id().ok_or(AppError::Forbidden)?;
        self.repo.update_theme(employee_id, update).await
    }

    async fn detail_of(&self, employee: Employee) -> Result<EmployeeDetail, AppError> {
        let (username, email) = self.repo.login_of(employee.user_id).await?;
        let role_ids = self.repo.role_ids(employee.id).await?;
        Ok(EmployeeDetail { employee, username, email, role_ids })
    }

    async fn check_refs(
        conn: &mut PgConnection,
        company_id: Uuid,
        department_id: Option<Uuid>,
        job_title_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(id) = department_id {
            ensure_owned(&mut *conn, OwnedTable::Department, id, company_id, "departmentId").await?;
        }
        if let Some(id) = job_title_id {
            ensure_owned(&mut *conn, OwnedTable::JobTitle, id, company_id, "jobTitleId").await?;
        }
        Ok(())
    }

    // Todos os papéis precisam ser da mesma empresa do funcionário
    async fn assign_roles(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        employee_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let mut unique: Vec<Uuid> = role_ids.to_vec();
        unique.sort();
        unique.dedup();

        let owned = self.rbac_repo.count_company_roles(&mut *conn, company_id, &unique).await?;
        if owned != unique.len() as i64 {
            return Err(AppError::invalid("roleIds", "Rol inválido para esta empresa."));
        }
        self.rbac_repo.replace_employee_roles(&mut *conn, employee_id, &unique).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_name_joins_both_surnames() {
        assert_eq!(last_name("Pérez ", Some(" Gómez")), "Pérez Gómez");
        assert_eq!(last_name("Pérez", None), "Pérez");
        assert_eq!(last_name("Pérez", Some("  ")), "Pérez");
    }
}
