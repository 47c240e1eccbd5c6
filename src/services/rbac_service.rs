// src/services/rbac_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    db::RbacRepository,
    models::rbac::{Permission, PermissionName, Role, RolePayload, RoleResponse},
};

/// Confere os nomes pedidos para um papel de empresa.
/// Desconhecidos e reservados à plataforma são erro de validação.
pub fn check_grantable(names: &[String]) -> Result<Vec<String>, AppError> {
    let mut accepted: Vec<String> = Vec::with_capacity(names.len());
    for raw in names {
        let name = raw.trim();
        match PermissionName::from_slug(name) {
            Some(p) if !p.is_reserved() => {
                if !accepted.iter().any(|n| n == name) {
                    accepted.push(name.to_string());
                }
            }
            Some(_) => {
                return Err(AppError::invalid("permissions", format!("Permiso reservado: {name}")));
            }
            None => {
                return Err(AppError::invalid("permissions", format!("Permiso desconocido: {name}")));
            }
        }
    }
    Ok(accepted)
}

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Alinha a tabela `permissions` com o catálogo do código (inicialização).
    pub async fn sync_catalog(&self) -> Result<(), AppError> {
        let (upserted, removed) = self.repo.sync_permissions(PermissionName::ALL).await?;
        tracing::info!(
            "🔐 Catálogo de permissões sincronizado ({} itens, {} alterados, {} removidos)",
            PermissionName::ALL.len(),
            upserted,
            removed
        );
        Ok(())
    }

    pub async fn list_system_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_permissions().await
    }

    pub async fn permission_names_for_employee(&self, employee_id: Uuid) -> Result<Vec<String>, AppError> {
        self.repo.permission_names_for_employee(employee_id).await
    }

    // ---
    // Papéis
    // ---

    pub async fn list_roles(&self, scope: &Scope) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.repo.list_roles(scope).await?;
        self.with_permissions(roles).await
    }

    pub async fn get_role(&self, scope: &Scope, id: Uuid) -> Result<RoleResponse, AppError> {
        let role = self.repo.get_role(&self.pool, scope, id).await?;
        let mut responses = self.with_permissions(vec![role]).await?;
        responses.pop().ok_or(AppError::NotFound("role"))
    }

    pub async fn create_role(&self, company_id: Uuid, payload: &RolePayload) -> Result<RoleResponse, AppError> {
        let names = check_grantable(&payload.permissions)?;

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o papel
        let role = self
            .repo
            .create_role(&mut *tx, company_id, &payload.name, payload.description.as_deref())
            .await?;

        // 3. Resolve nomes ("assets:view") para IDs e grava o vínculo
        let permissions = self.repo.find_permissions_by_names(&mut *tx, &names).await?;
        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        self.repo.replace_role_permissions(&mut *tx, role.id, &permission_ids).await?;

        tx.commit().await?;

        let mut granted: Vec<String> = permissions.into_iter().map(|p| p.name).collect();
        granted.sort();
        Ok(RoleResponse { role, permissions: granted })
    }

    pub async fn update_role(&self, scope: &Scope, id: Uuid, payload: &RolePayload) -> Result<RoleResponse, AppError> {
        let names = check_grantable(&payload.permissions)?;

        let mut tx = self.pool.begin().await?;

        let existing = self.repo.get_role(&mut *tx, scope, id).await?;
        scope.ensure_can_write(existing.company_id)?;

        let role = self
            .repo
            .update_role(&mut *tx, id, &payload.name, payload.description.as_deref())
            .await?;
        let permissions = self.repo.find_permissions_by_names(&mut *tx, &names).await?;
        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        self.repo.replace_role_permissions(&mut *tx, role.id, &permission_ids).await?;

        tx.commit().await?;

        let mut granted: Vec<String> = permissions.into_iter().map(|p| p.name).collect();
        granted.sort();
        Ok(RoleResponse { role, permissions: granted })
    }

    pub async fn delete_role(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        self.repo.delete_role(scope, id).await
    }

    async fn with_permissions(&self, roles: Vec<Role>) -> Result<Vec<RoleResponse>, AppError> {
        let ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
        let mut by_role: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (role_id, name) in self.repo.permission_names_for_roles(&ids).await? {
            by_role.entry(role_id).or_default().push(name);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let permissions = by_role.remove(&role.id).unwrap_or_default();
                RoleResponse { role, permissions }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grantable_names_are_deduplicated() {
        let names = vec!["assets:view".to_string(), " assets:view ".to_string(), "assets:manage".to_string()];
        assert_eq!(check_grantable(&names).unwrap(), vec!["assets:view", "assets:manage"]);
    }

    #[test]
    fn reserved_permissions_cannot_be_granted_to_company_roles() {
        let names = vec!["taxes:manage".to_string()];
        assert!(matches!(check_grantable(&names), Err(AppError::InvalidInput { .. })));
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let names = vec!["assets:destroy".to_string()];
        assert!(check_grantable(&names).is_err());
    }
}
