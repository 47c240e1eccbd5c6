// src/common/scope.rs

use uuid::Uuid;

use crate::common::error::AppError;

/// Alcance de dados do chamador, resolvido uma vez por requisição.
///
/// Todo acesso a entidades de tenant recebe um `Scope`:
/// - `Platform`: operador da plataforma, enxerga todas as empresas.
/// - `Tenant`: funcionário vinculado a exatamente uma empresa.
/// - `Unlinked`: usuário autenticado sem vínculo; leituras vazias, escritas negadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Platform,
    Tenant { company_id: Uuid, employee_id: Uuid },
    Unlinked,
}

impl Scope {
    pub fn resolve(is_staff: bool, employee: Option<(Uuid, Uuid)>) -> Self {
        if is_staff {
            return Scope::Platform;
        }
        match employee {
            Some((employee_id, company_id)) => Scope::Tenant { company_id, employee_id },
            None => Scope::Unlinked,
        }
    }

    pub fn is_platform(&self) -> bool {
        matches!(self, Scope::Platform)
    }

    pub fn company_id(&self) -> Option<Uuid> {
        match self {
            Scope::Tenant { company_id, .. } => Some(*company_id),
            _ => None,
        }
    }

    pub fn employee_id(&self) -> Option<Uuid> {
        match self {
            Scope::Tenant { employee_id, .. } => Some(*employee_id),
            _ => None,
        }
    }

    /// Predicado em memória equivalente ao filtro SQL `($1 OR company_id = $2)`.
    pub fn allows(&self, company_id: Uuid) -> bool {
        match self {
            Scope::Platform => true,
            Scope::Tenant { company_id: own, .. } => *own == company_id,
            Scope::Unlinked => false,
        }
    }

    /// Empresa dona de um novo registro.
    ///
    /// Funcionários sempre gravam na própria empresa (o cabeçalho é ignorado).
    /// Operadores da plataforma precisam indicar a empresa em `x-company-id`.
    pub fn write_target(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match self {
            Scope::Tenant { company_id, .. } => Ok(*company_id),
            Scope::Platform => requested
                .ok_or_else(|| AppError::invalid("x-company-id", "Indique la empresa destino.")),
            Scope::Unlinked => Err(AppError::Forbidden),
        }
    }

    /// Exige que o chamador tenha escopo de escrita sobre uma empresa já conhecida.
    pub fn ensure_can_write(&self, company_id: Uuid) -> Result<(), AppError> {
        match self {
            Scope::Unlinked => Err(AppError::Forbidden),
            scope if scope.allows(company_id) => Ok(()),
            _ => Err(AppError::Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_flag_wins_over_employee_link() {
        let link = Some((Uuid::new_v4(), Uuid::new_v4()));
        assert_eq!(Scope::resolve(true, link), Scope::Platform);
    }

    #[test]
    fn tenant_sees_only_own_company() {
        let own = Uuid::new_v4();
        let scope = Scope::resolve(false, Some((Uuid::new_v4(), own)));
        assert!(scope.allows(own));
        assert!(!scope.allows(Uuid::new_v4()));
    }

    #[test]
    fn unlinked_fails_closed() {
        let scope = Scope::resolve(false, None);
        assert!(!scope.allows(Uuid::new_v4()));
        assert!(matches!(scope.write_target(Some(Uuid::new_v4())), Err(AppError::Forbidden)));
    }

    #[test]
    fn tenant_write_ignores_requested_company() {
        let own = Uuid::new_v4();
        let scope = Scope::resolve(false, Some((Uuid::new_v4(), own)));
        assert_eq!(scope.write_target(Some(Uuid::new_v4())).unwrap(), own);
    }

    #[test]
    fn platform_write_requires_explicit_company() {
        assert!(matches!(
            Scope::Platform.write_target(None),
            Err(AppError::InvalidInput { .. })
        ));
        let target = Uuid::new_v4();
        assert_eq!(Scope::Platform.write_target(Some(target)).unwrap(), target);
    }
}
