// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, Method},
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::PermissionName,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    const PERMISSION: PermissionName;
    /// Quando verdadeiro a permissão é exigida também em GET/HEAD/OPTIONS.
    const ENFORCE_ON_READ: bool = false;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Métodos seguros só exigem autenticação; os demais exigem a permissão.
pub fn check_permission<T: PermissionDef>(user: &AuthenticatedUser, method: &Method) -> Result<(), AppError> {
    if is_safe(method) && !T::ENFORCE_ON_READ {
        return Ok(());
    }
    if user.permissions.allows(T::PERMISSION) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(T::PERMISSION.slug().to_string()))
    }
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        // A. Extrai Usuário (colocado pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Verifica contra o conjunto já materializado
        check_permission::<T>(user, &parts.method).map_err(|e| {
            tracing::debug!(user_id = %user.user.id, permission = T::PERMISSION.slug(), "Permissão negada");
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission_markers {
    ($($marker:ident => $name:ident $(, read = $read:literal)?;)+) => {
        $(
            pub struct $marker;
            impl PermissionDef for $marker {
                const PERMISSION: PermissionName = PermissionName::$name;
                $(const ENFORCE_ON_READ: bool = $read;)?
            }
        )+
    };
}

permission_markers! {
    PermAssetsManage => AssetsManage;
    PermRevaluationsManage => RevaluationsManage;
    PermBudgetsManage => BudgetsManage;
    PermPurchaseOrdersManage => PurchaseOrdersManage;
    PermInventoryManage => InventoryManage;
    PermCatalogManage => CatalogManage;
    PermMaintenanceManage => MaintenanceManage;
    PermMaintenanceUpdateAssigned => MaintenanceUpdateAssigned;
    PermDepartmentsManage => DepartmentsManage;
    PermJobTitlesManage => JobTitlesManage;
    PermEmployeesManage => EmployeesManage;
    PermRolesManage => RolesManage;
    PermLocationsManage => LocationsManage;
    PermSuppliersManage => SuppliersManage;
    PermAssetStatesManage => AssetStatesManage;
    PermCurrenciesManage => CurrenciesManage;
    PermTaxesManage => TaxesManage;
    PermReportsView => ReportsView;
    PermReportsExport => ReportsExport, read = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::scope::Scope, models::auth::User, models::rbac::PermissionSet};
    use chrono::Utc;
    use uuid::Uuid;

    fn caller(permissions: PermissionSet) -> AuthenticatedUser {
        AuthenticatedUser {
            user: User {
                id: Uuid::new_v4(),
                username: "ana".into(),
                email: "ana@example.com".into(),
                password_hash: String::new(),
                first_name: "Ana".into(),
                last_name: "Rojas".into(),
                is_staff: false,
                is_active: true,
                created_at: Utc::now(),
            },
            scope: Scope::Tenant { company_id: Uuid::new_v4(), employee_id: Uuid::new_v4() },
            permissions,
        }
    }

    #[test]
    fn reads_need_only_authentication() {
        let user = caller(PermissionSet::default());
        assert!(check_permission::<PermAssetsManage>(&user, &Method::GET).is_ok());
        assert!(check_permission::<PermAssetsManage>(&user, &Method::OPTIONS).is_ok());
    }

    #[test]
    fn writes_need_the_declared_permission() {
        let user = caller(PermissionSet::from_names(["assets:manage".to_string()]));
        assert!(check_permission::<PermAssetsManage>(&user, &Method::POST).is_ok());
        assert!(matches!(
            check_permission::<PermBudgetsManage>(&user, &Method::DELETE),
            Err(AppError::PermissionDenied(p)) if p == "budgets:manage"
        ));
    }

    #[test]
    fn export_is_enforced_even_on_get() {
        let user = caller(PermissionSet::default());
        assert!(check_permission::<PermReportsExport>(&user, &Method::GET).is_err());
        assert!(check_permission::<PermReportsExport>(&caller(PermissionSet::platform()), &Method::GET).is_ok());
    }
}
