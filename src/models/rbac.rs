// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Catálogo de permissões
// ---
// A lista fechada de permissões do sistema. Sincronizada com a tabela
// `permissions` na inicialização (insere, atualiza descrição, remove obsoletas).
macro_rules! permission_catalog {
    ($($variant:ident => ($slug:literal, $description:literal)),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PermissionName {
            $($variant),+
        }

        impl PermissionName {
            pub const ALL: &'static [PermissionName] = &[$(PermissionName::$variant),+];

            pub fn slug(self) -> &'static str {
                match self {
                    $(PermissionName::$variant => $slug),+
                }
            }

            pub fn description(self) -> &'static str {
                match self {
                    $(PermissionName::$variant => $description),+
                }
            }

            pub fn from_slug(slug: &str) -> Option<Self> {
                match slug {
                    $($slug => Some(PermissionName::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

permission_catalog! {
    DashboardView => ("dashboard:view", "Ver el panel principal"),

    AssetsView => ("assets:view", "Ver la lista de activos fijos"),
    AssetsManage => ("assets:manage", "Crear, editar y eliminar activos fijos"),
    RevaluationsView => ("revaluations:view", "Ver el historial de revalorizaciones"),
    RevaluationsManage => ("revaluations:manage", "Ejecutar revalorizaciones de activos"),

    BudgetsView => ("budgets:view", "Ver los presupuestos"),
    BudgetsManage => ("budgets:manage", "Crear, editar y eliminar presupuestos"),
    PurchaseOrdersView => ("purchase_orders:view", "Ver las órdenes de compra"),
    PurchaseOrdersManage => ("purchase_orders:manage", "Crear, editar y aprobar órdenes de compra"),

    InventoryView => ("inventory:view", "Ver el estado del inventario"),
    InventoryManage => ("inventory:manage", "Registrar inventario y movimientos"),
    CatalogView => ("catalog:view", "Ver el catálogo de ítems"),
    CatalogManage => ("catalog:manage", "Crear y editar ítems del catálogo"),

    MaintenanceView => ("maintenance:view", "Ver los mantenimientos"),
    MaintenanceManage => ("maintenance:manage", "Crear, editar y gestionar mantenimientos"),
    MaintenanceUpdateAssigned => ("maintenance:update_assigned", "Actualizar estado y notas de mantenimientos asignados"),

    DepartmentsView => ("departments:view", "Ver los departamentos"),
    DepartmentsManage => ("departments:manage", "Crear, editar y eliminar departamentos"),
    JobTitlesView => ("job_titles:view", "Ver los cargos"),
    JobTitlesManage => ("job_titles:manage", "Crear, editar y eliminar cargos"),
    EmployeesView => ("employees:view", "Ver los empleados"),
    EmployeesManage => ("employees:manage", "Crear, editar y eliminar empleados"),

    RolesView => ("roles:view", "Ver los roles de la empresa"),
    RolesManage => ("roles:manage", "Crear, editar y eliminar roles y asignar permisos"),
    PermissionsView => ("permissions:view", "Ver el catálogo global de permisos"),
    PermissionsManage => ("permissions:manage", "Administrar el catálogo global de permisos"),

    LocationsView => ("locations:view", "Ver las ubicaciones"),
    LocationsManage => ("locations:manage", "Crear, editar y eliminar ubicaciones"),
    SuppliersView => ("suppliers:view", "Ver los proveedores"),
    SuppliersManage => ("suppliers:manage", "Crear, editar y eliminar proveedores"),
    AssetStatesView => ("asset_states:view", "Ver los estados de activos"),
    AssetStatesManage => ("asset_states:manage", "Crear, editar y eliminar estados de activos"),
    CurrenciesView => ("currencies:view", "Ver las divisas globales"),
    CurrenciesManage => ("currencies:manage", "Crear y editar divisas globales"),
    TaxesView => ("taxes:view", "Ver los impuestos globales"),
    TaxesManage => ("taxes:manage", "Crear y editar impuestos globales"),

    ReportsView => ("reports:view", "Acceder a reportes y vistas previas"),
    ReportsExport => ("reports:export", "Exportar reportes a PDF/CSV"),
    SubscriptionView => ("subscription:view", "Ver el plan de suscripción de la empresa"),
    SubscriptionManage => ("subscription:manage", "Cambiar el plan de suscripción"),
    LogsView => ("logs:view", "Ver la bitácora de acciones"),
    SettingsManage => ("settings:manage", "Acceder a la configuración general"),
}

impl PermissionName {
    /// Permissões de escopo global: nunca concedidas a papéis de empresa.
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            PermissionName::PermissionsManage
                | PermissionName::CurrenciesManage
                | PermissionName::TaxesManage
        )
    }
}

/// Conjunto de permissões efetivas do chamador, materializado uma vez por requisição.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    platform: bool,
    names: HashSet<String>,
}

impl PermissionSet {
    pub fn platform() -> Self {
        Self { platform: true, names: HashSet::new() }
    }

    pub fn from_names<I: IntoIterator<Item = String>>(names: I) -> Self {
        Self { platform: false, names: names.into_iter().collect() }
    }

    pub fn allows(&self, permission: PermissionName) -> bool {
        self.platform || self.names.contains(permission.slug())
    }

    pub fn is_platform(&self) -> bool {
        self.platform
    }

    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().cloned().collect();
        names.sort();
        names
    }
}

// ---
// Linhas do banco
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,
    #[schema(example = "assets:manage")]
    pub name: String,
    #[schema(example = "Crear, editar y eliminar activos fijos")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Admin")]
    pub name: String,
    pub description: Option<String>,
}

// Papel + nomes de permissão
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,
    #[schema(example = json!(["assets:view", "assets:manage"]))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePayload {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio."))]
    #[schema(example = "Técnico de mantenimiento")]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    #[schema(example = json!(["maintenance:view", "maintenance:update_assigned"]))]
    pub permissions: Vec<String>,
}

// Resposta de /api/me/permissions
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyPermissions {
    pub permissions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for name in PermissionName::ALL {
            assert!(seen.insert(name.slug()), "duplicated slug {}", name.slug());
            assert_eq!(PermissionName::from_slug(name.slug()), Some(*name));
        }
    }

    #[test]
    fn permission_set_is_plain_membership() {
        let set = PermissionSet::from_names(vec!["assets:manage".to_string()]);
        assert!(set.allows(PermissionName::AssetsManage));
        assert!(!set.allows(PermissionName::AssetsView));
    }

    #[test]
    fn platform_set_allows_everything() {
        let set = PermissionSet::platform();
        assert!(PermissionName::ALL.iter().all(|p| set.allows(*p)));
    }

    #[test]
    fn only_global_permissions_are_reserved() {
        assert!(PermissionName::PermissionsManage.is_reserved());
        assert!(!PermissionName::RolesManage.is_reserved());
        assert!(!PermissionName::PermissionsView.is_reserved());
    }
}
