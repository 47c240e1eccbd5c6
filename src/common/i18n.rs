// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_LANG: &str = "es";

// Catálogos de mensagens embutidos no binário.
// Cada entrada: (chave, espanhol, português, inglês)
const MESSAGES: &[(&str, &str, &str, &str)] = &[
    ("error.validation", "Uno o más campos son inválidos.", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("error.invalid_credentials", "Usuario o contraseña inválidos.", "Usuário ou senha inválidos.", "Invalid username or password."),
    ("error.invalid_token", "Token de autenticación inválido o ausente.", "Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
    ("error.forbidden", "No tienes permiso para realizar esta acción.", "Você não tem permissão para realizar esta ação.", "You are not allowed to perform this action."),
    ("error.permission_denied", "Permiso \"{permission}\" requerido.", "Permissão \"{permission}\" requerida.", "Permission \"{permission}\" required."),
    ("error.subscription_inactive", "Tu suscripción no está activa. No puedes añadir nuevos registros.", "Sua assinatura não está ativa. Não é possível adicionar novos registros.", "Your subscription is not active. New records cannot be added."),
    ("error.capacity_exceeded", "Has alcanzado el límite de {limit} {resource} para tu plan {plan}. Por favor, actualiza tu plan.", "Você atingiu o limite de {limit} {resource} do plano {plan}. Atualize seu plano.", "You have reached the limit of {limit} {resource} for your {plan} plan. Please upgrade your plan."),
    ("error.not_found", "No se encontró el recurso: {entity}.", "Recurso não encontrado: {entity}.", "Resource not found: {entity}."),
    ("error.conflict", "Ya existe un registro con esos datos.", "Já existe um registro com esses dados.", "A record with these values already exists."),
    ("error.reference_in_use", "El registro está en uso y no puede eliminarse.", "O registro está em uso e não pode ser removido.", "The record is in use and cannot be deleted."),
    ("error.internal", "Ocurrió un error inesperado.", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
    ("resource.employees", "empleados", "funcionários", "employees"),
    ("resource.assets", "activos fijos", "ativos fixos", "fixed assets"),
    ("entity.company", "empresa", "empresa", "company"),
    ("entity.user", "usuario", "usuário", "user"),
    ("entity.employee", "empleado", "funcionário", "employee"),
    ("entity.department", "departamento", "departamento", "department"),
    ("entity.job_title", "cargo", "cargo", "job title"),
    ("entity.role", "rol", "papel", "role"),
    ("entity.permission", "permiso", "permissão", "permission"),
    ("entity.location", "ubicación", "local", "location"),
    ("entity.asset_state", "estado de activo", "estado do ativo", "asset state"),
    ("entity.supplier", "proveedor", "fornecedor", "supplier"),
    ("entity.catalog_item", "ítem de catálogo", "item de catálogo", "catalog item"),
    ("entity.asset", "activo fijo", "ativo fixo", "fixed asset"),
    ("entity.budget", "presupuesto", "orçamento", "budget"),
    ("entity.budget_line", "línea de presupuesto", "linha de orçamento", "budget line"),
    ("entity.purchase_order", "orden de compra", "ordem de compra", "purchase order"),
    ("entity.purchase_order_line", "línea de orden de compra", "linha da ordem de compra", "purchase order line"),
    ("entity.stock_record", "registro de inventario", "registro de estoque", "stock record"),
    ("entity.maintenance_ticket", "mantenimiento", "manutenção", "maintenance ticket"),
    ("entity.subscription", "suscripción", "assinatura", "subscription"),
    ("entity.notification", "notificación", "notificação", "notification"),
    ("entity.currency", "divisa", "moeda", "currency"),
    ("entity.tax", "impuesto", "imposto", "tax"),
    ("notification.capacity_warning", "Estás cerca de tu límite de {resource}. Uso actual: {used} de {limit}.", "Você está perto do limite de {resource}. Uso atual: {used} de {limit}.", "You are close to your {resource} limit. Current usage: {used} of {limit}."),
    ("notification.maintenance_assigned", "Se te ha asignado una tarea de mantenimiento ({kind}) para el activo '{asset}'.", "Uma manutenção ({kind}) do ativo '{asset}' foi atribuída a você.", "A {kind} maintenance task for asset '{asset}' was assigned to you."),
];

/// Armazena os textos traduzidos, indexados por idioma e chave.
#[derive(Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        for &(key, es, pt, en) in MESSAGES {
            catalogs.entry("es").or_default().insert(key, es);
            catalogs.entry("pt").or_default().insert(key, pt);
            catalogs.entry("en").or_default().insert(key, en);
        }
        Self { catalogs: Arc::new(catalogs) }
    }

    // Idioma desconhecido cai no padrão; chave desconhecida volta a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn format(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let mut text = self.translate(lang, key);
        for (name, value) in params {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_spanish() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "entity.asset"), "activo fijo");
    }

    #[test]
    fn unknown_key_returns_key() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "nope.nothing"), "nope.nothing");
    }

    #[test]
    fn format_replaces_every_placeholder() {
        let store = I18nStore::new();
        let text = store.format(
            "en",
            "notification.capacity_warning",
            &[("resource", "fixed assets"), ("used", "46"), ("limit", "50")],
        );
        assert_eq!(text, "You are close to your fixed assets limit. Current usage: 46 of 50.");
    }
}
