// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erro de domínio. Os serviços e repositórios só conhecem este tipo;
// a conversão para HTTP acontece no handler via `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo inválido '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Permissão requerida: {0}")]
    PermissionDenied(String),

    #[error("Assinatura inativa")]
    SubscriptionInactive,

    #[error("Limite de {resource} atingido ({limit}) no plano {plan}")]
    CapacityExceeded {
        resource: &'static str,
        limit: i32,
        plan: String,
    },

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Registro em uso: {0}")]
    ReferenceInUse(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden
            | AppError::PermissionDenied(_)
            | AppError::SubscriptionInactive
            | AppError::CapacityExceeded { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniqueConstraintViolation(_) | AppError::ReferenceInUse(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzindo a mensagem
    /// para o idioma pedido no `Accept-Language`.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (i18n.translate(lang, "error.validation"), Some(json!(details)))
            }
            AppError::InvalidInput { field, message } => {
                let details: HashMap<String, Vec<String>> = HashMap::from([(field, vec![message])]);
                (i18n.translate(lang, "error.validation"), Some(json!(details)))
            }
            AppError::InvalidCredentials => (i18n.translate(lang, "error.invalid_credentials"), None),
            AppError::InvalidToken => (i18n.translate(lang, "error.invalid_token"), None),
            AppError::Forbidden => (i18n.translate(lang, "error.forbidden"), None),
            AppError::PermissionDenied(perm) => (
                i18n.format(lang, "error.permission_denied", &[("permission", &perm)]),
                None,
            ),
            AppError::SubscriptionInactive => (i18n.translate(lang, "error.subscription_inactive"), None),
            AppError::CapacityExceeded { resource, limit, plan } => {
                let resource_name = i18n.translate(lang, &format!("resource.{resource}"));
                (
                    i18n.format(
                        lang,
                        "error.capacity_exceeded",
                        &[("limit", &limit.to_string()), ("resource", &resource_name), ("plan", &plan)],
                    ),
                    None,
                )
            }
            AppError::NotFound(entity) => {
                let entity_name = i18n.translate(lang, &format!("entity.{entity}"));
                (i18n.format(lang, "error.not_found", &[("entity", &entity_name)]), None)
            }
            AppError::UniqueConstraintViolation(msg) => (
                i18n.translate(lang, "error.conflict"),
                Some(json!({ "reason": msg })),
            ),
            AppError::ReferenceInUse(msg) => (
                i18n.translate(lang, "error.reference_in_use"),
                Some(json!({ "reason": msg })),
            ),
            // Erros internos: loga o detalhe e devolve mensagem genérica.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (i18n.translate(lang, "error.internal"), None)
            }
        };

        ApiError { status, error, details }
    }
}

// A resposta de erro que sai pela API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es() -> Locale {
        Locale("es".to_string())
    }

    #[test]
    fn not_found_is_404_with_localized_entity() {
        let store = I18nStore::new();
        let api = AppError::NotFound("asset").to_api_error(&es(), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(api.error.contains("activo"));
    }

    #[test]
    fn capacity_message_mentions_limit_and_plan() {
        let store = I18nStore::new();
        let api = AppError::CapacityExceeded {
            resource: "assets",
            limit: 50,
            plan: "BASIC".into(),
        }
        .to_api_error(&es(), &store);
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.error.contains("50"));
        assert!(api.error.contains("BASIC"));
    }

    #[test]
    fn invalid_input_carries_field_details() {
        let store = I18nStore::new();
        let api = AppError::invalid("value", "not a number").to_api_error(&es(), &store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["value"][0], "not a number");
    }

    #[test]
    fn internal_errors_hide_detail() {
        let store = I18nStore::new();
        let api = AppError::InternalServerError(anyhow::anyhow!("pool exploded"))
            .to_api_error(&Locale("en".into()), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("pool"));
        assert!(api.details.is_none());
    }
}
