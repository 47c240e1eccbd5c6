// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::organization::ThemePreference;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    #[serde(skip_serializing)] // nunca sai na API
    pub password_hash: String,

    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "El usuario es obligatorio."))]
    #[schema(example = "admin_acme")]
    pub username: String,
    #[validate(length(min = 1, message = "La contraseña es obligatoria."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshPayload {
    #[validate(length(min = 1, message = "El token de refresco es obligatorio."))]
    pub refresh: String,
}

// Par de credenciais devolvido no login, refresh e cadastro
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

// Estrutura de dados ("claims") dentro do JWT.
// O token de refresh só carrega sub/exp/iat/token_type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub token_type: TokenType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileClaims>,
}

/// Dados de perfil capturados no momento da emissão do token de acesso.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileClaims {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub company_id: Option<Uuid>,
    pub company_name: Option<String>,
    pub employee_id: Option<Uuid>,
    pub roles: Vec<String>,
    pub is_staff: bool,
    pub theme_preference: ThemePreference,
    pub theme_custom_color: String,
    pub theme_glow_enabled: bool,
}
