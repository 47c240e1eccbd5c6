// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, RbacRepository, UserRepository},
    models::{
        auth::{Claims, ProfileClaims, TokenPair, TokenType, User},
        organization::ThemeSettings,
    },
};

/// Gera o hash fora do runtime assíncrono (bcrypt é caro).
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

// Chave HS256 + validade dos dois tipos de token
#[derive(Clone)]
pub struct TokenKeys {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: String, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            secret,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        }
    }

    pub fn sign(&self, user_id: uuid::Uuid, token_type: TokenType, profile: Option<ProfileClaims>) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type,
            profile,
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    /// Decodifica e exige o tipo esperado. Qualquer falha vira `InvalidToken`.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        if data.claims.token_type != expected {
            return Err(AppError::InvalidToken);
        }
        Ok(data.claims)
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    employee_repo: EmployeeRepository,
    rbac_repo: RbacRepository,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        employee_repo: EmployeeRepository,
        rbac_repo: RbacRepository,
        keys: TokenKeys,
    ) -> Self {
        Self { user_repo, employee_repo, rbac_repo, keys }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "🔑 Login efetuado");
        self.issue_pair(&user).await
    }

    /// Troca um refresh token por um novo par (perfil recalculado).
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.keys.verify(refresh_token, TokenType::Refresh)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)?;

        self.issue_pair(&user).await
    }

    pub async fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let profile = self.build_profile(user).await?;
        Ok(TokenPair {
            access: self.keys.sign(user.id, TokenType::Access, Some(profile))?,
            refresh: self.keys.sign(user.id, TokenType::Refresh, None)?,
        })
    }

    // Dados de perfil gravados no access token no momento da emissão
    async fn build_profile(&self, user: &User) -> Result<ProfileClaims, AppError> {
        let link = self.user_repo.find_employee_link(user.id).await?;

        let (roles, theme) = match &link {
            Some(link) if !user.is_staff => (
                self.rbac_repo.role_names_for_employee(link.employee_id).await?,
                self.employee_repo.theme(link.employee_id).await?,
            ),
            _ => (Vec::new(), ThemeSettings::default()),
        };

        Ok(ProfileClaims {
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name(),
            company_id: link.as_ref().map(|l| l.company_id),
            company_name: link.as_ref().map(|l| l.company_name.clone()),
            employee_id: link.as_ref().map(|l| l.employee_id),
            roles,
            is_staff: user.is_staff,
            theme_preference: theme.theme_preference,
            theme_custom_color: theme.theme_custom_color,
            theme_glow_enabled: theme.theme_glow_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn keys() -> TokenKeys {
        TokenKeys::new("segredo-de-teste".into(), 60, 7)
    }

    #[test]
    fn access_token_round_trips() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, TokenType::Access, None).unwrap();
        let claims = keys.verify(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let keys = keys();
        let token = keys.sign(Uuid::new_v4(), TokenType::Refresh, None).unwrap();
        assert!(matches!(keys.verify(&token, TokenType::Access), Err(AppError::InvalidToken)));
        assert!(keys.verify(&token, TokenType::Refresh).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenKeys::new("outro".into(), 60, 7);
        let token = other.sign(Uuid::new_v4(), TokenType::Access, None).unwrap();
        assert!(keys().verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // validade negativa: já nasce expirado (além da tolerância padrão de 60s)
        let keys = TokenKeys::new("segredo-de-teste".into(), -5, 7);
        let token = keys.sign(Uuid::new_v4(), TokenType::Access, None).unwrap();
        assert!(keys.verify(&token, TokenType::Access).is_err());
    }
}
