// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use uuid::Uuid;

use crate::{
    common::{
        error::{ApiError, AppError},
        scope::Scope,
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::CompanyOverride},
    models::{
        auth::{TokenType, User},
        rbac::PermissionSet,
    },
};

/// O chamador já resolvido: usuário, alcance de dados e permissões efetivas.
/// Montado uma vez por requisição pelo `auth_guard`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub scope: Scope,
    pub permissions: PermissionSet,
}

impl AuthenticatedUser {
    /// Empresa onde um novo registro será gravado.
    pub fn write_target(&self, company: &CompanyOverride) -> Result<Uuid, AppError> {
        self.scope.write_target(company.0)
    }
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| to_api(AppError::InvalidToken))?;

    // 1. Assinatura, validade e tipo do token
    let claims = app_state
        .auth_service
        .keys()
        .verify(bearer.token(), TokenType::Access)
        .map_err(to_api)?;

    // 2. O usuário precisa continuar existindo e ativo
    let user = app_state
        .user_repo
        .find_by_id(claims.sub)
        .await
        .map_err(to_api)?
        .filter(|u| u.is_active)
        .ok_or_else(|| to_api(AppError::InvalidToken))?;

    // 3. Vínculo com empresa -> escopo
    let link = app_state.user_repo.find_employee_link(user.id).await.map_err(to_api)?;
    let scope = Scope::resolve(user.is_staff, link.map(|l| (l.employee_id, l.company_id)));

    // 4. Permissões efetivas, materializadas uma única vez
    let permissions = match scope {
        Scope::Platform => PermissionSet::platform(),
        Scope::Tenant { employee_id, .. } => PermissionSet::from_names(
            app_state
                .rbac_service
                .permission_names_for_employee(employee_id)
                .await
                .map_err(to_api)?,
        ),
        Scope::Unlinked => PermissionSet::default(),
    };

    tracing::debug!(user_id = %user.id, ?scope, "Requisição autenticada");

    request.extensions_mut().insert(AuthenticatedUser {
        user,
        scope,
        permissions,
    });
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                let app_state = AppState::from_ref(state);
                Err(AppError::InvalidToken.to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store))
            }
        }
    }
}
