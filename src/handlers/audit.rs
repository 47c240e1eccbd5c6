// src/handlers/audit.rs

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::audit::{AuditLogEntry, AuditLogFilter, CreateLogPayload, NewAuditEntry},
};

/// IP de origem: primeiro salto do `X-Forwarded-For`, senão o endereço do socket.
#[derive(Debug, Clone, Default)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string);

        ClientIp(forwarded.or_else(|| peer.map(|addr| addr.ip().to_string())))
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp::resolve(&parts.headers, peer))
    }
}

// GET /api/logs
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "Audit",
    params(AuditLogFilter),
    responses((status = 200, description = "Bitácora da empresa, mais recentes primeiro", body = Vec<AuditLogEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<AuditLogFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .audit_service
        .list(&user.scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}

// POST /api/logs
// Entradas enviadas pelo frontend; usuário, IP e empresa vêm do servidor
#[utoipa::path(
    post,
    path = "/api/logs",
    tag = "Audit",
    request_body = CreateLogPayload,
    responses((status = 201, description = "Entrada registrada", body = AuditLogEntry)),
    security(("api_jwt" = []))
)]
pub async fn create_log(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ClientIp(client_ip): ClientIp,
    Json(payload): Json<CreateLogPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let entry = app_state
        .audit_service
        .record(NewAuditEntry {
            user_id: Some(user.user.id),
            client_ip,
            action: payload.action.trim().to_string(),
            tenant_id: user.scope.company_id(),
            payload: payload.payload,
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.7:51234".parse().unwrap())
    }

    #[test]
    fn first_forwarded_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(ClientIp::resolve(&headers, peer()).0.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn falls_back_to_socket_address() {
        assert_eq!(ClientIp::resolve(&HeaderMap::new(), peer()).0.as_deref(), Some("10.0.0.7"));
        assert!(ClientIp::resolve(&HeaderMap::new(), None).0.is_none());
    }
}
