// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use uuid::Uuid;

use crate::common::error::ApiError;

// O nome do nosso cabeçalho HTTP customizado
const COMPANY_ID_HEADER: &str = "x-company-id";

// Empresa destino escolhida pelo operador da plataforma ao criar registros.
// Opcional: funcionários de empresa nunca precisam enviá-lo.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyOverride(pub Option<Uuid>);

impl CompanyOverride {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let Some(value) = headers.get(COMPANY_ID_HEADER) else {
            return Ok(CompanyOverride(None));
        };

        let company_id = value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| ApiError {
                status: StatusCode::BAD_REQUEST,
                error: "Cabeçalho X-Company-ID inválido (não é um UUID).".to_string(),
                details: None,
            })?;

        Ok(CompanyOverride(Some(company_id)))
    }
}

impl<S> FromRequestParts<S> for CompanyOverride
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        CompanyOverride::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_is_optional() {
        assert!(CompanyOverride::from_headers(&HeaderMap::new()).unwrap().0.is_none());
    }

    #[test]
    fn malformed_header_is_bad_request() {
        let mut headers = HeaderMap::new();
        headers.insert(COMPANY_ID_HEADER, HeaderValue::from_static("loja-1"));
        let err = CompanyOverride::from_headers(&headers).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parses_uuid() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(COMPANY_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(CompanyOverride::from_headers(&headers).unwrap().0, Some(id));
    }
}
