// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::common::error::AppError;

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// A corretora que o usuário quer acessar nesta requisição.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl TenantContext {
    fn parse(value: Option<&str>) -> Result<Self, AppError> {
        let raw = value.ok_or(AppError::MissingTenantHeader)?;
        Uuid::parse_str(raw.trim())
            .map(TenantContext)
            .map_err(|_| AppError::InvalidTenantHeader)
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Depois do tenant_guard o contexto já está validado nas extensions
        if let Some(ctx) = parts.extensions.get::<TenantContext>() {
            return Ok(*ctx);
        }

        let header = match parts.headers.get(TENANT_ID_HEADER) {
            Some(value) => Some(value.to_str().map_err(|_| AppError::InvalidTenantHeader)?),
            None => None,
        };

        TenantContext::parse(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_rejected() {
        assert!(matches!(TenantContext::parse(None), Err(AppError::MissingTenantHeader)));
    }

    #[test]
    fn malformed_uuid_is_rejected() {
        assert!(matches!(
            TenantContext::parse(Some("loja-1")),
            Err(AppError::InvalidTenantHeader)
        ));
    }

    #[test]
    fn valid_uuid_is_accepted() {
        let id = Uuid::new_v4();
        let ctx = TenantContext::parse(Some(&id.to_string())).unwrap();
        assert_eq!(ctx.0, id);
    }
}
