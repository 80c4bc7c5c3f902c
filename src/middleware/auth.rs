// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::auth::User,
};

/// Nome do cookie HTTP-only onde o login grava o JWT.
pub const AUTH_COOKIE: &str = "token";

// Bearer tem prioridade; sem ele, tenta o cookie
fn extract_token(request: &Request, jar: &CookieJar) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .or_else(|| jar.get(AUTH_COOKIE).map(|c| c.value().to_string()))
        .filter(|token| !token.is_empty())
}

// Só autenticação: rotas que não dependem de corretora (/me, /tenants)
pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request, &jar).ok_or(AppError::InvalidToken)?;
    let user = app_state.auth_service.validate_token(&token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Autenticação + x-tenant-id + vínculo ativo. Deixa o TenantMember nas extensions.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request, &jar).ok_or(AppError::InvalidToken)?;
    let user = app_state.auth_service.validate_token(&token).await?;

    let (mut parts, body) = request.into_parts();
    let tenant = TenantContext::from_request_parts(&mut parts, &app_state).await?;

    let member = app_state
        .tenant_service
        .find_active_membership(user.id, tenant.0)
        .await?
        .ok_or(AppError::TenantAccessDenied)?;

    tracing::debug!(user_id = %user.id, tenant_id = %tenant.0, role = ?member.role, "Acesso à corretora liberado");

    parts.extensions.insert(user);
    parts.extensions.insert(member);
    parts.extensions.insert(tenant);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}
