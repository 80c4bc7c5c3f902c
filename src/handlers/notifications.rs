// src/handlers/notifications.rs

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, Reviewer},
        tenancy::TenantContext,
    },
    models::notification::{SweepTally, WhatsAppLog},
};

const DEFAULT_LOG_LIMIT: i64 = 50;
const MAX_LOG_LIMIT: i64 = 500;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    /// Quantidade de linhas (padrão 50, máximo 500)
    pub limit: Option<i64>,
}

// O agendador externo manda `Authorization: Bearer <CRON_SECRET>`
fn cron_authorized(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| {
            !secret.is_empty() && constant_time_eq(token.trim().as_bytes(), secret.as_bytes())
        })
}

// Comparação em tempo constante (o tempo não revela quantos bytes batem)
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// POST /api/cron/reminders
#[utoipa::path(
    post,
    path = "/api/cron/reminders",
    tag = "Notifications",
    responses(
        (status = 200, description = "Varredura executada", body = SweepTally),
        (status = 401, description = "Segredo do cron inválido")
    ),
    security(("cron_secret" = []))
)]
pub async fn run_reminders(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if !cron_authorized(&headers, &app_state.config.cron_secret) {
        tracing::warn!("Chamada ao cron com segredo inválido");
        return Err(AppError::CronUnauthorized.to_api_error(&locale, &app_state.i18n_store));
    }

    // Roda em task própria: se o agendador desistir da requisição, a varredura vai até o fim
    let reminder_service = app_state.reminder_service.clone();
    let tally = tokio::spawn(async move { reminder_service.run_sweep(Utc::now()).await })
        .await
        .map_err(|e| AppError::from(anyhow::anyhow!("Falha na task da varredura: {}", e)))
        .and_then(|result| result)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tally))
}

// GET /api/notifications/logs
#[utoipa::path(
    get,
    path = "/api/notifications/logs",
    tag = "Notifications",
    responses((status = 200, description = "Últimos envios de WhatsApp", body = Vec<WhatsAppLog>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        LogQuery
    ),
    security(("api_jwt" = []))
)]
pub async fn list_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<Reviewer>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);

    let logs = app_state
        .notification_repo
        .list_logs(tenant.0, limit)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(logs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn accepts_the_configured_secret() {
        assert!(cron_authorized(&headers_with("Bearer s3cret"), "s3cret"));
    }

    #[test]
    fn rejects_wrong_or_missing_secret() {
        assert!(!cron_authorized(&headers_with("Bearer nope"), "s3cret"));
        assert!(!cron_authorized(&headers_with("s3cret"), "s3cret"));
        assert!(!cron_authorized(&HeaderMap::new(), "s3cret"));
    }

    #[test]
    fn rejects_prefix_and_same_length_mismatch() {
        assert!(!cron_authorized(&headers_with("Bearer s3cre"), "s3cret"));
        assert!(!cron_authorized(&headers_with("Bearer s3creT"), "s3cret"));
        assert!(!cron_authorized(&headers_with("Bearer "), ""));
    }

    #[test]
    fn constant_time_eq_matches_plain_equality() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
