// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::policy::PolicyStatus,
};

// O erro de domínio. Repositórios e serviços só conhecem este tipo;
// a tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cabeçalho x-tenant-id ausente")]
    MissingTenantHeader,

    #[error("Cabeçalho x-tenant-id inválido")]
    InvalidTenantHeader,

    #[error("Usuário não pertence a esta corretora")]
    TenantAccessDenied,

    #[error("Papel insuficiente: requer {0}")]
    Forbidden(String),

    #[error("Usuário já é membro desta corretora")]
    MemberAlreadyExists,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Apólice não encontrada")]
    PolicyNotFound,

    #[error("Número de apólice já cadastrado: {0}")]
    PolicyNumberAlreadyExists(String),

    #[error("Operação não permitida para apólice com status {0:?}")]
    InvalidPolicyStatus(PolicyStatus),

    #[error("Intervalo de datas inválido")]
    InvalidDateRange,

    #[error("Segredo do cron inválido")]
    CronUnauthorized,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O que efetivamente sai para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Código estável usado como chave de tradução.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::MissingTenantHeader => "missing_tenant_header",
            AppError::InvalidTenantHeader => "invalid_tenant_header",
            AppError::TenantAccessDenied => "tenant_access_denied",
            AppError::Forbidden(_) => "forbidden_role",
            AppError::MemberAlreadyExists => "member_already_exists",
            AppError::CustomerNotFound => "customer_not_found",
            AppError::PolicyNotFound => "policy_not_found",
            AppError::PolicyNumberAlreadyExists(_) => "policy_number_exists",
            AppError::InvalidPolicyStatus(_) => "invalid_policy_status",
            AppError::InvalidDateRange => "invalid_date_range",
            AppError::CronUnauthorized => "cron_unauthorized",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingTenantHeader
            | AppError::InvalidTenantHeader
            | AppError::InvalidDateRange => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::CronUnauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AppError::TenantAccessDenied | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::CustomerNotFound | AppError::PolicyNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::EmailAlreadyExists
            | AppError::MemberAlreadyExists
            | AppError::PolicyNumberAlreadyExists(_)
            | AppError::InvalidPolicyStatus(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let error = store.message(&locale.0, self.code());

        let details = match &self {
            AppError::ValidationError(errors) => {
                // Campo -> lista de códigos ("required", "invalid_email", ...)
                let mut fields: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    fields.insert(field.to_string(), codes);
                }
                Some(json!(fields))
            }
            AppError::Forbidden(required) => Some(json!({ "requiredRoles": required })),
            AppError::PolicyNumberAlreadyExists(number) => Some(json!({ "policyNumber": number })),
            AppError::InvalidPolicyStatus(current) => Some(json!({ "currentStatus": current })),
            _ => None,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe fica só no log, nunca na resposta.
            tracing::error!(error = %self, "Erro Interno do Servidor");
        }

        ApiError { status, error, details }
    }
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

// Para rejeições de extratores que não têm acesso ao idioma (ex: middlewares)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::builtin()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(AppError::CustomerNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PolicyNotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let err = AppError::InternalServerError(anyhow::anyhow!("pool exhausted"));
        let api = err.to_api_error(&Locale("en".into()), I18nStore::builtin());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("pool"));
        assert!(api.details.is_none());
    }

    #[test]
    fn invalid_policy_status_reports_current_status() {
        let api = AppError::InvalidPolicyStatus(PolicyStatus::Cancelled)
            .to_api_error(&Locale("pt".into()), I18nStore::builtin());

        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.details, Some(json!({ "currentStatus": "CANCELLED" })));
    }
}
