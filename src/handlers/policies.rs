// src/handlers/policies.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AnyMember, RequireRole, Writer},
        tenancy::TenantContext,
    },
    models::policy::{
        CreatePolicyPayload, Policy, PolicyStatus, PolicyWithCustomer, RenewPolicyPayload,
        RenewalEntry,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PolicyFilter {
    /// Filtra pelo status da apólice
    pub status: Option<PolicyStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct RenewalQuery {
    /// Horizonte em dias; sem ele, lista vencidas + críticas + próximas
    pub days_to_expiry: Option<u32>,
}

// POST /api/policies
#[utoipa::path(
    post,
    path = "/api/policies",
    tag = "Policies",
    request_body = CreatePolicyPayload,
    responses(
        (status = 201, description = "Apólice emitida", body = Policy),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado"),
        (status = 409, description = "Número de apólice já cadastrado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Corretora")),
    security(("api_jwt" = []))
)]
pub async fn create_policy(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _role: RequireRole<Writer>,
    Json(payload): Json<CreatePolicyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let policy = app_state
        .policy_service
        .create_policy(&app_state.db_pool, tenant.0, user.0.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(policy)))
}

// GET /api/policies
#[utoipa::path(
    get,
    path = "/api/policies",
    tag = "Policies",
    responses((status = 200, description = "Apólices com dados do cliente", body = Vec<PolicyWithCustomer>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        PolicyFilter
    ),
    security(("api_jwt" = []))
)]
pub async fn list_policies(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<AnyMember>,
    Query(filter): Query<PolicyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let policies = app_state
        .policy_service
        .list_policies(&app_state.db_pool, tenant.0, filter.status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(policies))
}

// POST /api/policies/{id}/renew
#[utoipa::path(
    post,
    path = "/api/policies/{id}/renew",
    tag = "Policies",
    request_body = RenewPolicyPayload,
    responses(
        (status = 201, description = "Apólice sucessora emitida; a atual vira RENEWED", body = Policy),
        (status = 404, description = "Apólice não encontrada"),
        (status = 409, description = "Apólice não está ATIVA ou número já cadastrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID da apólice")
    ),
    security(("api_jwt" = []))
)]
pub async fn renew_policy(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _role: RequireRole<Writer>,
    Path(policy_id): Path<Uuid>,
    Json(payload): Json<RenewPolicyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let renewed = app_state
        .policy_service
        .renew_policy(&app_state.db_pool, tenant.0, policy_id, user.0.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(renewed)))
}

// POST /api/policies/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/policies/{id}/cancel",
    tag = "Policies",
    responses(
        (status = 200, description = "Apólice cancelada", body = Policy),
        (status = 404, description = "Apólice não encontrada"),
        (status = 409, description = "Apólice não está ATIVA")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID da apólice")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_policy(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<Writer>,
    Path(policy_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let policy = app_state
        .policy_service
        .cancel_policy(&app_state.db_pool, tenant.0, policy_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(policy))
}

// GET /api/renewals
#[utoipa::path(
    get,
    path = "/api/renewals",
    tag = "Policies",
    responses((
        status = 200,
        description = "Apólices ATIVAS por vencimento, com dias restantes e faixa",
        body = Vec<RenewalEntry>
    )),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        RenewalQuery
    ),
    security(("api_jwt" = []))
)]
pub async fn list_renewals(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<AnyMember>,
    Query(query): Query<RenewalQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .policy_service
        .list_renewals(&app_state.db_pool, tenant.0, query.days_to_expiry, Utc::now())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}
