// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
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
        rbac::{AdminOnly, AnyMember, RequireRole, Writer},
        tenancy::TenantContext,
    },
    models::crm::{
        ApprovalStatus, CallLog, CreateCallLogPayload, CreateCustomerPayload,
        CreateKycDocumentPayload, Customer, KycDocument, LeadStage, UpdateApprovalPayload,
        UpdateStagePayload,
    },
};

// =============================================================================
//  ÁREA 1: CLIENTES / LEADS
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    /// Filtra pela etapa do funil
    pub stage: Option<LeadStage>,
    /// Filtra pelo status de aprovação
    pub approval: Option<ApprovalStatus>,
}

// POST /api/crm/customers
#[utoipa::path(
    post,
    path = "/api/crm/customers",
    tag = "CRM",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado na etapa LEAD", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Corretora")),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _role: RequireRole<Writer>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .crm_service
        .create_customer(&app_state.db_pool, tenant.0, user.0.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/crm/customers
#[utoipa::path(
    get,
    path = "/api/crm/customers",
    tag = "CRM",
    responses((status = 200, description = "Clientes da corretora", body = Vec<Customer>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        CustomerFilter
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<AnyMember>,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .crm_service
        .list_customers(&app_state.db_pool, tenant.0, filter.stage, filter.approval)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customers))
}

// GET /api/crm/customers/{id}
#[utoipa::path(
    get,
    path = "/api/crm/customers/{id}",
    tag = "CRM",
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<AnyMember>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .crm_service
        .get_customer(&app_state.db_pool, tenant.0, customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// PATCH /api/crm/customers/{id}/stage
#[utoipa::path(
    patch,
    path = "/api/crm/customers/{id}/stage",
    tag = "CRM",
    request_body = UpdateStagePayload,
    responses(
        (status = 200, description = "Etapa alterada (datas de etapa só são gravadas na primeira vez)", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<Writer>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<UpdateStagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .crm_service
        .change_stage(
            &app_state.db_pool,
            tenant.0,
            customer_id,
            payload.stage,
            payload.lost_reason.as_deref(),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// PATCH /api/crm/customers/{id}/approval
#[utoipa::path(
    patch,
    path = "/api/crm/customers/{id}/approval",
    tag = "CRM",
    request_body = UpdateApprovalPayload,
    responses(
        (status = 200, description = "Aprovação registrada", body = Customer),
        (status = 403, description = "Apenas ADMIN"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_approval(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<AdminOnly>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<UpdateApprovalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .crm_service
        .set_approval(&app_state.db_pool, tenant.0, customer_id, payload.status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// =============================================================================
//  ÁREA 2: LIGAÇÕES
// =============================================================================

// POST /api/crm/customers/{id}/calls
#[utoipa::path(
    post,
    path = "/api/crm/customers/{id}/calls",
    tag = "CRM",
    request_body = CreateCallLogPayload,
    responses(
        (status = 201, description = "Ligação registrada", body = CallLog),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_call_log(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _role: RequireRole<Writer>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CreateCallLogPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let log = app_state
        .crm_service
        .log_call(&app_state.db_pool, tenant.0, customer_id, user.0.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(log)))
}

// GET /api/crm/customers/{id}/calls
#[utoipa::path(
    get,
    path = "/api/crm/customers/{id}/calls",
    tag = "CRM",
    responses((status = 200, description = "Histórico de ligações", body = Vec<CallLog>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_call_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<AnyMember>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = app_state
        .crm_service
        .list_calls(&app_state.db_pool, tenant.0, customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(logs))
}

// =============================================================================
//  ÁREA 3: DOCUMENTOS KYC
// =============================================================================

// POST /api/crm/customers/{id}/documents
#[utoipa::path(
    post,
    path = "/api/crm/customers/{id}/documents",
    tag = "CRM",
    request_body = CreateKycDocumentPayload,
    responses(
        (status = 201, description = "Documento registrado", body = KycDocument),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_kyc_document(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _role: RequireRole<Writer>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CreateKycDocumentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let doc = app_state
        .crm_service
        .add_kyc_document(&app_state.db_pool, tenant.0, customer_id, user.0.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(doc)))
}

// GET /api/crm/customers/{id}/documents
#[utoipa::path(
    get,
    path = "/api/crm/customers/{id}/documents",
    tag = "CRM",
    responses((status = 200, description = "Documentos KYC do cliente", body = Vec<KycDocument>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_kyc_documents(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<AnyMember>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let docs = app_state
        .crm_service
        .list_kyc_documents(&app_state.db_pool, tenant.0, customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(docs))
}
