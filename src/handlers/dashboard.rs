// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid; // Importante para o Swagger params

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AnyMember, RequireRole, Reviewer},
        tenancy::TenantContext,
    },
    models::dashboard::{CommissionReportRow, DashboardSummary},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommissionQuery {
    /// Início do período (data de início da apólice), inclusivo
    #[param(value_type = String, format = Date, example = "2024-01-01")]
    pub from: NaiveDate,
    /// Fim do período, inclusivo
    #[param(value_type = String, format = Date, example = "2024-12-31")]
    pub to: NaiveDate,
}

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Funil por etapa e renovações por faixa", body = DashboardSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem acesso à corretora")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<AnyMember>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .get_summary(&app_state.db_pool, tenant.0, Utc::now())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

// GET /api/dashboard/commissions
#[utoipa::path(
    get,
    path = "/api/dashboard/commissions",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Comissões por agente no período", body = Vec<CommissionReportRow>),
        (status = 400, description = "Período inválido")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Corretora"),
        CommissionQuery
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_commissions(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _role: RequireRole<Reviewer>,
    Query(query): Query<CommissionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .dashboard_service
        .get_commission_report(&app_state.db_pool, tenant.0, query.from, query.to)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}
