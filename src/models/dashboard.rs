// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::crm::LeadStage;

// 1. Funil (quantos leads em cada etapa)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageCount {
    pub stage: LeadStage,
    pub total: i64,
}

// 2. Renovações por faixa
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenewalCounts {
    pub expired: u32,
    pub critical: u32,
    pub upcoming: u32,
}

// Os Cards do Topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub leads_by_stage: Vec<StageCount>,
    pub renewals: RenewalCounts,
}

// Linha crua vinda do banco: uma apólice emitida no período
#[derive(Debug, Clone, FromRow)]
pub struct CommissionSource {
    pub agent_id: Option<Uuid>,
    pub agent_name: Option<String>,
    pub premium: Decimal,
    pub commission_rate: Decimal,
}

// 3. Relatório de comissões (uma linha por agente)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionReportRow {
    pub agent_id: Option<Uuid>,
    pub agent_name: Option<String>,
    pub policy_count: u32,
    #[schema(example = "125000.00")]
    pub total_premium: Decimal,
    #[schema(example = "18750.00")]
    pub total_commission: Decimal,
}
