// src/models/crm.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

// Etapa do funil de vendas (mapeia o CREATE TYPE lead_stage do banco)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_stage", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStage {
    #[default]
    Lead,
    Pitched,
    Interested,
    Converted,
    Lost,
}

impl LeadStage {
    pub const ALL: [LeadStage; 5] = [
        LeadStage::Lead,
        LeadStage::Pitched,
        LeadStage::Interested,
        LeadStage::Converted,
        LeadStage::Lost,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "call_outcome", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallOutcome {
    Connected,
    NoAnswer,
    Busy,
    CallbackRequested,
    WrongNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "kyc_document_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycDocumentType {
    Pan,
    Aadhaar,
    Passport,
    Photo,
    Other,
}

// --- CLIENTE / LEAD ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub assigned_agent_id: Option<Uuid>,

    #[schema(example = "Rahul Verma")]
    pub full_name: String,
    #[schema(example = "9876543210")]
    pub phone: Option<String>,
    pub email: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "1988-04-12")]
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub notes: Option<String>,

    pub approval_status: ApprovalStatus,

    // Linha do tempo do funil: cada data é gravada uma única vez
    pub stage: LeadStage,
    pub lead_date: DateTime<Utc>,
    pub pitched_date: Option<DateTime<Utc>>,
    pub interested_date: Option<DateTime<Utc>>,
    pub converted_date: Option<DateTime<Utc>>,
    pub lost_date: Option<DateTime<Utc>>,
    pub lost_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- REGISTRO DE LIGAÇÕES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub agent_id: Uuid,
    pub outcome: CallOutcome,
    #[schema(example = "Pediu cotação do plano familiar")]
    pub notes: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "2024-02-10")]
    pub follow_up_date: Option<NaiveDate>,
    pub called_at: DateTime<Utc>,
}

// --- DOCUMENTOS KYC ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KycDocument {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub document_type: KycDocumentType,
    #[schema(example = "ABCDE1234F")]
    pub document_number: Option<String>,
    // URL devolvida pelo armazenamento de arquivos (upload acontece fora daqui)
    #[schema(example = "https://files.example.com/kyc/abc.jpg")]
    pub file_url: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Rahul Verma")]
    pub full_name: String,

    #[validate(length(min = 7, max = 20, message = "invalid_phone"))]
    #[schema(example = "98765 43210")]
    pub phone: Option<String>,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "rahul@email.com")]
    pub email: Option<String>,

    #[schema(value_type = Option<String>, format = Date, example = "1988-04-12")]
    pub birth_date: Option<NaiveDate>,

    pub address: Option<String>,
    pub notes: Option<String>,
}

// Corpo do PATCH de etapa: { stage, lostReason? }
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStagePayload {
    pub stage: LeadStage,
    #[schema(example = "Achou o prêmio caro")]
    pub lost_reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApprovalPayload {
    pub status: ApprovalStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallLogPayload {
    pub outcome: CallOutcome,

    #[validate(length(max = 2000, message = "too_long"))]
    pub notes: Option<String>,

    #[schema(value_type = Option<String>, format = Date, example = "2024-02-10")]
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateKycDocumentPayload {
    pub document_type: KycDocumentType,

    #[validate(length(min = 1, max = 50, message = "invalid_document_number"))]
    pub document_number: Option<String>,

    #[validate(url(message = "invalid_url"))]
    #[schema(example = "https://files.example.com/kyc/abc.jpg")]
    pub file_url: String,
}
