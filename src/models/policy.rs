// src/models/policy.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Enums (Mapeando o Postgres) ---

// EXPIRED nunca é gravado automaticamente: o vencimento é calculado na leitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "policy_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
    Renewed,
}

// Faixa de renovação, derivada de `end_date - hoje`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenewalBucket {
    Expired,
    Critical,
    Upcoming,
    #[serde(rename = "NONE")]
    NotDue,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub agent_id: Option<Uuid>,

    #[schema(example = "LIC-2024-000123")]
    pub policy_number: String,
    #[schema(example = "Star Health")]
    pub insurer: String,
    #[schema(example = "Family Floater")]
    pub product: String,

    #[schema(example = "25000.00")]
    pub premium: Decimal,
    // Percentual (ex: 15.00 = 15%)
    #[schema(example = "15.00")]
    pub commission_rate: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2024-12-31")]
    pub end_date: NaiveDate,

    pub status: PolicyStatus,
    // Apólice anterior, quando esta nasceu de uma renovação
    pub renewed_from_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Apólice + dados do cliente, como sai do JOIN usado nas telas de renovação
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyWithCustomer {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub policy: Policy,
    pub customer_name: String,
    pub customer_phone: Option<String>,
}

// Linha da tela de renovações
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenewalEntry {
    #[serde(flatten)]
    pub policy: PolicyWithCustomer,
    #[schema(example = 12)]
    pub days_remaining: i64,
    pub bucket: RenewalBucket,
}

// =============================================================================
//  PAYLOADS
// =============================================================================

fn validate_premium(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_premium"))
    }
}

fn validate_commission_rate(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO && *value <= Decimal::ONE_HUNDRED {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_commission_rate"))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyPayload {
    pub customer_id: Uuid,

    #[validate(length(min = 1, max = 64, message = "required"))]
    #[schema(example = "LIC-2024-000123")]
    pub policy_number: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Star Health")]
    pub insurer: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Family Floater")]
    pub product: String,

    #[validate(custom(function = "validate_premium"))]
    #[schema(example = "25000.00")]
    pub premium: Decimal,

    #[validate(custom(function = "validate_commission_rate"))]
    #[schema(example = "15.00")]
    pub commission_rate: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2024-12-31")]
    pub end_date: NaiveDate,
}

// Renovação: a apólice atual vira RENEWED e nasce a sucessora ATIVA
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenewPolicyPayload {
    #[validate(length(min = 1, max = 64, message = "required"))]
    #[schema(example = "LIC-2025-000123")]
    pub new_policy_number: String,

    // Padrão: dia seguinte ao vencimento da apólice atual
    #[schema(value_type = Option<String>, format = Date, example = "2025-01-01")]
    pub new_start_date: Option<NaiveDate>,

    #[schema(value_type = String, format = Date, example = "2025-12-31")]
    pub new_end_date: NaiveDate,

    // Padrão: os valores da apólice atual
    #[validate(custom(function = "validate_premium"))]
    pub premium: Option<Decimal>,
    #[validate(custom(function = "validate_commission_rate"))]
    pub commission_rate: Option<Decimal>,
}
