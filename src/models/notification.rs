// src/models/notification.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Tipo de lembrete enviado pelo WhatsApp (mapeia `whatsapp_message_type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "whatsapp_message_type")]
pub enum MessageType {
    #[sqlx(rename = "BIRTHDAY")]
    #[serde(rename = "BIRTHDAY")]
    Birthday,
    #[sqlx(rename = "RENEWAL_30")]
    #[serde(rename = "RENEWAL_30")]
    Renewal30,
    #[sqlx(rename = "RENEWAL_15")]
    #[serde(rename = "RENEWAL_15")]
    Renewal15,
    #[sqlx(rename = "RENEWAL_3")]
    #[serde(rename = "RENEWAL_3")]
    Renewal3,
}

impl MessageType {
    /// Lembretes de renovação, na ordem em que o cron os processa.
    pub const RENEWALS: [MessageType; 3] =
        [MessageType::Renewal30, MessageType::Renewal15, MessageType::Renewal3];

    /// Quantos dias antes do vencimento o lembrete dispara (`None` para aniversário).
    pub fn lookahead_days(self) -> Option<i64> {
        match self {
            MessageType::Birthday => None,
            MessageType::Renewal30 => Some(30),
            MessageType::Renewal15 => Some(15),
            MessageType::Renewal3 => Some(3),
        }
    }
}

// PENDING é a "reserva" gravada antes do envio; só SUCCESS e FAILED são resultados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "whatsapp_log_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppLog {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub policy_id: Option<Uuid>,
    pub message_type: MessageType,
    pub status: LogStatus,
    pub phone: Option<String>,
    pub error_message: Option<String>,
    // Dia civil (fuso da corretora) usado na deduplicação
    #[schema(value_type = String, format = Date)]
    pub sent_on: NaiveDate,
    pub sent_at: DateTime<Utc>,
}

// Resposta agregada do cron (sem detalhe por cliente)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepTally {
    pub birthdays_sent: u32,
    pub renewals_sent: u32,
    pub failed: u32,
    pub skipped: u32,
}

// Cliente aniversariante (linha crua da busca do cron)
#[derive(Debug, Clone, FromRow)]
pub struct BirthdayCustomer {
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub birth_date: NaiveDate,
}
