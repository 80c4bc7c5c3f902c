// src/db/notification_repo.rs

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        notification::{BirthdayCustomer, WhatsAppLog},
        policy::PolicyWithCustomer,
    },
    services::reminder_service::{ReminderCandidate, ReminderLedger, CLAIM_LEASE_MINUTES},
};

// O cron roda fora de qualquer requisição e varre todas as corretoras,
// por isso este repositório usa o próprio pool.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clientes (de todas as corretoras) que fazem aniversário em `today`.
    pub async fn list_birthday_customers(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<BirthdayCustomer>, AppError> {
        let customers = sqlx::query_as::<_, BirthdayCustomer>(
            r#"
            SELECT tenant_id, id AS customer_id, full_name, phone, birth_date
            FROM customers
            WHERE birth_date IS NOT NULL
              AND approval_status <> 'REJECTED'
              AND EXTRACT(MONTH FROM birth_date)::int = $1
              AND EXTRACT(DAY FROM birth_date)::int = $2
            ORDER BY tenant_id, full_name
            "#,
        )
        .bind(today.month() as i32)
        .bind(today.day() as i32)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Apólices ATIVAS (de todas as corretoras) que vencem exatamente em uma das datas.
    pub async fn list_active_policies_ending_on(
        &self,
        dates: &[NaiveDate],
    ) -> Result<Vec<PolicyWithCustomer>, AppError> {
        let policies = sqlx::query_as::<_, PolicyWithCustomer>(
            r#"
            SELECT p.*, c.full_name AS customer_name, c.phone AS customer_phone
            FROM policies p
            INNER JOIN customers c ON c.id = p.customer_id
            WHERE p.status = 'ACTIVE'
              AND p.end_date = ANY($1)
            ORDER BY p.end_date ASC, p.policy_number ASC
            "#,
        )
        .bind(dates)
        .fetch_all(&self.pool)
        .await?;

        Ok(policies)
    }

    /// Últimos envios da corretora, mais recentes primeiro.
    pub async fn list_logs(&self, tenant_id: Uuid, limit: i64) -> Result<Vec<WhatsAppLog>, AppError> {
        let logs = sqlx::query_as::<_, WhatsAppLog>(
            r#"
            SELECT * FROM whatsapp_logs
            WHERE tenant_id = $1
            ORDER BY sent_at DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

#[async_trait]
impl ReminderLedger for NotificationRepository {
    // O índice único parcial (cliente, tipo, dia) WHERE status IN (PENDING, SUCCESS)
    // faz o INSERT não devolver nada quando o lembrete já saiu ou está saindo.
    async fn claim(
        &self,
        candidate: &ReminderCandidate,
        phone: Option<&str>,
        day: NaiveDate,
    ) -> Result<Option<Uuid>, AppError> {
        // Reserva PENDING mais velha que o prazo é de uma varredura que morreu no meio
        let expired = sqlx::query(
            r#"
            UPDATE whatsapp_logs
            SET status = 'FAILED', error_message = 'claim expired'
            WHERE customer_id = $1
              AND message_type = $2
              AND sent_on = $3
              AND status = 'PENDING'
              AND sent_at < NOW() - make_interval(mins => $4)
            "#,
        )
        .bind(candidate.customer_id)
        .bind(candidate.message_type)
        .bind(day)
        .bind(CLAIM_LEASE_MINUTES as i32)
        .execute(&self.pool)
        .await?;

        if expired.rows_affected() > 0 {
            tracing::warn!(
                customer_id = %candidate.customer_id,
                message_type = ?candidate.message_type,
                "Reserva de lembrete expirada; liberando nova tentativa"
            );
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO whatsapp_logs (tenant_id, customer_id, policy_id, message_type, status, phone, sent_on)
            VALUES ($1, $2, $3, $4, 'PENDING', $5, $6)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(candidate.tenant_id)
        .bind(candidate.customer_id)
        .bind(candidate.policy_id)
        .bind(candidate.message_type)
        .bind(phone)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    async fn mark_success(&self, log_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE whatsapp_logs SET status = 'SUCCESS', sent_at = NOW() WHERE id = $1")
            .bind(log_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_failed(&self, log_id: Uuid, error_message: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE whatsapp_logs
            SET status = 'FAILED', error_message = $2, sent_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(log_id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
