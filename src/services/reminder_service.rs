// src/services/reminder_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    common::{dates::today_in, error::AppError, phone::normalize_phone},
    db::NotificationRepository,
    models::notification::{MessageType, SweepTally},
    services::{
        renewal::{is_birthday, reminder_target_dates, renewal_reminders_due},
        whatsapp::MessageSender,
    },
};

/// Um lembrete pronto para sair: destinatário + texto já renderizado.
#[derive(Debug, Clone)]
pub struct ReminderCandidate {
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub policy_id: Option<Uuid>,
    pub message_type: MessageType,
    pub phone: Option<String>,
    pub body: String,
}

/// Prazo de uma reserva PENDING. Passado esse tempo sem `mark_*`, a reserva
/// vira FAILED na próxima tentativa de `claim` e o slot é liberado.
pub const CLAIM_LEASE_MINUTES: i64 = 10;

/// O livro-razão de envios (tabela whatsapp_logs).
///
/// `claim` grava uma reserva PENDING protegida por índice único em
/// (cliente, tipo, dia). Se a reserva já existir (SUCCESS, ou PENDING dentro
/// de `CLAIM_LEASE_MINUTES`), devolve `Ok(None)` e o envio é pulado.
#[async_trait]
pub trait ReminderLedger: Send + Sync {
    async fn claim(
        &self,
        candidate: &ReminderCandidate,
        phone: Option<&str>,
        day: NaiveDate,
    ) -> Result<Option<Uuid>, AppError>;

    async fn mark_success(&self, log_id: Uuid) -> Result<(), AppError>;

    async fn mark_failed(&self, log_id: Uuid, error_message: &str) -> Result<(), AppError>;
}

// =============================================================================
//  Textos
// =============================================================================

pub fn birthday_message(customer_name: &str) -> String {
    format!(
        "Dear {customer_name}, wishing you a very happy birthday! \
         Thank you for trusting us with your insurance needs."
    )
}

pub fn renewal_message(
    customer_name: &str,
    policy_number: &str,
    product: &str,
    insurer: &str,
    end_date: NaiveDate,
    days_left: i64,
) -> String {
    format!(
        "Dear {customer_name}, your {insurer} {product} policy {policy_number} expires on {} \
         ({days_left} days left). Please contact us to renew and stay covered.",
        end_date.format("%d %b %Y")
    )
}

// =============================================================================
//  Disparo
// =============================================================================

/// Envia cada candidato uma única vez por dia.
///
/// Falha no envio de um cliente não interrompe os demais: vira linha FAILED e
/// entra na contagem. Só erro de infraestrutura (banco) aborta o lote.
pub async fn dispatch(
    candidates: Vec<ReminderCandidate>,
    ledger: &dyn ReminderLedger,
    sender: &dyn MessageSender,
    today: NaiveDate,
    country_code: &str,
) -> Result<SweepTally, AppError> {
    let mut tally = SweepTally::default();

    for candidate in candidates {
        let phone = candidate
            .phone
            .as_deref()
            .and_then(|raw| normalize_phone(raw, country_code));

        // 1. Reserva o slot (cliente, tipo, dia). Conflito = já enviado hoje.
        let Some(log_id) = ledger.claim(&candidate, phone.as_deref(), today).await? else {
            tally.skipped += 1;
            continue;
        };

        // 2. Sem telefone válido não há o que enviar
        let Some(phone) = phone else {
            ledger.mark_failed(log_id, "invalid phone number").await?;
            tally.failed += 1;
            continue;
        };

        // 3. Envia e registra o resultado
        match sender.send_text(&phone, &candidate.body).await {
            Ok(()) => {
                ledger.mark_success(log_id).await?;
                match candidate.message_type {
                    MessageType::Birthday => tally.birthdays_sent += 1,
                    _ => tally.renewals_sent += 1,
                }
            }
            Err(e) => {
                tracing::warn!(
                    customer_id = %candidate.customer_id,
                    message_type = ?candidate.message_type,
                    error = %e,
                    "Falha ao enviar lembrete de WhatsApp"
                );
                ledger.mark_failed(log_id, &e.to_string()).await?;
                tally.failed += 1;
            }
        }
    }

    Ok(tally)
}

// =============================================================================
//  Serviço (coleta + disparo)
// =============================================================================

#[derive(Clone)]
pub struct ReminderService {
    repo: NotificationRepository,
    sender: Arc<dyn MessageSender>,
    timezone: Tz,
    country_code: String,
}

impl ReminderService {
    pub fn new(
        repo: NotificationRepository,
        sender: Arc<dyn MessageSender>,
        timezone: Tz,
        country_code: String,
    ) -> Self {
        Self { repo, sender, timezone, country_code }
    }

    /// Uma varredura completa (aniversários + renovações) para todas as corretoras.
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepTally, AppError> {
        let today = today_in(self.timezone, now);

        let candidates = self.collect_candidates(today).await?;
        tracing::info!(%today, candidates = candidates.len(), "⏰ Iniciando varredura de lembretes");

        let tally = dispatch(
            candidates,
            &self.repo,
            self.sender.as_ref(),
            today,
            &self.country_code,
        )
        .await?;

        tracing::info!(
            birthdays_sent = tally.birthdays_sent,
            renewals_sent = tally.renewals_sent,
            failed = tally.failed,
            skipped = tally.skipped,
            "✅ Varredura de lembretes concluída"
        );

        Ok(tally)
    }

    async fn collect_candidates(&self, today: NaiveDate) -> Result<Vec<ReminderCandidate>, AppError> {
        let mut candidates = Vec::new();

        // A. Aniversários: o banco filtra por (mês, dia); conferimos de novo aqui
        let birthdays = self.repo.list_birthday_customers(today).await?;
        candidates.extend(
            birthdays
                .into_iter()
                .filter(|c| is_birthday(c.birth_date, today))
                .map(|c| ReminderCandidate {
                    tenant_id: c.tenant_id,
                    customer_id: c.customer_id,
                    policy_id: None,
                    message_type: MessageType::Birthday,
                    body: birthday_message(&c.full_name),
                    phone: c.phone,
                }),
        );

        // B. Renovações: busca só as datas-alvo e aplica o casamento exato
        let target_dates: Vec<NaiveDate> =
            reminder_target_dates(today).into_iter().map(|(_, d)| d).collect();
        let policies = self.repo.list_active_policies_ending_on(&target_dates).await?;

        for (kind, p) in renewal_reminders_due(&policies, today) {
            let days_left = kind.lookahead_days().unwrap_or_default();
            candidates.push(ReminderCandidate {
                tenant_id: p.policy.tenant_id,
                customer_id: p.policy.customer_id,
                policy_id: Some(p.policy.id),
                message_type: kind,
                phone: p.customer_phone.clone(),
                body: renewal_message(
                    &p.customer_name,
                    &p.policy.policy_number,
                    &p.policy.product,
                    &p.policy.insurer,
                    p.policy.end_date,
                    days_left,
                ),
            });
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::Mutex,
        time::Duration as StdDuration,
    };

    use chrono::Duration;

    use super::*;
    use crate::models::notification::LogStatus;
    use crate::services::whatsapp::SendError;

    type Key = (Uuid, MessageType, NaiveDate);

    struct Row {
        key: Key,
        status: LogStatus,
        error: Option<String>,
        claimed_at: DateTime<Utc>,
    }

    // Livro-razão em memória com as mesmas regras do banco: índice único
    // parcial e prazo da reserva PENDING, medido num relógio controlado pelo teste
    #[derive(Default)]
    struct MemoryLedger {
        rows: Mutex<HashMap<Uuid, Row>>,
        clock: Mutex<DateTime<Utc>>,
    }

    impl MemoryLedger {
        fn now(&self) -> DateTime<Utc> {
            *self.clock.lock().unwrap()
        }

        fn advance_minutes(&self, minutes: i64) {
            *self.clock.lock().unwrap() += Duration::minutes(minutes);
        }

        fn seed_success(&self, customer_id: Uuid, kind: MessageType, day: NaiveDate) {
            let row = Row {
                key: (customer_id, kind, day),
                status: LogStatus::Success,
                error: None,
                claimed_at: self.now(),
            };
            self.rows.lock().unwrap().insert(Uuid::new_v4(), row);
        }

        fn statuses(&self) -> Vec<LogStatus> {
            self.rows.lock().unwrap().values().map(|r| r.status).collect()
        }

        fn errors(&self) -> Vec<String> {
            self.rows.lock().unwrap().values().filter_map(|r| r.error.clone()).collect()
        }
    }

    #[async_trait]
    impl ReminderLedger for MemoryLedger {
        async fn claim(
            &self,
            candidate: &ReminderCandidate,
            _phone: Option<&str>,
            day: NaiveDate,
        ) -> Result<Option<Uuid>, AppError> {
            let key = (candidate.customer_id, candidate.message_type, day);
            let now = self.now();
            let mut rows = self.rows.lock().unwrap();

            for row in rows.values_mut() {
                if row.key == key
                    && row.status == LogStatus::Pending
                    && row.claimed_at < now - Duration::minutes(CLAIM_LEASE_MINUTES)
                {
                    row.status = LogStatus::Failed;
                    row.error = Some("claim expired".into());
                }
            }

            let taken = rows
                .values()
                .any(|r| r.key == key && r.status != LogStatus::Failed);
            if taken {
                return Ok(None);
            }
            let id = Uuid::new_v4();
            rows.insert(id, Row { key, status: LogStatus::Pending, error: None, claimed_at: now });
            Ok(Some(id))
        }

        async fn mark_success(&self, log_id: Uuid) -> Result<(), AppError> {
            if let Some(row) = self.rows.lock().unwrap().get_mut(&log_id) {
                row.status = LogStatus::Success;
            }
            Ok(())
        }

        async fn mark_failed(&self, log_id: Uuid, error_message: &str) -> Result<(), AppError> {
            if let Some(row) = self.rows.lock().unwrap().get_mut(&log_id) {
                row.status = LogStatus::Failed;
                row.error = Some(error_message.to_string());
            }
            Ok(())
        }
    }

    // Nunca responde: simula a varredura morrendo no meio do envio
    struct HangingSender;

    #[async_trait]
    impl MessageSender for HangingSender {
        async fn send_text(&self, _to: &str, _body: &str) -> Result<(), SendError> {
            std::future::pending().await
        }
    }

    // Envia tudo, menos para os números listados em `failing`
    #[derive(Default)]
    struct ScriptedSender {
        failing: Vec<String>,
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageSender for ScriptedSender {
        async fn send_text(&self, to: &str, _body: &str) -> Result<(), SendError> {
            self.attempts.lock().unwrap().push(to.to_string());
            if self.failing.iter().any(|f| f == to) {
                return Err(SendError::Api { status: 500, message: "boom".into() });
            }
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn candidate(customer_id: Uuid, kind: MessageType, phone: &str) -> ReminderCandidate {
        ReminderCandidate {
            tenant_id: Uuid::nil(),
            customer_id,
            policy_id: None,
            message_type: kind,
            phone: Some(phone.to_string()),
            body: "hello".into(),
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_batch() {
        let ledger = MemoryLedger::default();
        let sender = ScriptedSender {
            failing: vec!["919000000002".into()],
            ..Default::default()
        };
        let candidates = vec![
            candidate(Uuid::new_v4(), MessageType::Renewal15, "9000000001"),
            candidate(Uuid::new_v4(), MessageType::Renewal15, "9000000002"),
            candidate(Uuid::new_v4(), MessageType::Renewal15, "9000000003"),
        ];

        let tally = dispatch(candidates, &ledger, &sender, today(), "91").await.unwrap();

        assert_eq!(sender.attempts.lock().unwrap().len(), 3);
        assert_eq!(tally.renewals_sent, 2);
        assert_eq!(tally.failed, 1);
        let mut statuses = ledger.statuses();
        statuses.sort_by_key(|s| format!("{s:?}"));
        assert_eq!(statuses, vec![LogStatus::Failed, LogStatus::Success, LogStatus::Success]);
    }

    #[tokio::test]
    async fn existing_success_today_suppresses_the_send() {
        let c1 = Uuid::new_v4();
        let ledger = MemoryLedger::default();
        ledger.seed_success(c1, MessageType::Renewal15, today());
        let sender = ScriptedSender::default();

        let tally = dispatch(
            vec![candidate(c1, MessageType::Renewal15, "9000000001")],
            &ledger,
            &sender,
            today(),
            "91",
        )
        .await
        .unwrap();

        assert!(sender.attempts.lock().unwrap().is_empty());
        assert_eq!(tally, SweepTally { skipped: 1, ..Default::default() });
    }

    #[tokio::test]
    async fn second_pass_on_the_same_day_sends_nothing() {
        let ledger = MemoryLedger::default();
        let sender = ScriptedSender::default();
        let batch = vec![
            candidate(Uuid::new_v4(), MessageType::Birthday, "9000000001"),
            candidate(Uuid::new_v4(), MessageType::Renewal3, "9000000002"),
        ];

        let first = dispatch(batch.clone(), &ledger, &sender, today(), "91").await.unwrap();
        let second = dispatch(batch, &ledger, &sender, today(), "91").await.unwrap();

        assert_eq!(first.birthdays_sent, 1);
        assert_eq!(first.renewals_sent, 1);
        assert_eq!(second, SweepTally { skipped: 2, ..Default::default() });
        assert_eq!(sender.attempts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn different_type_for_same_customer_is_not_deduped() {
        let c1 = Uuid::new_v4();
        let ledger = MemoryLedger::default();
        ledger.seed_success(c1, MessageType::Renewal30, today());
        let sender = ScriptedSender::default();

        let tally = dispatch(
            vec![candidate(c1, MessageType::Birthday, "9000000001")],
            &ledger,
            &sender,
            today(),
            "91",
        )
        .await
        .unwrap();

        assert_eq!(tally.birthdays_sent, 1);
    }

    #[tokio::test]
    async fn failed_row_does_not_block_a_later_retry() {
        let c1 = Uuid::new_v4();
        let ledger = MemoryLedger::default();
        let failing = ScriptedSender { failing: vec!["919000000001".into()], ..Default::default() };
        let healthy = ScriptedSender::default();
        let batch = vec![candidate(c1, MessageType::Renewal30, "9000000001")];

        let first = dispatch(batch.clone(), &ledger, &failing, today(), "91").await.unwrap();
        let second = dispatch(batch, &ledger, &healthy, today(), "91").await.unwrap();

        assert_eq!(first.failed, 1);
        assert_eq!(second.renewals_sent, 1);
    }

    #[tokio::test]
    async fn invalid_phone_is_recorded_as_failure() {
        let ledger = MemoryLedger::default();
        let sender = ScriptedSender::default();
        let mut c = candidate(Uuid::new_v4(), MessageType::Birthday, "");
        c.phone = Some("n/a".into());

        let tally = dispatch(vec![c], &ledger, &sender, today(), "91").await.unwrap();

        assert_eq!(tally.failed, 1);
        assert!(sender.attempts.lock().unwrap().is_empty());
        assert_eq!(ledger.statuses(), vec![LogStatus::Failed]);
    }

    #[tokio::test]
    async fn stale_pending_claim_is_released_after_the_lease() {
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let ledger = MemoryLedger::default();
        let batch = vec![
            candidate(c1, MessageType::Renewal15, "9000000001"),
            candidate(c2, MessageType::Renewal15, "9000000002"),
        ];

        // A varredura para depois de reservar c1, antes de registrar o resultado
        let interrupted = tokio::time::timeout(
            StdDuration::from_millis(50),
            dispatch(batch.clone(), &ledger, &HangingSender, today(), "91"),
        )
        .await;
        assert!(interrupted.is_err());
        assert_eq!(ledger.statuses(), vec![LogStatus::Pending]);

        // Dentro do prazo a reserva ainda vale
        let sender = ScriptedSender::default();
        let within = dispatch(batch.clone(), &ledger, &sender, today(), "91").await.unwrap();
        assert_eq!(within, SweepTally { renewals_sent: 1, skipped: 1, ..Default::default() });

        // Depois do prazo c1 é liberado e enviado; c2 já saiu
        ledger.advance_minutes(CLAIM_LEASE_MINUTES + 1);
        let after = dispatch(batch, &ledger, &sender, today(), "91").await.unwrap();
        assert_eq!(after, SweepTally { renewals_sent: 1, skipped: 1, ..Default::default() });
        assert_eq!(
            *sender.attempts.lock().unwrap(),
            vec!["919000000002".to_string(), "919000000001".to_string()]
        );
        assert_eq!(ledger.errors(), vec!["claim expired".to_string()]);
    }

    #[test]
    fn renewal_message_mentions_policy_and_date() {
        let body = renewal_message(
            "Rahul",
            "LIC-1",
            "Term Plan",
            "LIC",
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            15,
        );
        assert!(body.contains("LIC-1"));
        assert!(body.contains("16 Jan 2024"));
        assert!(body.contains("15 days left"));
    }
}
