// src/services/policy_service.rs

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{dates::today_in, error::AppError},
    db::{policy_repo::NewPolicy, CrmRepository, PolicyRepository},
    models::policy::{
        CreatePolicyPayload, Policy, PolicyStatus, PolicyWithCustomer, RenewPolicyPayload,
        RenewalEntry,
    },
    services::renewal::{
        add_days, policies_within_horizon, renewal_entries, to_entry, UPCOMING_MAX_DAYS,
    },
};

#[derive(Clone)]
pub struct PolicyService {
    repo: PolicyRepository,
    crm_repo: CrmRepository,
    timezone: Tz,
}

impl PolicyService {
    pub fn new(repo: PolicyRepository, crm_repo: CrmRepository, timezone: Tz) -> Self {
        Self { repo, crm_repo, timezone }
    }

    /// Data civil de hoje no fuso da corretora.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        today_in(self.timezone, now)
    }

    // =========================================================================
    //  1. EMISSÃO
    // =========================================================================

    pub async fn create_policy<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        agent_id: Uuid,
        input: &CreatePolicyPayload,
    ) -> Result<Policy, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        ensure_date_range(input.start_date, input.end_date)?;

        let mut conn = executor.acquire().await?;

        self.crm_repo
            .find_customer(&mut *conn, tenant_id, input.customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        let new_policy = NewPolicy {
            customer_id: input.customer_id,
            agent_id: Some(agent_id),
            policy_number: input.policy_number.trim(),
            insurer: input.insurer.trim(),
            product: input.product.trim(),
            premium: input.premium,
            commission_rate: input.commission_rate,
            start_date: input.start_date,
            end_date: input.end_date,
            renewed_from_id: None,
        };

        let policy = self.repo.insert_policy(&mut *conn, tenant_id, &new_policy).await?;

        tracing::info!(policy_id = %policy.id, policy_number = %policy.policy_number, "📄 Apólice emitida");
        Ok(policy)
    }

    pub async fn list_policies<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        status: Option<PolicyStatus>,
    ) -> Result<Vec<PolicyWithCustomer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_policies(executor, tenant_id, status).await
    }

    // =========================================================================
    //  2. CICLO DE VIDA (renovar / cancelar)
    // =========================================================================

    /// A apólice atual vira RENEWED e a sucessora nasce ATIVA, tudo ou nada.
    pub async fn renew_policy<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        policy_id: Uuid,
        agent_id: Uuid,
        input: &RenewPolicyPayload,
    ) -> Result<Policy, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.lock_active(&mut *tx, tenant_id, policy_id).await?;

        let start_date = input
            .new_start_date
            .unwrap_or_else(|| add_days(current.end_date, 1));
        ensure_date_range(start_date, input.new_end_date)?;

        self.repo
            .set_status(&mut *tx, tenant_id, policy_id, PolicyStatus::Renewed)
            .await?;

        let successor = NewPolicy {
            customer_id: current.customer_id,
            agent_id: current.agent_id.or(Some(agent_id)),
            policy_number: input.new_policy_number.trim(),
            insurer: &current.insurer,
            product: &current.product,
            premium: input.premium.unwrap_or(current.premium),
            commission_rate: input.commission_rate.unwrap_or(current.commission_rate),
            start_date,
            end_date: input.new_end_date,
            renewed_from_id: Some(current.id),
        };

        let renewed = self.repo.insert_policy(&mut *tx, tenant_id, &successor).await?;

        tx.commit().await?;

        tracing::info!(
            from = %current.policy_number,
            to = %renewed.policy_number,
            "🔁 Apólice renovada"
        );
        Ok(renewed)
    }

    pub async fn cancel_policy<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        policy_id: Uuid,
    ) -> Result<Policy, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.lock_active(&mut *tx, tenant_id, policy_id).await?;
        let cancelled = self
            .repo
            .set_status(&mut *tx, tenant_id, policy_id, PolicyStatus::Cancelled)
            .await?;

        tx.commit().await?;
        Ok(cancelled)
    }

    // Trava a linha e exige status ATIVO (qualquer outro é 409)
    async fn lock_active<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        policy_id: Uuid,
    ) -> Result<Policy, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let policy = self
            .repo
            .find_policy_for_update(executor, tenant_id, policy_id)
            .await?
            .ok_or(AppError::PolicyNotFound)?;

        match policy.status {
            PolicyStatus::Active => Ok(policy),
            other => Err(AppError::InvalidPolicyStatus(other)),
        }
    }

    // =========================================================================
    //  3. RENOVAÇÕES
    // =========================================================================

    /// Tela de renovações.
    ///
    /// Com `days_to_expiry`: ATIVAS que vencem em `[hoje, hoje + N]`.
    /// Sem: tudo o que está vencido, crítico ou próximo (até 30 dias).
    pub async fn list_renewals<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        days_to_expiry: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RenewalEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let today = self.today(now);

        match days_to_expiry {
            Some(horizon) => {
                let until = add_days(today, u64::from(horizon));
                let candidates = self
                    .repo
                    .list_active_ending_between(executor, tenant_id, Some(today), until)
                    .await?;

                Ok(policies_within_horizon(candidates, horizon, today)
                    .into_iter()
                    .map(|p| to_entry(p, today))
                    .collect())
            }
            None => {
                let until = add_days(today, UPCOMING_MAX_DAYS as u64);
                let candidates = self
                    .repo
                    .list_active_ending_between(executor, tenant_id, None, until)
                    .await?;

                Ok(renewal_entries(candidates, today))
            }
        }
    }
}

fn ensure_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    if end < start {
        return Err(AppError::InvalidDateRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn single_day_policy_is_a_valid_range() {
        assert!(ensure_date_range(date("2024-01-01"), date("2024-01-01")).is_ok());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let result = ensure_date_range(date("2024-02-01"), date("2024-01-31"));
        assert!(matches!(result, Err(AppError::InvalidDateRange)));
    }

    #[test]
    fn today_follows_the_agency_timezone() {
        let service = PolicyService::new(
            PolicyRepository::new(),
            CrmRepository::new(),
            chrono_tz::Asia::Kolkata,
        );
        // 20:00 UTC já é o dia seguinte em IST (+05:30)
        let now = DateTime::parse_from_rfc3339("2024-03-10T20:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(service.today(now), date("2024-03-11"));
    }
}
