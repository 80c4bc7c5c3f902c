// src/services/dashboard_service.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{dates::today_in, error::AppError},
    db::{DashboardRepository, PolicyRepository},
    models::{
        crm::LeadStage,
        dashboard::{CommissionReportRow, CommissionSource, DashboardSummary, StageCount},
    },
    services::renewal::{add_days, count_buckets, UPCOMING_MAX_DAYS},
};

// Precisa ser o primeiro comando da transação
const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY";

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    policy_repo: PolicyRepository,
    timezone: Tz,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, policy_repo: PolicyRepository, timezone: Tz) -> Self {
        Self { repo, policy_repo, timezone }
    }

    pub async fn get_summary<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let today = today_in(self.timezone, now);

        // Funil e renovações lidos do mesmo snapshot (READ COMMITTED tiraria um por comando)
        let mut tx = executor.begin().await?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;

        let stage_rows = self.repo.count_by_stage(&mut *tx, tenant_id).await?;
        let due = self
            .policy_repo
            .list_active_ending_between(
                &mut *tx,
                tenant_id,
                None,
                add_days(today, UPCOMING_MAX_DAYS as u64),
            )
            .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            leads_by_stage: fill_stages(stage_rows),
            renewals: count_buckets(due.iter().map(|p| &p.policy), today),
        })
    }

    pub async fn get_commission_report<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CommissionReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if to < from {
            return Err(AppError::InvalidDateRange);
        }

        let sources = self.repo.commission_sources(executor, tenant_id, from, to).await?;
        Ok(aggregate_commissions(sources))
    }
}

// Toda etapa aparece, mesmo sem leads, na ordem do funil
fn fill_stages(rows: Vec<StageCount>) -> Vec<StageCount> {
    LeadStage::ALL
        .iter()
        .map(|stage| StageCount {
            stage: *stage,
            total: rows
                .iter()
                .find(|r| r.stage == *stage)
                .map(|r| r.total)
                .unwrap_or(0),
        })
        .collect()
}

/// Agrupa por agente; comissão = prêmio × taxa / 100, arredondada em 2 casas por agente.
fn aggregate_commissions(sources: Vec<CommissionSource>) -> Vec<CommissionReportRow> {
    let mut by_agent: BTreeMap<Option<Uuid>, CommissionReportRow> = BTreeMap::new();

    for source in sources {
        let row = by_agent
            .entry(source.agent_id)
            .or_insert_with(|| CommissionReportRow {
                agent_id: source.agent_id,
                agent_name: source.agent_name.clone(),
                policy_count: 0,
                total_premium: Decimal::ZERO,
                total_commission: Decimal::ZERO,
            });

        row.policy_count += 1;
        row.total_premium += source.premium;
        row.total_commission += source.premium * source.commission_rate / Decimal::ONE_HUNDRED;
    }

    let mut rows: Vec<CommissionReportRow> = by_agent
        .into_values()
        .map(|mut row| {
            row.total_commission = row.total_commission.round_dp(2);
            row
        })
        .collect();

    // Maior comissão primeiro
    rows.sort_by(|a, b| b.total_commission.cmp(&a.total_commission));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn source(agent: Uuid, premium: Decimal, rate: Decimal) -> CommissionSource {
        CommissionSource {
            agent_id: Some(agent),
            agent_name: Some("Priya".into()),
            premium,
            commission_rate: rate,
        }
    }

    #[test]
    fn missing_stages_are_reported_as_zero() {
        let filled = fill_stages(vec![StageCount { stage: LeadStage::Interested, total: 4 }]);

        assert_eq!(filled.len(), 5);
        assert_eq!(filled[0], StageCount { stage: LeadStage::Lead, total: 0 });
        assert_eq!(filled[2], StageCount { stage: LeadStage::Interested, total: 4 });
    }

    #[test]
    fn commissions_are_summed_per_agent_and_rounded() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rows = aggregate_commissions(vec![
            source(a, dec("10000.00"), dec("15.00")),
            source(a, dec("333.33"), dec("10.00")),
            source(b, dec("2000.00"), dec("5.00")),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].agent_id, Some(a));
        assert_eq!(rows[0].policy_count, 2);
        assert_eq!(rows[0].total_premium, dec("10333.33"));
        assert_eq!(rows[0].total_commission, dec("1533.33"));
        assert_eq!(rows[1].total_commission, dec("100.00"));
    }

    #[test]
    fn policies_without_agent_are_grouped_together() {
        let rows = aggregate_commissions(vec![
            CommissionSource {
                agent_id: None,
                agent_name: None,
                premium: dec("100"),
                commission_rate: dec("10"),
            },
            CommissionSource {
                agent_id: None,
                agent_name: None,
                premium: dec("50"),
                commission_rate: dec("10"),
            },
        ]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].policy_count, 2);
        assert_eq!(rows[0].total_commission, dec("15"));
    }

    #[test]
    fn summary_reads_share_one_snapshot() {
        // READ COMMITTED (padrão do Postgres) tira um snapshot por comando
        assert!(SNAPSHOT_ISOLATION.starts_with("SET TRANSACTION"));
        assert!(SNAPSHOT_ISOLATION.contains("REPEATABLE READ"));
    }
}
