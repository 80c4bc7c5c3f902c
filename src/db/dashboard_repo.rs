// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dashboard::{CommissionSource, StageCount},
};

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // 1. Funil: só as etapas que têm leads (o serviço completa com zero)
    pub async fn count_by_stage<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<StageCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StageCount>(
            r#"
            SELECT stage, COUNT(*) AS total
            FROM customers
            WHERE tenant_id = $1
            GROUP BY stage
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    // 2. Comissões: apólices emitidas no período (canceladas não contam)
    pub async fn commission_sources<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CommissionSource>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, CommissionSource>(
            r#"
            SELECT p.agent_id, u.full_name AS agent_name, p.premium, p.commission_rate
            FROM policies p
            LEFT JOIN users u ON u.id = p.agent_id
            WHERE p.tenant_id = $1
              AND p.status <> 'CANCELLED'
              AND p.start_date BETWEEN $2 AND $3
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}
