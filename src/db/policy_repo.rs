// src/db/policy_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::policy::{Policy, PolicyStatus, PolicyWithCustomer},
};

// Colunas da apólice + cliente, no formato esperado por `PolicyWithCustomer`
const POLICY_WITH_CUSTOMER: &str = r#"
    SELECT p.*, c.full_name AS customer_name, c.phone AS customer_phone
    FROM policies p
    INNER JOIN customers c ON c.id = p.customer_id
"#;

/// Dados de uma nova apólice, já resolvidos pelo serviço.
#[derive(Debug, Clone)]
pub struct NewPolicy<'a> {
    pub customer_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub policy_number: &'a str,
    pub insurer: &'a str,
    pub product: &'a str,
    pub premium: Decimal,
    pub commission_rate: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub renewed_from_id: Option<Uuid>,
}

#[derive(Clone, Default)]
pub struct PolicyRepository;

impl PolicyRepository {
    pub fn new() -> Self {
        Self
    }

    /// Insere uma apólice ATIVA. Número repetido na corretora vira 409.
    pub async fn insert_policy<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &NewPolicy<'_>,
    ) -> Result<Policy, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Policy>(
            r#"
            INSERT INTO policies (
                tenant_id, customer_id, agent_id, policy_number, insurer, product,
                premium, commission_rate, start_date, end_date, renewed_from_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.customer_id)
        .bind(input.agent_id)
        .bind(input.policy_number)
        .bind(input.insurer)
        .bind(input.product)
        .bind(input.premium)
        .bind(input.commission_rate)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.renewed_from_id)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::PolicyNumberAlreadyExists(input.policy_number.to_string());
                }
            }
            e.into()
        })
    }

    /// Busca travando a linha até o fim da transação (renovar/cancelar).
    pub async fn find_policy_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        policy_id: Uuid,
    ) -> Result<Option<Policy>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let policy = sqlx::query_as::<_, Policy>(
            "SELECT * FROM policies WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(policy_id)
        .fetch_optional(executor)
        .await?;

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
        let sql = format!(
            "{POLICY_WITH_CUSTOMER}
             WHERE p.tenant_id = $1
               AND ($2::policy_status IS NULL OR p.status = $2)
             ORDER BY p.end_date ASC, p.policy_number ASC"
        );

        let policies = sqlx::query_as::<_, PolicyWithCustomer>(&sql)
            .bind(tenant_id)
            .bind(status)
            .fetch_all(executor)
            .await?;

        Ok(policies)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        policy_id: Uuid,
        status: PolicyStatus,
    ) -> Result<Policy, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Policy>(
            r#"
            UPDATE policies
            SET status = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(policy_id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::PolicyNotFound)
    }

    /// Apólices ATIVAS com vencimento até `until` (e a partir de `from`, se houver).
    ///
    /// É só o recorte grosso no banco; a classificação fina é feita em memória.
    pub async fn list_active_ending_between<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        until: NaiveDate,
    ) -> Result<Vec<PolicyWithCustomer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{POLICY_WITH_CUSTOMER}
             WHERE p.tenant_id = $1
               AND p.status = 'ACTIVE'
               AND ($2::date IS NULL OR p.end_date >= $2)
               AND p.end_date <= $3
             ORDER BY p.end_date ASC, p.policy_number ASC"
        );

        let policies = sqlx::query_as::<_, PolicyWithCustomer>(&sql)
            .bind(tenant_id)
            .bind(from)
            .bind(until)
            .fetch_all(executor)
            .await?;

        Ok(policies)
    }
}
