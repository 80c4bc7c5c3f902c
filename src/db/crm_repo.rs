// src/db/crm_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{
        ApprovalStatus, CallLog, CreateCallLogPayload, CreateCustomerPayload,
        CreateKycDocumentPayload, Customer, KycDocument, LeadStage,
    },
    services::pipeline::StageUpdate,
};

// Todas as operações recebem o executor (pool ou transação) de quem chama.
#[derive(Clone, Default)]
pub struct CrmRepository;

impl CrmRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CLIENTES / LEADS
    // =========================================================================

    /// Cria o cliente já como lead (etapa LEAD, aprovação PENDING).
    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        agent_id: Uuid,
        input: &CreateCustomerPayload,
        lead_date: DateTime<Utc>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                tenant_id, assigned_agent_id, full_name, phone, email,
                birth_date, address, notes, lead_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(agent_id)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.birth_date)
        .bind(&input.address)
        .bind(&input.notes)
        .bind(lead_date)
        .fetch_one(executor)
        .await?;

        Ok(customer)
    }

    /// Lista com filtros opcionais de etapa e aprovação (NULL = sem filtro).
    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        stage: Option<LeadStage>,
        approval: Option<ApprovalStatus>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE tenant_id = $1
              AND ($2::lead_stage IS NULL OR stage = $2)
              AND ($3::approval_status IS NULL OR approval_status = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(stage)
        .bind(approval)
        .fetch_all(executor)
        .await?;

        Ok(customers)
    }

    pub async fn find_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }

    /// Grava o resultado do motor de etapas numa única atualização atômica.
    ///
    /// O COALESCE garante, também no banco, que uma data já gravada nunca é
    /// sobrescrita (dois agentes movendo o mesmo lead ao mesmo tempo).
    pub async fn apply_stage_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        update: &StageUpdate,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET stage = $3,
                pitched_date = COALESCE(pitched_date, $4),
                interested_date = COALESCE(interested_date, $5),
                converted_date = COALESCE(converted_date, $6),
                lost_date = COALESCE(lost_date, $7),
                lost_reason = COALESCE($8, lost_reason),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(update.stage)
        .bind(update.pitched_date)
        .bind(update.interested_date)
        .bind(update.converted_date)
        .bind(update.lost_date)
        .bind(&update.lost_reason)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }

    pub async fn set_approval_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET approval_status = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }

    // =========================================================================
    //  LIGAÇÕES
    // =========================================================================

    pub async fn create_call_log<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        agent_id: Uuid,
        input: &CreateCallLogPayload,
    ) -> Result<CallLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, CallLog>(
            r#"
            INSERT INTO call_logs (tenant_id, customer_id, agent_id, outcome, notes, follow_up_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(agent_id)
        .bind(input.outcome)
        .bind(&input.notes)
        .bind(input.follow_up_date)
        .fetch_one(executor)
        .await?;

        Ok(log)
    }

    pub async fn list_call_logs<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<CallLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let logs = sqlx::query_as::<_, CallLog>(
            r#"
            SELECT * FROM call_logs
            WHERE tenant_id = $1 AND customer_id = $2
            ORDER BY called_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

        Ok(logs)
    }

    // =========================================================================
    //  DOCUMENTOS KYC
    // =========================================================================

    pub async fn create_kyc_document<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        uploaded_by: Uuid,
        input: &CreateKycDocumentPayload,
    ) -> Result<KycDocument, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let doc = sqlx::query_as::<_, KycDocument>(
            r#"
            INSERT INTO kyc_documents (tenant_id, customer_id, document_type, document_number, file_url, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(input.document_type)
        .bind(&input.document_number)
        .bind(&input.file_url)
        .bind(uploaded_by)
        .fetch_one(executor)
        .await?;

        Ok(doc)
    }

    pub async fn list_kyc_documents<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<KycDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let docs = sqlx::query_as::<_, KycDocument>(
            r#"
            SELECT * FROM kyc_documents
            WHERE tenant_id = $1 AND customer_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

        Ok(docs)
    }
}
