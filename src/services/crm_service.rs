// src/services/crm_service.rs

use chrono::Utc;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CrmRepository,
    models::crm::{
        ApprovalStatus, CallLog, CreateCallLogPayload, CreateCustomerPayload,
        CreateKycDocumentPayload, Customer, KycDocument, LeadStage,
    },
    services::pipeline::{apply_stage_transition, LeadTimeline},
};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  1. CLIENTES / LEADS
    // =========================================================================

    /// Todo cliente nasce como lead do agente que o cadastrou.
    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        agent_id: Uuid,
        input: &CreateCustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .create_customer(executor, tenant_id, agent_id, input, Utc::now())
            .await
    }

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
        self.repo.list_customers(executor, tenant_id, stage, approval).await
    }

    pub async fn get_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_customer(executor, tenant_id, customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    /// Move o lead para `target`, carimbando a data da etapa na primeira chegada.
    pub async fn change_stage<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        target: LeadStage,
        lost_reason: Option<&str>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_customer(&mut *tx, tenant_id, customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        let update = apply_stage_transition(
            &LeadTimeline::from(&current),
            target,
            lost_reason,
            Utc::now(),
        );

        let updated = self
            .repo
            .apply_stage_update(&mut *tx, tenant_id, customer_id, &update)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        tx.commit().await?;

        tracing::debug!(
            %customer_id,
            from = ?current.stage,
            to = ?updated.stage,
            "Etapa do lead atualizada"
        );

        Ok(updated)
    }

    pub async fn set_approval<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .set_approval_status(executor, tenant_id, customer_id, status)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    // =========================================================================
    //  2. LIGAÇÕES
    // =========================================================================

    pub async fn log_call<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        agent_id: Uuid,
        input: &CreateCallLogPayload,
    ) -> Result<CallLog, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.ensure_customer(&mut *conn, tenant_id, customer_id).await?;
        self.repo
            .create_call_log(&mut *conn, tenant_id, customer_id, agent_id, input)
            .await
    }

    pub async fn list_calls<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<CallLog>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.ensure_customer(&mut *conn, tenant_id, customer_id).await?;
        self.repo.list_call_logs(&mut *conn, tenant_id, customer_id).await
    }

    // =========================================================================
    //  3. DOCUMENTOS KYC
    // =========================================================================

    /// Registra um documento já enviado ao storage (aqui só guardamos a URL).
    pub async fn add_kyc_document<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        uploaded_by: Uuid,
        input: &CreateKycDocumentPayload,
    ) -> Result<KycDocument, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.ensure_customer(&mut *conn, tenant_id, customer_id).await?;
        self.repo
            .create_kyc_document(&mut *conn, tenant_id, customer_id, uploaded_by, input)
            .await
    }

    pub async fn list_kyc_documents<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<KycDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.ensure_customer(&mut *conn, tenant_id, customer_id).await?;
        self.repo.list_kyc_documents(&mut *conn, tenant_id, customer_id).await
    }

    // 404 em vez de lista vazia quando o cliente não é desta corretora
    async fn ensure_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_customer(executor, tenant_id, customer_id)
            .await?
            .map(|_| ())
            .ok_or(AppError::CustomerNotFound)
    }
}
