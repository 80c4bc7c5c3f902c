// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    models::tenancy::{MyTenant, Tenant, TenantMember, UserRole},
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { tenant_repo, user_repo, pool }
    }

    /// Cria a corretora e, na mesma transação, torna o criador seu ADMIN.
    pub async fn create_tenant_with_owner(
        &self,
        name: &str,
        owner_id: Uuid,
    ) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        let tenant = self.tenant_repo.create_tenant(&mut *tx, name.trim()).await?;

        self.tenant_repo
            .add_member(&mut *tx, tenant.id, owner_id, UserRole::Admin)
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant.id, %owner_id, "🏢 Corretora criada");
        Ok(tenant)
    }

    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<MyTenant>, AppError> {
        self.tenant_repo.list_user_tenants(user_id).await
    }

    /// Vincula um usuário já cadastrado (buscado por e-mail) à corretora.
    pub async fn add_member_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<TenantMember, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.tenant_repo
            .add_member(&self.pool, tenant_id, user.id, role)
            .await
    }

    pub async fn find_active_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<TenantMember>, AppError> {
        self.tenant_repo.find_active_membership(user_id, tenant_id).await
    }
}
