// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{MyTenant, Tenant, TenantMember, UserRole},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Vínculo ativo do usuário com a corretora (a checagem de autorização mais importante).
    pub async fn find_active_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<TenantMember>, AppError> {
        let member = sqlx::query_as::<_, TenantMember>(
            r#"
            SELECT * FROM tenant_members
            WHERE user_id = $1 AND tenant_id = $2 AND is_active = true
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    pub async fn create_tenant<'e, E>(&self, executor: E, name: &str) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name) VALUES ($1) RETURNING *",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<TenantMember, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TenantMember>(
            r#"
            INSERT INTO tenant_members (tenant_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::MemberAlreadyExists;
                }
            }
            e.into()
        })
    }

    /// Lista as corretoras às quais o usuário pertence, com o papel em cada uma.
    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<MyTenant>, AppError> {
        let tenants = sqlx::query_as::<_, MyTenant>(
            r#"
            SELECT t.id, t.name, tm.role
            FROM tenants t
            INNER JOIN tenant_members tm ON tm.tenant_id = t.id
            WHERE tm.user_id = $1 AND tm.is_active = true
            ORDER BY t.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }
}
