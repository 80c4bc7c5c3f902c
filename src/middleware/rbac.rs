// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    models::tenancy::{TenantMember, UserRole},
};

/// 1. O Trait que define um conjunto de papéis autorizados
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];
}

/// 2. O Extractor (Guardião). Depende do TenantMember deixado pelo tenant_guard.
pub struct RequireRole<T>(pub PhantomData<T>);

pub fn role_allows(role: UserRole, allowed: &[UserRole]) -> bool {
    allowed.contains(&role)
}

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let member = parts
            .extensions
            .get::<TenantMember>()
            .ok_or(AppError::TenantAccessDenied)?;

        if !role_allows(member.role, T::allowed()) {
            let required = T::allowed()
                .iter()
                .map(|r| format!("{r:?}").to_uppercase())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::Forbidden(required));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS CONJUNTOS DE PAPÉIS
// ---

/// Qualquer membro ativo (leitura).
pub struct AnyMember;
impl RoleDef for AnyMember {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::Agent, UserRole::Auditor]
    }
}

/// Quem pode alterar dados do dia a dia. Auditor é somente leitura.
pub struct Writer;
impl RoleDef for Writer {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::Agent]
    }
}

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::Admin]
    }
}

/// Relatórios e trilha de envios.
pub struct Reviewer;
impl RoleDef for Reviewer {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::Auditor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auditor_is_read_only() {
        assert!(role_allows(UserRole::Auditor, AnyMember::allowed()));
        assert!(role_allows(UserRole::Auditor, Reviewer::allowed()));
        assert!(!role_allows(UserRole::Auditor, Writer::allowed()));
    }

    #[test]
    fn agent_writes_but_does_not_review() {
        assert!(role_allows(UserRole::Agent, Writer::allowed()));
        assert!(!role_allows(UserRole::Agent, Reviewer::allowed()));
        assert!(!role_allows(UserRole::Agent, AdminOnly::allowed()));
    }

    #[test]
    fn admin_can_do_everything() {
        for set in [AnyMember::allowed(), Writer::allowed(), AdminOnly::allowed(), Reviewer::allowed()] {
            assert!(role_allows(UserRole::Admin, set));
        }
    }
}
