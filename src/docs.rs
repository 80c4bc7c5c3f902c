// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::add_member,

        // --- CRM ---
        handlers::crm::create_customer,
        handlers::crm::list_customers,
        handlers::crm::get_customer,
        handlers::crm::update_stage,
        handlers::crm::update_approval,
        handlers::crm::create_call_log,
        handlers::crm::list_call_logs,
        handlers::crm::create_kyc_document,
        handlers::crm::list_kyc_documents,

        // --- Policies ---
        handlers::policies::create_policy,
        handlers::policies::list_policies,
        handlers::policies::renew_policy,
        handlers::policies::cancel_policy,
        handlers::policies::list_renewals,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_commissions,

        // --- Notifications ---
        handlers::notifications::run_reminders,
        handlers::notifications::list_logs,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- TENANCY ---
            models::tenancy::UserRole,
            models::tenancy::Tenant,
            models::tenancy::TenantMember,
            models::tenancy::MyTenant,
            models::tenancy::CreateTenantPayload,
            models::tenancy::AddMemberPayload,

            // --- CRM ---
            models::crm::LeadStage,
            models::crm::ApprovalStatus,
            models::crm::CallOutcome,
            models::crm::KycDocumentType,
            models::crm::Customer,
            models::crm::CallLog,
            models::crm::KycDocument,
            models::crm::CreateCustomerPayload,
            models::crm::UpdateStagePayload,
            models::crm::UpdateApprovalPayload,
            models::crm::CreateCallLogPayload,
            models::crm::CreateKycDocumentPayload,

            // --- Policies ---
            models::policy::PolicyStatus,
            models::policy::RenewalBucket,
            models::policy::Policy,
            models::policy::PolicyWithCustomer,
            models::policy::RenewalEntry,
            models::policy::CreatePolicyPayload,
            models::policy::RenewPolicyPayload,

            // --- DASHBOARD ---
            models::dashboard::StageCount,
            models::dashboard::RenewalCounts,
            models::dashboard::DashboardSummary,
            models::dashboard::CommissionReportRow,

            // --- Notifications ---
            models::notification::MessageType,
            models::notification::LogStatus,
            models::notification::WhatsAppLog,
            models::notification::SweepTally,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Tenancy", description = "Corretoras e Membros"),
        (name = "CRM", description = "Clientes, Funil, Ligações e KYC"),
        (name = "Policies", description = "Apólices e Renovações"),
        (name = "Dashboard", description = "Indicadores e Comissões"),
        (name = "Notifications", description = "Lembretes de WhatsApp")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
        // Mesmo formato Bearer, mas com o CRON_SECRET no lugar do JWT
        components.add_security_scheme(
            "cron_secret",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
