pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod policy_repo;
pub use policy_repo::PolicyRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
