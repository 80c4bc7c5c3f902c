pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod notifications;
pub mod policies;
pub mod tenancy;
