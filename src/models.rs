pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod notification;
pub mod policy;
pub mod tenancy;
