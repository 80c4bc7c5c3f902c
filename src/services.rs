pub mod auth;
pub mod crm_service;
pub mod dashboard_service;
pub mod pipeline;
pub mod policy_service;
pub mod reminder_service;
pub mod renewal;
pub mod tenancy_service;
pub mod whatsapp;
