// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CrmRepository, DashboardRepository, NotificationRepository, PolicyRepository,
        TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        crm_service::CrmService,
        dashboard_service::DashboardService,
        policy_service::PolicyService,
        reminder_service::ReminderService,
        tenancy_service::TenantService,
        whatsapp::{MessageSender, WhatsAppClient, WhatsAppConfig},
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
const DEFAULT_COUNTRY_CODE: &str = "91";
const DEFAULT_WHATSAPP_API_URL: &str = "https://graph.facebook.com/v19.0";

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub cron_secret: String,
    pub timezone: Tz,
    pub default_country_code: String,
    pub whatsapp: WhatsAppConfig,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let cron_secret = env::var("CRON_SECRET").context("CRON_SECRET deve ser definido")?;

        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {raw}"))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let tz_name = var_or("APP_TIMEZONE", DEFAULT_TIMEZONE);
        let timezone: Tz = tz_name
            .parse()
            .map_err(|e| anyhow::anyhow!("APP_TIMEZONE inválido ({tz_name}): {e}"))?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: var_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            db_max_connections,
            cron_secret,
            timezone,
            default_country_code: var_or("DEFAULT_COUNTRY_CODE", DEFAULT_COUNTRY_CODE),
            whatsapp: WhatsAppConfig {
                api_url: var_or("WHATSAPP_API_URL", DEFAULT_WHATSAPP_API_URL),
                phone_number_id: non_empty_var("WHATSAPP_PHONE_NUMBER_ID"),
                access_token: non_empty_var("WHATSAPP_TOKEN"),
            },
            cookie_secure: var_or("COOKIE_SECURE", "false").eq_ignore_ascii_case("true"),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    non_empty_var(key).unwrap_or_else(|| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: I18nStore,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub crm_service: CrmService,
    pub policy_service: PolicyService,
    pub dashboard_service: DashboardService,
    pub reminder_service: ReminderService,
    pub notification_repo: NotificationRepository,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        if config.whatsapp.phone_number_id.is_none() || config.whatsapp.access_token.is_none() {
            tracing::warn!("⚠️ WhatsApp sem credenciais: os lembretes serão registrados como FAILED");
        }

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new();
        let policy_repo = PolicyRepository::new();
        let dashboard_repo = DashboardRepository::new();
        let notification_repo = NotificationRepository::new(db_pool.clone());

        let sender: Arc<dyn MessageSender> = Arc::new(WhatsAppClient::new(config.whatsapp.clone())?);

        let auth_service =
            AuthService::new(user_repo.clone(), config.jwt_secret.clone(), db_pool.clone());
        let tenant_service = TenantService::new(tenant_repo, user_repo, db_pool.clone());
        let crm_service = CrmService::new(crm_repo.clone());
        let policy_service = PolicyService::new(policy_repo.clone(), crm_repo, config.timezone);
        let dashboard_service = DashboardService::new(dashboard_repo, policy_repo, config.timezone);
        let reminder_service = ReminderService::new(
            notification_repo.clone(),
            sender,
            config.timezone,
            config.default_country_code.clone(),
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: I18nStore::builtin().clone(),
            auth_service,
            tenant_service,
            crm_service,
            policy_service,
            dashboard_service,
            reminder_service,
            notification_repo,
        })
    }
}
