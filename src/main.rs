// src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env().context("Falha ao carregar a configuração")?;
    let bind_addr = config.bind_addr.clone();

    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {bind_addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    // Rotas de usuário (só autenticação)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let tenancy_routes = Router::new()
        .route(
            "/api/tenants",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Daqui para baixo tudo exige x-tenant-id + vínculo ativo
    let tenant_member_routes = Router::new()
        .route("/api/tenants/members", post(handlers::tenancy::add_member))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let crm_routes = Router::new()
        .route(
            "/customers",
            post(handlers::crm::create_customer).get(handlers::crm::list_customers),
        )
        .route("/customers/{id}", get(handlers::crm::get_customer))
        .route("/customers/{id}/stage", patch(handlers::crm::update_stage))
        .route("/customers/{id}/approval", patch(handlers::crm::update_approval))
        .route(
            "/customers/{id}/calls",
            post(handlers::crm::create_call_log).get(handlers::crm::list_call_logs),
        )
        .route(
            "/customers/{id}/documents",
            post(handlers::crm::create_kyc_document).get(handlers::crm::list_kyc_documents),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let policy_routes = Router::new()
        .route(
            "/api/policies",
            post(handlers::policies::create_policy).get(handlers::policies::list_policies),
        )
        .route("/api/policies/{id}/renew", post(handlers::policies::renew_policy))
        .route("/api/policies/{id}/cancel", post(handlers::policies::cancel_policy))
        .route("/api/renewals", get(handlers::policies::list_renewals))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .route("/commissions", get(handlers::dashboard::get_commissions))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let notification_routes = Router::new()
        .route("/logs", get(handlers::notifications::list_logs))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        // O cron se autentica com o CRON_SECRET, não com JWT
        .route("/api/cron/reminders", post(handlers::notifications::run_reminders))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .merge(tenancy_routes)
        .merge(tenant_member_routes)
        .nest("/api/crm", crm_routes)
        .merge(policy_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/notifications", notification_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Sem o handler o servidor só para quando o processo for morto
        tracing::error!(error = %e, "Falha ao instalar o handler de Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Encerrando o servidor");
}
