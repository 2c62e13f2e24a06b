//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
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

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, ingest_key_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Estrutura física do prédio (protegida pelo JWT)
    let building_routes = Router::new()
        .route("/{building_id}/floors", post(handlers::buildings::create_floor))
        .route(
            "/{building_id}/zones",
            post(handlers::buildings::create_zone).get(handlers::buildings::list_zones),
        )
        .route(
            "/{building_id}/zones/{zone_id}/geometry",
            patch(handlers::buildings::update_zone_geometry),
        )
        .route("/{building_id}/doors", post(handlers::buildings::create_regular_door))
        .route("/{building_id}/doors/entrance", post(handlers::buildings::create_entrance_door))
        .route("/{building_id}/doors/{door_id}", delete(handlers::buildings::delete_door))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let organization_routes = Router::new()
        .route("/{organization_id}/buildings", post(handlers::buildings::create_building))
        // RFID
        .route("/{organization_id}/readers", post(handlers::rfid::create_reader))
        .route("/{organization_id}/readers/{reader_id}/door", put(handlers::rfid::attach_reader))
        .route("/{organization_id}/tags", post(handlers::rfid::create_tag))
        .route("/{organization_id}/tags/{tag_id}/assignments", post(handlers::rfid::assign_tag))
        // Regras
        .route("/{organization_id}/rules", post(handlers::rules::create_rule))
        .route("/{organization_id}/rules/{rule_id}/zones", post(handlers::rules::attach_rule))
        .route(
            "/{organization_id}/rule-assignments/{assignment_id}",
            delete(handlers::rules::detach_rule),
        )
        .route(
            "/{organization_id}/rule-assignments/{assignment_id}/positions/{position_id}",
            post(handlers::rules::add_position).delete(handlers::rules::remove_position),
        )
        // Notificações e localização
        .route("/{organization_id}/notifications", get(handlers::notifications::list_notifications))
        .route(
            "/{organization_id}/notifications/{notification_id}/read",
            patch(handlers::notifications::mark_read),
        )
        .route(
            "/{organization_id}/employees/{employee_id}/zone",
            get(handlers::scans::get_employee_zone),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Ponte dos leitores RFID (chave compartilhada)
    let scan_routes = Router::new()
        .route("/api/scans", post(handlers::scans::ingest_scan))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), ingest_key_guard));

    // Verificação periódica de tempo em zona
    let _sweeper = app_state.time_limit_sweeper.clone().spawn(settings.sweep_interval);

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/buildings", building_routes)
        .nest("/api/organizations", organization_routes)
        .merge(scan_routes)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
