pub mod app;
pub mod error;
pub mod extractors;
pub mod handlers;

use anyhow::Result;
use tracing::info;

use crate::config::CatalogConfig;
use crate::database::setup_database;
use crate::services::AuthService;

pub async fn start_server(config: &CatalogConfig) -> Result<()> {
    let db = setup_database(&config.database).await?;

    let auth = AuthService::new(db.clone(), config.auth.clone());
    if auth.ensure_super_admin().await? {
        info!("Log in as 'superadmin' with the configured ADMIN_PASSWORD");
    }

    let state = app::AppState::new(db, &config.auth);
    let app = app::create_app(state, config.server.cors_origin.as_deref()).await?;

    log_routes(config.server.port);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server running on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes(port: u16) {
    info!("API Endpoints:");
    info!("  /health                     - Health check");
    info!("  /api-docs/openapi.json      - OpenAPI document");
    info!("  /api/v1/*                   - REST API (entities, relationships, tags, graph, admins, audit logs)");
    info!("  Base URL: http://localhost:{}", port);
}
