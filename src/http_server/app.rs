use std::sync::Arc;

use axum::Router;
#[cfg(not(debug_assertions))]
use axum::http::Method;
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::{
    database::Database,
    http_server::{
        http_routes::{artists, shows, venues},
        state::AppState,
    },
    ports::clock::SystemClock,
};

pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub database: Database,
}

pub fn router(app_state: Arc<AppState>) -> Router {
    #[cfg(debug_assertions)]
    let cors_layer = CorsLayer::permissive();

    // Same-origin only in release builds
    #[cfg(not(debug_assertions))]
    let cors_layer = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::DELETE]);

    Router::new()
        .merge(venues::router())
        .merge(artists::router())
        .merge(shows::router())
        .layer(ServiceBuilder::new().layer(cors_layer))
        .with_state(app_state)
}

pub async fn start(
    HttpServerConfig {
        host,
        port,
        database,
    }: HttpServerConfig,
) -> color_eyre::Result<()> {
    let db = Arc::new(database);
    let app_state = Arc::new(AppState {
        db: db.clone(),
        clock: Arc::new(SystemClock),
    });

    let app = router(app_state);

    let address = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .wrap_err_with(|| eyre!("Failed to bind to {}", address))?;
    log::info!("Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to start HTTP server")?;
    log::info!("HTTP server stopped");

    match Arc::try_unwrap(db) {
        Ok(database) => database.close().await?,
        Err(_) => log::warn!("Database still shared at shutdown, skipping explicit close"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
