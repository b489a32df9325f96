#![allow(dead_code, unused)]
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Extension, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod api;
mod middleware;
mod utils;

use crate::config::Config;
use crate::db::queries::approval::ApprovalDoc;
use crate::db::queries::custom_flow::CustomFlowDoc;
use crate::db::queries::flow::FlowDoc;
use crate::db::queries::homebase::HomebaseDoc;
use crate::db::queries::reservoir::ReservoirDoc;
use crate::middleware::auth::{create_role_cache, jwt_middleware, role_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    Config::init();

    std::fs::create_dir_all("logs")?;
    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .with_writer(non_blocking)
        .init();

    let role_cache = create_role_cache();
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .idle_timeout(Duration::from_secs(30))
        .connect(&Config::get().database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let merged_doc = FlowDoc::openapi()
        .merge_from(CustomFlowDoc::openapi())
        .merge_from(ApprovalDoc::openapi())
        .merge_from(ReservoirDoc::openapi())
        .merge_from(HomebaseDoc::openapi());

    // Private routes: JWT first, then role loading.
    let private_routes = Router::new()
        .merge(api::flow::flow_routes())
        .merge(api::custom_flow::custom_flow_routes())
        .merge(api::approval::approval_routes())
        .merge(api::reservoir::reservoir_routes())
        .merge(api::homebase::homebase_routes())
        .route_layer(from_fn_with_state(pool.clone(), role_middleware))
        .route_layer(from_fn(jwt_middleware));

    let app = Router::new()
        .merge(api::health::health_routes())
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc).path("/rapidoc"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(role_cache.clone()))
        .with_state(pool.clone());

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    run_server(app, shutdown_tx, pool).await;
    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: broadcast::Receiver<()>, pool: PgPool) {
    tokio::select! {
        _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down..."),
        _ = shutdown_rx.recv() => info!("Received shutdown signal."),
    }
    info!("Closing database pool...");
    pool.close().await;
    info!("Database pool closed. Server shutting down.");
}

async fn run_server(app: Router, shutdown_tx: broadcast::Sender<()>, pool: PgPool) {
    let addr = SocketAddr::from(([127, 0, 0, 1], Config::get().server_port));
    info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    let shutdown_signal = shutdown_signal(shutdown_tx.subscribe(), pool.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .expect("Server encountered an error");
}
