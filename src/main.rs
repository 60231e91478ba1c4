use axum::middleware::from_fn;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use reelgraph::api::{create_router, AppState};
use reelgraph::config::{Config, StorageBackend};
use reelgraph::db::Storage;
use reelgraph::middleware::request_id::{assign_request_id, request_span};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let storage = match config.storage {
        StorageBackend::Memory => {
            tracing::info!("using in-memory storage");
            Storage::in_memory()
        }
        StorageBackend::Postgres => {
            tracing::info!("using postgres storage");
            Storage::postgres(&config.database_url).await?
        }
    };

    let state = AppState::new(storage);
    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(from_fn(assign_request_id))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(host = %config.host, port = config.port, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
