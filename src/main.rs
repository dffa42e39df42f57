use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use schoolhub_api::config::{config, StoreBackend};
use schoolhub_api::database::{DatabaseManager, DocumentStore, MemoryStore, PgDocumentStore, Repositories};
use schoolhub_api::services::MediaStorage;
use schoolhub_api::AppState;

#[derive(Parser)]
#[command(name = "schoolhub-api")]
#[command(about = "School management backend API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Address to bind (overrides SERVER_HOST)")]
    host: Option<String>,

    #[arg(long, short, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, value_enum, help = "Document store backend (overrides STORE_BACKEND)")]
    store: Option<StoreBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are visible to the config
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = config();
    tracing::info!("Starting SchoolHub API in {:?} mode", config.environment);

    let backend = args.store.unwrap_or(config.database.backend);
    let store: Arc<dyn DocumentStore> = match backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            DatabaseManager::migrate(&pool)
                .await
                .context("failed to create collection tables")?;
            Arc::new(PgDocumentStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let media = MediaStorage::new(config.media.uploads_dir.clone());
    tokio::fs::create_dir_all(media.root())
        .await
        .with_context(|| format!("failed to create uploads directory {}", media.root().display()))?;

    let state = AppState::new(Repositories::new(store), media);
    let app = schoolhub_api::app(state);

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("SchoolHub API listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
