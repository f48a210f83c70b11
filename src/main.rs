use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use contacts_api::cli::Cli;
use contacts_api::config::{AppConfig, StoreBackend};
use contacts_api::database::{DatabaseManager, EntityStore, MemoryStore, PgStore};
use contacts_api::validation::RulesTable;
use contacts_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config: AppConfig = contacts_api::config::config().clone();
    cli.apply(&mut config);

    init_tracing(&config);
    info!("Starting contacts API in {:?} mode", config.environment);

    // Built once; handlers only ever read it
    let rules = Arc::new(RulesTable::for_today().context("invalid validation rules")?);

    let store: Arc<dyn EntityStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let app = app(AppState::new(store, rules), &config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Contacts API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let default_filter = if config.api.enable_request_logging {
        "contacts_api=info,tower_http=info"
    } else {
        "contacts_api=info,tower_http=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
