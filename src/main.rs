use anyhow::Context;
use leadledger::{api, BillingService, Config, InMemoryRepository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let repo = match &config.seed_path {
        Some(path) => {
            let repo = InMemoryRepository::load_seed(path)
                .await
                .with_context(|| format!("Failed to load seed {}", path.display()))?;
            tracing::info!("Seeded deals from {}", path.display());
            repo
        }
        None => {
            tracing::info!("No SEED_PATH set, starting with an empty ledger");
            InMemoryRepository::new()
        }
    };

    let service = Arc::new(BillingService::new(Arc::new(repo), config));
    let app = api::create_router(api::AppState::new(service));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
