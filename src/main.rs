use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blog_api::config;
use blog_api::database::DatabaseManager;
use blog_api::AppState;

#[derive(Parser)]
#[command(name = "blog-api")]
#[command(about = "Blog API - posts and comments over HTTP")]
#[command(version)]
struct Cli {
    #[arg(long, env = "BLOG_API_HOST", default_value = "0.0.0.0", help = "Address to bind")]
    host: String,

    #[arg(long, env = "BLOG_API_PORT", help = "Port to listen on (falls back to PORT, then 3000)")]
    port: Option<u16>,

    #[arg(long, help = "Create the database tables and exit")]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blog_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = config::config().clone();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Blog API in {:?} mode", config.environment);

    if cli.migrate_only {
        DatabaseManager::migrate(&config.database)
            .await
            .context("schema migration failed")?;
        tracing::info!("Migration complete");
        return Ok(());
    }

    let store = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the store")?;
    let app = blog_api::app(AppState::new(store, config));

    let port = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()))
        .unwrap_or(3000);

    let bind_addr = format!("{}:{}", cli.host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Blog API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
