//! notegraph-api - HTTP API server for notegraph

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notegraph_api::{create_router, ApiConfig, AppState, LogFormat};
use notegraph_db::{log_pool_metrics, Database, PoolConfig};
use notegraph_links::LinkService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "notegraph_api=debug,notegraph_links=info,tower_http=debug")
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notegraph_api=debug,notegraph_links=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = config.log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notegraph-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if config.log_format == LogFormat::Json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // no ANSI in files unless asked for
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(config.log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if config.log_format == LogFormat::Json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = config.log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = ?config.log_format,
        log_file = config.log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Connect to database
    info!("Connecting to database...");
    let pool_config = PoolConfig::new().max_connections(config.db_max_connections);
    let db = Database::connect_with_config(&config.database_url, pool_config).await?;
    log_pool_metrics(db.pool());
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let state = AppState::new(LinkService::new(db.store()));
    let app = create_router(state);

    // Start server
    let addr = config.socket_addr()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
