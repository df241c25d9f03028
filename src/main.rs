// Weibo Sentiment Server - comment CRUD and topic statistics over HTTP

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use weibo_sentiment::{api::create_app, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let default_filter = match (config.app.debug, config.database.echo) {
        (_, true) => "info,sqlx=debug",
        (true, false) => "debug",
        (false, false) => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    info!("🚀 {} starting", config.app.name);

    // Initialize application state and import the data file if present
    let app_state = AppState::new(config.clone()).await?;
    app_state.load_initial_data().await;

    let db = app_state.db.clone();
    let app = create_app(app_state);

    // Start server
    let addr = config.server_address();
    info!("🌐 Listening on http://{}", addr);
    info!("📋 API:");
    info!("  GET    /api/stats           - Sentiment statistics");
    info!("  GET    /api/comments        - List comments (skip, limit, sentiment)");
    info!("  GET    /api/comments/{{id}}   - Get comment");
    info!("  POST   /api/comments        - Add comment (content, sentiment)");
    info!("  DELETE /api/comments/{{id}}   - Delete comment");
    info!("  POST   /api/reload          - Reload data file");
    info!("  DELETE /api/all             - Delete all data");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    db.close().await;
    Ok(())
}
