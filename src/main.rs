use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

mod config;
mod dashboard;
mod db;
mod sizing;

use config::Config;
use dashboard::AppState;
use db::Database;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let defaults = config.default_adjustment();
    info!(
        "Default risk adjustment: {:.2}x Kelly, cap {:.1}% of capital",
        defaults.fraction_multiplier,
        defaults.max_position_fraction * 100.0
    );

    // Open trade journal
    let db = Database::open(&config.database_path)?;
    info!(
        "Trade journal opened: {} ({} trades)",
        config.database_path,
        db.list_trades()?.len()
    );

    let app = dashboard::router(AppState {
        db,
        defaults,
        locale: config.locale,
    });
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Calculator listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
