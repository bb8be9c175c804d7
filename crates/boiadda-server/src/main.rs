//! # boiadda-server
//!
//! REST API server for the BoiAdda community library.
//!
//! This binary provides:
//! - **Bearer-token auth** (register / login / logout / me)
//! - **Catalog browsing** with per-user availability flags
//! - **The lending workflow**: borrow and donation requests, admin
//!   approve/reject queues, returns
//! - **Notifications** for request decisions
//! - **Dashboard feeds**: recent activity and per-user statistics

mod api;
mod auth;
mod config;
mod error;
mod routes;
mod seed;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use boiadda_lending::Lending;
use boiadda_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,boiadda_server=debug")),
        )
        .init();

    info!("Starting BoiAdda library server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database and seed demo data on first run
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?;

    if config.seed_demo_data {
        if db.count_users()? == 0 {
            seed::seed_demo_data(&db)?;
        } else {
            info!("Database already contains data, skipping demo seed");
        }
    }

    let lending = Arc::new(Lending::with_loan_period(db, config.loan_period_days));

    let app_state = AppState {
        lending: lending.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic session cleanup (hourly, drop expired bearer sessions)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let purged = lending
                .database()
                .and_then(|db| db.delete_expired_sessions(chrono::Utc::now()).map_err(Into::into));
            match purged {
                Ok(removed) if removed > 0 => {
                    info!(removed, "expired sessions purged");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "session cleanup failed"),
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
