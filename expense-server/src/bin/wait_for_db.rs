//! Blocks until the database named by the `DB_*` variables accepts connections.
//!
//! Exits with status 0 once a connection succeeds and 1 when the variables are missing or the
//! database is still unreachable after the last attempt.

use std::process::ExitCode;

use expense_lib::config::DbEnvConfig;
use expense_lib::readiness::{wait_for_database, ActixSleeper, PgProbe, RetryPolicy};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;

#[actix_web::main]
async fn main() -> ExitCode {
    let subscriber = registry::Registry::default()
        .with(LevelFilter::INFO)
        .with(tracing_subscriber::fmt::Layer::default());
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set up tracing: {}", e);
    }

    let config = match DbEnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Invalid database configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "Waiting for database"
    );

    let probe = PgProbe::new(&config);
    match wait_for_database(&probe, &RetryPolicy::default(), &ActixSleeper).await {
        Ok(attempts) => {
            info!(attempts, "Database is ready");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Giving up on database");
            ExitCode::FAILURE
        }
    }
}
