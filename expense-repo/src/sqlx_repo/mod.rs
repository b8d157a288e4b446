mod category_repo;
mod expense_repo;
mod migrator;
mod product_repo;
mod promotion_repo;
mod user_repo;

pub use migrator::SQLxMigrator;

use crate::{HealthCheck, Repos};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, Pool, Postgres};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct SQLxRepo {
    pool: Pool<Postgres>,
}

impl SQLxRepo {
    pub fn new(pool: Pool<Postgres>) -> SQLxRepo {
        SQLxRepo { pool }
    }
}

pub async fn create_pool(
    database_url: &str,
    max_pool_size: u32,
) -> Result<Pool<Postgres>, anyhow::Error> {
    let options = PgConnectOptions::from_str(database_url).context("Invalid database url")?;
    let pool = PgPoolOptions::new()
        .max_connections(max_pool_size)
        .connect_with(options)
        .await
        .context("Unable to connect to database")?;
    info!(max_pool_size, "Database pool created");
    Ok(pool)
}

pub fn create_repos(pool: Pool<Postgres>) -> Repos {
    Repos::from_store(Arc::new(SQLxRepo::new(pool)))
}

/// Opens a single connection, runs a trivial query and closes the connection again.
#[instrument(skip(options), fields(host = options.get_host(), port = options.get_port()))]
pub async fn probe_connection(options: &PgConnectOptions) -> Result<(), anyhow::Error> {
    let mut connection = PgConnection::connect_with(options)
        .await
        .context("Unable to connect to database")?;
    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&mut connection)
        .await
        .context("Unable to query database");
    if let Err(e) = connection.close().await {
        warn!(error = %e, "Unable to close probe connection");
    }
    result.map(|_| ())
}

#[async_trait]
impl HealthCheck for SQLxRepo {
    async fn check(&self) -> bool {
        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(e) if e.is_unique_violation())
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(e) if e.is_foreign_key_violation())
}

/// Name of the constraint a database error was raised for, if any
fn violated_constraint(error: &sqlx::Error) -> Option<&str> {
    match error {
        sqlx::Error::Database(e) => e.constraint(),
        _ => None,
    }
}
