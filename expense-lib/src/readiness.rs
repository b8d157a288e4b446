//! Waits for the database to accept connections before anything else starts.
//!
//! Attempts are sequential with a fixed delay and no backoff. Each attempt opens its own
//! connection, runs `SELECT 1` and closes it again.

use crate::config::DbEnvConfig;
use async_trait::async_trait;
use expense_repo::sqlx_repo::probe_connection;
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 30,
            interval: Duration::from_secs(2),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Database still unreachable after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    async fn probe(&self) -> Result<(), anyhow::Error>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct ActixSleeper;

#[async_trait]
impl Sleeper for ActixSleeper {
    async fn sleep(&self, duration: Duration) {
        actix_rt::time::sleep(duration).await
    }
}

pub struct PgProbe {
    options: PgConnectOptions,
}

impl PgProbe {
    pub fn new(config: &DbEnvConfig) -> PgProbe {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);
        PgProbe { options }
    }
}

#[async_trait]
impl DatabaseProbe for PgProbe {
    async fn probe(&self) -> Result<(), anyhow::Error> {
        probe_connection(&self.options).await
    }
}

/// Returns the number of attempts it took to reach the database.
pub async fn wait_for_database(
    probe: &dyn DatabaseProbe,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<u32, ProbeError> {
    let mut last_error = String::from("no attempt made");
    for attempt in 1..=policy.max_attempts {
        match probe.probe().await {
            Ok(()) => {
                info!(attempt, "Database is reachable");
                return Ok(attempt);
            }
            Err(e) => {
                last_error = format!("{:#}", e);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %last_error,
                    "Database not reachable"
                );
            }
        }
        if attempt < policy.max_attempts {
            sleeper.sleep(policy.interval).await;
        }
    }
    Err(ProbeError::Exhausted {
        attempts: policy.max_attempts,
        last_error,
    })
}
