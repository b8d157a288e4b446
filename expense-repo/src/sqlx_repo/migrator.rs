use crate::migration::{
    migrations, pending, statuses, to_revert, Migration, MigrationError, MigrationRecord,
    MigrationStatus,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{query, query_as, Connection, Executor, PgConnection, Pool, Postgres};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Key of the advisory lock held while migrations are applied or reverted
const MIGRATION_LOCK_KEY: i64 = 7_251_043_118;

const CREATE_HISTORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS migrations_history
(
    id             BIGSERIAL PRIMARY KEY,
    timestamp      BIGINT       NOT NULL,
    name           VARCHAR(255) NOT NULL,
    executed_at    TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    execution_time BIGINT       NOT NULL,
    success        BOOLEAN      NOT NULL,
    error_message  TEXT,
    created_at     TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    updated_at     TIMESTAMPTZ  NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS migrations_history_timestamp_idx ON migrations_history (timestamp);
"#;

#[derive(sqlx::FromRow)]
struct HistoryEntry {
    id: i64,
    timestamp: i64,
    name: String,
    executed_at: DateTime<Utc>,
    execution_time: i64,
    success: bool,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<HistoryEntry> for MigrationRecord {
    fn from(value: HistoryEntry) -> Self {
        MigrationRecord {
            id: value.id,
            timestamp: value.timestamp,
            name: value.name,
            executed_at: value.executed_at,
            execution_time: value.execution_time,
            success: value.success,
            error_message: value.error_message,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Applies and reverts the embedded migrations against a PostgreSQL database.
///
/// Everything a run does happens on the connection that holds the migration lock, so a pool
/// with a single connection is enough.
pub struct SQLxMigrator {
    pool: Pool<Postgres>,
}

impl SQLxMigrator {
    pub fn new(pool: Pool<Postgres>) -> SQLxMigrator {
        SQLxMigrator { pool }
    }

    async fn lock(&self) -> Result<PoolConnection<Postgres>, MigrationError> {
        let mut conn = self.pool.acquire().await.context("Unable to get connection")?;
        query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *conn)
            .await
            .context("Unable to acquire migration lock")?;
        Ok(conn)
    }

    async fn unlock(&self, mut conn: PoolConnection<Postgres>) {
        let result = query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *conn)
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Unable to release migration lock");
        }
    }

    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<Vec<MigrationStatus>, MigrationError> {
        let mut conn = self.pool.acquire().await.context("Unable to get connection")?;
        let applied = applied_records(&mut conn).await?;
        statuses(&migrations(), &applied)
    }

    /// Applies pending migrations in order, at most `steps` of them when given.
    /// Returns the migrations that were applied.
    #[instrument(skip(self))]
    pub async fn run_pending(&self, steps: Option<usize>) -> Result<Vec<Migration>, MigrationError> {
        let mut conn = self.lock().await?;
        let result = run_pending_locked(&mut conn, steps).await;
        self.unlock(conn).await;
        result
    }

    /// Reverts the `steps` most recently applied migrations, newest first.
    /// Returns the migrations that were reverted.
    #[instrument(skip(self))]
    pub async fn revert(&self, steps: usize) -> Result<Vec<Migration>, MigrationError> {
        let mut conn = self.lock().await?;
        let result = revert_locked(&mut conn, steps).await;
        self.unlock(conn).await;
        result
    }
}

async fn ensure_history_table(conn: &mut PgConnection) -> Result<(), MigrationError> {
    (&mut *conn)
        .execute(CREATE_HISTORY_TABLE)
        .await
        .context("Unable to create migrations_history table")?;
    Ok(())
}

/// Successful history rows, oldest first
async fn applied_records(conn: &mut PgConnection) -> Result<Vec<MigrationRecord>, MigrationError> {
    ensure_history_table(conn).await?;
    let entries: Vec<HistoryEntry> =
        query_as("SELECT * FROM migrations_history WHERE success ORDER BY timestamp, id")
            .fetch_all(&mut *conn)
            .await
            .context("Unable to read migrations_history")?;
    Ok(entries.into_iter().map(MigrationRecord::from).collect())
}

async fn run_pending_locked(
    conn: &mut PgConnection,
    steps: Option<usize>,
) -> Result<Vec<Migration>, MigrationError> {
    let migrations = migrations();
    let applied = applied_records(conn).await?;
    let pending = pending(&migrations, &applied, steps)?;
    if pending.is_empty() {
        info!("Database is up to date");
    }

    let mut done = Vec::with_capacity(pending.len());
    for migration in pending {
        apply(conn, migration).await?;
        done.push(*migration);
    }
    Ok(done)
}

#[instrument(skip(conn, migration), fields(timestamp = migration.timestamp, name = migration.name))]
async fn apply(conn: &mut PgConnection, migration: &Migration) -> Result<(), MigrationError> {
    let started = Instant::now();
    let mut tx = conn.begin().await.context("Unable to start transaction")?;

    let executed = (&mut *tx).execute(migration.up).await;
    match executed {
        Ok(_) => {
            record(&mut tx, migration, elapsed_millis(started), None).await?;
            tx.commit()
                .await
                .with_context(|| format!("Unable to commit migration {}", migration.name))?;
            info!(execution_time = elapsed_millis(started), "Migration applied");
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            error!(error = %message, "Migration failed");
            tx.rollback().await.context("Unable to roll back migration")?;

            record(conn, migration, elapsed_millis(started), Some(&message)).await?;
            Err(MigrationError::MigrationFailed {
                timestamp: migration.timestamp,
                name: migration.name,
                message,
            })
        }
    }
}

async fn revert_locked(
    conn: &mut PgConnection,
    steps: usize,
) -> Result<Vec<Migration>, MigrationError> {
    let migrations = migrations();
    let applied = applied_records(conn).await?;
    let to_revert = to_revert(&migrations, &applied, steps)?;

    let mut done = Vec::with_capacity(to_revert.len());
    for migration in to_revert {
        let mut tx = conn.begin().await.context("Unable to start transaction")?;
        let executed = (&mut *tx).execute(migration.down).await;
        if let Err(e) = executed {
            let message = e.to_string();
            error!(timestamp = migration.timestamp, error = %message, "Revert failed");
            tx.rollback().await.context("Unable to roll back revert")?;
            return Err(MigrationError::MigrationFailed {
                timestamp: migration.timestamp,
                name: migration.name,
                message,
            });
        }
        query("DELETE FROM migrations_history WHERE timestamp = $1 AND success")
            .bind(migration.timestamp)
            .execute(&mut *tx)
            .await
            .context("Unable to update migrations_history")?;
        tx.commit()
            .await
            .with_context(|| format!("Unable to commit revert of {}", migration.name))?;
        info!(timestamp = migration.timestamp, name = migration.name, "Migration reverted");
        done.push(*migration);
    }
    Ok(done)
}

async fn record(
    conn: &mut PgConnection,
    migration: &Migration,
    execution_time: i64,
    error_message: Option<&str>,
) -> Result<(), MigrationError> {
    query(
        "INSERT INTO migrations_history(timestamp, name, execution_time, success, error_message) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(migration.timestamp)
    .bind(migration.name)
    .bind(execution_time)
    .bind(error_message.is_none())
    .bind(error_message)
    .execute(conn)
    .await
    .context("Unable to record migration")?;
    Ok(())
}

fn elapsed_millis(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}
