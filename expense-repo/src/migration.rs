//! Schema migrations embedded in the binary, and the bookkeeping shared by migrators.
//!
//! Every migration lives in `migrations/<timestamp>_<name>/` with an `up.sql` and a `down.sql`.
//! Migrations are applied in timestamp order, each in its own transaction, and every attempt is
//! recorded in the `migrations_history` table.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Migration {
    pub timestamp: i64,
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

macro_rules! embed_migration {
    ($timestamp:literal, $name:literal) => {
        Migration {
            timestamp: $timestamp,
            name: $name,
            up: include_str!(concat!("../migrations/", $timestamp, "_", $name, "/up.sql")),
            down: include_str!(concat!("../migrations/", $timestamp, "_", $name, "/down.sql")),
        }
    };
}

const MIGRATIONS: &[Migration] = &[
    embed_migration!(20230901100000, "create_users"),
    embed_migration!(20230901100500, "create_expenses"),
    embed_migration!(20230914090000, "create_products"),
    embed_migration!(20230914091000, "create_categories"),
    embed_migration!(20230914092000, "create_product_categories"),
    embed_migration!(20231002080000, "create_promotions"),
    embed_migration!(20231002081000, "create_promotion_rules"),
    embed_migration!(20231002082000, "create_promotion_applicable_products"),
    embed_migration!(20231002083000, "create_promotion_applicable_categories"),
    embed_migration!(20231120150000, "categories_to_ancestor_tree"),
];

/// All known migrations, oldest first
pub fn migrations() -> Vec<Migration> {
    let mut migrations = MIGRATIONS.to_vec();
    migrations.sort_by_key(|m| m.timestamp);
    migrations
}

/// A row of `migrations_history`
#[derive(Clone, PartialEq, Debug)]
pub struct MigrationRecord {
    pub id: i64,
    pub timestamp: i64,
    pub name: String,
    pub executed_at: DateTime<Utc>,
    /// Milliseconds
    pub execution_time: i64,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct MigrationStatus {
    pub migration: Migration,
    pub applied: Option<MigrationRecord>,
}

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Migration {timestamp}_{name} failed: {message}")]
    MigrationFailed {
        timestamp: i64,
        name: &'static str,
        message: String,
    },
    #[error("Applied migration {timestamp}_{name} is not known to this build")]
    UnknownMigration { timestamp: i64, name: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Pairs every known migration with its successful history row, if any.
///
/// `applied` must only contain successful rows.
pub fn statuses(
    migrations: &[Migration],
    applied: &[MigrationRecord],
) -> Result<Vec<MigrationStatus>, MigrationError> {
    check_applied_known(migrations, applied)?;
    let statuses = migrations
        .iter()
        .map(|migration| MigrationStatus {
            migration: *migration,
            applied: applied
                .iter()
                .find(|r| r.timestamp == migration.timestamp)
                .cloned(),
        })
        .collect();
    Ok(statuses)
}

/// Migrations still to apply, oldest first, limited to `steps` when given.
pub fn pending<'a>(
    migrations: &'a [Migration],
    applied: &[MigrationRecord],
    steps: Option<usize>,
) -> Result<Vec<&'a Migration>, MigrationError> {
    check_applied_known(migrations, applied)?;
    let applied: HashSet<i64> = applied.iter().map(|r| r.timestamp).collect();
    let pending = migrations
        .iter()
        .filter(|m| !applied.contains(&m.timestamp))
        .take(steps.unwrap_or(usize::MAX))
        .collect();
    Ok(pending)
}

/// The `steps` most recently applied migrations, newest first.
pub fn to_revert<'a>(
    migrations: &'a [Migration],
    applied: &[MigrationRecord],
    steps: usize,
) -> Result<Vec<&'a Migration>, MigrationError> {
    check_applied_known(migrations, applied)?;
    let applied: HashSet<i64> = applied.iter().map(|r| r.timestamp).collect();
    let to_revert = migrations
        .iter()
        .rev()
        .filter(|m| applied.contains(&m.timestamp))
        .take(steps)
        .collect();
    Ok(to_revert)
}

fn check_applied_known(
    migrations: &[Migration],
    applied: &[MigrationRecord],
) -> Result<(), MigrationError> {
    let known: HashSet<i64> = migrations.iter().map(|m| m.timestamp).collect();
    match applied.iter().find(|r| !known.contains(&r.timestamp)) {
        Some(record) => Err(MigrationError::UnknownMigration {
            timestamp: record.timestamp,
            name: record.name.clone(),
        }),
        None => Ok(()),
    }
}
