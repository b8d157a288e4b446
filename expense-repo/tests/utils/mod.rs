pub mod generator;
pub mod test_user;

use expense_repo::sqlx_repo::SQLxMigrator;
use expense_repo::Repos;
use serde::Deserialize;
use std::fs;
use tracing::warn;

#[derive(Deserialize)]
pub struct TestConfig {
    pub database_url: String,
    /// Scratch database that migrations are applied to and reverted from
    pub migration_database_url: Option<String>,
}

#[derive(Debug)]
pub enum RepoType {
    SQLx,
    Mem,
}

#[allow(dead_code)]
pub fn test_config() -> Option<TestConfig> {
    let Ok(config) = fs::read_to_string("config_test.toml") else {
        warn!("config_test.toml not found, skipping database tests");
        return None;
    };
    Some(toml::from_str(config.as_str()).unwrap())
}

/// Returns `None` for database backed repos when no test database is configured.
pub async fn build_repos(repo_type: RepoType) -> Option<Repos> {
    match repo_type {
        RepoType::SQLx => {
            let config = test_config()?;
            let pool = expense_repo::sqlx_repo::create_pool(&config.database_url, 5)
                .await
                .unwrap();
            SQLxMigrator::new(pool.clone())
                .run_pending(None)
                .await
                .unwrap();
            Some(expense_repo::sqlx_repo::create_repos(pool))
        }
        RepoType::Mem => Some(expense_repo::mem_repo::create_repos()),
    }
}
