use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use std::{env, fs};

#[derive(Deserialize, Clone, PartialEq, Debug)]
pub struct SSLConfig {
    pub private_key_file: PathBuf,
    pub certificate_chain_file: PathBuf,
}

#[derive(Deserialize, Clone, PartialEq, Debug)]
pub struct Config {
    pub database_url: String,
    pub signups_enabled: bool,
    /// Traces are only exported when this is set
    pub honeycomb_api_key: Option<String>,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub ssl: Option<SSLConfig>,
}

fn default_max_pool_size() -> u32 {
    10
}

fn default_run_migrations() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_owned()
}

impl Config {
    pub fn from_file(path: PathBuf) -> Result<Config, anyhow::Error> {
        let config = fs::read_to_string(path).context("Unable to read config file")?;
        Config::parse(&config)
    }

    pub fn parse(config: &str) -> Result<Config, anyhow::Error> {
        let config: Config = toml::from_str(config).with_context(|| "Unable to parse config")?;
        Ok(config)
    }

    pub fn from_env() -> Result<Config, anyhow::Error> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signups_enabled = read_var(&lookup, "SIGNUPS_ENABLED")?;
        let signups_enabled = signups_enabled
            .parse()
            .context("Unable to parse SIGNUPS_ENABLED value")?;
        let database_url = read_var(&lookup, "DATABASE_URL")?;
        let honeycomb_api_key = lookup("HONEYCOMB_API_KEY");
        let max_pool_size = match lookup("MAX_POOL_SIZE") {
            Some(size) => size.parse().context("Unable to parse MAX_POOL_SIZE value")?,
            None => default_max_pool_size(),
        };
        let run_migrations = match lookup("RUN_MIGRATIONS") {
            Some(run) => run.parse().context("Unable to parse RUN_MIGRATIONS value")?,
            None => default_run_migrations(),
        };
        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(default_bind_address);
        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_owned())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Config {
            database_url,
            signups_enabled,
            honeycomb_api_key,
            max_pool_size,
            run_migrations,
            bind_address,
            allowed_origins,
            ssl: None,
        };
        Ok(config)
    }
}

/// Connection settings for `wait-for-db`
#[derive(Clone, PartialEq, Debug)]
pub struct DbEnvConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl DbEnvConfig {
    pub fn from_env() -> Result<DbEnvConfig, anyhow::Error> {
        DbEnvConfig::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<DbEnvConfig, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = read_var(&lookup, "DB_PORT")?;
        let port = port.parse().context("Unable to parse DB_PORT value")?;
        Ok(DbEnvConfig {
            host: read_var(&lookup, "DB_HOST")?,
            port,
            username: read_var(&lookup, "DB_USERNAME")?,
            password: read_var(&lookup, "DB_PASSWORD")?,
            database: read_var(&lookup, "DB_DATABASE")?,
        })
    }
}

fn read_var<F>(lookup: &F, key: &str) -> Result<String, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).with_context(|| format!("Unable to read env var: {}", key))
}
