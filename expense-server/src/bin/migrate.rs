//! Applies, reverts and lists the embedded schema migrations.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use expense_repo::migration::MigrationError;
use expense_repo::sqlx_repo::{create_pool, SQLxMigrator};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;

#[derive(Parser, Debug)]
#[command(name = "expense-migrate", about = "Manage the database schema")]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every migration and whether it has been applied
    Status,
    /// Apply pending migrations
    Up {
        /// Apply at most this many migrations
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Revert the most recently applied migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
}

#[actix_web::main]
async fn main() -> ExitCode {
    let subscriber = registry::Registry::default()
        .with(LevelFilter::INFO)
        .with(tracing_subscriber::fmt::Layer::default());
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set up tracing: {}", e);
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Migration command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), anyhow::Error> {
    let pool = create_pool(&cli.database_url, 2).await?;
    let migrator = SQLxMigrator::new(pool);

    match cli.command {
        Command::Status => {
            for status in migrator.status().await? {
                let migration = status.migration;
                match status.applied {
                    Some(record) => println!(
                        "[applied {}] {}_{} ({} ms)",
                        record.executed_at.format("%Y-%m-%d %H:%M:%S"),
                        migration.timestamp,
                        migration.name,
                        record.execution_time
                    ),
                    None => println!("[pending] {}_{}", migration.timestamp, migration.name),
                }
            }
        }
        Command::Up { steps } => {
            let applied = migrator.run_pending(steps).await.map_err(report)?;
            if applied.is_empty() {
                info!("Nothing to apply");
            }
            for migration in applied {
                info!(timestamp = migration.timestamp, name = migration.name, "Applied");
            }
        }
        Command::Down { steps } => {
            let reverted = migrator.revert(steps).await.map_err(report)?;
            if reverted.is_empty() {
                info!("Nothing to revert");
            }
            for migration in reverted {
                info!(timestamp = migration.timestamp, name = migration.name, "Reverted");
            }
        }
    }
    Ok(())
}

fn report(error: MigrationError) -> anyhow::Error {
    if let MigrationError::MigrationFailed { timestamp, name, .. } = &error {
        error!(timestamp, name, "Stopped at failing migration");
    }
    error.into()
}
