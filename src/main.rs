use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use comunipaz::channels::web::{AppState, start_server};
use comunipaz::config::Config;
use comunipaz::db::{self, CaseFilter, CaseStore, ProfileStore};
use comunipaz::export::write_cases_csv;

#[derive(Parser)]
#[command(name = "comunipaz", version, about = "Community justice case management service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run schema migrations and start the web gateway.
    Serve,
    /// Run schema migrations and exit.
    Migrate,
    /// Export all cases as CSV.
    Export {
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::resolve().context("failed to resolve configuration")?;

    match cli.command {
        Command::Serve => {
            let database = db::connect_from_config(&config.database)
                .await
                .context("failed to connect to database")?;
            let state = AppState::new(database, config.branding.clone());
            start_server(config.server.bind, state).await?;
        }
        Command::Migrate => {
            db::connect_from_config(&config.database)
                .await
                .context("failed to run migrations")?;
            tracing::info!("migrations applied");
        }
        Command::Export { output } => {
            let database = db::connect_from_config(&config.database)
                .await
                .context("failed to connect to database")?;
            let cases = database.list_cases(&CaseFilter::default()).await?;
            let judge_names: HashMap<Uuid, String> = database
                .list_profiles()
                .await?
                .into_iter()
                .map(|profile| (profile.id, profile.username))
                .collect();

            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    write_cases_csv(file, &cases, &judge_names)?;
                    tracing::info!(path = %path.display(), cases = cases.len(), "export written");
                }
                None => {
                    let mut buffer = Vec::new();
                    write_cases_csv(&mut buffer, &cases, &judge_names)?;
                    std::io::stdout().write_all(&buffer)?;
                }
            }
        }
    }

    Ok(())
}
