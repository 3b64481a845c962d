use anyhow::Result;
use clap::{Parser, Subcommand};
use recdraft_core::draft::DraftStore;
use recdraft_core::record::{RecordId, RecordKind};
use recdraft_infrastructure::ConfigService;
use std::path::PathBuf;
use std::sync::Arc;

mod commands;

#[derive(Parser)]
#[command(name = "recdraft")]
#[command(about = "recdraft CLI - inspect and clean up autosaved record drafts", long_about = None)]
struct Cli {
    /// Draft file to use instead of the configured one
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Config file to use instead of ~/.config/recdraft/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or remove stored drafts
    Drafts {
        #[command(subcommand)]
        action: DraftsAction,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum DraftsAction {
    /// List records that have drafts
    List {
        #[arg(long, value_parser = commands::parse_kind)]
        kind: Option<RecordKind>,
    },
    /// Print the stored drafts of one record
    Show {
        #[arg(long, value_parser = commands::parse_kind)]
        kind: RecordKind,
        #[arg(long)]
        id: i64,
    },
    /// Delete the stored drafts of one record
    Clear {
        #[arg(long, value_parser = commands::parse_kind)]
        kind: RecordKind,
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };

    let output = match cli.command {
        Commands::Drafts { action } => {
            let storage = config_service.open_storage(cli.storage)?;
            let store = DraftStore::new(Arc::new(storage));
            match action {
                DraftsAction::List { kind } => commands::drafts::list(&store, kind),
                DraftsAction::Show { kind, id } => {
                    commands::drafts::show(&store, kind, RecordId(id))?
                }
                DraftsAction::Clear { kind, id } => {
                    commands::drafts::clear(&store, kind, RecordId(id))
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config_service)?,
        },
    };

    print!("{output}");
    Ok(())
}
