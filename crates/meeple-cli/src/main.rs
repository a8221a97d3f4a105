use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use meeple_cli::commands::{assign_game, checkin, checkout, floor, reserve, status, tables};
use meeple_cli::{Cli, Commands, Config, TablesAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(meeple_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db =
        meeple_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout();
    // Wall-clock time in the venue's local timezone drives every command.
    let now = Local::now().naive_local();

    match &cli.command {
        Some(Commands::Floor { venue, date, json }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let date = date.unwrap_or_else(|| now.date());
            floor::run(&mut db, venue, date, now, *json, &config.venue_config())?;
        }
        Some(Commands::Status { venue }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut stdout, &mut db, venue, now, &config)?;
        }
        Some(Commands::Checkin { venue, table, game }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            checkin::run(&mut stdout, &mut db, venue, table, game.as_deref(), now)?;
        }
        Some(Commands::Checkout { session }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            checkout::run(&mut stdout, &mut db, session, now)?;
        }
        Some(Commands::AssignGame { session, game }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            assign_game::run(&mut stdout, &mut db, session, game, now)?;
        }
        Some(Commands::Reserve(args)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            reserve::run(&mut stdout, &mut db, args)?;
        }
        Some(Commands::Tables { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                TablesAction::List { venue, json } => {
                    tables::list(&mut stdout, &db, venue, *json)?;
                }
                TablesAction::Add { venue, label } => {
                    tables::add(&mut stdout, &mut db, venue, label)?;
                }
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
