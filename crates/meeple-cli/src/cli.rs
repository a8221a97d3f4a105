//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::commands::reserve::ReserveArgs;

/// Board-game cafe floor operations.
///
/// Tracks tables, walk-in check-ins and reservations for a venue, and
/// surfaces double-bookings and tight turnovers before guests arrive.
#[derive(Debug, Parser)]
#[command(name = "meeple", version, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the per-table occupancy board for one day.
    Floor {
        /// Venue to show.
        #[arg(long)]
        venue: String,

        /// Day to show (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one-screen counts for a venue's day.
    Status {
        /// Venue to summarize.
        #[arg(long)]
        venue: String,
    },

    /// Seat a walk-in party at a table.
    Checkin {
        /// Venue the table belongs to.
        #[arg(long)]
        venue: String,

        /// Table to occupy.
        #[arg(long)]
        table: String,

        /// Game picked at check-in, if the party starts playing right away.
        #[arg(long)]
        game: Option<String>,
    },

    /// End a session, freeing its table.
    Checkout {
        /// Session to end.
        #[arg(long)]
        session: String,
    },

    /// Put a game on a seated session's table.
    AssignGame {
        /// Session to update.
        #[arg(long)]
        session: String,

        /// Game being played.
        #[arg(long)]
        game: String,
    },

    /// Book a table slot.
    Reserve(ReserveArgs),

    /// Manage a venue's tables.
    Tables {
        #[command(subcommand)]
        action: TablesAction,
    },
}

/// Table management actions.
#[derive(Debug, Subcommand)]
pub enum TablesAction {
    /// List a venue's tables.
    List {
        /// Venue to list.
        #[arg(long)]
        venue: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Register a new table.
    Add {
        /// Venue the table belongs to.
        #[arg(long)]
        venue: String,

        /// Floor label for the table (e.g. "Window 2").
        #[arg(long)]
        label: String,
    },
}
