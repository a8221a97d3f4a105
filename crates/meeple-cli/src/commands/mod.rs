//! CLI subcommand implementations.

pub mod assign_game;
pub mod checkin;
pub mod checkout;
pub mod floor;
pub mod reserve;
pub mod status;
pub mod tables;
