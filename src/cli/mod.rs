//! CLI module - Command-line interface for subplan
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

pub use commands::{cmd_check_datastore, cmd_init, cmd_list_users};

use clap::{Parser, Subcommand};

/// subplan - substitution board for schools
#[derive(Parser)]
#[command(name = "subplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    #[command(alias = "daemon")]
    Serve,

    /// Write a default config.toml and prepare the datastore
    Init {
        /// Start the setup wizard on first launch
        #[arg(long)]
        setup: bool,
    },

    /// Check that the configured datastore is reachable
    #[command(name = "check-datastore", alias = "check")]
    CheckDatastore,

    /// List user accounts
    #[command(alias = "ls")]
    Users,
}
