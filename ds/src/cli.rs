//! CLI argument parsing for deadlinestore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ds")]
#[command(author, version, about = "Deadline store inspection and administration", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a deadline
    Add {
        /// Owning user id
        #[arg(required = true)]
        user_id: i64,

        /// Deadline title
        #[arg(required = true)]
        title: String,

        /// Due date/time, RFC 3339 (e.g. 2026-09-15T18:00:00Z)
        #[arg(required = true)]
        due_at: String,

        /// Importance weight 0-10
        #[arg(short, long, default_value = "5")]
        weight: u8,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List a user's deadlines
    List {
        /// User id
        #[arg(required = true)]
        user_id: i64,

        /// Include completed deadlines
        #[arg(short, long)]
        all: bool,
    },

    /// Edit fields of an existing deadline
    Edit {
        #[arg(required = true)]
        user_id: i64,

        #[arg(required = true)]
        id: i64,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New due date/time, RFC 3339
        #[arg(long)]
        due_at: Option<String>,

        /// New importance weight 0-10
        #[arg(short, long)]
        weight: Option<u8>,
    },

    /// Mark a deadline completed
    Complete {
        #[arg(required = true)]
        user_id: i64,

        #[arg(required = true)]
        id: i64,
    },

    /// Reopen a completed deadline
    Reopen {
        #[arg(required = true)]
        user_id: i64,

        #[arg(required = true)]
        id: i64,
    },

    /// Delete a deadline
    Delete {
        #[arg(required = true)]
        user_id: i64,

        #[arg(required = true)]
        id: i64,
    },

    /// Show or update a user's notification preferences
    Prefs {
        /// User id
        #[arg(required = true)]
        user_id: i64,

        /// Notification times as HH:MM, comma separated (replaces existing)
        #[arg(short, long, value_delimiter = ',')]
        times: Option<Vec<String>>,

        /// Notification weekdays 0=Mon..6=Sun, comma separated (replaces existing)
        #[arg(short, long, value_delimiter = ',')]
        weekdays: Option<Vec<u8>>,
    },

    /// Show or update a user's display settings
    Display {
        /// User id
        #[arg(required = true)]
        user_id: i64,

        /// Settings to enable, comma separated
        /// (remaining-time, description, importance, weight, emojis, date)
        #[arg(long, value_delimiter = ',')]
        on: Option<Vec<String>>,

        /// Settings to disable, comma separated
        #[arg(long, value_delimiter = ',')]
        off: Option<Vec<String>>,
    },

    /// Show store statistics
    Stats,
}
