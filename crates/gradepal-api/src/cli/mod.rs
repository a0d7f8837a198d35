//! CLI command definitions for the `gradepal` binary.
//!
//! `serve` runs the HTTP API. `chat`, `threads` and `history` are clients
//! of a running server. `add-user`, `issue-token` and `seed-demo` write to
//! the local database directly.

pub mod admin;
pub mod chat;
pub mod client;
pub mod threads;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use gradepal_types::identity::UserRole;

/// Academic assistant chat server and terminal client.
#[derive(Parser)]
#[command(name = "gradepal", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where a client command finds the server and who it is.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Base URL of a running `gradepal serve`.
    #[arg(long, env = "GRADEPAL_SERVER", default_value = "http://127.0.0.1:3000")]
    pub server: String,

    /// Bearer token (see `gradepal issue-token`).
    #[arg(long, env = "GRADEPAL_TOKEN", hide_env_values = true)]
    pub token: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `[server].port`).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host address to bind to (defaults to `[server].host`).
        #[arg(long)]
        host: Option<String>,

        /// Also export spans through OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Chat with the assistant in the terminal.
    Chat {
        #[command(flatten)]
        server: ServerArgs,

        /// Continue an existing conversation.
        #[arg(long)]
        thread: Option<Uuid>,
    },

    /// List your conversations.
    Threads {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Show the messages of one conversation.
    History {
        #[command(flatten)]
        server: ServerArgs,

        /// Conversation ID.
        thread: Uuid,
    },

    /// Create a user in the local database.
    #[command(name = "add-user")]
    AddUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        full_name: String,

        /// student or lecturer.
        #[arg(long, value_parser = parse_role)]
        role: UserRole,

        /// Required for students whose grades are keyed by number.
        #[arg(long)]
        student_number: Option<String>,
    },

    /// Issue a new bearer token for a user (shown once).
    #[command(name = "issue-token")]
    IssueToken {
        #[arg(long)]
        username: String,
    },

    /// Insert a small demo dataset and print tokens for its users.
    #[command(name = "seed-demo")]
    SeedDemo,
}

fn parse_role(s: &str) -> Result<UserRole, String> {
    s.parse()
}
