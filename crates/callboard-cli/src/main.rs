//! Callboard CLI - terminal front end for the voice-agent dashboard.
//!
//! This is the entry point for the `callboard` binary.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use callboard_client::{ApiClient, ClientConfig, DurableStore, FileStore};
use callboard_session::SessionContext;

/// Callboard CLI - sign in and browse agents, calls and analytics.
#[derive(Parser, Debug)]
#[command(name = "callboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend URL. Defaults to `CALLBOARD_API_BASE_URL`, then
    /// `CALLBOARD_BACKEND_URL`, then `http://localhost:3000`.
    #[arg(long)]
    api_url: Option<String>,

    /// File holding the session token between runs.
    #[arg(long, env = "CALLBOARD_STATE_FILE", default_value = ".callboard/session.json")]
    state_file: PathBuf,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "CALLBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "CALLBOARD_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name.
        #[arg(long)]
        name: String,
        /// Phone number for verification.
        #[arg(long)]
        phone: String,
    },
    /// Send a verification code to the phone of a pending account.
    PhoneStart {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Replacement phone number.
        #[arg(long)]
        phone: Option<String>,
    },
    /// Confirm a phone verification code.
    PhoneVerify {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Code received by SMS.
        #[arg(long)]
        code: String,
    },
    /// Sign out and forget the stored token.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List agents.
    Agents {
        /// Show a single agent.
        #[arg(long)]
        id: Option<String>,
    },
    /// List calls.
    Calls {
        /// Restrict to one agent's call history.
        #[arg(long)]
        agent: Option<String>,
        /// Maximum number of calls.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// List leads.
    Leads,
    /// Show an analytics report.
    Analytics {
        /// Report to fetch.
        #[arg(value_enum, default_value = "overview")]
        report: Report,
        /// Reporting period (e.g. `7d`, `30d`).
        #[arg(long)]
        period: Option<String>,
    },
    /// Show dashboard statistics.
    Stats,
    /// Sync agents and calls from the telephony provider.
    Sync,
    /// Search calls and agents.
    Search {
        /// Search text.
        query: String,
    },
    /// Manage users (admins only).
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Report {
    Overview,
    Agents,
    Calls,
    Sentiment,
}

#[derive(Subcommand, Debug)]
enum UsersAction {
    /// List users.
    List {
        /// Filter by status (PENDING, APPROVED, REJECTED).
        #[arg(long)]
        status: Option<String>,
    },
    /// Approve a pending account (super admins only).
    Approve {
        /// User id.
        id: String,
    },
    /// Change a user's role.
    SetRole {
        /// User id.
        id: String,
        /// New role (USER, ADMIN, SUPERADMIN).
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        tracing_subscriber::fmt()
            .with_env_filter("callboard=debug,callboard_session=debug,callboard_client=debug,warn")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "error".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = ClientConfig::from_env();
    if let Some(url) = args.api_url {
        config.base_url = url;
    }
    tracing::debug!(base_url = %config.base_url, state_file = %args.state_file.display(), "Starting");

    let store: Arc<dyn DurableStore> = Arc::new(FileStore::new(args.state_file));
    let client = ApiClient::new(config, store)?;
    let session = SessionContext::connect(client).await;

    commands::run(&session, args.command).await
}
