//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use drivechat_core::api::ApiClient;
use drivechat_core::config::{self, Config};
use drivechat_core::session::{Session, SessionStore};

mod commands;

#[derive(Parser)]
#[command(name = "drivechat")]
#[command(version)]
#[command(about = "Terminal client for the Drive document chatbot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Interactive chat with the document store (default)
    Chat,

    /// Log in via the backend's OAuth entry point
    Login,

    /// Log out and clear the local session
    Logout,

    /// Show the authenticated identity
    Whoami,

    /// List folders available for scoping
    Folders {
        /// Case-insensitive substring filter on folder names
        filter: Option<String>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("DRIVECHAT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("drivechat=warn,drivechat_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;
    let base_url = config::resolve_base_url(&config).context("resolve backend URL")?;
    let api = ApiClient::new(base_url);
    let store = SessionStore::new();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let session = require_session(&store)?;
            commands::chat::run(&api, &store, &config, &session).await
        }
        Commands::Login => commands::login::run(&api, &store).await,
        Commands::Logout => commands::logout::run(&api, &store).await,
        Commands::Whoami => {
            let session = require_session(&store)?;
            commands::whoami::run(&api, &session).await
        }
        Commands::Folders { filter } => {
            let session = require_session(&store)?;
            commands::folders::run(&api, &session, filter.as_deref()).await
        }
    }
}

/// Restores the persisted session or explains how to get one.
fn require_session(store: &SessionStore) -> Result<Session> {
    store
        .restore()
        .context("Not logged in. Run `drivechat login` first.")
}
