//! Terminal client for the Skillatics placement-readiness platform.
//!
//! Each invocation runs one command against the REST backend. The session
//! persists in the state directory between invocations, and every command is
//! checked against the role-based route guard before it runs.

use anyhow::{Context, Result};
use sk_client::{
    app::App,
    cli::{self, Command},
    logging,
};
use skillatics::auth::FileStore;
use skillatics::{ApiClient, ClientConfig, SessionStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = cli::parse_args(std::env::args_os().skip(1).collect())?;
    if args.command == Command::Help {
        print!("{}", cli::HELP);
        return Ok(());
    }

    let config = ClientConfig::from_env(args.api_url, args.state_dir)?;
    config.validate()?;

    let log_file = config.log_file();
    let full_screen = args.command.is_proctored();
    logging::init(full_screen.then_some(log_file.as_path()))?;

    run(args.command, config).await
}

async fn run(command: Command, config: ClientConfig) -> Result<()> {
    let storage = FileStore::in_dir(&config.state_dir).with_context(|| {
        format!(
            "Failed to open session storage in {}",
            config.state_dir.display()
        )
    })?;
    let session = SessionStore::hydrate(Arc::new(storage)).context("Failed to load session")?;

    let route = cli::authorize(&command, session.current_user().as_ref())?;
    if let Some(route) = route {
        log::debug!("Command opens {route}");
    }

    let api = ApiClient::new(&config, Arc::new(session)).context("Failed to build HTTP client")?;
    App::new(api).dispatch(command, route).await
}
