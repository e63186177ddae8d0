//! meetup2md CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use meetup2md_client::cli::Cli;
use meetup2md_client::commands::{auth, events};
use meetup2md_client::config::CredentialStore;
use meetup2md_client::error::ClientResult;
use meetup2md_core::{TracingConfig, init_tracing};
use meetup2md_providers::meetup::{MeetupClient, MeetupOAuth, MeetupSettings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.verbose {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if e.is_usage() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let path = cli.config.clone().unwrap_or_else(CredentialStore::default_path);
    let mut store = CredentialStore::load(path)?;
    debug!("Using configuration {}", store.path().display());

    let overrides = store.internal_overrides();
    let settings =
        MeetupSettings::from_overrides(overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

    let oauth = MeetupOAuth::new(settings.clone())?;
    let Some(session) = auth::authorize(&oauth, &mut store, auth::handshake_input(&cli)).await?
    else {
        return Ok(());
    };

    let options = events::EventOptions::resolve(&cli, &store)?;
    let client = MeetupClient::new(settings, &session)?;
    let mut stdout = std::io::stdout().lock();
    events::export(&client, &options, &mut stdout).await?;
    Ok(())
}
