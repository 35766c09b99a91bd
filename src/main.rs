mod cli;
mod config;
mod convert;
mod errors;
mod fetch;
mod jobs;
mod logging;
mod transcode;
mod utils;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;
use anyhow::Context;
use clap::Parser;
use log::info;
use crate::cli::{print_results, App, Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = config::AppConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    let job_log = logging::init(&config.logging).context("failed to initialize logging")?;
    info!("Starting media-multitool");

    if cli.config.is_none() {
        if let Ok(path) = config::AppConfig::get_config_path() {
            config::AppConfig::save_defaults_if_missing(&path);
        }
    }

    // Collaborators pick the proxy up from the environment
    if let Some(proxy_url) = &config.proxy {
        info!("Setting up proxy: {}", proxy_url);
        std::env::set_var("HTTP_PROXY", proxy_url);
        std::env::set_var("HTTPS_PROXY", proxy_url);
        std::env::set_var("ALL_PROXY", proxy_url);
    }

    let app = App::from_config(config, job_log);
    app.check_tools().await;

    let request = match cli.command.unwrap_or(Command::Menu) {
        Command::Fetch { url, audio, dest } => app.fetch_request(url, audio, dest),
        Command::Convert { input, format } => app.convert_request(input, format),
        Command::Menu => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            app.menu(&mut input, &mut out).await?;
            return Ok(());
        }
    };

    let results = app
        .execute(&request)
        .await
        .map_err(errors::AppError::from)
        .context("could not resolve request")?;
    print_results(&mut std::io::stdout(), &results)?;
    Ok(())
}
