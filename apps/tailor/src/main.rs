mod analysis;
mod cli;
mod compile;
mod config;
mod documents;
mod errors;
mod llm_client;
mod logging;
mod models;
mod posting;
mod retry;
mod state;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use crate::cli::{commands, Cli};
use crate::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // .env is loaded here, before the subscriber reads RUST_LOG
    let env = Config::from_env();
    logging::init(&env.rust_log, Some(Path::new(logging::LOG_DIR)));

    info!("Starting tailor v{}", env!("CARGO_PKG_VERSION"));

    match commands::run(cli, env).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("Error: {err}");
            if matches!(err, errors::AppError::Authentication(_)) {
                eprintln!("Set OPENAI_API_KEY in the environment or .env, or pass --offline.");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
