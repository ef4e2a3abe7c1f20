use std::process::ExitCode;

use clap::Parser;
use holdboard_utils::{config::Config, disk_storage::DiskStorageInterface, log, pipeline};
use tracing::error;

mod cli;

fn load_config(cli: &cli::Cli) -> holdboard_utils::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    log::init(cli.verbose);

    let result = match load_config(&cli) {
        Ok(config) => pipeline::run(&config).await.map(|_| ()),
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            if err.is_config() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
