//! docbuddy - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use docbuddy::cli::{self, Args, Commands};
use docbuddy::config::Config;
use docbuddy::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(2);
    }

    if let Commands::Config { init: true, force } = &args.command {
        let path = args.config.clone().unwrap_or_else(Config::default_path);
        return cli::init_config(&path, *force);
    }

    let config = Config::load(args.config.clone())?;
    logging::init(&config.logging, args.verbosity().log_level());
    tracing::debug!("verbosity: {}", args.verbosity().as_str());

    cli::run(&args, config).await
}
