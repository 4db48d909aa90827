use anyhow::{Context, Result};
use cli::{Cli, Commands};
use config::Configuration;
use std::process::ExitCode;

mod clean;
mod cli;
mod config;
mod config_wizard;
mod fetch;
mod logging;
mod render;

fn main() -> ExitCode {
    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match &cli.command {
        Commands::Config => config_wizard::run(&cli.config),
        Commands::Clean => clean::run(&Configuration::load_or_default(&cli.config)?),
        Commands::Fetch(args) => {
            let config = Configuration::load_or_default(&cli.config)?;
            runtime()?.block_on(fetch::run(&config, cli.access_token.clone(), args))
        }
        Commands::Render(args) => {
            println!("Loading configuration...");
            let config = Configuration::load(&cli.config)?;
            runtime()?.block_on(render::run(&config, cli.access_token.clone(), args))
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "Failed to start async runtime")
}
