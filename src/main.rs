mod config;
mod export;
mod models;
mod pipeline;
mod pricing;
mod scraper;
mod utils;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "carconf-scrape",
    about = "Scrape vehicle specs and lease costs from the car configurator into a CSV file",
    version
)]
struct Cli {
    /// Account login, e.g. "mario.rossi@example.com"
    #[arg(env = "CARCONF_LOGIN")]
    login: String,

    /// Account password
    #[arg(env = "CARCONF_PASSWORD", hide_env_values = true)]
    password: String,

    /// Output file (default: cars.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write each vehicle as soon as it is scraped; a failed run leaves a partial file
    #[arg(long)]
    stream: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "carconf_scraper=info,warn",
        1 => "carconf_scraper=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;
    if let Some(path) = cli.output {
        config.export.path = path;
    }
    if cli.stream {
        config.export.stream = true;
    }

    let _t = utils::Timer::start("Catalog scrape");
    let stats = Pipeline::new(config).run(&cli.login, &cli.password).await?;
    info!(
        "Exported {} of {} vehicles to {:?}",
        stats.rows_written, stats.vehicles, stats.output
    );

    Ok(())
}
