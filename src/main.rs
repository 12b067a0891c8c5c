use std::io::Read;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};
use serde_json::Value;

mod cleaner;
mod collector;
mod config;
mod logger;
mod offer;

#[derive(Parser)]
#[command(
    name = "wttj-scraper",
    version,
    about = "Collect and flatten Welcome to the Jungle job offers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one offer payload and print its flattened record
    Extract { url: String },
    /// Walk the search pages and print the organization API endpoints
    Collect {
        #[arg(default_value = "data")]
        job_title: String,
        #[arg(default_value_t = 40)]
        max_pages: u32,
    },
    /// Normalize a flattened record read from stdin
    Clean,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();
    let cli = Cli::parse();
    let config = config::load()?;

    match cli.command {
        Commands::Extract { url } => {
            let client = reqwest::Client::builder()
                .user_agent(&config.user_agent)
                .timeout(Duration::from_secs(30))
                .build()
                .context("could not build the HTTP client")?;
            let extracted = offer::fetch_offer(&client, &url).await;
            // Whatever went wrong, the record built so far is still printed.
            if let Some(failure) = extracted.failure {
                error!("extraction incomplete: {failure:#}");
            }
            println!("{}", serde_json::to_string(&extracted.record)?);
        }
        Commands::Collect { job_title, max_pages } => {
            let collected =
                tokio_rayon::spawn(move || collector::run(&config, &job_title, max_pages)).await;
            info!("{} endpoints ({})", collected.endpoints.len(), collected.stop);
            println!("{}", serde_json::to_string(&collected.endpoints)?);
        }
        Commands::Clean => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("could not read stdin")?;
            let value: Value = serde_json::from_str(&raw).context("stdin is not valid JSON")?;
            let Value::Object(record) = value else {
                anyhow::bail!("expected a JSON object on stdin");
            };
            println!("{}", serde_json::to_string(&cleaner::clean_record(record))?);
        }
    }
    Ok(())
}
