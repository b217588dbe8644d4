use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::{
    fs,
    path::{Path, PathBuf},
};

use fargo_league_scraper::{
    browser::ChromeFetcher,
    config::ScraperConfig,
    runner::{render_page, run_all, run_schedule, run_standings, PageKind},
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Runs both pipelines when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every configured division schedule into schedule.json
    Schedule,
    /// Scrape the standings table into standings.json
    Standings,
    /// Run the schedule and standings pipelines one after the other
    All,
    /// Parse a saved HTML page and print the records as JSON
    ParseFile {
        #[arg(short, long, value_enum)]
        kind: PageKind,
        /// Path to the HTML file to parse
        #[arg(short, long)]
        file: PathBuf,
        /// Division label for schedule records
        #[arg(short, long, default_value = "")]
        division: String,
    },
}

fn parse_file(kind: PageKind, file: &Path, division: &str) -> Result<()> {
    let html = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    println!("{}", render_page(kind, &html, division)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    // stdout carries the parse-file JSON
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = ScraperConfig::from_env()?;

    let launch = || ChromeFetcher::launch(&config.browser);

    match cli.command.unwrap_or(Commands::All) {
        Commands::Schedule => {
            run_schedule(launch, &config.schedule).await?;
        }
        Commands::Standings => {
            run_standings(launch, &config.standings).await?;
        }
        Commands::All => {
            run_all(launch, &config).await?;
        }
        Commands::ParseFile { kind, file, division } => {
            parse_file(kind, &file, &division)?;
        }
    }

    Ok(())
}
