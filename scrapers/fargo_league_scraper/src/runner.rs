use anyhow::{anyhow, Result};
use std::future::Future;
use tracing::{error, info, warn};

use crate::{
    browser::HtmlFetcher,
    config::{ScheduleConfig, ScraperConfig, StandingsConfig},
    schedule::{ScheduleParser, ScheduleScraper},
    standings::{StandingsParser, StandingsScraper},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PageKind {
    Schedule,
    Standings,
}

pub async fn run_schedule<F, L, Fut>(launch: L, config: &ScheduleConfig) -> Result<usize>
where
    F: HtmlFetcher,
    L: FnOnce() -> Fut,
    Fut: Future<Output = Result<F>>,
{
    let fetcher = launch().await?;
    ScheduleScraper::new(fetcher)?.run(config).await
}

pub async fn run_standings<F, L, Fut>(launch: L, config: &StandingsConfig) -> Result<usize>
where
    F: HtmlFetcher,
    L: FnOnce() -> Fut,
    Fut: Future<Output = Result<F>>,
{
    let fetcher = launch().await?;
    StandingsScraper::new(fetcher)?.run(config).await
}

/// Runs the schedule pipeline and then the standings pipeline, each with its own
/// session from `launch`. A failure in one does not stop the other; the run fails
/// if either did.
pub async fn run_all<F, L, Fut>(launch: L, config: &ScraperConfig) -> Result<(usize, usize)>
where
    F: HtmlFetcher,
    L: Fn() -> Fut,
    Fut: Future<Output = Result<F>>,
{
    let schedule = run_schedule(&launch, &config.schedule).await;
    if let Err(e) = &schedule {
        error!("Schedule scrape failed: {:?}", e);
    }

    let standings = run_standings(&launch, &config.standings).await;
    if let Err(e) = &standings {
        error!("Standings scrape failed: {:?}", e);
    }

    match (schedule, standings) {
        (Ok(matches), Ok(players)) => {
            info!("Scrape complete: {} matches, {} players", matches, players);
            Ok((matches, players))
        }
        (Err(e), Ok(_)) => Err(e.context("Schedule scrape failed")),
        (Ok(_), Err(e)) => Err(e.context("Standings scrape failed")),
        (Err(schedule), Err(standings)) => Err(anyhow!(
            "Schedule and standings scrapes failed: {:#}; {:#}",
            schedule,
            standings
        )),
    }
}

/// Parses a saved page and renders its records as a pretty JSON array, `[]` when the
/// page has no schedule list or standings table.
pub fn render_page(kind: PageKind, html: &str, division: &str) -> Result<String> {
    let json = match kind {
        PageKind::Schedule => match ScheduleParser::new()?.parse(html, division) {
            Some(matches) => serde_json::to_string_pretty(&matches)?,
            None => {
                warn!("Could not find schedule list");
                "[]".to_string()
            }
        },
        PageKind::Standings => match StandingsParser::new()?.parse(html) {
            Some(standings) => serde_json::to_string_pretty(&standings)?,
            None => {
                warn!("Could not find standings table.");
                "[]".to_string()
            }
        },
    };
    Ok(json)
}
