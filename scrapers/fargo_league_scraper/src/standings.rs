use anyhow::Result;
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::{
    browser::HtmlFetcher,
    config::StandingsConfig,
    output::write_json,
    types::StandingRecord,
    utils::{selector, stripped_text},
};

/// The first table with this class on the page holds the player standings.
pub const STANDINGS_TABLE: &str = "table.tablesaw";

pub struct StandingsParser {
    table: Selector,
    body: Selector,
    row: Selector,
    cell: Selector,
    link: Selector,
}

impl StandingsParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            table: selector(STANDINGS_TABLE)?,
            body: selector("tbody")?,
            row: selector("tr")?,
            cell: selector("td")?,
            link: selector("a")?,
        })
    }

    /// Returns `None` when the page has no standings table.
    pub fn parse(&self, html: &str) -> Option<Vec<StandingRecord>> {
        let document = Html::parse_document(html);
        let table = document.select(&self.table).next()?;

        let Some(body) = table.select(&self.body).next() else {
            return Some(Vec::new());
        };

        let standings = body
            .select(&self.row)
            .filter_map(|row| {
                let cells: Vec<_> = row.select(&self.cell).collect();
                if cells.len() < 2 {
                    return None;
                }

                let rank = stripped_text(&cells[0]);
                let name = cells[1]
                    .select(&self.link)
                    .next()
                    .map(|link| stripped_text(&link))
                    .unwrap_or_else(|| stripped_text(&cells[1]));

                Some(StandingRecord { rank, name })
            })
            .collect();

        Some(standings)
    }
}

pub struct StandingsScraper<F: HtmlFetcher> {
    html_fetcher: F,
    parser: StandingsParser,
}

impl<F: HtmlFetcher> StandingsScraper<F> {
    pub fn new(html_fetcher: F) -> Result<Self> {
        Ok(Self {
            html_fetcher,
            parser: StandingsParser::new()?,
        })
    }

    pub async fn scrape(&self, url: &str) -> Result<Vec<StandingRecord>> {
        info!("Scraping standings from {}", url);
        let html = self.html_fetcher.fetch_html(url, STANDINGS_TABLE).await?;

        Ok(self.parser.parse(&html).unwrap_or_else(|| {
            warn!("Could not find standings table.");
            Vec::new()
        }))
    }

    /// Scrapes the standings page, closes the browser session and writes the standings
    /// file. The file is written even when the table is missing, as an empty array.
    pub async fn run(self, config: &StandingsConfig) -> Result<usize> {
        let scraped = self.scrape(&config.url).await;

        if let Err(e) = self.html_fetcher.close().await {
            warn!("Failed to close browser session: {:?}", e);
        }
        let standings = scraped?;

        let count = write_json(&config.output_path, &standings)?;
        info!("Saved {} players to {}", count, config.output_path.display());
        Ok(count)
    }
}
