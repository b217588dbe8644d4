use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    browser::HtmlFetcher,
    config::ScheduleConfig,
    output::write_json,
    types::{Division, MatchRecord},
    utils::{has_class, selector, strip_home_away, stripped_text},
};

/// Element the rendered schedule page is waited on and parsed from.
pub const SCHEDULE_CONTAINER: &str = "div#schedule-list";

const DATE_CLASS: &str = "schedule-date";
const MATCH_BLOCK_CLASS: &str = "schedule-team-block";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("expected 2 teams in match block, found {0}")]
    TeamCount(usize),
    #[error("match block has no location")]
    MissingLocation,
}

#[derive(Debug, Default)]
struct ScheduleFold {
    current_date: Option<String>,
    matches: Vec<MatchRecord>,
}

pub struct ScheduleParser {
    container: Selector,
    team: Selector,
    location: Selector,
}

impl ScheduleParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            container: selector(SCHEDULE_CONTAINER)?,
            team: selector("span.schedule-team")?,
            location: selector("span.schedule-location")?,
        })
    }

    /// Returns `None` when the page has no schedule container.
    pub fn parse(&self, html: &str, division: &str) -> Option<Vec<MatchRecord>> {
        let document = Html::parse_document(html);
        let container = document.select(&self.container).next()?;

        let fold = container
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "div")
            .fold(ScheduleFold::default(), |mut acc, el| {
                if has_class(&el, DATE_CLASS) {
                    acc.current_date = Some(stripped_text(&el));
                } else if has_class(&el, MATCH_BLOCK_CLASS) {
                    match self.parse_block(&el, division, acc.current_date.as_deref()) {
                        Ok(record) => acc.matches.push(record),
                        Err(BlockError::TeamCount(_)) => {}
                        Err(e @ BlockError::MissingLocation) => {
                            warn!("Skipping match block in {}: {}", division, e);
                        }
                    }
                }
                acc
            });

        Some(fold.matches)
    }

    fn parse_block(
        &self,
        block: &ElementRef,
        division: &str,
        date: Option<&str>,
    ) -> Result<MatchRecord, BlockError> {
        let teams: Vec<_> = block.select(&self.team).collect();
        let [home, away] = teams.as_slice() else {
            return Err(BlockError::TeamCount(teams.len()));
        };

        let location = block
            .select(&self.location)
            .next()
            .map(|el| stripped_text(&el))
            .ok_or(BlockError::MissingLocation)?;

        Ok(MatchRecord {
            division: division.to_string(),
            date: date.map(str::to_string),
            player1: strip_home_away(&stripped_text(home)),
            player2: strip_home_away(&stripped_text(away)),
            location,
        })
    }
}

pub struct ScheduleScraper<F: HtmlFetcher> {
    html_fetcher: F,
    parser: ScheduleParser,
}

impl<F: HtmlFetcher> ScheduleScraper<F> {
    pub fn new(html_fetcher: F) -> Result<Self> {
        Ok(Self {
            html_fetcher,
            parser: ScheduleParser::new()?,
        })
    }

    pub async fn scrape_division(&self, division: &Division) -> Result<Vec<MatchRecord>> {
        info!("Scraping {}...", division.name);
        let html = self
            .html_fetcher
            .fetch_html(&division.url, SCHEDULE_CONTAINER)
            .await?;

        match self.parser.parse(&html, &division.name) {
            Some(matches) => {
                debug!("Found {} matches for {}", matches.len(), division.name);
                Ok(matches)
            }
            None => {
                warn!("Could not find schedule list for {}", division.name);
                Ok(Vec::new())
            }
        }
    }

    pub async fn scrape_all(&self, divisions: &[Division]) -> Result<Vec<MatchRecord>> {
        let mut all_matches = Vec::new();
        for division in divisions {
            all_matches.extend(self.scrape_division(division).await?);
        }
        Ok(all_matches)
    }

    /// Scrapes every configured division, closes the browser session and writes the
    /// schedule file. Returns the number of matches written.
    pub async fn run(self, config: &ScheduleConfig) -> Result<usize> {
        let scraped = self.scrape_all(&config.divisions).await;

        if let Err(e) = self.html_fetcher.close().await {
            warn!("Failed to close browser session: {:?}", e);
        }
        let matches = scraped?;

        let count = write_json(&config.output_path, &matches)?;
        info!("Saved {} matches to {}", count, config.output_path.display());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(children: &str) -> String {
        format!(
            r#"<html><body><div id="schedule-list">{}</div></body></html>"#,
            children
        )
    }

    fn block(home: &str, away: &str, location: &str) -> String {
        format!(
            r#"<div class="schedule-team-block">
                 <span class="schedule-team">{}</span>
                 <span class="schedule-team">{}</span>
                 <span class="schedule-location">{}</span>
               </div>"#,
            home, away, location
        )
    }

    fn date(label: &str) -> String {
        format!(r#"<div class="schedule-date">{}</div>"#, label)
    }

    fn record(date: Option<&str>, player1: &str, player2: &str, location: &str) -> MatchRecord {
        MatchRecord {
            division: "FRBCAPL TEST".to_string(),
            date: date.map(str::to_string),
            player1: player1.to_string(),
            player2: player2.to_string(),
            location: location.to_string(),
        }
    }

    #[test]
    fn test_dates_carry_forward_to_matches() {
        let html = page(&[
            date("Mon 1/6"),
            block("Alice (H)", "Bob (A)", "Hall A"),
            date("Tue 1/7"),
            block("Cara (H)", "Dan (A)", "Hall B"),
        ]
        .concat());

        let matches = ScheduleParser::new().unwrap().parse(&html, "FRBCAPL TEST").unwrap();

        assert_eq!(
            matches,
            vec![
                record(Some("Mon 1/6"), "Alice", "Bob", "Hall A"),
                record(Some("Tue 1/7"), "Cara", "Dan", "Hall B"),
            ]
        );
    }

    #[test]
    fn test_date_applies_until_next_marker() {
        let html = page(&[
            date("Mon 1/6"),
            block("Alice (H)", "Bob (A)", "Hall A"),
            block("Eve (H)", "Finn (A)", "Hall C"),
        ]
        .concat());

        let matches = ScheduleParser::new().unwrap().parse(&html, "FRBCAPL TEST").unwrap();

        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.date.as_deref() == Some("Mon 1/6")));
    }

    #[test]
    fn test_match_before_any_date_has_no_date() {
        let html = page(&[block("Alice (H)", "Bob (A)", "Hall A"), date("Mon 1/6")].concat());

        let matches = ScheduleParser::new().unwrap().parse(&html, "FRBCAPL TEST").unwrap();

        assert_eq!(matches, vec![record(None, "Alice", "Bob", "Hall A")]);
    }

    #[test]
    fn test_blocks_without_two_teams_are_skipped() {
        let one_team = r#"<div class="schedule-team-block">
                            <span class="schedule-team">Alice (H)</span>
                            <span class="schedule-location">Hall A</span>
                          </div>"#;
        let three_teams = r#"<div class="schedule-team-block">
                               <span class="schedule-team">A</span>
                               <span class="schedule-team">B</span>
                               <span class="schedule-team">C</span>
                               <span class="schedule-location">Hall A</span>
                             </div>"#;
        let no_teams = r#"<div class="schedule-team-block"><span class="schedule-location">Hall A</span></div>"#;
        let html = page(&[
            date("Mon 1/6"),
            one_team.to_string(),
            three_teams.to_string(),
            no_teams.to_string(),
            block("Cara (H)", "Dan (A)", "Hall B"),
        ]
        .concat());

        let matches = ScheduleParser::new().unwrap().parse(&html, "FRBCAPL TEST").unwrap();

        assert_eq!(matches, vec![record(Some("Mon 1/6"), "Cara", "Dan", "Hall B")]);
    }

    #[test]
    fn test_block_without_location_is_skipped() {
        let no_location = r#"<div class="schedule-team-block">
                               <span class="schedule-team">Alice (H)</span>
                               <span class="schedule-team">Bob (A)</span>
                             </div>"#;
        let html = page(&[no_location.to_string(), block("Cara (H)", "Dan (A)", "Hall B")].concat());

        let matches = ScheduleParser::new().unwrap().parse(&html, "FRBCAPL TEST").unwrap();

        assert_eq!(matches, vec![record(None, "Cara", "Dan", "Hall B")]);
    }

    #[test]
    fn test_parse_block_errors() {
        let parser = ScheduleParser::new().unwrap();
        let html = Html::parse_fragment(
            r#"<div class="schedule-team-block"><span class="schedule-team">Alice</span></div>
               <div class="schedule-team-block">
                 <span class="schedule-team">Alice</span><span class="schedule-team">Bob</span>
               </div>"#,
        );
        let blocks: Vec<_> = html.select(&selector("div").unwrap()).collect();

        assert_eq!(
            parser.parse_block(&blocks[0], "FRBCAPL TEST", None),
            Err(BlockError::TeamCount(1))
        );
        assert_eq!(
            parser.parse_block(&blocks[1], "FRBCAPL TEST", None),
            Err(BlockError::MissingLocation)
        );
    }

    #[test]
    fn test_names_are_trimmed_and_unmarked() {
        let html = page(&block("\n   Alice Smith (H)  ", "  (A) Bob Jones", "  Hall A \n"));

        let matches = ScheduleParser::new().unwrap().parse(&html, "FRBCAPL TEST").unwrap();

        assert_eq!(matches[0].player1, "Alice Smith");
        assert_eq!(matches[0].player2, "Bob Jones");
        assert_eq!(matches[0].location, "Hall A");
        for m in &matches {
            for name in [&m.player1, &m.player2] {
                assert!(!name.contains("(H)") && !name.contains("(A)"));
                assert_eq!(name.trim(), name.as_str());
            }
        }
    }

    #[test]
    fn test_only_direct_div_children_are_walked() {
        let html = page(&[
            r#"<section><div class="schedule-date">Hidden</div></section>"#.to_string(),
            r#"<span class="schedule-date">Not a div</span>"#.to_string(),
            r#"<div class="wrapper">"#.to_string(),
            block("Nested (H)", "Block (A)", "Hall Z"),
            "</div>".to_string(),
            date("Mon 1/6"),
            block("Alice (H)", "Bob (A)", "Hall A"),
        ]
        .concat());

        let matches = ScheduleParser::new().unwrap().parse(&html, "FRBCAPL TEST").unwrap();

        assert_eq!(matches, vec![record(Some("Mon 1/6"), "Alice", "Bob", "Hall A")]);
    }

    #[test]
    fn test_missing_container() {
        let html = r#"<html><body><div id="standings">Nothing here</div></body></html>"#;
        assert!(ScheduleParser::new().unwrap().parse(html, "FRBCAPL TEST").is_none());
    }

    #[test]
    fn test_empty_container() {
        let matches = ScheduleParser::new().unwrap().parse(&page(""), "FRBCAPL TEST");
        assert_eq!(matches, Some(Vec::new()));
    }
}
