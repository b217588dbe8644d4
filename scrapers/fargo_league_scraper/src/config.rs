use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

use crate::types::Division;

const LEAGUE_REPORT_URL: &str = "https://lms.fargorate.com/PublicReport/LeagueReports?leagueId=e05896bb-b0f4-4a80-bf99-b2ca012ceaaa";
const FRBCAPL_TEST_DIVISION_ID: &str = "b345a437-3415-4765-b19a-b2f7014f2cfa";
const SINGLES_TEST_DIVISION_ID: &str = "9058a0cc-3231-4118-bd91-b305006fe578";

fn division_url(division_id: &str) -> String {
    format!("{}&divisionId={}", LEAGUE_REPORT_URL, division_id)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrowserSettings {
    pub headless: bool,
    pub disable_gpu: bool,
    pub no_sandbox: bool,
    pub chrome_executable: Option<PathBuf>,
    pub render_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl BrowserSettings {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            disable_gpu: true,
            no_sandbox: false,
            chrome_executable: None,
            render_timeout_secs: 5,
            poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Scraped in this order; output records follow it.
    pub divisions: Vec<Division>,
    pub output_path: PathBuf,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            divisions: vec![
                Division::new("FRBCAPL TEST", &division_url(FRBCAPL_TEST_DIVISION_ID)),
                Division::new("Singles Test", &division_url(SINGLES_TEST_DIVISION_ID)),
            ],
            // Served as a static asset by the front-end
            output_path: PathBuf::from("./public/schedule.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandingsConfig {
    pub url: String,
    pub output_path: PathBuf,
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self {
            url: division_url(FRBCAPL_TEST_DIVISION_ID),
            output_path: PathBuf::from("standings.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    pub browser: BrowserSettings,
    pub schedule: ScheduleConfig,
    pub standings: StandingsConfig,
}

impl ScraperConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Applies overrides on top of the defaults. Values that fail to parse are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("CHROME_EXECUTABLE") {
            config.browser.chrome_executable = Some(PathBuf::from(path));
        }
        if let Some(headless) = lookup("CHROME_HEADLESS").and_then(|v| parse_bool(&v)) {
            config.browser.headless = headless;
        }
        if let Some(no_sandbox) = lookup("CHROME_NO_SANDBOX").and_then(|v| parse_bool(&v)) {
            config.browser.no_sandbox = no_sandbox;
        }
        if let Some(timeout) = lookup("RENDER_TIMEOUT_SECS").and_then(|t| t.parse::<u64>().ok()) {
            config.browser.render_timeout_secs = timeout;
        }
        if let Some(interval) = lookup("RENDER_POLL_INTERVAL_MS").and_then(|i| i.parse::<u64>().ok()) {
            if interval > 0 {
                config.browser.poll_interval_ms = interval;
            }
        }

        if let Some(path) = lookup("SCHEDULE_OUTPUT_PATH") {
            config.schedule.output_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("SCHEDULE_DIVISIONS_FILE") {
            config.schedule.divisions = load_divisions(&path)?;
        }

        if let Some(url) = lookup("STANDINGS_URL") {
            config.standings.url = url;
        }
        if let Some(path) = lookup("STANDINGS_OUTPUT_PATH") {
            config.standings.output_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads a JSON array of `{ "name": ..., "url": ... }` objects.
fn load_divisions(path: &str) -> Result<Vec<Division>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read divisions file {}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid divisions file {}", path))
}
