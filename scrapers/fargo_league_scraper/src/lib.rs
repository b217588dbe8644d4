pub mod browser;
pub mod config;
pub mod output;
pub mod runner;
pub mod schedule;
pub mod standings;
pub mod types;
pub mod utils;
