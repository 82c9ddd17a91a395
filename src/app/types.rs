use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{Config, LogFormat};
use crate::scrape::PageOutcome;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "linkgate",
    version,
    about = "Focused crawler with URL canonicalization, trap detection and crawl analytics"
)]
pub struct Cli {
    #[arg(value_name = "SEED", required = true)]
    pub seeds: Vec<String>,

    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<ReportFormatArg>,

    #[arg(long, value_name = "N")]
    pub max_pages: Option<usize>,

    #[arg(long, value_name = "N")]
    pub fetch_concurrency: Option<usize>,

    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Flags given on the command line win over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(max_pages) = self.max_pages {
            config.crawl.max_pages = max_pages;
        }
        if let Some(concurrency) = self.fetch_concurrency {
            config.crawl.fetch_concurrency = concurrency;
        }
        if let Some(ref ua) = self.user_agent {
            config.crawl.user_agent = ua.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format.into();
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum, PartialEq, Eq)]
pub enum ReportFormatArg {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Copy, Clone, ValueEnum, PartialEq, Eq)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug)]
pub enum CrawlEvent {
    Page {
        url: String,
        status: u16,
        outcome: PageOutcome,
        discovered: usize,
    },
    Error(String),
    Status(String),
    Finished,
}

#[derive(Debug, Default)]
pub struct CrawlState {
    pub fetched: usize,
    pub scraped: usize,
    pub marked_bad: usize,
    pub skipped: usize,
    pub discovered: usize,
    pub errors: usize,
    pub done: bool,
}

impl CrawlState {
    pub fn apply(&mut self, event: &CrawlEvent) {
        match event {
            CrawlEvent::Page {
                outcome,
                discovered,
                ..
            } => {
                self.fetched += 1;
                self.discovered += discovered;
                match outcome {
                    PageOutcome::Scraped { .. } => self.scraped += 1,
                    PageOutcome::MarkedBad => self.marked_bad += 1,
                    _ => self.skipped += 1,
                }
            }
            CrawlEvent::Error(_) => self.errors += 1,
            CrawlEvent::Status(_) => {}
            CrawlEvent::Finished => self.done = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "linkgate",
            "https://www.ics.uci.edu",
            "--max-pages",
            "7",
            "--fetch-concurrency",
            "3",
            "--log-format",
            "json",
            "-vv",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.crawl.max_pages, 7);
        assert_eq!(config.crawl.fetch_concurrency, 3);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.seeds, vec!["https://www.ics.uci.edu".to_string()]);
    }

    #[test]
    fn test_state_counts_outcomes() {
        let mut state = CrawlState::default();
        state.apply(&CrawlEvent::Page {
            url: "https://ics.uci.edu/".to_string(),
            status: 200,
            outcome: PageOutcome::Scraped { words: 80, links: 4 },
            discovered: 3,
        });
        state.apply(&CrawlEvent::Page {
            url: "https://ics.uci.edu/gone".to_string(),
            status: 404,
            outcome: PageOutcome::MarkedBad,
            discovered: 0,
        });
        state.apply(&CrawlEvent::Finished);
        assert_eq!(state.fetched, 2);
        assert_eq!(state.scraped, 1);
        assert_eq!(state.marked_bad, 1);
        assert_eq!(state.discovered, 3);
        assert!(state.done);
    }
}
