use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::batch::DEFAULT_EDIT_SUMMARY;
use crate::session::Credentials;

pub const DEFAULT_API_URL: &str = "https://impact.miraheze.org/w/api.php";

/// Publish project summaries as new pages on the wiki.
#[derive(Parser)]
#[command(version)]
pub struct Config {
    /// MediaWiki `api.php` endpoint.
    #[arg(long, env = "WIKI_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: Url,

    /// CSV file with `Name` and `Website` columns.
    #[arg(long, default_value = "resources/mixed_data.csv")]
    pub dataset: PathBuf,

    /// Directory holding `<title>.txt` summaries.
    #[arg(long, default_value = "summaries")]
    pub summaries: PathBuf,

    #[arg(long, env = "MIRAHEZE_BOT_USERNAME")]
    pub username: String,

    #[arg(long, env = "MIRAHEZE_BOT_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Milliseconds to wait between two page creations.
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    #[arg(long, default_value = DEFAULT_EDIT_SUMMARY)]
    pub edit_summary: String,

    /// Ask the Wayback Machine to snapshot each project website first.
    #[arg(long)]
    pub archive: bool,

    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Config {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
