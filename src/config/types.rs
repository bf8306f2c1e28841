use serde::Deserialize;
use std::time::Duration;

/// Seed URLs crawled when no config file is given
pub const DEFAULT_SEEDS: &[&str] = &[
    "https://ton.org/docs",
    "https://tonscan.org/",
    "https://en.wikipedia.org/wiki/The_Open_Network",
    "https://tonwiki.space/wiki/The_Open_Network",
    "https://docs.ton.org/",
    "https://wallet.tg/",
    "http://ston.fi/",
    "https://www.tapps.center/",
    "https://tonstarter.com/",
    "https://core.telegram.org/bots/webapps",
    "https://ton.org/ru/mini-apps",
    "https://tonresear.ch/u/simpson/summary",
];

/// Recursion budget given to every seed
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Folder that receives page texts and downloaded documents
pub const DEFAULT_OUTPUT_DIR: &str = "TON_Library";

/// Browser-like user agent; several seed sites reject obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for ton-harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Ordered list of seed URLs
    #[serde(default = "default_seeds")]
    pub seeds: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Depth budget for each seed; 1 fetches the seed only
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,
}

/// HTTP fetch and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Attempts per URL before it counts as failed
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for `.txt` page dumps and downloaded documents
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

impl FetchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seeds: default_seeds(),
            crawler: CrawlerConfig::default(),
            fetch: FetchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

fn default_seeds() -> Vec<String> {
    DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect()
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}
