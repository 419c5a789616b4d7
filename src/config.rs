//! Configuration types for channel-harvest

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::output::file_stem;
use crate::types::TimeWindow;

/// Which expansions run for every collected message
///
/// The mode also decides the column set of the persisted file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    /// Messages only; no reply or reaction expansion
    MessagesOnly,
    /// Messages plus their flattened reply threads
    #[default]
    Comments,
    /// Messages, reply threads and emoji reactions
    Full,
}

impl CollectionMode {
    /// Whether reply threads are fetched in this mode
    pub fn expands_comments(&self) -> bool {
        matches!(self, CollectionMode::Comments | CollectionMode::Full)
    }

    /// Whether reaction tallies are flattened in this mode
    pub fn expands_reactions(&self) -> bool {
        matches!(self, CollectionMode::Full)
    }
}

/// Time window configuration
///
/// Explicit bounds win; a missing `end` means "now" and a missing `start`
/// means `lookback_days` before the end.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Inclusive lower bound (default: `end - lookback_days`)
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    /// Inclusive upper bound (default: the time the run starts)
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,

    /// Days to look back when `start` is not set (default: 1825, five years)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            lookback_days: default_lookback_days(),
        }
    }
}

impl WindowConfig {
    /// Resolve the configured bounds against `now`
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<TimeWindow> {
        let end = self.end.unwrap_or(now);
        let start = match self.start {
            Some(start) => start,
            None => end
                .checked_sub_signed(ChronoDuration::days(i64::from(self.lookback_days)))
                .ok_or_else(|| {
                    Error::config(
                        "window.lookback_days",
                        format!("{} days before {end} is out of range", self.lookback_days),
                    )
                })?,
        };
        TimeWindow::new(start, end)
    }
}

/// Collection behavior (mode, caps, pacing, progress reporting)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Expansion mode (default: comments)
    #[serde(default)]
    pub mode: CollectionMode,

    /// Hard cap on dated messages fetched per channel (None = unlimited)
    #[serde(default)]
    pub max_messages: Option<usize>,

    /// Emit a progress signal every N collected messages (default: 100)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Pause between two channels (default: 10 seconds)
    #[serde(default = "default_channel_delay", with = "duration_serde")]
    pub channel_delay: Duration,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            mode: CollectionMode::default(),
            max_messages: None,
            progress_interval: default_progress_interval(),
            channel_delay: default_channel_delay(),
        }
    }
}

/// How quota-exhaustion signals from the service are handled
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sleep for the wait the service mandates (default: true)
    ///
    /// When disabled the signal is only reported; the affected channel still
    /// closes with the messages collected so far.
    #[serde(default = "default_true")]
    pub honor_flood_wait: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            honor_flood_wait: true,
        }
    }
}

/// Output file configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one CSV per channel (default: "./data")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Appended to the channel identifier to form the file name (default: "_messages.csv")
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,

    /// Start each file with a UTF-8 byte order mark (default: true)
    #[serde(default = "default_true")]
    pub write_bom: bool,

    /// Add a normalized `clean_text` column after `text` and trim the
    /// reactions column (default: false)
    #[serde(default)]
    pub include_clean_text: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_suffix: default_file_suffix(),
            write_bom: true,
            include_clean_text: false,
        }
    }
}

/// Main configuration for a [`Harvester`](crate::Harvester)
///
/// Credentials are not part of the configuration: the transport is built
/// and authenticated by the caller and handed to the harvester.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Channel identifiers, harvested in this order
    pub channels: Vec<String>,

    /// Time window
    #[serde(default)]
    pub window: WindowConfig,

    /// Collection behavior
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Rate-limit handling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Output files
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Parse a configuration from a JSON string and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(Error::config("channels", "at least one channel is required"));
        }
        if let Some(blank) = self.channels.iter().position(|c| c.trim().is_empty()) {
            return Err(Error::config(
                "channels",
                format!("channel at position {blank} is empty"),
            ));
        }
        // One file per channel: two identifiers must never share an output path
        let mut stems: HashMap<String, &str> = HashMap::new();
        for channel in &self.channels {
            if let Some(previous) = stems.insert(file_stem(channel), channel.as_str()) {
                return Err(Error::config(
                    "channels",
                    format!("'{previous}' and '{channel}' would write to the same output file"),
                ));
            }
        }
        if self.collection.progress_interval == 0 {
            return Err(Error::config(
                "collection.progress_interval",
                "must be greater than zero",
            ));
        }
        if self.collection.max_messages == Some(0) {
            return Err(Error::config(
                "collection.max_messages",
                "must be greater than zero when set",
            ));
        }
        if self.output.file_suffix.trim().is_empty() {
            return Err(Error::config("output.file_suffix", "must not be empty"));
        }
        if let (Some(start), Some(end)) = (self.window.start, self.window.end) {
            if start > end {
                return Err(Error::config(
                    "window",
                    format!("start {start} is after end {end}"),
                ));
            }
        }
        Ok(())
    }
}

fn default_lookback_days() -> u32 {
    5 * 365
}

fn default_progress_interval() -> usize {
    100
}

fn default_channel_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_file_suffix() -> String {
    "_messages.csv".to_string()
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
