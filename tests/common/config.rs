//! Test configuration helpers for building harvesters over a temp data directory

use channel_harvest::config::OutputConfig;
use channel_harvest::{CollectionMode, Config, CsvSink, Harvester, Transport};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Configuration writing into `dir`, with no pacing and no BOM
///
/// The window is pinned so runs are reproducible regardless of today's date.
pub fn test_config(
    dir: &TempDir,
    channels: &[&str],
    mode: CollectionMode,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Config {
    let mut config = Config {
        channels: channels.iter().map(|c| c.to_string()).collect(),
        output: OutputConfig {
            data_dir: dir.path().to_path_buf(),
            write_bom: false,
            ..Default::default()
        },
        ..Default::default()
    };
    config.window.start = Some(start);
    config.window.end = Some(end);
    config.collection.mode = mode;
    config.collection.channel_delay = Duration::ZERO;
    config
}

/// Harvester persisting through a [`CsvSink`] built from the config
pub fn create_harvester(config: Config, transport: Arc<dyn Transport>) -> Harvester {
    let sink = Arc::new(CsvSink::new(config.output.clone()).unwrap());
    Harvester::new(config, transport, sink).unwrap()
}
