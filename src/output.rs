//! Persistence of channel result sets
//!
//! The harvester hands every non-empty [`ChannelResultSet`] to a
//! [`ResultSink`]. [`CsvSink`] is the shipped implementation: one UTF-8 CSV
//! file per channel, columns chosen by the [`CollectionMode`], rows in
//! collection order (newest first).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{CollectionMode, OutputConfig};
use crate::error::{Error, Result};
use crate::preprocess::TextCleaner;
use crate::types::{ChannelResultSet, Message};

/// UTF-8 byte order mark
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Timezone-naive rendering of message dates
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Destination for completed channel result sets
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist one channel's messages, returning where they were written
    async fn persist(&self, results: &ChannelResultSet, mode: CollectionMode) -> Result<PathBuf>;
}

/// Column names for a mode, in file order
pub fn columns(mode: CollectionMode, include_clean_text: bool) -> Vec<&'static str> {
    let mut columns = vec!["msg_id", "date", "text"];
    if include_clean_text {
        columns.push("clean_text");
    }
    columns.extend(["views", "forwards", "replies_to"]);
    if mode.expands_comments() {
        columns.push("comments");
    }
    if mode.expands_reactions() {
        columns.push("emoji_reactions");
    }
    columns.push("channel");
    columns
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn row(message: &Message, mode: CollectionMode, cleaner: Option<&TextCleaner>) -> Vec<String> {
    let mut row = vec![
        message.id.to_string(),
        message.date.format(DATE_FORMAT).to_string(),
        message.text.clone(),
    ];
    if let Some(cleaner) = cleaner {
        row.push(cleaner.clean_text(&message.text));
    }
    row.extend([
        optional(message.views),
        optional(message.forwards),
        optional(message.reply_to),
    ]);
    if mode.expands_comments() {
        row.push(message.comments.clone());
    }
    if mode.expands_reactions() {
        row.push(match cleaner {
            Some(cleaner) => cleaner.clean_reactions(&message.reactions),
            None => message.reactions.clone(),
        });
    }
    row.push(message.channel.clone());
    row
}

/// Render a result set as CSV bytes
///
/// Output is a pure function of its inputs, so identical result sets always
/// produce identical bytes.
pub fn render_csv(
    results: &ChannelResultSet,
    mode: CollectionMode,
    cleaner: Option<&TextCleaner>,
    write_bom: bool,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if write_bom {
        buf.extend_from_slice(UTF8_BOM);
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buf);

    writer.write_record(columns(mode, cleaner.is_some()))?;
    for message in results.messages() {
        writer.write_record(row(message, mode, cleaner))?;
    }

    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// File-name-safe form of a channel identifier
pub fn file_stem(channel: &str) -> String {
    channel
        .trim()
        .trim_start_matches('@')
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// Writes one CSV file per channel into the configured data directory
pub struct CsvSink {
    config: OutputConfig,
    cleaner: Option<TextCleaner>,
}

impl CsvSink {
    /// Create a sink; compiles the text cleaner when `include_clean_text` is set
    pub fn new(config: OutputConfig) -> Result<Self> {
        let cleaner = if config.include_clean_text {
            Some(TextCleaner::new()?)
        } else {
            None
        };
        Ok(Self { config, cleaner })
    }

    /// Output path for a channel
    pub fn path_for(&self, channel: &str) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}{}", file_stem(channel), self.config.file_suffix))
    }
}

#[async_trait]
impl ResultSink for CsvSink {
    async fn persist(&self, results: &ChannelResultSet, mode: CollectionMode) -> Result<PathBuf> {
        let path = self.path_for(results.channel());
        let bytes = render_csv(results, mode, self.cleaner.as_ref(), self.config.write_bom)?;

        tokio::fs::create_dir_all(&self.config.data_dir)
            .await
            .map_err(|e| persist_error(&self.config.data_dir, e))?;

        // Write beside the target and rename so a crash never leaves a torn file
        let tmp = temp_path(&path);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| persist_error(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            // Best effort; the rename failure is what gets reported
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(persist_error(&path, e));
        }

        debug!(path = %path.display(), bytes = bytes.len(), "CSV written");
        info!(
            channel = %results.channel(),
            rows = results.len(),
            path = %path.display(),
            "Saved messages"
        );
        Ok(path)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn persist_error(path: &Path, e: std::io::Error) -> Error {
    Error::Persist {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
