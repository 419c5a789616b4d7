//! Core types for channel-harvest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Separator placed between reply bodies in the flattened comments field
pub const COMMENT_SEPARATOR: &str = " || ";

/// Separator placed between `emoji:count` pairs in the flattened reactions field
pub const REACTION_SEPARATOR: &str = ", ";

/// Identifier of a message within a channel
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    /// Create a new MessageId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<MessageId> for i64 {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Kind of a reaction attached to a message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// Plain unicode emoji reaction
    Emoji(String),
    /// Custom emoji from a sticker set, identified by its document
    CustomEmoji {
        /// Document backing the custom emoji
        document_id: i64,
    },
    /// Paid reaction
    Paid,
}

/// One entry of a message's reaction tally
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    /// What was reacted with
    pub kind: ReactionKind,
    /// How many users reacted this way
    pub count: u32,
}

impl ReactionCount {
    /// Plain emoji reaction entry
    pub fn emoji(symbol: impl Into<String>, count: u32) -> Self {
        Self {
            kind: ReactionKind::Emoji(symbol.into()),
            count,
        }
    }

    /// `"<emoji>:<count>"` for emoji reactions, `None` for every other kind
    pub fn format_emoji(&self) -> Option<String> {
        match &self.kind {
            ReactionKind::Emoji(symbol) => Some(format!("{}:{}", symbol, self.count)),
            ReactionKind::CustomEmoji { .. } | ReactionKind::Paid => None,
        }
    }
}

/// A message record as delivered by the transport
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Message identifier, unique within the channel
    pub id: MessageId,
    /// Publication time; messages without one are skipped
    pub date: Option<DateTime<Utc>>,
    /// Raw message body
    pub text: Option<String>,
    /// View counter
    pub views: Option<u64>,
    /// Forward counter
    pub forwards: Option<u64>,
    /// Parent message in the same channel
    pub reply_to: Option<MessageId>,
    /// Number of replies in this message's thread
    pub reply_count: Option<u32>,
    /// Reaction tally
    #[serde(default)]
    pub reactions: Vec<ReactionCount>,
}

impl RawMessage {
    /// Whether the message reports at least one reply
    pub fn has_replies(&self) -> bool {
        self.reply_count.is_some_and(|n| n > 0)
    }
}

/// Replace every line break with a single space
///
/// Each break maps to its own space, so blank lines leave a double space
/// behind. `\r\n` counts as one break. Other whitespace is preserved as
/// delivered.
pub fn newlines_to_spaces(text: &str) -> String {
    text.replace("\r\n", "\n").replace(['\n', '\r'], " ")
}

/// A collected message, augmented with its flattened thread and reactions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier
    pub id: MessageId,
    /// Publication time (UTC)
    pub date: DateTime<Utc>,
    /// Body with newlines collapsed to spaces
    pub text: String,
    /// View counter
    pub views: Option<u64>,
    /// Forward counter
    pub forwards: Option<u64>,
    /// Parent message in the same channel
    pub reply_to: Option<MessageId>,
    /// Reply bodies joined by [`COMMENT_SEPARATOR`]
    pub comments: String,
    /// `emoji:count` pairs joined by [`REACTION_SEPARATOR`]
    pub reactions: String,
    /// Source channel identifier
    pub channel: String,
}

impl Message {
    /// Build a message from a dated raw record and its expansion
    ///
    /// Returns `None` when the raw record carries no date.
    pub fn from_raw(
        channel: &str,
        raw: RawMessage,
        comments: String,
        reactions: String,
    ) -> Option<Self> {
        let date = raw.date?;
        Some(Self {
            id: raw.id,
            date,
            text: raw.text.as_deref().map(newlines_to_spaces).unwrap_or_default(),
            views: raw.views,
            forwards: raw.forwards,
            reply_to: raw.reply_to,
            comments,
            reactions,
            channel: channel.to_string(),
        })
    }
}

/// Closed interval `[start, end]` of UTC instants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::Config {
                message: format!("window start {start} is after window end {end}"),
                key: Some("window".to_string()),
            });
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Inclusive upper bound
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `t` lies strictly before the window
    pub fn is_before_start(&self, t: DateTime<Utc>) -> bool {
        t < self.start
    }

    /// `t` lies strictly after the window
    pub fn is_after_end(&self, t: DateTime<Utc>) -> bool {
        t > self.end
    }

    /// `t` lies inside the window (bounds included)
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        !self.is_before_start(t) && !self.is_after_end(t)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Messages collected for one channel, in stream order (newest first)
#[derive(Clone, Debug)]
pub struct ChannelResultSet {
    channel: String,
    messages: Vec<Message>,
    seen: HashSet<MessageId>,
}

impl ChannelResultSet {
    /// Create an empty result set for `channel`
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            messages: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Append a message; returns `false` (and drops it) if its id was already collected
    pub fn push(&mut self, message: Message) -> bool {
        if !self.seen.insert(message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Whether a message with this id was already collected
    pub fn contains(&self, id: MessageId) -> bool {
        self.seen.contains(&id)
    }

    /// Source channel
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Collected messages in stream order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of collected messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing was collected
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Date of the newest collected message
    pub fn latest_date(&self) -> Option<DateTime<Utc>> {
        self.messages.first().map(|m| m.date)
    }

    /// Date of the oldest collected message
    pub fn oldest_date(&self) -> Option<DateTime<Utc>> {
        self.messages.last().map(|m| m.date)
    }

    /// Drop everything collected so far
    pub(crate) fn clear(&mut self) {
        self.messages.clear();
        self.seen.clear();
    }

    /// Consume the set, yielding its messages
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// How a channel's collection ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// The stream ended normally (window boundary, cap or end of history)
    Complete,
    /// The service demanded a pause; the mandated wait was served and the
    /// channel closed with what had been collected
    RateLimited {
        /// Time spent waiting
        waited: Duration,
    },
    /// The channel is private, invalid or missing; nothing was collected
    Unavailable {
        /// Human-readable rejection reason
        reason: String,
    },
    /// An unclassified transport error ended the channel; partial results kept
    Failed {
        /// Human-readable error
        error: String,
    },
}

impl ChannelOutcome {
    /// Whether the channel ended without any error
    pub fn is_complete(&self) -> bool {
        matches!(self, ChannelOutcome::Complete)
    }
}

impl std::fmt::Display for ChannelOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelOutcome::Complete => write!(f, "complete"),
            ChannelOutcome::RateLimited { waited } => {
                write!(f, "rate limited (waited {}s)", waited.as_secs())
            }
            ChannelOutcome::Unavailable { reason } => write!(f, "unavailable: {reason}"),
            ChannelOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Summary of one channel's collection and persistence
#[derive(Clone, Debug)]
pub struct ChannelReport {
    /// Channel identifier
    pub channel: String,
    /// How collection ended
    pub outcome: ChannelOutcome,
    /// Messages in the result set
    pub collected: usize,
    /// Messages dropped because their id was already collected
    pub duplicates: usize,
    /// Messages whose reply thread could not be fetched
    pub reply_failures: usize,
    /// Records skipped for lacking a date
    pub skipped_undated: usize,
    /// Records skipped for being newer than the window
    pub skipped_after_window: usize,
    /// File the result set was written to
    pub output: Option<PathBuf>,
    /// Why persistence failed, if it did
    pub persist_error: Option<String>,
}

impl ChannelReport {
    /// Fresh report for a channel that has not produced anything yet
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            outcome: ChannelOutcome::Complete,
            collected: 0,
            duplicates: 0,
            reply_failures: 0,
            skipped_undated: 0,
            skipped_after_window: 0,
            output: None,
            persist_error: None,
        }
    }
}

/// Summary of a whole run, one report per channel in run order
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    /// Per-channel reports
    pub channels: Vec<ChannelReport>,
}

impl RunReport {
    /// Messages collected across all channels
    pub fn total_messages(&self) -> usize {
        self.channels.iter().map(|c| c.collected).sum()
    }

    /// Channels that did not complete cleanly or could not be persisted
    pub fn failed_channels(&self) -> Vec<&str> {
        self.channels
            .iter()
            .filter(|c| !c.outcome.is_complete() || c.persist_error.is_some())
            .map(|c| c.channel.as_str())
            .collect()
    }
}

/// Event emitted while a run progresses
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run over the configured channels started
    RunStarted {
        /// Channels in run order
        channels: Vec<String>,
        /// Window start
        start: DateTime<Utc>,
        /// Window end
        end: DateTime<Utc>,
    },

    /// Collection of a channel started
    ChannelStarted {
        /// Channel identifier
        channel: String,
    },

    /// Periodic progress signal
    Progress {
        /// Channel identifier
        channel: String,
        /// Messages collected so far
        collected: usize,
        /// Date of the most recently collected message
        latest_date: DateTime<Utc>,
    },

    /// A message's reply thread could not be fetched; its comments are empty
    ReplyFetchFailed {
        /// Channel identifier
        channel: String,
        /// Message whose thread failed
        msg_id: MessageId,
        /// Error message
        error: String,
    },

    /// The service demanded a pause
    RateLimited {
        /// Channel identifier
        channel: String,
        /// Mandated wait in seconds
        wait_secs: u64,
    },

    /// Collection of a channel ended
    ChannelFinished {
        /// Channel identifier
        channel: String,
        /// Messages collected
        collected: usize,
        /// How collection ended
        outcome: String,
    },

    /// A channel result set was written
    Persisted {
        /// Channel identifier
        channel: String,
        /// Output file
        path: PathBuf,
        /// Rows written
        rows: usize,
    },

    /// Writing a channel result set failed
    PersistFailed {
        /// Channel identifier
        channel: String,
        /// Error message
        error: String,
    },

    /// The run finished
    RunFinished {
        /// Number of channels processed
        channels: usize,
        /// Messages collected across all channels
        total_messages: usize,
    },
}
