//! In-memory channel fixtures and a fake transport serving them

use channel_harvest::{
    MessageId, MessageStream, RawMessage, ReactionCount, ReactionKind, Transport, TransportError,
    UnavailableReason,
};
use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Mutex;

/// Midnight UTC on the given day
pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// A channel post with counters filled in
pub fn post(id: i64, date: DateTime<Utc>, text: &str) -> RawMessage {
    RawMessage {
        id: MessageId(id),
        date: Some(date),
        text: Some(text.to_string()),
        views: Some(100 * id as u64),
        forwards: Some(id as u64),
        ..Default::default()
    }
}

/// A reply inside a discussion thread
pub fn reply(id: i64, text: &str) -> RawMessage {
    RawMessage {
        id: MessageId(id),
        date: Some(day(2024, 1, 1)),
        text: Some(text.to_string()),
        ..Default::default()
    }
}

/// One reaction of every kind the service delivers
pub fn mixed_reactions() -> Vec<ReactionCount> {
    vec![
        ReactionCount::emoji("👍", 12),
        ReactionCount {
            kind: ReactionKind::CustomEmoji {
                document_id: 5_368_324_170_671_202_286,
            },
            count: 4,
        },
        ReactionCount {
            kind: ReactionKind::Paid,
            count: 2,
        },
        ReactionCount::emoji("🔥", 3),
    ]
}

/// Fake messaging service holding channel histories and reply threads
///
/// Channels that were never registered answer with "does not exist".
#[derive(Default)]
pub struct FakeTelegram {
    histories: HashMap<String, Vec<RawMessage>>,
    threads: HashMap<(String, MessageId), Result<Vec<RawMessage>, TransportError>>,
    unavailable: HashMap<String, UnavailableReason>,
    requests: Mutex<Vec<(String, Option<MessageId>)>>,
}

impl FakeTelegram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel history, newest first
    pub fn channel(mut self, name: &str, history: Vec<RawMessage>) -> Self {
        self.histories.insert(name.to_string(), history);
        self
    }

    /// Register the replies of one post
    pub fn thread(mut self, channel: &str, post: i64, replies: Vec<RawMessage>) -> Self {
        self.threads
            .insert((channel.to_string(), MessageId(post)), Ok(replies));
        self
    }

    /// Make the reply fetch of one post fail
    pub fn broken_thread(mut self, channel: &str, post: i64, error: &str) -> Self {
        self.threads.insert(
            (channel.to_string(), MessageId(post)),
            Err(TransportError::Other(error.to_string())),
        );
        self
    }

    /// Make a channel inaccessible
    pub fn restricted(mut self, name: &str, reason: UnavailableReason) -> Self {
        self.unavailable.insert(name.to_string(), reason);
        self
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<(String, Option<MessageId>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTelegram {
    fn iter_messages<'a>(
        &'a self,
        channel: &'a str,
        reply_to: Option<MessageId>,
    ) -> MessageStream<'a> {
        self.requests
            .lock()
            .unwrap()
            .push((channel.to_string(), reply_to));

        if let Some(reason) = self.unavailable.get(channel) {
            return stream::iter(vec![Err(TransportError::ChannelUnavailable {
                channel: channel.to_string(),
                reason: reason.clone(),
            })])
            .boxed();
        }

        let items: Vec<Result<RawMessage, TransportError>> = match reply_to {
            None => match self.histories.get(channel) {
                Some(history) => history.iter().cloned().map(Ok).collect(),
                None => vec![Err(TransportError::ChannelUnavailable {
                    channel: channel.to_string(),
                    reason: UnavailableReason::NotFound,
                })],
            },
            Some(post) => match self.threads.get(&(channel.to_string(), post)) {
                Some(Ok(replies)) => replies.iter().cloned().map(Ok).collect(),
                Some(Err(e)) => vec![Err(e.clone())],
                None => Vec::new(),
            },
        };
        stream::iter(items).boxed()
    }
}
