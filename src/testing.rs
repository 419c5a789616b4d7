//! Shared test helpers: a scripted in-memory transport and record builders.

use crate::error::{TransportError, UnavailableReason};
use crate::transport::{MessageStream, Transport};
use crate::types::{MessageId, RawMessage, ReactionCount};
use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Mutex;

type Script = Vec<Result<RawMessage, TransportError>>;

/// Midnight UTC on the given day
pub(crate) fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// A dated message with a body and nothing else
pub(crate) fn raw(id: i64, date: DateTime<Utc>, text: &str) -> RawMessage {
    RawMessage {
        id: MessageId(id),
        date: Some(date),
        text: Some(text.to_string()),
        ..Default::default()
    }
}

/// A message with replies and reactions, as a channel post with a discussion
pub(crate) fn raw_with_thread(
    id: i64,
    date: DateTime<Utc>,
    reply_count: u32,
    reactions: Vec<ReactionCount>,
) -> RawMessage {
    RawMessage {
        id: MessageId(id),
        date: Some(date),
        text: Some(format!("post {id}")),
        views: Some(1000 + id as u64),
        forwards: Some(id as u64),
        reply_to: None,
        reply_count: Some(reply_count),
        reactions,
    }
}

/// A reply body in a thread
pub(crate) fn reply(id: i64, text: &str) -> RawMessage {
    RawMessage {
        id: MessageId(id),
        date: Some(at(2024, 1, 1)),
        text: Some(text.to_string()),
        ..Default::default()
    }
}

/// In-memory transport replaying scripted histories and reply threads
///
/// Every `iter_messages` call is recorded, and so is every history item
/// pulled, so tests can assert exactly how far a stream was consumed.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    histories: HashMap<String, Script>,
    threads: HashMap<(String, MessageId), Script>,
    calls: Mutex<Vec<(String, Option<MessageId>)>>,
    pulled: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Script a channel history from successful records
    pub(crate) fn with_history(self, channel: &str, messages: Vec<RawMessage>) -> Self {
        self.with_script(channel, messages.into_iter().map(Ok).collect())
    }

    /// Script a channel history that may include errors
    pub(crate) fn with_script(mut self, channel: &str, script: Script) -> Self {
        self.histories.insert(channel.to_string(), script);
        self
    }

    /// Script the reply thread of one message
    pub(crate) fn with_thread(mut self, channel: &str, anchor: i64, script: Script) -> Self {
        self.threads
            .insert((channel.to_string(), MessageId(anchor)), script);
        self
    }

    /// Every `iter_messages` call, in order
    pub(crate) fn calls(&self) -> Vec<(String, Option<MessageId>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Reply-thread fetches issued for a channel
    pub(crate) fn thread_calls(&self, channel: &str) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .filter_map(|(_, anchor)| anchor)
            .collect()
    }

    /// History items handed out for a channel
    pub(crate) fn pulled(&self, channel: &str) -> usize {
        self.pulled
            .lock()
            .unwrap()
            .get(channel)
            .copied()
            .unwrap_or(0)
    }
}

impl Transport for ScriptedTransport {
    fn iter_messages<'a>(
        &'a self,
        channel: &'a str,
        reply_to: Option<MessageId>,
    ) -> MessageStream<'a> {
        self.calls
            .lock()
            .unwrap()
            .push((channel.to_string(), reply_to));

        match reply_to {
            None => match self.histories.get(channel) {
                Some(script) => stream::iter(script.clone())
                    .inspect(move |_| {
                        *self
                            .pulled
                            .lock()
                            .unwrap()
                            .entry(channel.to_string())
                            .or_insert(0) += 1;
                    })
                    .boxed(),
                None => stream::iter(vec![Err(TransportError::ChannelUnavailable {
                    channel: channel.to_string(),
                    reason: UnavailableReason::NotFound,
                })])
                .boxed(),
            },
            Some(anchor) => {
                let script = self
                    .threads
                    .get(&(channel.to_string(), anchor))
                    .cloned()
                    .unwrap_or_default();
                stream::iter(script).boxed()
            }
        }
    }
}
