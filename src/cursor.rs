//! Time-window cursor over a channel's message stream
//!
//! The transport delivers a channel's history newest first. [`MessageCursor`]
//! walks that stream and applies the window policy:
//!
//! - records without a date are skipped and never count toward the cap
//! - a record older than the window start ends the stream, since everything
//!   after it is older still
//! - a record newer than the window end is skipped without ending the stream
//! - an optional cap on dated records fetched ends the stream early
//!
//! Transport order is preserved as delivered; nothing is re-sorted.

use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::transport::{MessageStream, Transport};
use crate::types::{RawMessage, TimeWindow};

/// Why a cursor stopped producing records
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// A record older than the window start was reached
    WindowStart,
    /// The configured cap on fetched records was reached
    Cap,
    /// The transport has no more history
    EndOfHistory,
    /// The transport returned an error
    TransportError,
}

/// Lazy, window-bounded walk over one channel's history
pub struct MessageCursor<'a> {
    stream: MessageStream<'a>,
    channel: &'a str,
    window: TimeWindow,
    max_messages: Option<usize>,
    fetched: usize,
    skipped_undated: usize,
    skipped_after_window: usize,
    stop: Option<StopReason>,
}

impl<'a> MessageCursor<'a> {
    /// Open the channel's history on `transport`
    ///
    /// No request is issued until the first call to [`next`](Self::next).
    pub fn new(
        transport: &'a dyn Transport,
        channel: &'a str,
        window: TimeWindow,
        max_messages: Option<usize>,
    ) -> Self {
        Self {
            stream: transport.iter_messages(channel, None),
            channel,
            window,
            max_messages,
            fetched: 0,
            skipped_undated: 0,
            skipped_after_window: 0,
            stop: None,
        }
    }

    /// Next in-window record, `Ok(None)` once the stream has ended
    ///
    /// A transport error is returned once; the cursor is exhausted afterwards.
    pub async fn next(&mut self) -> Result<Option<RawMessage>, TransportError> {
        loop {
            if self.stop.is_some() {
                return Ok(None);
            }

            if let Some(cap) = self.max_messages {
                if self.fetched >= cap {
                    info!(channel = %self.channel, cap, "Message cap reached, stopping");
                    self.stop = Some(StopReason::Cap);
                    return Ok(None);
                }
            }

            let raw = match self.stream.next().await {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    self.stop = Some(StopReason::TransportError);
                    return Err(e);
                }
                None => {
                    debug!(channel = %self.channel, fetched = self.fetched, "End of channel history");
                    self.stop = Some(StopReason::EndOfHistory);
                    return Ok(None);
                }
            };

            let Some(date) = raw.date else {
                debug!(channel = %self.channel, msg_id = %raw.id, "Skipping message without date");
                self.skipped_undated += 1;
                continue;
            };

            self.fetched += 1;

            if self.window.is_before_start(date) {
                info!(
                    channel = %self.channel,
                    msg_id = %raw.id,
                    date = %date,
                    "Reached the end of the time window, stopping"
                );
                self.stop = Some(StopReason::WindowStart);
                return Ok(None);
            }

            if self.window.is_after_end(date) {
                debug!(channel = %self.channel, msg_id = %raw.id, date = %date, "Skipping message newer than window");
                self.skipped_after_window += 1;
                continue;
            }

            return Ok(Some(raw));
        }
    }

    /// Adapt the cursor into a [`Stream`]
    pub fn into_stream(self) -> impl Stream<Item = Result<RawMessage, TransportError>> + 'a {
        stream::unfold(self, |mut cursor| async move {
            match cursor.next().await {
                Ok(Some(raw)) => Some((Ok(raw), cursor)),
                Ok(None) => None,
                Err(e) => Some((Err(e), cursor)),
            }
        })
    }

    /// Dated records pulled from the transport so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Records skipped for lacking a date
    pub fn skipped_undated(&self) -> usize {
        self.skipped_undated
    }

    /// Records skipped for being newer than the window
    pub fn skipped_after_window(&self) -> usize {
        self.skipped_after_window
    }

    /// Why the cursor stopped, once it has
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }
}
