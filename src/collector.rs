//! Per-channel collection: cursor + expander + error classification
//!
//! [`ChannelCollector::collect`] never fails. Every transport error is
//! classified and folded into the returned [`ChannelReport`]:
//!
//! | Error | Outcome | Messages kept |
//! |---|---|---|
//! | flood wait | mandated wait served, [`ChannelOutcome::RateLimited`] | collected so far |
//! | channel unavailable | [`ChannelOutcome::Unavailable`] | none |
//! | anything else | [`ChannelOutcome::Failed`] | collected so far |
//!
//! A reply-thread failure only affects the message it belongs to.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::CollectionConfig;
use crate::cursor::MessageCursor;
use crate::error::TransportError;
use crate::expander::ThreadExpander;
use crate::retry::{QuotaSignal, RateLimitPolicy};
use crate::transport::Transport;
use crate::types::{ChannelOutcome, ChannelReport, ChannelResultSet, Event, Message, TimeWindow};

/// Collects one channel at a time into an in-memory result set
pub struct ChannelCollector {
    transport: Arc<dyn Transport>,
    expander: ThreadExpander,
    policy: RateLimitPolicy,
    max_messages: Option<usize>,
    progress_interval: usize,
    event_tx: broadcast::Sender<Event>,
}

impl ChannelCollector {
    /// Create a collector
    ///
    /// Progress, reply failures and rate limits are broadcast on `event_tx`.
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &CollectionConfig,
        policy: RateLimitPolicy,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        let expander = ThreadExpander::new(transport.clone(), config.mode, policy.clone());
        Self {
            transport,
            expander,
            policy,
            max_messages: config.max_messages,
            progress_interval: config.progress_interval.max(1),
            event_tx,
        }
    }

    /// Collect the in-window messages of `channel`
    pub async fn collect(
        &self,
        channel: &str,
        window: TimeWindow,
    ) -> (ChannelResultSet, ChannelReport) {
        info!(channel = %channel, window = %window, "Fetching messages");

        let mut results = ChannelResultSet::new(channel);
        let mut report = ChannelReport::new(channel);
        let mut cursor =
            MessageCursor::new(self.transport.as_ref(), channel, window, self.max_messages);

        let outcome = loop {
            let raw = match cursor.next().await {
                Ok(Some(raw)) => raw,
                Ok(None) => break ChannelOutcome::Complete,
                Err(e) => break self.classify(channel, e, &mut results).await,
            };

            let msg_id = raw.id;
            // Checked before expansion so a repeat never costs a thread fetch
            if results.contains(msg_id) {
                debug!(channel = %channel, msg_id = %msg_id, "Dropping duplicate message");
                report.duplicates += 1;
                continue;
            }

            let expansion = self.expander.expand(channel, &raw).await;
            if let Some(e) = expansion.reply_error {
                report.reply_failures += 1;
                self.emit(Event::ReplyFetchFailed {
                    channel: channel.to_string(),
                    msg_id,
                    error: e.to_string(),
                });
            }

            let Some(message) =
                Message::from_raw(channel, raw, expansion.comments, expansion.reactions)
            else {
                continue;
            };
            let date = message.date;

            results.push(message);

            if results.len() % self.progress_interval == 0 {
                info!(
                    channel = %channel,
                    collected = results.len(),
                    latest_date = %date.format("%Y-%m-%d"),
                    "Fetched messages"
                );
                self.emit(Event::Progress {
                    channel: channel.to_string(),
                    collected: results.len(),
                    latest_date: date,
                });
            }
        };

        report.collected = results.len();
        report.skipped_undated = cursor.skipped_undated();
        report.skipped_after_window = cursor.skipped_after_window();
        report.outcome = outcome;
        (results, report)
    }

    async fn classify(
        &self,
        channel: &str,
        error: TransportError,
        results: &mut ChannelResultSet,
    ) -> ChannelOutcome {
        if let Some(required) = error.required_wait() {
            self.emit(Event::RateLimited {
                channel: channel.to_string(),
                wait_secs: required.as_secs(),
            });
            let waited = self.policy.wait_for_quota(channel, required).await;
            info!(
                channel = %channel,
                collected = results.len(),
                "Closing channel after flood wait with partial results"
            );
            return ChannelOutcome::RateLimited { waited };
        }

        match error {
            TransportError::ChannelUnavailable { reason, .. } => {
                warn!(
                    channel = %channel,
                    reason = %reason,
                    "Channel is private, restricted, or does not exist"
                );
                results.clear();
                ChannelOutcome::Unavailable {
                    reason: reason.to_string(),
                }
            }
            other => {
                error!(
                    channel = %channel,
                    error = %other,
                    collected = results.len(),
                    "Unexpected error while fetching channel, keeping partial results"
                );
                ChannelOutcome::Failed {
                    error: other.to_string(),
                }
            }
        }
    }

    fn emit(&self, event: Event) {
        // No receivers is fine
        self.event_tx.send(event).ok();
    }
}
