//! Reply-thread and reaction expansion for collected messages

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::CollectionMode;
use crate::error::TransportError;
use crate::retry::{QuotaSignal, RateLimitPolicy};
use crate::transport::Transport;
use crate::types::{
    COMMENT_SEPARATOR, MessageId, REACTION_SEPARATOR, RawMessage, ReactionCount,
    newlines_to_spaces,
};

/// Flattened thread and reactions of one message
#[derive(Debug, Default)]
pub struct Expansion {
    /// Reply bodies joined by `" || "`; empty when there are none or the fetch failed
    pub comments: String,
    /// `emoji:count` pairs joined by `", "`
    pub reactions: String,
    /// Why the reply thread could not be fetched
    pub reply_error: Option<TransportError>,
}

/// Flatten a reaction tally, keeping plain emoji reactions only
pub fn flatten_reactions(reactions: &[ReactionCount]) -> String {
    reactions
        .iter()
        .filter_map(ReactionCount::format_emoji)
        .collect::<Vec<_>>()
        .join(REACTION_SEPARATOR)
}

/// Expands a message into its reply thread and reaction set
///
/// A failed thread fetch never escapes: the message keeps empty comments and
/// the error is handed back for reporting.
pub struct ThreadExpander {
    transport: Arc<dyn Transport>,
    mode: CollectionMode,
    policy: RateLimitPolicy,
}

impl ThreadExpander {
    /// Create an expander for the given mode
    pub fn new(transport: Arc<dyn Transport>, mode: CollectionMode, policy: RateLimitPolicy) -> Self {
        Self {
            transport,
            mode,
            policy,
        }
    }

    /// Expand one message of `channel`
    pub async fn expand(&self, channel: &str, message: &RawMessage) -> Expansion {
        let mut expansion = Expansion::default();

        if self.mode.expands_comments() && message.has_replies() {
            match self.fetch_comments(channel, message.id).await {
                Ok(comments) => expansion.comments = comments,
                Err(e) => {
                    warn!(
                        channel = %channel,
                        msg_id = %message.id,
                        error = %e,
                        "Could not fetch replies, leaving comments empty"
                    );
                    if let Some(required) = e.required_wait() {
                        self.policy.wait_for_quota(channel, required).await;
                    }
                    expansion.reply_error = Some(e);
                }
            }
        }

        if self.mode.expands_reactions() {
            expansion.reactions = flatten_reactions(&message.reactions);
        }

        expansion
    }

    async fn fetch_comments(
        &self,
        channel: &str,
        anchor: MessageId,
    ) -> Result<String, TransportError> {
        let mut thread = self.transport.iter_messages(channel, Some(anchor));
        let mut bodies = Vec::new();

        while let Some(reply) = thread.next().await {
            let reply = reply?;
            if let Some(text) = reply.text.as_deref().filter(|t| !t.is_empty()) {
                bodies.push(newlines_to_spaces(text));
            }
        }

        debug!(channel = %channel, msg_id = %anchor, replies = bodies.len(), "Fetched reply thread");
        Ok(bodies.join(COMMENT_SEPARATOR))
    }
}
