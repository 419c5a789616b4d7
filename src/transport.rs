//! Message transport abstraction
//!
//! The harvester does not talk to the messaging service itself. The embedding
//! application owns the authenticated session and exposes it through the
//! [`Transport`] trait; the collection pipeline only ever pulls from the
//! streams it returns, one request at a time.
//!
//! ## Usage
//!
//! ```
//! use channel_harvest::transport::{MessageStream, Transport};
//! use channel_harvest::types::{MessageId, RawMessage};
//! use futures::stream::{self, StreamExt};
//!
//! /// Serves a fixed history and never has replies.
//! struct StaticHistory(Vec<RawMessage>);
//!
//! impl Transport for StaticHistory {
//!     fn iter_messages<'a>(
//!         &'a self,
//!         _channel: &'a str,
//!         reply_to: Option<MessageId>,
//!     ) -> MessageStream<'a> {
//!         match reply_to {
//!             None => stream::iter(self.0.clone().into_iter().map(Ok)).boxed(),
//!             Some(_) => stream::empty().boxed(),
//!         }
//!     }
//! }
//! ```

use futures::stream::BoxStream;

use crate::error::TransportError;
use crate::types::{MessageId, RawMessage};

/// Lazy sequence of raw message records
pub type MessageStream<'a> = BoxStream<'a, Result<RawMessage, TransportError>>;

/// Access to a channel's history through an authenticated session
///
/// Implementations must deliver the channel history newest first, using the
/// service's native pagination. The harvester never re-sorts what it is given.
pub trait Transport: Send + Sync {
    /// Iterate a channel's messages
    ///
    /// * `reply_to = None` - the channel history, newest first
    /// * `reply_to = Some(id)` - the reply thread anchored at message `id`
    ///
    /// Errors are yielded as stream items; the harvester stops pulling from
    /// a stream after its first error.
    fn iter_messages<'a>(
        &'a self,
        channel: &'a str,
        reply_to: Option<MessageId>,
    ) -> MessageStream<'a>;
}
