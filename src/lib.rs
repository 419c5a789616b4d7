//! # channel-harvest
//!
//! Batch collection of public Telegram channel history into per-channel CSV
//! datasets.
//!
//! ## Design Philosophy
//!
//! channel-harvest is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Transport-agnostic** - The messaging client is injected through the
//!   [`Transport`] trait, already authenticated
//! - **Failure-isolated** - One broken channel never stops the run
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use channel_harvest::{Config, CsvSink, Harvester, MessageId, MessageStream, Transport};
//!
//! struct MyClient;
//!
//! impl Transport for MyClient {
//!     fn iter_messages<'a>(
//!         &'a self,
//!         channel: &'a str,
//!         reply_to: Option<MessageId>,
//!     ) -> MessageStream<'a> {
//!         unimplemented!("wire up your Telegram client here")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         channels: vec!["bbcpersian".to_string(), "radiofarda".to_string()],
//!         ..Default::default()
//!     };
//!     let sink = Arc::new(CsvSink::new(config.output.clone())?);
//!     let harvester = Harvester::new(config, Arc::new(MyClient), sink)?;
//!
//!     // Subscribe to events
//!     let mut events = harvester.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = harvester.run().await?;
//!     println!("collected {} messages", report.total_messages());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Per-channel collection pipeline
pub mod collector;
/// Configuration types
pub mod config;
/// Windowed iteration over a channel history
pub mod cursor;
/// Error types
pub mod error;
/// Reply and reaction expansion
pub mod expander;
/// Run orchestration
pub mod harvester;
/// CSV persistence
pub mod output;
/// Text cleaning for downstream analysis
pub mod preprocess;
/// Rate-limit handling
pub mod retry;
/// Messaging transport abstraction
pub mod transport;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{CollectionMode, Config};
pub use error::{Error, Result, TransportError, UnavailableReason};
pub use harvester::Harvester;
pub use output::{CsvSink, ResultSink};
pub use transport::{MessageStream, Transport};
pub use types::{
    ChannelOutcome, ChannelReport, ChannelResultSet, Event, Message, MessageId, RawMessage,
    ReactionCount, ReactionKind, RunReport, TimeWindow,
};
