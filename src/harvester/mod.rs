//! Run orchestration across the configured channels.
//!
//! The `Harvester` struct and its methods are organized by concern:
//! - [`run`] - sequential channel loop, pacing and persistence hand-off

mod run;


use std::sync::Arc;

use crate::collector::ChannelCollector;
use crate::config::Config;
use crate::error::Result;
use crate::output::ResultSink;
use crate::retry::RateLimitPolicy;
use crate::transport::Transport;
use crate::types::Event;

/// Main harvester instance
///
/// Owns the injected transport and sink for the duration of a run. Channels
/// are processed strictly one after another; nothing is spawned.
pub struct Harvester {
    /// Configuration (wrapped in Arc so callers can keep a cheap handle)
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Per-channel collection pipeline
    pub(crate) collector: ChannelCollector,
    /// Persistence collaborator
    pub(crate) sink: Arc<dyn ResultSink>,
}

impl Harvester {
    /// Create a new Harvester
    ///
    /// Validates the configuration and wires the collection pipeline onto the
    /// given transport. The transport must already be authenticated.
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self> {
        config.validate()?;

        // Buffer of 1000 events; slow subscribers see RecvError::Lagged
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let policy = RateLimitPolicy::new(config.rate_limit.clone());
        let collector =
            ChannelCollector::new(transport, &config.collection, policy, event_tx.clone());

        tracing::info!(
            channels = config.channels.len(),
            mode = ?config.collection.mode,
            "Harvester initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            event_tx,
            collector,
            sink,
        })
    }

    /// Subscribe to harvest events
    ///
    /// Each subscriber receives all events independently.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
