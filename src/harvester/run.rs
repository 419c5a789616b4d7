//! Sequential channel loop

use chrono::Utc;
use tracing::{debug, error, info};

use super::Harvester;
use crate::error::Result;
use crate::types::{ChannelReport, ChannelResultSet, Event, RunReport, TimeWindow};

impl Harvester {
    /// Harvest every configured channel over the configured window
    ///
    /// The window is resolved against the current time. Only window
    /// resolution can fail; per-channel problems end up in the report.
    pub async fn run(&self) -> Result<RunReport> {
        let window = self.config.window.resolve(Utc::now())?;
        Ok(self.run_channels(&self.config.channels, window).await)
    }

    /// Harvest `channels` in order over `window`
    ///
    /// Channels are processed one at a time. After each channel its result set
    /// is persisted (when non-empty), then the configured inter-channel delay
    /// is observed before the next channel starts. No channel failure stops
    /// the run.
    pub async fn run_channels(&self, channels: &[String], window: TimeWindow) -> RunReport {
        info!(channels = channels.len(), window = %window, "Starting harvest run");
        self.emit_event(Event::RunStarted {
            channels: channels.to_vec(),
            start: window.start(),
            end: window.end(),
        });

        let delay = self.config.collection.channel_delay;
        let mut report = RunReport::default();

        for (index, channel) in channels.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                debug!(delay_secs = delay.as_secs(), "Pausing between channels");
                tokio::time::sleep(delay).await;
            }

            self.emit_event(Event::ChannelStarted {
                channel: channel.clone(),
            });

            let (results, mut channel_report) = self.collector.collect(channel, window).await;

            info!(
                channel = %channel,
                collected = channel_report.collected,
                outcome = %channel_report.outcome,
                "Channel finished"
            );
            self.emit_event(Event::ChannelFinished {
                channel: channel.clone(),
                collected: channel_report.collected,
                outcome: channel_report.outcome.to_string(),
            });

            self.persist(&results, &mut channel_report).await;
            report.channels.push(channel_report);
        }

        info!(
            channels = report.channels.len(),
            total_messages = report.total_messages(),
            failed = report.failed_channels().len(),
            "Harvest run finished"
        );
        self.emit_event(Event::RunFinished {
            channels: report.channels.len(),
            total_messages: report.total_messages(),
        });

        report
    }

    async fn persist(&self, results: &ChannelResultSet, report: &mut ChannelReport) {
        if results.is_empty() {
            info!(channel = %results.channel(), "No messages found in the time window, nothing to save");
            return;
        }

        match self
            .sink
            .persist(results, self.config.collection.mode)
            .await
        {
            Ok(path) => {
                self.emit_event(Event::Persisted {
                    channel: results.channel().to_string(),
                    path: path.clone(),
                    rows: results.len(),
                });
                report.output = Some(path);
            }
            Err(e) => {
                error!(channel = %results.channel(), error = %e, "Failed to save messages");
                self.emit_event(Event::PersistFailed {
                    channel: results.channel().to_string(),
                    error: e.to_string(),
                });
                report.persist_error = Some(e.to_string());
            }
        }
    }
}
