//! Rate-limit policy for quota-exhaustion signals
//!
//! The messaging service signals quota exhaustion with a mandatory wait
//! ("flood wait"). This module classifies errors carrying such a signal and
//! serves the wait. The policy never invents a duration of its own: it waits
//! exactly what the service asked for, then hands control back so the caller
//! can decide what to do next.
//!
//! # Example
//!
//! ```no_run
//! use channel_harvest::config::RateLimitConfig;
//! use channel_harvest::error::TransportError;
//! use channel_harvest::retry::{QuotaSignal, RateLimitPolicy};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let policy = RateLimitPolicy::new(RateLimitConfig::default());
//! let err = TransportError::FloodWait { wait: Duration::from_secs(30) };
//!
//! if let Some(required) = err.required_wait() {
//!     let waited = policy.wait_for_quota("bbcpersian", required).await;
//!     assert_eq!(waited, Duration::from_secs(30));
//! }
//! # }
//! ```

use crate::config::RateLimitConfig;
use crate::error::{Error, TransportError};
use std::time::Duration;

/// Trait for errors that may carry a quota-exhaustion signal
///
/// Returns the wait mandated by the service, or `None` when the error is not
/// a quota signal.
pub trait QuotaSignal {
    /// The pause the service requires before the next request
    fn required_wait(&self) -> Option<Duration>;
}

impl QuotaSignal for TransportError {
    fn required_wait(&self) -> Option<Duration> {
        match self {
            TransportError::FloodWait { wait } => Some(*wait),
            // Channel-level rejections are permanent for the whole run
            TransportError::ChannelUnavailable { .. } => None,
            TransportError::Other(_) => None,
        }
    }
}

impl QuotaSignal for Error {
    fn required_wait(&self) -> Option<Duration> {
        match self {
            Error::Transport(e) => e.required_wait(),
            _ => None,
        }
    }
}

/// Serves the waits mandated by quota-exhaustion signals
#[derive(Clone, Debug, Default)]
pub struct RateLimitPolicy {
    config: RateLimitConfig,
}

impl RateLimitPolicy {
    /// Create a policy from its configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config }
    }

    /// Suspend for exactly `required`, then return the time spent waiting
    ///
    /// With `honor_flood_wait` disabled the signal is logged and nothing is
    /// awaited; the returned duration is then zero.
    pub async fn wait_for_quota(&self, channel: &str, required: Duration) -> Duration {
        if !self.config.honor_flood_wait {
            tracing::warn!(
                channel = %channel,
                wait_secs = required.as_secs(),
                "Flood wait reported, not sleeping (honor_flood_wait disabled)"
            );
            return Duration::ZERO;
        }

        tracing::warn!(
            channel = %channel,
            wait_secs = required.as_secs(),
            "Flood wait: sleeping for the mandated duration"
        );
        tokio::time::sleep(required).await;
        tracing::info!(channel = %channel, "Flood wait served");

        required
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnavailableReason;

    #[test]
    fn flood_wait_carries_required_wait() {
        let err = TransportError::FloodWait {
            wait: Duration::from_secs(17),
        };
        assert_eq!(err.required_wait(), Some(Duration::from_secs(17)));
    }

    #[test]
    fn other_transport_errors_are_not_quota_signals() {
        let unavailable = TransportError::ChannelUnavailable {
            channel: "x".to_string(),
            reason: UnavailableReason::NotFound,
        };
        assert_eq!(unavailable.required_wait(), None);
        assert_eq!(
            TransportError::Other("reset".to_string()).required_wait(),
            None
        );
    }

    #[test]
    fn wrapped_transport_error_keeps_signal() {
        let err = Error::Transport(TransportError::FloodWait {
            wait: Duration::from_secs(5),
        });
        assert_eq!(err.required_wait(), Some(Duration::from_secs(5)));
        assert_eq!(Error::Other("nope".to_string()).required_wait(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_exactly_the_mandated_duration() {
        let policy = RateLimitPolicy::new(RateLimitConfig::default());
        let start = tokio::time::Instant::now();

        let waited = policy
            .wait_for_quota("chan", Duration::from_secs(420))
            .await;

        assert_eq!(waited, Duration::from_secs(420));
        assert_eq!(start.elapsed(), Duration::from_secs(420));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_wait_returns_immediately() {
        let policy = RateLimitPolicy::default();
        let start = tokio::time::Instant::now();

        let waited = policy.wait_for_quota("chan", Duration::ZERO).await;

        assert_eq!(waited, Duration::ZERO);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_policy_does_not_sleep() {
        let policy = RateLimitPolicy::new(RateLimitConfig {
            honor_flood_wait: false,
        });
        let start = tokio::time::Instant::now();

        let waited = policy.wait_for_quota("chan", Duration::from_secs(60)).await;

        assert_eq!(waited, Duration::ZERO);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
