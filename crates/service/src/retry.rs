//! Bounded retry for idempotent bridge API reads

use bridge_types::BridgeApiResult;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const TRACING_TARGET: &str = "bridge_service::retry";

/// Exponential backoff applied to transient bridge API failures
///
/// Only errors reporting [`is_retryable`](bridge_types::BridgeApiError::is_retryable)
/// are retried. Transaction submission never goes through this policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
	/// Total attempts including the first one
	pub max_attempts: u32,
	pub initial_delay: Duration,
	pub backoff_multiplier: f64,
	pub max_delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_delay: Duration::from_millis(250),
			backoff_multiplier: 2.0,
			max_delay: Duration::from_secs(2),
		}
	}
}

impl RetryPolicy {
	/// Single attempt, no retries
	pub fn none() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	/// Delay before retry number `retry` (zero-based)
	pub fn delay_for(&self, retry: u32) -> Duration {
		let factor = self.backoff_multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
		let delay = self.initial_delay.as_secs_f64() * factor;
		if !delay.is_finite() || delay >= self.max_delay.as_secs_f64() {
			self.max_delay
		} else {
			Duration::from_secs_f64(delay)
		}
	}

	pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> BridgeApiResult<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = BridgeApiResult<T>>,
	{
		let attempts = self.max_attempts.max(1);
		let mut retry = 0;
		loop {
			match call().await {
				Err(e) if e.is_retryable() && retry + 1 < attempts => {
					let delay = self.delay_for(retry);
					debug!(
						target: TRACING_TARGET,
						operation,
						attempt = retry + 1,
						delay_ms = delay.as_millis() as u64,
						"Retrying after transient failure: {}",
						e
					);
					tokio::time::sleep(delay).await;
					retry += 1;
				},
				result => return result,
			}
		}
	}
}
