use std::time::Duration;

use relay_notify::DeliveryMode;
use serde::Deserialize;

use crate::DEFAULT_RESET_THRESHOLD;

/// Tunables for one [`crate::ObservableList`].
///
/// Deserializable so hosts can keep it in their own configuration files:
///
/// ```toml
/// reset_threshold = 8
/// lock_timeout_ms = 250
/// delivery = "inline"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
	/// Minimum average number of removed elements per contiguous range for a
	/// bulk removal to be reported range by range. Below it, a single `Reset`
	/// is published instead. `0` and `1` never reset.
	pub reset_threshold: usize,
	/// Lock acquisition timeout in milliseconds; unset waits indefinitely.
	/// The `_async` operations then need a Tokio runtime with its time driver
	/// enabled.
	pub lock_timeout_ms: Option<u64>,
	/// How change notifications reach subscribers.
	pub delivery: DeliveryMode,
}

impl Default for ListConfig {
	fn default() -> Self {
		Self {
			reset_threshold: DEFAULT_RESET_THRESHOLD,
			lock_timeout_ms: None,
			delivery: DeliveryMode::Detached,
		}
	}
}

impl ListConfig {
	pub fn lock_timeout(&self) -> Option<Duration> {
		self.lock_timeout_ms.map(Duration::from_millis)
	}

	#[must_use]
	pub fn with_reset_threshold(mut self, threshold: usize) -> Self {
		self.reset_threshold = threshold;
		self
	}

	#[must_use]
	pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
		self.lock_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
		self
	}

	#[must_use]
	pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
		self.delivery = delivery;
		self
	}
}
