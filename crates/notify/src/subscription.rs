use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique handle for one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
	pub(crate) fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}

	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for SubscriptionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "sub#{}", self.0)
	}
}

/// Runs a teardown action exactly once when dropped.
///
/// Returned by scoped subscriptions; dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately undoes it"]
pub struct Subscription {
	on_drop: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
	pub fn new(on_drop: impl FnOnce() + Send + Sync + 'static) -> Self {
		Self {
			on_drop: Some(Box::new(on_drop)),
		}
	}

	/// Keeps the subscription alive for the rest of the process.
	pub fn detach(mut self) {
		self.on_drop = None;
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("armed", &self.on_drop.is_some()).finish()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(on_drop) = self.on_drop.take() {
			on_drop();
		}
	}
}
