use std::time::Duration;

use thiserror::Error;

/// Failure to acquire an [`crate::UpgradeLock`].
///
/// Neither variant leaves any trace in the lock: the waiter is withdrawn and
/// the protected value is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LockError {
	/// The cancellation token fired before the lock was granted.
	#[error("lock acquisition cancelled")]
	Cancelled,
	/// The configured acquisition timeout elapsed.
	#[error("lock acquisition timed out after {0:?}")]
	TimedOut(Duration),
}
