use std::time::Duration;

use relay_sync::LockError;
use thiserror::Error;

/// Errors reported by [`crate::ObservableList`] operations.
///
/// Whatever the variant, the list is left unmodified and nothing is published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
	#[error("index {index} is out of range for length {len}")]
	IndexOutOfRange { index: usize, len: usize },
	#[error("invalid argument: {0}")]
	InvalidArgument(&'static str),
	#[error("lock acquisition cancelled")]
	Cancelled,
	#[error("lock acquisition timed out after {0:?}")]
	TimedOut(Duration),
}

impl From<LockError> for ListError {
	fn from(err: LockError) -> Self {
		match err {
			LockError::Cancelled => Self::Cancelled,
			LockError::TimedOut(after) => Self::TimedOut(after),
		}
	}
}
