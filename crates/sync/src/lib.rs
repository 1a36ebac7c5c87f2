//! Reader/writer lock with an upgradeable-reader mode.
//!
//! [`UpgradeLock`] serves both blocking callers (OS threads park) and async
//! callers (tasks yield, with cancellation). Critical sections are synchronous
//! closures, so a holder can never suspend while the lock is held.

mod error;
mod gate;
mod lock;

pub use error::LockError;
pub use lock::UpgradeLock;
pub use tokio_util::sync::CancellationToken;
