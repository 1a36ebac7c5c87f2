use std::fmt;
use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::LockError;
use crate::gate::{Gate, Mode};

/// A value guarded by a reader/writer/upgradeable-reader lock.
///
/// Modes:
/// * reader: any number of concurrent holders, excluded by a writer.
/// * writer: exclusive.
/// * upgradeable reader: at most one holder, compatible with plain readers,
///   and promotable to writer without releasing, so a read and the write it
///   decides on form one atomic step with respect to other writers.
///
/// Every critical section is a synchronous closure. Waiting happens only while
/// acquiring (or upgrading); once a closure runs it cannot suspend, and the
/// mode is released as soon as it returns or unwinds.
///
/// A queued writer blocks newly arriving readers, so a stream of readers cannot
/// starve writers. A panic inside a closure releases the lock normally; there is
/// no poisoning.
pub struct UpgradeLock<T> {
	gate: Gate,
	value: RwLock<T>,
}

impl<T> UpgradeLock<T> {
	/// Creates a lock that waits indefinitely for acquisition.
	pub fn new(value: T) -> Self {
		Self::with_timeout(value, None)
	}

	/// Creates a lock whose acquisitions fail with [`LockError::TimedOut`] after `timeout`.
	///
	/// Async acquisitions that have to wait measure the timeout with Tokio's
	/// timer, so they must run on a runtime with the time driver enabled
	/// (`enable_time` or `enable_all`); waiting on one without it panics.
	/// Blocking acquisitions and uncontended async ones need no timer.
	pub fn with_timeout(value: T, timeout: Option<Duration>) -> Self {
		Self {
			gate: Gate::new(timeout),
			value: RwLock::new(value),
		}
	}

	/// Returns the acquisition timeout, if any.
	pub fn timeout(&self) -> Option<Duration> {
		self.gate.timeout()
	}

	/// Consumes the lock, returning the protected value.
	pub fn into_inner(self) -> T {
		self.value.into_inner()
	}

	/// Runs `f` with shared access, parking the thread while a writer holds the lock.
	pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, LockError> {
		let _held = self.gate.acquire_blocking(Mode::Read)?;
		let value = self.value.read();
		Ok(f(&value))
	}

	/// Runs `f` with exclusive access.
	pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, LockError> {
		let _held = self.gate.acquire_blocking(Mode::Write)?;
		let mut value = self.value.write();
		Ok(f(&mut value))
	}

	/// Read-then-maybe-write under one upgradeable critical section.
	///
	/// `inspect` runs with shared access. `Break(r)` ends the section with `r`;
	/// `Continue(plan)` upgrades to writer (waiting for plain readers to leave)
	/// and runs `apply` with `plan`. No other writer can run between the two.
	pub fn upgradeable<P, R>(&self, inspect: impl FnOnce(&T) -> ControlFlow<R, P>, apply: impl FnOnce(&mut T, P) -> R) -> Result<R, LockError> {
		let mut held = self.gate.acquire_blocking(Mode::Upgradeable)?;
		let flow = {
			let value = self.value.read();
			inspect(&value)
		};
		let plan = match flow {
			ControlFlow::Break(done) => return Ok(done),
			ControlFlow::Continue(plan) => plan,
		};
		self.gate.upgrade_blocking(&mut held)?;
		let mut value = self.value.write();
		Ok(apply(&mut value, plan))
	}

	/// Async [`Self::read`]; fails with [`LockError::Cancelled`] if `cancel` fires first.
	pub async fn read_async<R>(&self, cancel: &CancellationToken, f: impl FnOnce(&T) -> R) -> Result<R, LockError> {
		let _held = self.gate.acquire(Mode::Read, cancel).await?;
		let value = self.value.read();
		Ok(f(&value))
	}

	/// Async [`Self::write`].
	pub async fn write_async<R>(&self, cancel: &CancellationToken, f: impl FnOnce(&mut T) -> R) -> Result<R, LockError> {
		let _held = self.gate.acquire(Mode::Write, cancel).await?;
		let mut value = self.value.write();
		Ok(f(&mut value))
	}

	/// Async [`Self::upgradeable`].
	///
	/// Cancellation during the upgrade wait releases the upgradeable slot;
	/// `apply` never runs in that case.
	pub async fn upgradeable_async<P, R>(
		&self,
		cancel: &CancellationToken,
		inspect: impl FnOnce(&T) -> ControlFlow<R, P>,
		apply: impl FnOnce(&mut T, P) -> R,
	) -> Result<R, LockError> {
		let mut held = self.gate.acquire(Mode::Upgradeable, cancel).await?;
		let flow = {
			let value = self.value.read();
			inspect(&value)
		};
		let plan = match flow {
			ControlFlow::Break(done) => return Ok(done),
			ControlFlow::Continue(plan) => plan,
		};
		self.gate.upgrade(&mut held, cancel).await?;
		let mut value = self.value.write();
		Ok(apply(&mut value, plan))
	}
}

impl<T: Default> Default for UpgradeLock<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T> fmt::Debug for UpgradeLock<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UpgradeLock").field("timeout", &self.gate.timeout()).finish_non_exhaustive()
	}
}
