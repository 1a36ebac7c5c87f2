//! Admission control for the three lock modes.
//!
//! The gate only decides who may touch the protected value; it never holds the
//! value itself. Blocking waiters park on a condvar, async waiters on a
//! [`Notify`], and every state change wakes both populations.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::LockError;

/// Mode held by an admitted caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
	Read,
	Upgradeable,
	Write,
}

/// What a waiter is asking for. `Upgrade` promotes an already-held upgradeable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
	Read,
	Upgradeable,
	Write,
	Upgrade,
}

impl From<Mode> for Request {
	fn from(mode: Mode) -> Self {
		match mode {
			Mode::Read => Self::Read,
			Mode::Upgradeable => Self::Upgradeable,
			Mode::Write => Self::Write,
		}
	}
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Admission {
	pub(crate) readers: usize,
	pub(crate) upgradeable: bool,
	pub(crate) writer: bool,
	pub(crate) upgrading: bool,
	pub(crate) queued_writers: usize,
}

impl Admission {
	fn enqueue(&mut self, request: Request) {
		match request {
			Request::Write => self.queued_writers += 1,
			Request::Upgrade => self.upgrading = true,
			Request::Read | Request::Upgradeable => {}
		}
	}

	fn withdraw(&mut self, request: Request) {
		match request {
			Request::Write => self.queued_writers -= 1,
			Request::Upgrade => self.upgrading = false,
			Request::Read | Request::Upgradeable => {}
		}
	}

	/// Admits `request` if it is compatible with the current holders.
	///
	/// A queued writer or a pending upgrade turns away new readers and
	/// upgradeable readers so that writers cannot starve.
	fn try_admit(&mut self, request: Request) -> bool {
		let writer_pending = self.queued_writers > 0 || self.upgrading;
		match request {
			Request::Read if !self.writer && !writer_pending => {
				self.readers += 1;
				true
			}
			Request::Upgradeable if !self.writer && !self.upgradeable && !writer_pending => {
				self.upgradeable = true;
				true
			}
			Request::Write if !self.writer && !self.upgradeable && self.readers == 0 => {
				self.queued_writers -= 1;
				self.writer = true;
				true
			}
			Request::Upgrade if self.readers == 0 => {
				debug_assert!(self.upgradeable && !self.writer, "upgrade without an upgradeable slot");
				self.upgrading = false;
				self.upgradeable = false;
				self.writer = true;
				true
			}
			_ => false,
		}
	}

	fn release(&mut self, mode: Mode) {
		match mode {
			Mode::Read => {
				debug_assert!(self.readers > 0, "reader count underflow");
				self.readers -= 1;
			}
			Mode::Upgradeable => self.upgradeable = false,
			Mode::Write => self.writer = false,
		}
	}
}

pub(crate) struct Gate {
	state: Mutex<Admission>,
	threads: Condvar,
	tasks: Notify,
	timeout: Option<Duration>,
}

impl Gate {
	pub(crate) fn new(timeout: Option<Duration>) -> Self {
		Self {
			state: Mutex::new(Admission::default()),
			threads: Condvar::new(),
			tasks: Notify::new(),
			timeout,
		}
	}

	pub(crate) fn timeout(&self) -> Option<Duration> {
		self.timeout
	}

	#[cfg(test)]
	pub(crate) fn admission(&self) -> Admission {
		self.state.lock().clone()
	}

	fn wake_all(&self) {
		self.threads.notify_all();
		self.tasks.notify_waiters();
	}

	/// Parks the calling thread until `mode` is granted or the timeout elapses.
	pub(crate) fn acquire_blocking(&self, mode: Mode) -> Result<Held<'_>, LockError> {
		self.wait_blocking(mode.into())?;
		Ok(Held { gate: self, mode })
	}

	/// Promotes an upgradeable slot to writer once the remaining readers leave.
	pub(crate) fn upgrade_blocking(&self, held: &mut Held<'_>) -> Result<(), LockError> {
		debug_assert_eq!(held.mode, Mode::Upgradeable);
		self.wait_blocking(Request::Upgrade)?;
		held.mode = Mode::Write;
		Ok(())
	}

	/// Waits for `mode` without blocking the thread.
	pub(crate) async fn acquire(&self, mode: Mode, cancel: &CancellationToken) -> Result<Held<'_>, LockError> {
		self.wait(mode.into(), cancel).await?;
		Ok(Held { gate: self, mode })
	}

	/// Async counterpart of [`Self::upgrade_blocking`].
	pub(crate) async fn upgrade(&self, held: &mut Held<'_>, cancel: &CancellationToken) -> Result<(), LockError> {
		debug_assert_eq!(held.mode, Mode::Upgradeable);
		self.wait(Request::Upgrade, cancel).await?;
		held.mode = Mode::Write;
		Ok(())
	}

	fn wait_blocking(&self, request: Request) -> Result<(), LockError> {
		let limit = self.timeout.map(|timeout| (timeout, Instant::now() + timeout));
		let mut state = self.state.lock();
		state.enqueue(request);
		loop {
			if state.try_admit(request) {
				return Ok(());
			}
			let Some((timeout, deadline)) = limit else {
				self.threads.wait(&mut state);
				continue;
			};
			if self.threads.wait_until(&mut state, deadline).timed_out() {
				if state.try_admit(request) {
					return Ok(());
				}
				state.withdraw(request);
				drop(state);
				self.wake_all();
				tracing::debug!(?request, ?timeout, "lock.wait.timed_out");
				return Err(LockError::TimedOut(timeout));
			}
		}
	}

	async fn wait(&self, request: Request, cancel: &CancellationToken) -> Result<(), LockError> {
		if cancel.is_cancelled() {
			return Err(LockError::Cancelled);
		}

		let mut waiter = Waiter::enqueue(self, request);
		// Uncontended acquisitions return here and never arm a timer.
		if waiter.try_admit() {
			return Ok(());
		}
		let admitted = waiter.admitted();
		let outcome = match self.timeout {
			None => tokio::select! {
				biased;
				() = cancel.cancelled() => Err(LockError::Cancelled),
				() = admitted => Ok(()),
			},
			Some(timeout) => tokio::select! {
				biased;
				() = cancel.cancelled() => Err(LockError::Cancelled),
				res = tokio::time::timeout(timeout, admitted) => res.map_err(|_| LockError::TimedOut(timeout)),
			},
		};
		if let Err(err) = &outcome {
			tracing::debug!(?request, %err, "lock.wait.abandoned");
		}
		// Dropping an unadmitted waiter withdraws it and wakes the others.
		drop(waiter);
		outcome
	}
}

/// Registration of one async waiter.
///
/// Dropping it before admission withdraws the request, which covers explicit
/// cancellation, timeouts, and callers that simply drop the future.
struct Waiter<'a> {
	gate: &'a Gate,
	request: Request,
	admitted: bool,
}

impl<'a> Waiter<'a> {
	fn enqueue(gate: &'a Gate, request: Request) -> Self {
		gate.state.lock().enqueue(request);
		Self {
			gate,
			request,
			admitted: false,
		}
	}

	fn try_admit(&mut self) -> bool {
		self.admitted = self.gate.state.lock().try_admit(self.request);
		self.admitted
	}

	async fn admitted(&mut self) {
		loop {
			// Register before checking to avoid a lost wakeup between the check and the await.
			let notified = self.gate.tasks.notified();
			let admitted = self.gate.state.lock().try_admit(self.request);
			if admitted {
				self.admitted = true;
				return;
			}
			notified.await;
		}
	}
}

impl Drop for Waiter<'_> {
	fn drop(&mut self) {
		if !self.admitted {
			self.gate.state.lock().withdraw(self.request);
			self.gate.wake_all();
		}
	}
}

/// A granted mode. Released on drop, including during unwinding.
pub(crate) struct Held<'a> {
	gate: &'a Gate,
	mode: Mode,
}

impl Drop for Held<'_> {
	fn drop(&mut self) {
		self.gate.state.lock().release(self.mode);
		self.gate.wake_all();
	}
}
