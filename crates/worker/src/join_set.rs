use std::future::Future;

use tokio::task::{JoinError, JoinSet};

use crate::TaskClass;

/// Tokio [`JoinSet`] whose tasks always land on [`crate::runtime_handle`].
///
/// Fan-out tasks may be started from a thread that has no runtime entered, so
/// spawning enters the resolved handle first.
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty join set for the given task class.
	pub fn new(class: TaskClass) -> Self {
		Self { class, inner: JoinSet::new() }
	}

	/// Returns the number of tasks currently in the set.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if the set is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns a future into the set.
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.spawn");
		let handle = crate::runtime_handle();
		let _guard = handle.enter();
		self.inner.spawn(fut);
	}

	/// Spawns a blocking closure into the set.
	pub fn spawn_blocking<F>(&mut self, f: F)
	where
		F: FnOnce() -> T + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.spawn_blocking");
		let handle = crate::runtime_handle();
		let _guard = handle.enter();
		self.inner.spawn_blocking(f);
	}

	/// Waits for the next completed task.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}
}
