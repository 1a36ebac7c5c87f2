//! Where delivery tasks run.
//!
//! Work spawned from inside a Tokio runtime stays on that runtime. Publishers
//! on plain threads have none, so their fan-outs go to a small process-wide
//! delivery runtime started the first time one is needed.

use std::future::Future;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

/// Async workers of the delivery runtime. Subscriber callbacks run on its
/// blocking pool, so few are needed.
const DELIVERY_WORKERS: usize = 2;

const DELIVERY_THREAD_PREFIX: &str = "relay-delivery";

static DELIVERY_RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn delivery_runtime() -> &'static Runtime {
	DELIVERY_RUNTIME.get_or_init(|| {
		let next_thread = AtomicUsize::new(0);
		Builder::new_multi_thread()
			.worker_threads(DELIVERY_WORKERS)
			.thread_name_fn(move || format!("{DELIVERY_THREAD_PREFIX}-{}", next_thread.fetch_add(1, Ordering::Relaxed)))
			.enable_time()
			.build()
			.expect("relay delivery runtime failed to start")
	})
}

/// Resolves the runtime for new work, reporting whether it is the shared
/// delivery runtime.
fn resolve() -> (Handle, bool) {
	match Handle::try_current() {
		Ok(handle) => (handle, false),
		Err(_) => (delivery_runtime().handle().clone(), true),
	}
}

/// Handle of the caller's runtime, or of the shared delivery runtime when the
/// caller is outside one.
pub fn runtime_handle() -> Handle {
	resolve().0
}

/// Spawns an async task tagged with `class`. Dropping the handle detaches it.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	let (handle, shared) = resolve();
	tracing::trace!(worker_class = class.as_str(), shared_runtime = shared, "worker.spawn");
	handle.spawn(fut)
}

/// Runs `f` on the blocking pool, for callbacks that may park.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let (handle, shared) = resolve();
	tracing::trace!(worker_class = class.as_str(), shared_runtime = shared, "worker.spawn_blocking");
	handle.spawn_blocking(f)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_thread_work_runs_on_delivery_runtime() {
		assert!(Handle::try_current().is_err());
		let handle = spawn_blocking(TaskClass::Subscriber, || std::thread::current().name().map(str::to_owned));
		let (tx, rx) = std::sync::mpsc::channel();
		drop(spawn(TaskClass::Fanout, async move {
			let _ = tx.send(handle.await.ok().flatten());
		}));
		let name = rx.recv().ok().flatten().expect("named delivery thread");
		assert!(name.starts_with(DELIVERY_THREAD_PREFIX), "ran on {name}");
	}

	#[tokio::test]
	async fn spawn_inside_runtime_uses_current_handle() {
		let name = spawn(TaskClass::Fanout, async { std::thread::current().name().map(str::to_owned) })
			.await
			.ok()
			.flatten()
			.unwrap_or_default();
		assert!(!name.starts_with(DELIVERY_THREAD_PREFIX), "ran on {name}");
	}
}
