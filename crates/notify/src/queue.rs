//! Ordered hand-off from publishers to the detached fan-out worker.
//!
//! Every detached publish draws a [`Ticket`] and submits its fan-outs under
//! that ticket. One long-lived worker per queue runs submissions strictly in
//! ticket order, awaiting each fan-out before starting the next, so
//! subscribers observe events in the order tickets were drawn even though
//! publishers submit from many threads.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use relay_worker::TaskClass;
use tokio::sync::mpsc;

/// One fan-out waiting for its turn.
pub(crate) type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

type Submission = (u64, Vec<Job>);

struct QueueInner {
	name: &'static str,
	next_ticket: AtomicU64,
	sender: OnceLock<mpsc::UnboundedSender<Submission>>,
}

/// Shared handle to one ordered delivery worker.
#[derive(Clone)]
pub(crate) struct DeliveryQueue {
	inner: Arc<QueueInner>,
}

impl DeliveryQueue {
	pub(crate) fn new(name: &'static str) -> Self {
		Self {
			inner: Arc::new(QueueInner {
				name,
				next_ticket: AtomicU64::new(0),
				sender: OnceLock::new(),
			}),
		}
	}

	/// Reserves the next delivery slot.
	pub(crate) fn ticket(&self) -> Ticket {
		let seq = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst);
		Ticket {
			seq,
			queue: Some(self.clone()),
		}
	}

	fn submit(&self, seq: u64, jobs: Vec<Job>) {
		// The worker starts on first use, so inline-only buses never spawn one.
		let sender = self.inner.sender.get_or_init(|| {
			let (tx, rx) = mpsc::unbounded_channel();
			drop(relay_worker::spawn(TaskClass::Fanout, drain(self.inner.name, rx)));
			tx
		});
		if sender.send((seq, jobs)).is_err() {
			tracing::warn!(queue = self.inner.name, seq, "notify.queue.worker_gone");
		}
	}
}

impl fmt::Debug for DeliveryQueue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeliveryQueue")
			.field("name", &self.inner.name)
			.field("issued", &self.inner.next_ticket.load(Ordering::Relaxed))
			.field("started", &self.inner.sender.get().is_some())
			.finish()
	}
}

async fn drain(name: &'static str, mut rx: mpsc::UnboundedReceiver<Submission>) {
	let mut parked: BTreeMap<u64, Vec<Job>> = BTreeMap::new();
	let mut next = 0_u64;
	while let Some((seq, jobs)) = rx.recv().await {
		parked.insert(seq, jobs);
		while let Some(jobs) = parked.remove(&next) {
			next += 1;
			for job in jobs {
				job.await;
			}
		}
		if !parked.is_empty() {
			tracing::trace!(queue = name, waiting_for = next, parked = parked.len(), "notify.queue.parked");
		}
	}
	tracing::trace!(queue = name, delivered = next, "notify.queue.closed");
}

/// A reserved position in a bus's delivery order.
///
/// Draw it while the state an event describes is still locked, then hand it
/// back with [`crate::NotificationBus::publish_in_order`] after release.
/// Dropping an unused ticket gives its slot up so later tickets are not held
/// back. Tickets from an inline bus carry no slot.
#[must_use = "later detached deliveries wait until this ticket is published or dropped"]
pub struct Ticket {
	seq: u64,
	queue: Option<DeliveryQueue>,
}

impl Ticket {
	pub(crate) fn unordered() -> Self {
		Self { seq: 0, queue: None }
	}

	pub(crate) fn submit(mut self, jobs: Vec<Job>) {
		if let Some(queue) = self.queue.take() {
			queue.submit(self.seq, jobs);
		}
	}
}

impl Drop for Ticket {
	fn drop(&mut self) {
		if let Some(queue) = self.queue.take() {
			queue.submit(self.seq, Vec::new());
		}
	}
}

impl fmt::Debug for Ticket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Ticket").field("seq", &self.seq).field("ordered", &self.queue.is_some()).finish()
	}
}
