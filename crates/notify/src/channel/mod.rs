use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;

use tokio::sync::oneshot;

use crate::delivery::{Handler, Targets, deliver_inline, fan_out};
use crate::queue::{DeliveryQueue, Job};
use crate::{Delivery, DeliveryMode, DeliveryOptions, Subscription, SubscriptionId};

struct ChannelInner<E> {
	name: &'static str,
	options: DeliveryOptions,
	handlers: RwLock<IndexMap<SubscriptionId, Handler<E>>>,
	queue: DeliveryQueue,
}

impl<E> ChannelInner<E> {
	fn remove(&self, id: SubscriptionId) -> bool {
		self.handlers.write().shift_remove(&id).is_some()
	}

	/// Copies the current subscribers so publishing never holds the registry lock.
	fn snapshot(&self) -> Targets<E> {
		self.handlers.read().iter().map(|(id, handler)| (*id, Arc::clone(handler))).collect()
	}
}

/// Ordered set of subscribers for one event kind.
///
/// Cloning yields another handle to the same subscriber set.
pub struct EventChannel<E> {
	inner: Arc<ChannelInner<E>>,
}

impl<E> Clone for EventChannel<E> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<E> fmt::Debug for EventChannel<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventChannel")
			.field("name", &self.inner.name)
			.field("mode", &self.inner.options.mode)
			.field("subscribers", &self.inner.handlers.read().len())
			.finish()
	}
}

impl<E> EventChannel<E>
where
	E: Send + Sync + 'static,
{
	pub fn new(name: &'static str, options: DeliveryOptions) -> Self {
		Self::with_queue(name, options, DeliveryQueue::new(name))
	}

	/// Builds a channel whose detached deliveries share `queue`'s order.
	pub(crate) fn with_queue(name: &'static str, options: DeliveryOptions, queue: DeliveryQueue) -> Self {
		Self {
			inner: Arc::new(ChannelInner {
				name,
				options,
				handlers: RwLock::new(IndexMap::new()),
				queue,
			}),
		}
	}

	pub fn name(&self) -> &'static str {
		self.inner.name
	}

	pub fn mode(&self) -> DeliveryMode {
		self.inner.options.mode
	}

	/// Registers `handler` for every publish issued after this call returns.
	pub fn subscribe(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
		let id = SubscriptionId::next();
		self.inner.handlers.write().insert(id, Arc::new(handler));
		tracing::trace!(channel = self.inner.name, subscription = %id, "notify.subscribe");
		id
	}

	/// Like [`Self::subscribe`], unsubscribing when the guard drops.
	pub fn subscribe_scoped(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
		let id = self.subscribe(handler);
		let inner: Weak<ChannelInner<E>> = Arc::downgrade(&self.inner);
		Subscription::new(move || {
			if let Some(inner) = inner.upgrade() {
				inner.remove(id);
			}
		})
	}

	/// Removes a subscriber. Publishes issued after this returns never reach it;
	/// one already in flight may still.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let removed = self.inner.remove(id);
		if removed {
			tracing::trace!(channel = self.inner.name, subscription = %id, "notify.unsubscribe");
		}
		removed
	}

	pub fn contains(&self, id: SubscriptionId) -> bool {
		self.inner.handlers.read().contains_key(&id)
	}

	pub fn subscriber_count(&self) -> usize {
		self.inner.handlers.read().len()
	}

	/// Publishes according to the channel's [`DeliveryMode`].
	///
	/// Detached publishes from one channel reach each subscriber in the order
	/// `publish` was called.
	pub fn publish(&self, event: E) {
		self.publish_shared(Arc::new(event));
	}

	/// [`Self::publish`] for an event that is already shared.
	pub fn publish_shared(&self, event: Arc<E>) {
		match self.inner.options.mode {
			DeliveryMode::Inline => {
				self.deliver_now(&event);
			}
			DeliveryMode::Detached => {
				let ticket = self.inner.queue.ticket();
				ticket.submit(self.detached_job(event).into_iter().collect());
			}
		}
	}

	/// Publishes and waits until every subscriber has returned.
	///
	/// A detached channel keeps its order here too: the fan-out waits behind
	/// earlier publishes.
	pub async fn publish_and_wait(&self, event: E) -> Delivery {
		match self.inner.options.mode {
			DeliveryMode::Inline => self.deliver_now(&event),
			DeliveryMode::Detached => {
				let ticket = self.inner.queue.ticket();
				let Some(fanned) = self.fan_out_job(Arc::new(event)) else {
					return Delivery::default();
				};
				let (tx, rx) = oneshot::channel();
				let job: Job = Box::pin(async move {
					let _ = tx.send(fanned.await);
				});
				ticket.submit(vec![job]);
				rx.await.unwrap_or_default()
			}
		}
	}

	/// Runs the current subscribers on the calling thread.
	pub(crate) fn deliver_now(&self, event: &E) -> Delivery {
		let targets = self.inner.snapshot();
		if targets.is_empty() {
			return Delivery::default();
		}
		let inner = &self.inner;
		tracing::trace!(channel = inner.name, subscribers = targets.len(), "notify.publish.inline");
		deliver_inline(inner.name, targets, event, inner.options.fault_handler.as_ref())
	}

	/// Snapshots the subscribers now and returns their fan-out, ready to queue.
	pub(crate) fn detached_job(&self, event: Arc<E>) -> Option<Job> {
		let name = self.inner.name;
		let fanned = self.fan_out_job(event)?;
		let job: Job = Box::pin(async move {
			let delivery = fanned.await;
			tracing::trace!(channel = name, delivered = delivery.delivered, faulted = delivery.faulted, "notify.fanout.done");
		});
		Some(job)
	}

	fn fan_out_job(&self, event: Arc<E>) -> Option<impl Future<Output = Delivery> + Send + use<E>> {
		let targets = self.inner.snapshot();
		if targets.is_empty() {
			return None;
		}
		let inner = &self.inner;
		tracing::trace!(channel = inner.name, subscribers = targets.len(), "notify.publish.queued");
		Some(fan_out(inner.name, targets, event, inner.options.fault_handler.clone()))
	}
}
