use std::sync::Arc;

use crate::queue::{DeliveryQueue, Ticket};
use crate::{ChangeEvent, Delivery, DeliveryMode, DeliveryOptions, EventChannel, PropertyChanged, SubscriptionId};

/// One entry of an ordered publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<T> {
	Collection(ChangeEvent<T>),
	Property(PropertyChanged),
}

/// The two notification channels of one observable collection.
///
/// Both channels feed one delivery queue, so under
/// [`DeliveryMode::Detached`] a collection event and the property signal
/// published after it reach subscribers in that order.
pub struct NotificationBus<T> {
	collection: EventChannel<ChangeEvent<T>>,
	property: EventChannel<PropertyChanged>,
	queue: DeliveryQueue,
	mode: DeliveryMode,
}

impl<T> Clone for NotificationBus<T> {
	fn clone(&self) -> Self {
		Self {
			collection: self.collection.clone(),
			property: self.property.clone(),
			queue: self.queue.clone(),
			mode: self.mode,
		}
	}
}

impl<T> std::fmt::Debug for NotificationBus<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NotificationBus")
			.field("collection", &self.collection)
			.field("property", &self.property)
			.field("queue", &self.queue)
			.finish()
	}
}

impl<T> Default for NotificationBus<T>
where
	T: Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new(DeliveryOptions::default())
	}
}

impl<T> NotificationBus<T>
where
	T: Send + Sync + 'static,
{
	pub fn new(options: DeliveryOptions) -> Self {
		let queue = DeliveryQueue::new("notification_bus");
		Self {
			mode: options.mode,
			collection: EventChannel::with_queue("collection_changed", options.clone(), queue.clone()),
			property: EventChannel::with_queue("property_changed", options, queue.clone()),
			queue,
		}
	}

	pub fn mode(&self) -> DeliveryMode {
		self.mode
	}

	pub fn collection(&self) -> &EventChannel<ChangeEvent<T>> {
		&self.collection
	}

	pub fn property(&self) -> &EventChannel<PropertyChanged> {
		&self.property
	}

	pub fn subscribe_collection(&self, handler: impl Fn(&ChangeEvent<T>) + Send + Sync + 'static) -> SubscriptionId {
		self.collection.subscribe(handler)
	}

	pub fn subscribe_property(&self, handler: impl Fn(&PropertyChanged) + Send + Sync + 'static) -> SubscriptionId {
		self.property.subscribe(handler)
	}

	/// Removes `id` from whichever channel holds it.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.collection.unsubscribe(id) || self.property.unsubscribe(id)
	}

	/// Reserves a place in the detached delivery order.
	///
	/// Writers draw the ticket inside their critical section so that
	/// deliveries follow lock order even though they are published after
	/// release. Inline buses hand out tickets that reserve nothing.
	pub fn ticket(&self) -> Ticket {
		match self.mode {
			DeliveryMode::Detached => self.queue.ticket(),
			DeliveryMode::Inline => Ticket::unordered(),
		}
	}

	/// Publishes `notifications` in sequence, in the slot `ticket` reserved.
	///
	/// Inline buses deliver on the calling thread right away.
	pub fn publish_in_order(&self, ticket: Ticket, notifications: impl IntoIterator<Item = Notification<T>>) {
		match self.mode {
			DeliveryMode::Inline => {
				drop(ticket);
				for notification in notifications {
					match notification {
						Notification::Collection(event) => self.collection.deliver_now(&event),
						Notification::Property(event) => self.property.deliver_now(&event),
					};
				}
			}
			DeliveryMode::Detached => {
				let jobs = notifications
					.into_iter()
					.filter_map(|notification| match notification {
						Notification::Collection(event) => self.collection.detached_job(Arc::new(event)),
						Notification::Property(event) => self.property.detached_job(Arc::new(event)),
					})
					.collect();
				ticket.submit(jobs);
			}
		}
	}

	pub fn publish_collection(&self, event: ChangeEvent<T>) {
		self.collection.publish(event);
	}

	pub fn publish_property(&self, event: PropertyChanged) {
		self.property.publish(event);
	}

	/// Publishes the `Count` property signal.
	pub fn publish_count_changed(&self) {
		self.property.publish(PropertyChanged::count());
	}

	pub async fn publish_collection_and_wait(&self, event: ChangeEvent<T>) -> Delivery {
		self.collection.publish_and_wait(event).await
	}

	pub async fn publish_property_and_wait(&self, event: PropertyChanged) -> Delivery {
		self.property.publish_and_wait(event).await
	}
}
