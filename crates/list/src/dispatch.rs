use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use relay_notify::{ChangeEvent, DeliveryOptions, NotificationBus, PropertyChanged, Subscription};

use crate::ObservableList;

/// A unit of notification work handed to a [`Dispatcher`].
pub type Job = Box<dyn FnOnce() + Send>;

/// Runs jobs on some target execution context, such as a UI thread's queue.
///
/// Any `Fn(Job)` closure is a dispatcher.
pub trait Dispatcher: Send + Sync + 'static {
	fn dispatch(&self, job: Job);
}

impl<F> Dispatcher for F
where
	F: Fn(Job) + Send + Sync + 'static,
{
	fn dispatch(&self, job: Job) {
		self(job);
	}
}

/// An [`ObservableList`] whose notifications are replayed through a [`Dispatcher`].
///
/// Subscribe through [`DispatchedList::bus`]: every event the inner list
/// publishes is handed to the dispatcher, and delivered inline to those
/// subscribers wherever the dispatcher runs it. Relative order of events is
/// kept as long as the dispatcher runs jobs in submission order and the inner
/// list delivers inline. All list operations are available through `Deref`.
pub struct DispatchedList<T> {
	list: ObservableList<T>,
	bus: NotificationBus<T>,
	_relays: [Subscription; 2],
}

impl<T> DispatchedList<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub fn new(list: ObservableList<T>, dispatcher: impl Dispatcher) -> Self {
		let dispatcher: Arc<dyn Dispatcher> = Arc::new(dispatcher);
		let bus = NotificationBus::new(DeliveryOptions::inline());

		let collection = {
			let bus = bus.clone();
			let dispatcher = Arc::clone(&dispatcher);
			list.bus().collection().subscribe_scoped(move |event: &ChangeEvent<T>| {
				let bus = bus.clone();
				let event = event.clone();
				dispatcher.dispatch(Box::new(move || bus.publish_collection(event)));
			})
		};
		let property = {
			let bus = bus.clone();
			list.bus().property().subscribe_scoped(move |event: &PropertyChanged| {
				let bus = bus.clone();
				let event = event.clone();
				dispatcher.dispatch(Box::new(move || bus.publish_property(event)));
			})
		};

		Self {
			list,
			bus,
			_relays: [collection, property],
		}
	}

	/// The dispatched notification bus.
	///
	/// Shadows [`ObservableList::bus`]; the inner list's own bus stays
	/// reachable through [`Self::inner`].
	pub fn bus(&self) -> &NotificationBus<T> {
		&self.bus
	}

	pub fn inner(&self) -> &ObservableList<T> {
		&self.list
	}

	/// Stops relaying and returns the inner list.
	pub fn into_inner(self) -> ObservableList<T> {
		let Self { list, .. } = self;
		list
	}
}

impl<T> Deref for DispatchedList<T> {
	type Target = ObservableList<T>;

	fn deref(&self) -> &Self::Target {
		&self.list
	}
}

impl<T> fmt::Debug for DispatchedList<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DispatchedList")
			.field("list", &self.list)
			.field("bus", &self.bus)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::VecDeque;
	use std::thread;

	use parking_lot::Mutex;
	use relay_notify::DeliveryMode;

	use super::*;
	use crate::ListConfig;

	/// Stand-in for a UI thread: jobs pile up until [`Self::drain`] runs them.
	#[derive(Clone, Default)]
	struct Queue(Arc<Mutex<VecDeque<Job>>>);

	impl Queue {
		fn dispatcher(&self) -> impl Dispatcher {
			let queue = self.clone();
			move |job: Job| queue.0.lock().push_back(job)
		}

		fn drain(&self) -> usize {
			let mut ran = 0;
			loop {
				let Some(job) = self.0.lock().pop_front() else {
					return ran;
				};
				job();
				ran += 1;
			}
		}
	}

	fn inline_list(items: Vec<u32>) -> ObservableList<u32> {
		ObservableList::from_vec(items, ListConfig::default().with_delivery(DeliveryMode::Inline))
	}

	#[test]
	fn events_wait_for_the_target_context() {
		let queue = Queue::default();
		let list = DispatchedList::new(inline_list(vec![1]), queue.dispatcher());
		let seen = Arc::new(Mutex::new(Vec::new()));
		{
			let seen = Arc::clone(&seen);
			list.bus().subscribe_collection(move |event| seen.lock().push((thread::current().id(), event.clone())));
		}

		let writer = thread::spawn(move || {
			list.push(2).expect("push");
			list
		});
		let list = writer.join().expect("writer thread");
		assert!(seen.lock().is_empty());

		// One job per channel: the insert and the count signal.
		assert_eq!(queue.drain(), 2);
		let seen = seen.lock();
		assert_eq!(*seen, vec![(thread::current().id(), ChangeEvent::Insert { index: 1, items: vec![2] })]);
		assert_eq!(list.snapshot(), Ok(vec![1, 2]));
	}

	#[test]
	fn property_signals_are_relayed_in_order() {
		let queue = Queue::default();
		let list = DispatchedList::new(inline_list(Vec::new()), queue.dispatcher());
		let names = Arc::new(Mutex::new(Vec::new()));
		{
			let names = Arc::clone(&names);
			list.bus().subscribe_collection(move |event| names.lock().push(format!("{:?}", event.kind())));
		}
		{
			let names = Arc::clone(&names);
			list.bus().subscribe_property(move |event| names.lock().push(event.name.to_string()));
		}

		list.push(1).expect("push");
		list.clear().expect("clear");
		queue.drain();
		assert_eq!(*names.lock(), vec!["Insert", "Count", "Reset", "Count"]);
	}

	#[test]
	fn into_inner_stops_relaying() {
		let queue = Queue::default();
		let list = DispatchedList::new(inline_list(Vec::new()), queue.dispatcher());
		assert_eq!(list.inner().bus().collection().subscriber_count(), 1);

		let inner = list.into_inner();
		assert_eq!(inner.bus().collection().subscriber_count(), 0);
		assert_eq!(inner.bus().property().subscriber_count(), 0);
		inner.push(1).expect("push");
		assert_eq!(queue.drain(), 0);
	}
}
