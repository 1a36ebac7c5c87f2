use std::collections::BTreeMap;
use std::fmt;

use relay_notify::{ChangeEvent, DeliveryOptions, FaultHandler, Notification, NotificationBus, PropertyChanged, Ticket};
use relay_sync::UpgradeLock;

use crate::compact::{Compaction, compact_removals};
use crate::{ListConfig, ListError};

mod blocking;
mod deferred;
mod nonblocking;

/// Elements removed by one bulk removal, keyed by their pre-removal index.
pub type RemovalSet<T> = BTreeMap<usize, T>;

/// An ordered collection that many threads and tasks may read and mutate at
/// once, publishing a change notification after every mutation.
///
/// All element access goes through one [`UpgradeLock`]. Notifications are
/// issued on the list's [`NotificationBus`] only after the lock has been
/// released, so subscribers may call back into the list. Each successful
/// mutation publishes its collection event first and the `Count` property
/// signal second; a failed operation publishes nothing.
///
/// Every mutation draws a delivery [`Ticket`] before it leaves the lock, so
/// under detached delivery subscribers see events in the order the writes
/// took effect.
pub struct ObservableList<T> {
	items: UpgradeLock<Vec<T>>,
	bus: NotificationBus<T>,
	config: ListConfig,
}

impl<T> ObservableList<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self::with_config(ListConfig::default())
	}

	pub fn with_config(config: ListConfig) -> Self {
		Self::from_parts(Vec::new(), config, None)
	}

	/// Builds a list over existing `items`. No event is published for them.
	pub fn from_vec(items: Vec<T>, config: ListConfig) -> Self {
		Self::from_parts(items, config, None)
	}

	/// Builds a list whose bus reports subscriber panics to `fault_handler`.
	pub fn from_parts(items: Vec<T>, config: ListConfig, fault_handler: Option<FaultHandler>) -> Self {
		let options = DeliveryOptions {
			mode: config.delivery,
			fault_handler,
		};
		Self {
			items: UpgradeLock::with_timeout(items, config.lock_timeout()),
			bus: NotificationBus::new(options),
			config,
		}
	}

	pub fn bus(&self) -> &NotificationBus<T> {
		&self.bus
	}

	pub fn config(&self) -> &ListConfig {
		&self.config
	}

	/// Consumes the list, returning its elements.
	pub fn into_vec(self) -> Vec<T> {
		self.items.into_inner()
	}

	fn publish_replaced(&self, ticket: Ticket, index: usize, value: T) {
		tracing::trace!(index, "list.replace");
		self.bus.publish_in_order(ticket, [Notification::Collection(ChangeEvent::Replace { index, value })]);
	}

	fn publish_inserted(&self, ticket: Ticket, index: usize, items: Vec<T>) {
		tracing::trace!(index, count = items.len(), "list.insert");
		self.bus.publish_in_order(ticket, [
			Notification::Collection(ChangeEvent::Insert { index, items }),
			Notification::Property(PropertyChanged::count()),
		]);
	}

	fn publish_removed_one(&self, ticket: Ticket, index: usize, value: T) {
		tracing::trace!(index, "list.remove");
		self.bus.publish_in_order(ticket, [
			Notification::Collection(ChangeEvent::RemoveRange { start: index, values: vec![value] }),
			Notification::Property(PropertyChanged::count()),
		]);
	}

	fn publish_removed(&self, ticket: Ticket, len_before: usize, removed: &RemovalSet<T>) {
		let mut notifications: Vec<Notification<T>> = match compact_removals(len_before, removed, self.config.reset_threshold) {
			Compaction::Empty => return,
			Compaction::Reset => vec![Notification::Collection(ChangeEvent::Reset)],
			Compaction::Ranges(ranges) => ranges
				.into_iter()
				.map(|range| {
					Notification::Collection(ChangeEvent::RemoveRange {
						start: range.start,
						values: range.values,
					})
				})
				.collect(),
		};
		notifications.push(Notification::Property(PropertyChanged::count()));
		tracing::trace!(len_before, removed = removed.len(), "list.remove_where");
		self.bus.publish_in_order(ticket, notifications);
	}

	fn publish_cleared(&self, ticket: Ticket, cleared: usize) {
		tracing::trace!(cleared, "list.clear");
		self.bus.publish_in_order(ticket, [
			Notification::Collection(ChangeEvent::Reset),
			Notification::Property(PropertyChanged::count()),
		]);
	}
}

impl<T> Default for ObservableList<T>
where
	T: Clone + Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T> From<Vec<T>> for ObservableList<T>
where
	T: Clone + Send + Sync + 'static,
{
	fn from(items: Vec<T>) -> Self {
		Self::from_vec(items, ListConfig::default())
	}
}

impl<T> FromIterator<T> for ObservableList<T>
where
	T: Clone + Send + Sync + 'static,
{
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self::from(iter.into_iter().collect::<Vec<_>>())
	}
}

impl<T> fmt::Debug for ObservableList<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObservableList")
			.field("config", &self.config)
			.field("bus", &self.bus)
			.finish_non_exhaustive()
	}
}

fn check_index(index: usize, len: usize) -> Result<(), ListError> {
	if index < len { Ok(()) } else { Err(ListError::IndexOutOfRange { index, len }) }
}

fn check_insert_index(index: usize, len: usize) -> Result<(), ListError> {
	if index <= len { Ok(()) } else { Err(ListError::IndexOutOfRange { index, len }) }
}

fn get_at<T: Clone>(items: &[T], index: usize) -> Result<T, ListError> {
	check_index(index, items.len())?;
	Ok(items[index].clone())
}

fn replace_at<T>(items: &mut [T], index: usize, value: T) -> Result<(), ListError> {
	check_index(index, items.len())?;
	items[index] = value;
	Ok(())
}

fn insert_at<T>(items: &mut Vec<T>, index: usize, new: Vec<T>) -> Result<(), ListError> {
	check_insert_index(index, items.len())?;
	drop(items.splice(index..index, new));
	Ok(())
}

fn remove_at<T>(items: &mut Vec<T>, index: usize) -> Result<T, ListError> {
	check_index(index, items.len())?;
	Ok(items.remove(index))
}

/// Removes every element matching `pred`.
///
/// `pred` sees each element with its pre-removal index, from the back. The
/// survivors are then compacted in one forward pass.
fn remove_matching<T>(items: &mut Vec<T>, mut pred: impl FnMut(usize, &T) -> bool) -> (usize, RemovalSet<T>) {
	let len_before = items.len();
	let mut doomed = vec![false; len_before];
	let mut matched = 0;
	for index in (0..len_before).rev() {
		if pred(index, &items[index]) {
			doomed[index] = true;
			matched += 1;
		}
	}

	let mut removed = RemovalSet::new();
	if matched == 0 {
		return (len_before, removed);
	}
	let mut kept = Vec::with_capacity(len_before - matched);
	for (index, item) in std::mem::take(items).into_iter().enumerate() {
		if doomed[index] {
			removed.insert(index, item);
		} else {
			kept.push(item);
		}
	}
	*items = kept;
	(len_before, removed)
}

fn copy_into<T: Clone>(items: &[T], dest: &mut [T], offset: usize) -> Result<usize, ListError> {
	let Some(room) = dest.len().checked_sub(offset) else {
		return Err(ListError::IndexOutOfRange { index: offset, len: dest.len() });
	};
	if items.len() > room {
		return Err(ListError::InvalidArgument("destination is too small for the list"));
	}
	dest[offset..offset + items.len()].clone_from_slice(items);
	Ok(items.len())
}

#[cfg(test)]
mod async_tests;
