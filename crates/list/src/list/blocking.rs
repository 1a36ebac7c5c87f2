//! Operations that park the calling thread while waiting for the lock.
//!
//! Avoid these on async runtime worker threads; use the `_async` forms there.

use std::ops::ControlFlow;
use std::vec;

use relay_notify::Ticket;

use super::{ObservableList, RemovalSet, copy_into, get_at, insert_at, remove_at, remove_matching, replace_at};
use crate::ListError;

impl<T> ObservableList<T>
where
	T: Clone + Send + Sync + 'static,
{
	/// Runs `f` over the current elements under a read lock.
	pub fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> Result<R, ListError> {
		Ok(self.items.read(|items| f(items.as_slice()))?)
	}

	pub fn get(&self, index: usize) -> Result<T, ListError> {
		self.items.read(|items| get_at(items, index))?
	}

	pub fn len(&self) -> Result<usize, ListError> {
		self.read(<[T]>::len)
	}

	pub fn is_empty(&self) -> Result<bool, ListError> {
		self.read(<[T]>::is_empty)
	}

	pub fn contains(&self, value: &T) -> Result<bool, ListError>
	where
		T: PartialEq,
	{
		self.contains_by(value, <T as PartialEq>::eq)
	}

	pub fn contains_by(&self, value: &T, eq: impl Fn(&T, &T) -> bool) -> Result<bool, ListError> {
		self.read(|items| items.iter().any(|item| eq(item, value)))
	}

	pub fn index_of(&self, value: &T) -> Result<Option<usize>, ListError>
	where
		T: PartialEq,
	{
		self.index_of_by(value, <T as PartialEq>::eq)
	}

	pub fn index_of_by(&self, value: &T, eq: impl Fn(&T, &T) -> bool) -> Result<Option<usize>, ListError> {
		self.read(|items| items.iter().position(|item| eq(item, value)))
	}

	/// Copies the elements out under one read lock.
	pub fn snapshot(&self) -> Result<Vec<T>, ListError> {
		self.read(<[T]>::to_vec)
	}

	/// Iterates over a snapshot; later mutations are not observed.
	pub fn iter(&self) -> Result<vec::IntoIter<T>, ListError> {
		Ok(self.snapshot()?.into_iter())
	}

	/// Clones every element into `dest` starting at `offset`, returning how many were copied.
	pub fn copy_to(&self, dest: &mut [T], offset: usize) -> Result<usize, ListError> {
		self.items.read(|items| copy_into(items, dest, offset))?
	}

	/// Replaces the element at `index`.
	pub fn set(&self, index: usize, value: T) -> Result<(), ListError> {
		let published = value.clone();
		let ticket = self.items.write(|items| replace_at(items, index, value).map(|()| self.bus.ticket()))??;
		self.publish_replaced(ticket, index, published);
		Ok(())
	}

	/// Inserts `items` so the first lands at `index`. Inserting nothing is a no-op.
	pub fn insert(&self, index: usize, items: impl IntoIterator<Item = T>) -> Result<(), ListError> {
		let items: Vec<T> = items.into_iter().collect();
		if items.is_empty() {
			return Ok(());
		}
		let published = items.clone();
		let ticket = self.items.write(|list| insert_at(list, index, items).map(|()| self.bus.ticket()))??;
		self.publish_inserted(ticket, index, published);
		Ok(())
	}

	/// Appends `items`, returning the index of the first, or `None` when
	/// nothing was given.
	///
	/// Reading the length and appending form one step: no other writer can
	/// land in between, so concurrent appends receive distinct indices.
	pub fn append(&self, items: impl IntoIterator<Item = T>) -> Result<Option<usize>, ListError> {
		let items: Vec<T> = items.into_iter().collect();
		if items.is_empty() {
			return Ok(None);
		}
		self.append_vec(items).map(Some)
	}

	/// Appends one element, returning its index.
	pub fn push(&self, value: T) -> Result<usize, ListError> {
		self.append_vec(vec![value])
	}

	fn append_vec(&self, items: Vec<T>) -> Result<usize, ListError> {
		let published = items.clone();
		let (index, ticket) = self.items.upgradeable(
			|list| ControlFlow::<(usize, Ticket), usize>::Continue(list.len()),
			|list, index| {
				list.extend(items);
				(index, self.bus.ticket())
			},
		)?;
		self.publish_inserted(ticket, index, published);
		Ok(index)
	}

	/// Removes every element. Always publishes a reset, even when already empty.
	pub fn clear(&self) -> Result<(), ListError> {
		let (cleared, ticket) = self.items.write(|items| {
			let len = items.len();
			items.clear();
			(len, self.bus.ticket())
		})?;
		self.publish_cleared(ticket, cleared);
		Ok(())
	}

	/// Removes and returns the element at `index`.
	pub fn remove_at(&self, index: usize) -> Result<T, ListError> {
		let (value, ticket) = self.items.write(|items| remove_at(items, index).map(|value| (value, self.bus.ticket())))??;
		self.publish_removed_one(ticket, index, value.clone());
		Ok(value)
	}

	/// Removes the first element equal to `value`, returning where it was.
	pub fn remove(&self, value: &T) -> Result<Option<usize>, ListError>
	where
		T: PartialEq,
	{
		self.remove_by(value, <T as PartialEq>::eq)
	}

	/// Removes the first element `eq` matches against `value`.
	///
	/// The search and the removal share one upgradeable critical section;
	/// when nothing matches the lock is never upgraded.
	pub fn remove_by(&self, value: &T, eq: impl Fn(&T, &T) -> bool) -> Result<Option<usize>, ListError> {
		let removed = self.items.upgradeable(
			|items| match items.iter().position(|item| eq(item, value)) {
				Some(index) => ControlFlow::Continue(index),
				None => ControlFlow::Break(None),
			},
			|items, index| Some((index, items.remove(index), self.bus.ticket())),
		)?;
		let Some((index, value, ticket)) = removed else {
			return Ok(None);
		};
		self.publish_removed_one(ticket, index, value);
		Ok(Some(index))
	}

	/// Removes every element matching `pred`.
	pub fn remove_where(&self, mut pred: impl FnMut(&T) -> bool) -> Result<RemovalSet<T>, ListError> {
		self.remove_where_indexed(|_, item| pred(item))
	}

	/// Removes every element matching `pred`, which also sees each element's
	/// current index. Elements are visited from the back.
	///
	/// Returns the removed elements keyed by their pre-removal index. The
	/// removal is reported as contiguous ranges, or as a reset when too
	/// scattered (see [`crate::ListConfig::reset_threshold`]). Nothing is
	/// published when nothing matched.
	pub fn remove_where_indexed(&self, pred: impl FnMut(usize, &T) -> bool) -> Result<RemovalSet<T>, ListError> {
		let (len_before, removed, ticket) = self.items.write(|items| {
			let (len_before, removed) = remove_matching(items, pred);
			(len_before, removed, self.bus.ticket())
		})?;
		self.publish_removed(ticket, len_before, &removed);
		Ok(removed)
	}
}
