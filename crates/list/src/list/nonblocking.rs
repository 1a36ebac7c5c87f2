//! Operations that yield while waiting for the lock.
//!
//! Each takes a [`CancellationToken`]; if it fires before the lock is
//! acquired the operation fails with [`ListError::Cancelled`], leaving the
//! list untouched and publishing nothing. Once acquired, the critical section
//! runs to completion without suspending.

use std::ops::ControlFlow;
use std::vec;

use relay_notify::Ticket;
use relay_sync::CancellationToken;

use super::{ObservableList, RemovalSet, copy_into, get_at, insert_at, remove_at, remove_matching, replace_at};
use crate::ListError;

impl<T> ObservableList<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub async fn read_async<R>(&self, cancel: &CancellationToken, f: impl FnOnce(&[T]) -> R) -> Result<R, ListError> {
		Ok(self.items.read_async(cancel, |items| f(items.as_slice())).await?)
	}

	pub async fn get_async(&self, index: usize, cancel: &CancellationToken) -> Result<T, ListError> {
		self.items.read_async(cancel, |items| get_at(items, index)).await?
	}

	pub async fn len_async(&self, cancel: &CancellationToken) -> Result<usize, ListError> {
		self.read_async(cancel, <[T]>::len).await
	}

	pub async fn is_empty_async(&self, cancel: &CancellationToken) -> Result<bool, ListError> {
		self.read_async(cancel, <[T]>::is_empty).await
	}

	pub async fn contains_async(&self, value: &T, cancel: &CancellationToken) -> Result<bool, ListError>
	where
		T: PartialEq,
	{
		self.contains_by_async(value, <T as PartialEq>::eq, cancel).await
	}

	pub async fn contains_by_async(&self, value: &T, eq: impl Fn(&T, &T) -> bool, cancel: &CancellationToken) -> Result<bool, ListError> {
		self.read_async(cancel, |items| items.iter().any(|item| eq(item, value))).await
	}

	pub async fn index_of_async(&self, value: &T, cancel: &CancellationToken) -> Result<Option<usize>, ListError>
	where
		T: PartialEq,
	{
		self.index_of_by_async(value, <T as PartialEq>::eq, cancel).await
	}

	pub async fn index_of_by_async(
		&self,
		value: &T,
		eq: impl Fn(&T, &T) -> bool,
		cancel: &CancellationToken,
	) -> Result<Option<usize>, ListError> {
		self.read_async(cancel, |items| items.iter().position(|item| eq(item, value))).await
	}

	pub async fn snapshot_async(&self, cancel: &CancellationToken) -> Result<Vec<T>, ListError> {
		self.read_async(cancel, <[T]>::to_vec).await
	}

	pub async fn iter_async(&self, cancel: &CancellationToken) -> Result<vec::IntoIter<T>, ListError> {
		Ok(self.snapshot_async(cancel).await?.into_iter())
	}

	pub async fn copy_to_async(&self, dest: &mut [T], offset: usize, cancel: &CancellationToken) -> Result<usize, ListError> {
		self.items.read_async(cancel, |items| copy_into(items, dest, offset)).await?
	}

	pub async fn set_async(&self, index: usize, value: T, cancel: &CancellationToken) -> Result<(), ListError> {
		let published = value.clone();
		let ticket = self.items.write_async(cancel, |items| replace_at(items, index, value).map(|()| self.bus.ticket())).await??;
		self.publish_replaced(ticket, index, published);
		Ok(())
	}

	pub async fn insert_async(&self, index: usize, items: Vec<T>, cancel: &CancellationToken) -> Result<(), ListError> {
		if items.is_empty() {
			return Ok(());
		}
		let published = items.clone();
		let ticket = self.items.write_async(cancel, |list| insert_at(list, index, items).map(|()| self.bus.ticket())).await??;
		self.publish_inserted(ticket, index, published);
		Ok(())
	}

	pub async fn append_async(&self, items: Vec<T>, cancel: &CancellationToken) -> Result<Option<usize>, ListError> {
		if items.is_empty() {
			return Ok(None);
		}
		self.append_vec_async(items, cancel).await.map(Some)
	}

	pub async fn push_async(&self, value: T, cancel: &CancellationToken) -> Result<usize, ListError> {
		self.append_vec_async(vec![value], cancel).await
	}

	async fn append_vec_async(&self, items: Vec<T>, cancel: &CancellationToken) -> Result<usize, ListError> {
		let published = items.clone();
		let (index, ticket) = self
			.items
			.upgradeable_async(cancel, |list| ControlFlow::<(usize, Ticket), usize>::Continue(list.len()), |list, index| {
				list.extend(items);
				(index, self.bus.ticket())
			})
			.await?;
		self.publish_inserted(ticket, index, published);
		Ok(index)
	}

	pub async fn clear_async(&self, cancel: &CancellationToken) -> Result<(), ListError> {
		let (cleared, ticket) = self
			.items
			.write_async(cancel, |items| {
				let len = items.len();
				items.clear();
				(len, self.bus.ticket())
			})
			.await?;
		self.publish_cleared(ticket, cleared);
		Ok(())
	}

	pub async fn remove_at_async(&self, index: usize, cancel: &CancellationToken) -> Result<T, ListError> {
		let (value, ticket) = self.items.write_async(cancel, |items| remove_at(items, index).map(|value| (value, self.bus.ticket()))).await??;
		self.publish_removed_one(ticket, index, value.clone());
		Ok(value)
	}

	pub async fn remove_async(&self, value: &T, cancel: &CancellationToken) -> Result<Option<usize>, ListError>
	where
		T: PartialEq,
	{
		self.remove_by_async(value, <T as PartialEq>::eq, cancel).await
	}

	pub async fn remove_by_async(
		&self,
		value: &T,
		eq: impl Fn(&T, &T) -> bool,
		cancel: &CancellationToken,
	) -> Result<Option<usize>, ListError> {
		let removed = self
			.items
			.upgradeable_async(
				cancel,
				|items| match items.iter().position(|item| eq(item, value)) {
					Some(index) => ControlFlow::Continue(index),
					None => ControlFlow::Break(None),
				},
				|items, index| Some((index, items.remove(index), self.bus.ticket())),
			)
			.await?;
		let Some((index, value, ticket)) = removed else {
			return Ok(None);
		};
		self.publish_removed_one(ticket, index, value);
		Ok(Some(index))
	}

	pub async fn remove_where_async(&self, mut pred: impl FnMut(&T) -> bool, cancel: &CancellationToken) -> Result<RemovalSet<T>, ListError> {
		self.remove_where_indexed_async(|_, item| pred(item), cancel).await
	}

	pub async fn remove_where_indexed_async(
		&self,
		pred: impl FnMut(usize, &T) -> bool,
		cancel: &CancellationToken,
	) -> Result<RemovalSet<T>, ListError> {
		let (len_before, removed, ticket) = self
			.items
			.write_async(cancel, |items| {
				let (len_before, removed) = remove_matching(items, pred);
				(len_before, removed, self.bus.ticket())
			})
			.await?;
		self.publish_removed(ticket, len_before, &removed);
		Ok(removed)
	}
}
