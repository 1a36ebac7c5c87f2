//! Operations whose inputs are still being computed.
//!
//! Inputs are awaited to completion before the lock is requested, and never
//! while it is held. An input that fails short-circuits the operation with
//! that input's error, unchanged, without touching the lock. Failures from the
//! list itself are converted with `E::from`.

use std::future::Future;

use relay_sync::CancellationToken;

use super::ObservableList;
use crate::ListError;

impl<T> ObservableList<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub async fn get_deferred<E>(&self, index: impl Future<Output = Result<usize, E>>, cancel: &CancellationToken) -> Result<T, E>
	where
		E: From<ListError>,
	{
		let index = index.await?;
		Ok(self.get_async(index, cancel).await?)
	}

	pub async fn set_deferred<E>(
		&self,
		index: impl Future<Output = Result<usize, E>>,
		value: impl Future<Output = Result<T, E>>,
		cancel: &CancellationToken,
	) -> Result<(), E>
	where
		E: From<ListError>,
	{
		let (index, value) = tokio::try_join!(index, value)?;
		Ok(self.set_async(index, value, cancel).await?)
	}

	/// An absent item sequence is a no-op, as is an empty one.
	pub async fn insert_deferred<E, I>(
		&self,
		index: impl Future<Output = Result<usize, E>>,
		items: impl Future<Output = Result<Option<I>, E>>,
		cancel: &CancellationToken,
	) -> Result<(), E>
	where
		E: From<ListError>,
		I: IntoIterator<Item = T>,
	{
		let (index, items) = tokio::try_join!(index, items)?;
		let Some(items) = items else {
			return Ok(());
		};
		Ok(self.insert_async(index, items.into_iter().collect(), cancel).await?)
	}

	pub async fn append_deferred<E, I>(&self, items: impl Future<Output = Result<Option<I>, E>>, cancel: &CancellationToken) -> Result<Option<usize>, E>
	where
		E: From<ListError>,
		I: IntoIterator<Item = T>,
	{
		let Some(items) = items.await? else {
			return Ok(None);
		};
		Ok(self.append_async(items.into_iter().collect(), cancel).await?)
	}

	pub async fn remove_at_deferred<E>(&self, index: impl Future<Output = Result<usize, E>>, cancel: &CancellationToken) -> Result<T, E>
	where
		E: From<ListError>,
	{
		let index = index.await?;
		Ok(self.remove_at_async(index, cancel).await?)
	}

	pub async fn remove_deferred<E>(&self, value: impl Future<Output = Result<T, E>>, cancel: &CancellationToken) -> Result<Option<usize>, E>
	where
		T: PartialEq,
		E: From<ListError>,
	{
		let value = value.await?;
		Ok(self.remove_async(&value, cancel).await?)
	}

	pub async fn contains_deferred<E>(&self, value: impl Future<Output = Result<T, E>>, cancel: &CancellationToken) -> Result<bool, E>
	where
		T: PartialEq,
		E: From<ListError>,
	{
		let value = value.await?;
		Ok(self.contains_async(&value, cancel).await?)
	}

	pub async fn index_of_deferred<E>(&self, value: impl Future<Output = Result<T, E>>, cancel: &CancellationToken) -> Result<Option<usize>, E>
	where
		T: PartialEq,
		E: From<ListError>,
	{
		let value = value.await?;
		Ok(self.index_of_async(&value, cancel).await?)
	}
}
