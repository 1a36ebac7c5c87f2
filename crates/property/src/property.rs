use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A value together with the instant it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChange<T> {
	pub value: T,
	pub timestamp: DateTime<Utc>,
}

impl<T> DataChange<T> {
	/// Stamps `value` with the current time.
	pub fn new(value: T) -> Self {
		Self::at(value, Utc::now())
	}

	pub fn at(value: T, timestamp: DateTime<Utc>) -> Self {
		Self { value, timestamp }
	}
}

/// A named cell holding the most recent [`DataChange`] of its value.
pub struct Property<T> {
	name: Cow<'static, str>,
	recent: Mutex<DataChange<T>>,
}

impl<T> Property<T> {
	/// The initial value is stamped with the earliest representable instant,
	/// so any real change compares as newer.
	pub fn new(name: impl Into<Cow<'static, str>>, initial: T) -> Self {
		Self {
			name: name.into(),
			recent: Mutex::new(DataChange::at(initial, DateTime::<Utc>::MIN_UTC)),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn name_cow(&self) -> Cow<'static, str> {
		self.name.clone()
	}

	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.recent.lock().value.clone()
	}

	pub fn recent(&self) -> DataChange<T>
	where
		T: Clone,
	{
		self.recent.lock().clone()
	}

	/// Timestamp of the current value.
	pub fn updated_at(&self) -> DateTime<Utc> {
		self.recent.lock().timestamp
	}

	pub(crate) fn holds(&self, value: &T) -> bool
	where
		T: PartialEq,
	{
		self.recent.lock().value == *value
	}

	pub(crate) fn store(&self, change: DataChange<T>) {
		*self.recent.lock() = change;
	}
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Property")
			.field("name", &self.name)
			.field("recent", &*self.recent.lock())
			.finish()
	}
}
