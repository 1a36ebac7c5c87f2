use std::borrow::Cow;

/// Name carried by the [`PropertyChanged`] signal published after any
/// membership change.
pub const COUNT_PROPERTY: &str = "Count";

/// Structural change to an ordered collection.
///
/// Indices refer to the collection as it was immediately before the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<T> {
	/// One element at `index` was overwritten with `value`.
	Replace { index: usize, value: T },
	/// `items` were inserted as one contiguous block starting at `index`.
	Insert { index: usize, items: Vec<T> },
	/// One contiguous block was removed; `start` is its pre-removal index.
	RemoveRange { start: usize, values: Vec<T> },
	/// Contents changed too much to describe; re-read the whole collection.
	Reset,
}

/// Fieldless discriminant of [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
	Replace,
	Insert,
	RemoveRange,
	Reset,
}

impl<T> ChangeEvent<T> {
	pub fn kind(&self) -> ChangeKind {
		match self {
			Self::Replace { .. } => ChangeKind::Replace,
			Self::Insert { .. } => ChangeKind::Insert,
			Self::RemoveRange { .. } => ChangeKind::RemoveRange,
			Self::Reset => ChangeKind::Reset,
		}
	}

	/// Number of elements named by the event; zero for `Reset`.
	pub fn len(&self) -> usize {
		match self {
			Self::Replace { .. } => 1,
			Self::Insert { items, .. } => items.len(),
			Self::RemoveRange { values, .. } => values.len(),
			Self::Reset => 0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// A named property changed its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyChanged {
	pub name: Cow<'static, str>,
}

impl PropertyChanged {
	pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
		Self { name: name.into() }
	}

	/// The `Count` signal.
	pub fn count() -> Self {
		Self::new(COUNT_PROPERTY)
	}

	pub fn is_count(&self) -> bool {
		self.name == COUNT_PROPERTY
	}
}
