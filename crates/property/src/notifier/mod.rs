use std::any::Any;
use std::fmt;
use std::sync::Arc;

use relay_list::{ListConfig, ListError, ObservableList};
use relay_notify::{DeliveryOptions, EventChannel, PropertyChanged, Subscription};

use crate::{DataChange, Property, PropertyValidator};

type Validators = ObservableList<Arc<dyn PropertyValidator>>;

/// Gatekeeper and announcer for writes to [`Property`] cells.
///
/// Validators and change subscribers are independent: validators decide
/// whether a write happens, subscribers hear about writes that did.
pub struct PropertyNotifier {
	changes: EventChannel<PropertyChanged>,
	validators: Arc<Validators>,
}

impl PropertyNotifier {
	pub fn new(options: DeliveryOptions) -> Self {
		Self {
			changes: EventChannel::new("property_changed", options),
			validators: Arc::new(ObservableList::with_config(ListConfig::default())),
		}
	}

	/// Channel announcing accepted property changes by name.
	pub fn changes(&self) -> &EventChannel<PropertyChanged> {
		&self.changes
	}

	/// Adds a validator consulted before every [`Self::set`]. Dropping the
	/// returned guard removes it again.
	pub fn subscribe_validator(&self, validator: impl PropertyValidator) -> Result<Subscription, ListError> {
		let validator: Arc<dyn PropertyValidator> = Arc::new(validator);
		self.validators.push(Arc::clone(&validator))?;
		let validators = Arc::downgrade(&self.validators);
		Ok(Subscription::new(move || {
			let Some(validators) = validators.upgrade() else {
				return;
			};
			if let Err(err) = validators.remove_by(&validator, Arc::ptr_eq) {
				tracing::warn!(%err, "property.validator.unsubscribe_failed");
			}
		}))
	}

	pub fn validator_count(&self) -> Result<usize, ListError> {
		self.validators.len()
	}

	/// True when every validator approves `candidate` for `property`; true
	/// when there are none.
	///
	/// Validators run against a snapshot, outside the list lock, so they may
	/// subscribe or unsubscribe validators themselves.
	pub fn can_property_change(&self, property: &str, candidate: &dyn Any) -> Result<bool, ListError> {
		let validators = self.validators.snapshot()?;
		let approved = validators.iter().all(|validator| validator.can_change(property, candidate));
		if !approved {
			tracing::debug!(property, "property.change.vetoed");
		}
		Ok(approved)
	}

	/// Writes `value` into `property` unless it already holds it or a
	/// validator vetoes it. Returns whether the write happened.
	///
	/// Concurrent writes to the same property are last-writer-wins.
	pub fn set<T>(&self, property: &Property<T>, value: T) -> Result<bool, ListError>
	where
		T: PartialEq + 'static,
	{
		if property.holds(&value) || !self.can_property_change(property.name(), &value)? {
			return Ok(false);
		}
		self.set_change(property, DataChange::new(value));
		Ok(true)
	}

	/// Stores a caller-stamped change without comparing or validating, then
	/// announces it.
	pub fn set_change<T>(&self, property: &Property<T>, change: DataChange<T>) {
		tracing::trace!(property = property.name(), timestamp = %change.timestamp, "property.set");
		property.store(change);
		self.notify(property.name_cow());
	}

	/// Announces a change to `property` without touching any cell.
	pub fn notify(&self, property: impl Into<std::borrow::Cow<'static, str>>) {
		self.changes.publish(PropertyChanged::new(property));
	}
}

impl Default for PropertyNotifier {
	fn default() -> Self {
		Self::new(DeliveryOptions::default())
	}
}

impl fmt::Debug for PropertyNotifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PropertyNotifier")
			.field("changes", &self.changes)
			.finish_non_exhaustive()
	}
}
