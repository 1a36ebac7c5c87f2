//! Observable, concurrency-safe ordered collection.
//!
//! [`ObservableList`] keeps its elements behind one
//! [`relay_sync::UpgradeLock`] and publishes a [`ChangeEvent`] stream after
//! every mutation, once the lock has been released. Removals from
//! [`ObservableList::remove_where`] are folded into contiguous ranges by the
//! [`compact`] module, or collapsed into a single `Reset` when they are too
//! scattered.
//!
//! Every operation comes in three forms:
//! * blocking (`insert`): parks the calling thread while waiting for the lock;
//! * async (`insert_async`): yields while waiting and honours a cancellation token;
//! * deferred (`insert_deferred`): resolves future inputs first, then behaves
//!   like the async form. An input that fails is returned to the caller as is.

pub mod compact;
mod config;
mod dispatch;
mod error;
mod list;

pub use compact::{Compaction, DEFAULT_RESET_THRESHOLD, RemovedRange};
pub use config::ListConfig;
pub use dispatch::{DispatchedList, Dispatcher, Job};
pub use error::ListError;
pub use list::{ObservableList, RemovalSet};
pub use relay_notify::{
	COUNT_PROPERTY, ChangeEvent, ChangeKind, Delivery, DeliveryMode, DeliveryOptions, FaultHandler, NotificationBus, PropertyChanged,
	SubscriberFault, Subscription, SubscriptionId,
};
pub use relay_sync::CancellationToken;
