//! Change notifications for observable collections.
//!
//! Two event kinds travel over separate [`EventChannel`]s: structural
//! [`ChangeEvent`]s and plain [`PropertyChanged`] signals. A
//! [`NotificationBus`] bundles both for one collection.
//!
//! # Delivery
//!
//! Subscribers are snapshotted at publish time, so subscribing or unsubscribing
//! concurrently with a publish never disturbs an in-flight fan-out. Under
//! [`DeliveryMode::Detached`] the publisher returns immediately; a per-bus
//! worker fans events out one at a time in publish order, running the
//! subscribers of each event concurrently on the blocking pool. Under
//! [`DeliveryMode::Inline`] subscribers run in registration order on the
//! publishing thread. Either way a panicking subscriber is isolated and
//! reported through [`DeliveryOptions::fault_handler`], never to the publisher.

mod bus;
mod channel;
mod delivery;
mod event;
mod queue;
mod subscription;

pub use bus::{Notification, NotificationBus};
pub use channel::EventChannel;
pub use delivery::{Delivery, DeliveryMode, DeliveryOptions, FaultHandler, SubscriberFault};
pub use event::{COUNT_PROPERTY, ChangeEvent, ChangeKind, PropertyChanged};
pub use queue::Ticket;
pub use subscription::{Subscription, SubscriptionId};
