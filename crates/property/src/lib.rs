//! Property-change notification with pluggable change validation.
//!
//! A [`Property`] is a named cell holding its most recent [`DataChange`].
//! [`PropertyNotifier`] writes through to properties, asking every subscribed
//! [`PropertyValidator`] first and announcing accepted changes as
//! [`PropertyChanged`] signals.

mod notifier;
mod property;
mod validator;

pub use notifier::PropertyNotifier;
pub use property::{DataChange, Property};
pub use relay_notify::PropertyChanged;
pub use validator::PropertyValidator;
