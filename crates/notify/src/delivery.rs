use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use relay_worker::{TaskClass, WorkerJoinSet, join_error_panic_message, panic_payload_message};
use serde::Deserialize;

use crate::SubscriptionId;

/// How a publish reaches its subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
	/// Fire and forget: the publisher returns at once. Events are fanned out
	/// one at a time in publish order; the subscribers of one event run
	/// concurrently on the blocking pool.
	#[default]
	Detached,
	/// Subscribers run one after another, in registration order, on the
	/// publishing thread.
	Inline,
}

/// A subscriber panicked while handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberFault {
	pub channel: &'static str,
	pub subscription: SubscriptionId,
	pub message: String,
}

/// Callback receiving subscriber faults, in addition to the `tracing` log.
pub type FaultHandler = Arc<dyn Fn(&SubscriberFault) + Send + Sync>;

/// Delivery settings shared by the channels of one bus.
#[derive(Clone, Default)]
pub struct DeliveryOptions {
	pub mode: DeliveryMode,
	pub fault_handler: Option<FaultHandler>,
}

impl DeliveryOptions {
	pub fn detached() -> Self {
		Self::default()
	}

	pub fn inline() -> Self {
		Self {
			mode: DeliveryMode::Inline,
			fault_handler: None,
		}
	}

	#[must_use]
	pub fn with_fault_handler(mut self, handler: impl Fn(&SubscriberFault) + Send + Sync + 'static) -> Self {
		self.fault_handler = Some(Arc::new(handler));
		self
	}
}

impl From<DeliveryMode> for DeliveryOptions {
	fn from(mode: DeliveryMode) -> Self {
		Self { mode, fault_handler: None }
	}
}

impl fmt::Debug for DeliveryOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeliveryOptions")
			.field("mode", &self.mode)
			.field("fault_handler", &self.fault_handler.is_some())
			.finish()
	}
}

/// Outcome of one awaited publish.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
	pub delivered: usize,
	pub faulted: usize,
}

pub(crate) type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

pub(crate) type Targets<E> = Vec<(SubscriptionId, Handler<E>)>;

fn report(fault: &SubscriberFault, handler: Option<&FaultHandler>) {
	tracing::error!(
		channel = fault.channel,
		subscription = %fault.subscription,
		message = %fault.message,
		"notify.subscriber.panicked"
	);
	if let Some(handler) = handler {
		handler(fault);
	}
}

fn invoke<E>(channel: &'static str, id: SubscriptionId, handler: &Handler<E>, event: &E) -> Result<(), SubscriberFault> {
	catch_unwind(AssertUnwindSafe(|| handler(event))).map_err(|payload| SubscriberFault {
		channel,
		subscription: id,
		message: panic_payload_message(payload.as_ref()),
	})
}

/// Runs every target on the calling thread, in order.
pub(crate) fn deliver_inline<E>(channel: &'static str, targets: Targets<E>, event: &E, faults: Option<&FaultHandler>) -> Delivery {
	let mut delivery = Delivery::default();
	for (id, handler) in targets {
		match invoke(channel, id, &handler, event) {
			Ok(()) => delivery.delivered += 1,
			Err(fault) => {
				delivery.faulted += 1;
				report(&fault, faults);
			}
		}
	}
	delivery
}

/// Runs every target concurrently on the blocking pool and waits for all of them.
pub(crate) async fn fan_out<E>(channel: &'static str, targets: Targets<E>, event: Arc<E>, faults: Option<FaultHandler>) -> Delivery
where
	E: Send + Sync + 'static,
{
	let mut set = WorkerJoinSet::new(TaskClass::Subscriber);
	for (id, handler) in targets {
		let event = Arc::clone(&event);
		set.spawn_blocking(move || invoke(channel, id, &handler, &*event));
	}

	let mut delivery = Delivery::default();
	while let Some(joined) = set.join_next().await {
		match joined {
			Ok(Ok(())) => delivery.delivered += 1,
			Ok(Err(fault)) => {
				delivery.faulted += 1;
				report(&fault, faults.as_ref());
			}
			Err(err) => {
				delivery.faulted += 1;
				let message = join_error_panic_message(err).unwrap_or_else(|| "subscriber task cancelled".to_string());
				tracing::error!(channel, %message, "notify.subscriber.join_failed");
			}
		}
	}
	delivery
}
