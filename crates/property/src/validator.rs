use std::any::Any;

/// Votes on whether a property may take a candidate value.
///
/// Validators see the candidate type-erased; downcast to inspect it.
pub trait PropertyValidator: Send + Sync + 'static {
	fn can_change(&self, property: &str, candidate: &dyn Any) -> bool;
}

impl<F> PropertyValidator for F
where
	F: Fn(&str, &dyn Any) -> bool + Send + Sync + 'static,
{
	fn can_change(&self, property: &str, candidate: &dyn Any) -> bool {
		self(property, candidate)
	}
}
