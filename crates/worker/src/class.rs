/// Execution classes used to tag spawned notification work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Async coordinator that fans one event out to its subscribers.
	Fanout,
	/// One subscriber callback, run on the blocking pool.
	Subscriber,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Fanout => "fanout",
			Self::Subscriber => "subscriber",
		}
	}
}
