//! Ordered listener registries.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

trait Unsubscribe: Send + Sync {
	fn remove(&self, id: u64);
}

/// Handle returned when a listener is registered.
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Clone)]
pub struct Subscription {
	registry: Weak<dyn Unsubscribe>,
	id: u64,
}

impl Subscription {
	/// Removes the listener this handle was returned for.
	///
	/// Calling it again, or after the registry is gone, does nothing.
	pub fn unsubscribe(&self) {
		if let Some(registry) = self.registry.upgrade() {
			registry.remove(self.id);
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("id", &self.id).finish()
	}
}

/// Listeners of one event kind, called in registration order.
pub(crate) struct Listeners<F: ?Sized> {
	entries: RwLock<Vec<(u64, Arc<F>)>>,
	next_id: AtomicU64,
}

impl<F: ?Sized + Send + Sync + 'static> Listeners<F> {
	pub(crate) fn new() -> Arc<Self> {
		Arc::new(Self {
			entries: RwLock::new(Vec::new()),
			next_id: AtomicU64::new(0),
		})
	}

	pub(crate) fn add(self: &Arc<Self>, listener: Arc<F>) -> Subscription {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.entries.write().push((id, listener));

		let registry: Arc<dyn Unsubscribe> = Arc::clone(self) as Arc<dyn Unsubscribe>;
		Subscription {
			registry: Arc::downgrade(&registry),
			id,
		}
	}

	/// The listeners at this moment.
	///
	/// Callers invoke the returned listeners without holding the lock, so a
	/// listener may register or unsubscribe while being called.
	pub(crate) fn snapshot(&self) -> Vec<Arc<F>> {
		self.entries
			.read()
			.iter()
			.map(|(_, listener)| Arc::clone(listener))
			.collect()
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.read().len()
	}
}

impl<F: ?Sized + Send + Sync> Unsubscribe for Listeners<F> {
	fn remove(&self, id: u64) {
		self.entries.write().retain(|(entry_id, _)| *entry_id != id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	type Callback = dyn Fn(&str) -> String + Send + Sync;

	#[rstest]
	fn test_snapshot_keeps_registration_order() {
		let listeners = Listeners::<Callback>::new();
		listeners.add(Arc::new(|s: &str| format!("first {s}")));
		listeners.add(Arc::new(|s: &str| format!("second {s}")));

		let calls: Vec<_> = listeners.snapshot().iter().map(|l| l("call")).collect();

		assert_eq!(calls, vec!["first call", "second call"]);
	}

	#[rstest]
	fn test_unsubscribe_removes_only_that_listener() {
		let listeners = Listeners::<Callback>::new();
		let first = listeners.add(Arc::new(|_: &str| "first".to_string()));
		listeners.add(Arc::new(|_: &str| "second".to_string()));

		first.unsubscribe();
		first.unsubscribe();

		assert_eq!(listeners.len(), 1);
		assert_eq!(listeners.snapshot()[0]("x"), "second");
	}

	#[rstest]
	fn test_unsubscribe_after_registry_dropped() {
		let listeners = Listeners::<Callback>::new();
		let subscription = listeners.add(Arc::new(|_: &str| String::new()));
		drop(listeners);

		subscription.unsubscribe();
	}
}
