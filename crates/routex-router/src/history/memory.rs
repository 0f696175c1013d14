use super::{History, HistoryEntry, PopEvent, PopListener};
use crate::listeners::{Listeners, Subscription};
use parking_lot::Mutex;
use routex_urls::{Query, create_href, split_href};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Entry {
	pathname: String,
	query: Query,
	state: Option<HistoryEntry>,
}

impl Entry {
	fn from_href(href: &str, state: Option<HistoryEntry>) -> Self {
		let (pathname, query) = split_href(href);
		Self {
			pathname: pathname.to_string(),
			query,
			state,
		}
	}

	fn pop_event(&self) -> PopEvent {
		PopEvent {
			pathname: self.pathname.clone(),
			query: self.query.clone(),
			state: self.state.clone(),
		}
	}
}

#[derive(Debug)]
struct Stack {
	entries: Vec<Entry>,
	index: usize,
}

impl Stack {
	fn current(&self) -> &Entry {
		&self.entries[self.index]
	}
}

/// A history kept in memory.
///
/// It never reports navigation on its own. [`back`](Self::back),
/// [`forward`](Self::forward) and [`go`](Self::go) move through the entry
/// stack the way a browser's buttons would, and notify pop listeners.
///
/// # Example
///
/// ```
/// use routex_router::history::{History, HistoryEntry, MemoryHistory};
///
/// let history = MemoryHistory::new("/");
/// history.push_state(&HistoryEntry::default(), "/users?page=2");
///
/// assert_eq!(history.pathname(), "/users");
/// assert!(history.back());
/// assert_eq!(history.pathname(), "/");
/// ```
pub struct MemoryHistory {
	stack: Mutex<Stack>,
	listeners: Arc<Listeners<dyn Fn(&PopEvent) + Send + Sync>>,
}

impl MemoryHistory {
	/// Creates a history with a single entry at `href` and no state.
	pub fn new(href: &str) -> Self {
		Self {
			stack: Mutex::new(Stack {
				entries: vec![Entry::from_href(href, None)],
				index: 0,
			}),
			listeners: Listeners::new(),
		}
	}

	/// Number of entries in the stack.
	pub fn len(&self) -> usize {
		self.stack.lock().entries.len()
	}

	/// Always `false`: the stack has at least the initial entry.
	pub fn is_empty(&self) -> bool {
		false
	}

	/// Position of the current entry.
	pub fn index(&self) -> usize {
		self.stack.lock().index
	}

	/// Number of registered pop listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Hrefs of all entries, oldest first.
	pub fn hrefs(&self) -> Vec<String> {
		self.stack
			.lock()
			.entries
			.iter()
			.map(|entry| create_href(&entry.pathname, &entry.query))
			.collect()
	}

	/// Moves one entry back. Returns `false` at the first entry.
	pub fn back(&self) -> bool {
		self.go(-1)
	}

	/// Moves one entry forward. Returns `false` at the last entry.
	pub fn forward(&self) -> bool {
		self.go(1)
	}

	/// Moves `delta` entries and notifies pop listeners.
	///
	/// Returns `false` without moving if the target is out of range.
	pub fn go(&self, delta: isize) -> bool {
		let event = {
			let mut stack = self.stack.lock();
			let Some(target) = stack
				.index
				.checked_add_signed(delta)
				.filter(|target| *target < stack.entries.len())
			else {
				return false;
			};
			stack.index = target;
			stack.current().pop_event()
		};

		tracing::debug!(pathname = %event.pathname, delta, "memory history pop");
		for listener in self.listeners.snapshot() {
			listener(&event);
		}
		true
	}
}

impl Default for MemoryHistory {
	fn default() -> Self {
		Self::new("/")
	}
}

impl History for MemoryHistory {
	fn state(&self) -> Option<HistoryEntry> {
		self.stack.lock().current().state.clone()
	}

	fn pathname(&self) -> String {
		self.stack.lock().current().pathname.clone()
	}

	fn query(&self) -> Query {
		self.stack.lock().current().query.clone()
	}

	fn push_state(&self, entry: &HistoryEntry, href: &str) {
		let mut stack = self.stack.lock();
		let next = stack.index + 1;
		stack.entries.truncate(next);
		stack.entries.push(Entry::from_href(href, Some(entry.clone())));
		stack.index = next;
	}

	fn replace_state(&self, entry: &HistoryEntry, href: &str) {
		let mut stack = self.stack.lock();
		let index = stack.index;
		stack.entries[index] = Entry::from_href(href, Some(entry.clone()));
	}

	fn add_pop_state_listener(&self, listener: PopListener) -> Subscription {
		self.listeners.add(listener)
	}
}

impl fmt::Debug for MemoryHistory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let stack = self.stack.lock();
		f.debug_struct("MemoryHistory")
			.field("entries", &stack.entries.len())
			.field("index", &stack.index)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}
