//! History backends.
//!
//! The router reads the current location from a [`History`], writes committed
//! routes back to it and listens to its pop events. Two backends are
//! provided: [`MemoryHistory`] for any target, and `BrowserHistory` for
//! `wasm32` targets running in a browser.

#[cfg(target_arch = "wasm32")]
mod browser;
mod memory;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserHistory;
pub use memory::MemoryHistory;

use crate::listeners::Subscription;
use routex_routes::ResolvedRoute;
use routex_urls::Query;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// What the router stores in a history entry.
///
/// Handlers and components cannot be persisted, so a popped entry is always
/// resolved again instead of being trusted as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
	/// Route name, if the matched chain has one.
	pub name: Option<String>,
	/// Extracted path variables.
	pub vars: HashMap<String, String>,
	/// Query the route was resolved with.
	pub query: Query,
	/// The matched path.
	pub path: String,
}

impl HistoryEntry {
	/// Captures the persistable part of a resolved route.
	pub fn from_route<C>(route: &ResolvedRoute<C>) -> Self {
		Self {
			name: route.name.clone(),
			vars: route.vars.clone(),
			query: route.query.clone(),
			path: route.pathname.clone(),
		}
	}
}

/// A back or forward navigation reported by a history backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PopEvent {
	/// Path of the entry navigated to.
	pub pathname: String,
	/// Query of the entry navigated to.
	pub query: Query,
	/// State stored with the entry, if the router wrote it.
	pub state: Option<HistoryEntry>,
}

/// Callback receiving pop events.
pub type PopListener = Arc<dyn Fn(&PopEvent) + Send + Sync>;

/// The capabilities the router needs from a history backend.
pub trait History: Send + Sync {
	/// State of the current entry, if one was written.
	fn state(&self) -> Option<HistoryEntry>;

	/// Path of the current entry.
	fn pathname(&self) -> String;

	/// Query of the current entry.
	fn query(&self) -> Query;

	/// Adds an entry after the current one.
	fn push_state(&self, entry: &HistoryEntry, href: &str);

	/// Overwrites the current entry.
	fn replace_state(&self, entry: &HistoryEntry, href: &str);

	/// Registers a callback for back and forward navigation.
	fn add_pop_state_listener(&self, listener: PopListener) -> Subscription;
}

impl<H: History + ?Sized> History for Arc<H> {
	fn state(&self) -> Option<HistoryEntry> {
		(**self).state()
	}

	fn pathname(&self) -> String {
		(**self).pathname()
	}

	fn query(&self) -> Query {
		(**self).query()
	}

	fn push_state(&self, entry: &HistoryEntry, href: &str) {
		(**self).push_state(entry, href)
	}

	fn replace_state(&self, entry: &HistoryEntry, href: &str) {
		(**self).replace_state(entry, href)
	}

	fn add_pop_state_listener(&self, listener: PopListener) -> Subscription {
		(**self).add_pop_state_listener(listener)
	}
}
