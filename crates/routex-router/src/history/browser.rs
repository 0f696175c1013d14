use super::{History, HistoryEntry, PopEvent, PopListener};
use crate::listeners::{Listeners, Subscription};
use routex_urls::{Query, parse_query};
use std::fmt;
use std::sync::Arc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, PopStateEvent};

type PopListeners = Listeners<dyn Fn(&PopEvent) + Send + Sync>;

/// A history backed by the browser's History API.
///
/// Entries written by the router carry a serialized [`HistoryEntry`] as their
/// state. Browser back and forward navigation is reported to pop listeners.
pub struct BrowserHistory {
	listeners: Arc<PopListeners>,
}

impl BrowserHistory {
	/// Creates the history and starts listening for `popstate` events.
	///
	/// The event listener stays installed for the lifetime of the page.
	pub fn new() -> Self {
		let listeners = PopListeners::new();
		install_popstate_listener(Arc::clone(&listeners));
		Self { listeners }
	}
}

impl Default for BrowserHistory {
	fn default() -> Self {
		Self::new()
	}
}

impl History for BrowserHistory {
	fn state(&self) -> Option<HistoryEntry> {
		let state = web_sys::window()?.history().ok()?.state().ok()?;
		decode_state(&state)
	}

	fn pathname(&self) -> String {
		web_sys::window()
			.and_then(|w| w.location().pathname().ok())
			.unwrap_or_else(|| "/".to_string())
	}

	fn query(&self) -> Query {
		current_query()
	}

	fn push_state(&self, entry: &HistoryEntry, href: &str) {
		write_state(entry, href, false);
	}

	fn replace_state(&self, entry: &HistoryEntry, href: &str) {
		write_state(entry, href, true);
	}

	fn add_pop_state_listener(&self, listener: PopListener) -> Subscription {
		self.listeners.add(listener)
	}
}

impl fmt::Debug for BrowserHistory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BrowserHistory")
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

fn current_query() -> Query {
	web_sys::window()
		.and_then(|w| w.location().search().ok())
		.map(|search| parse_query(&search))
		.unwrap_or_default()
}

fn encode_state(entry: &HistoryEntry) -> Result<JsValue, String> {
	let json = serde_json::to_string(entry).map_err(|e| e.to_string())?;
	js_sys::JSON::parse(&json).map_err(|e| format!("{:?}", e))
}

fn decode_state(state: &JsValue) -> Option<HistoryEntry> {
	if state.is_null() || state.is_undefined() {
		return None;
	}
	let json: String = js_sys::JSON::stringify(state).ok()?.into();
	match serde_json::from_str(&json) {
		Ok(entry) => Some(entry),
		Err(e) => {
			tracing::warn!(error = %e, "ignoring history state not written by the router");
			None
		}
	}
}

fn write_state(entry: &HistoryEntry, href: &str, replace: bool) {
	let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
		tracing::warn!(href = %href, "no window history available");
		return;
	};

	let result = encode_state(entry).and_then(|state| {
		let written = if replace {
			history.replace_state_with_url(&state, "", Some(href))
		} else {
			history.push_state_with_url(&state, "", Some(href))
		};
		written.map_err(|e| format!("{:?}", e))
	});

	if let Err(e) = result {
		tracing::warn!(href = %href, replace, error = %e, "failed to write history state");
	}
}

fn install_popstate_listener(listeners: Arc<PopListeners>) {
	let Some(window) = web_sys::window() else {
		tracing::warn!("no window, popstate events will not be reported");
		return;
	};

	let handler = Closure::wrap(Box::new(move |event: Event| {
		let state = event
			.dyn_ref::<PopStateEvent>()
			.and_then(|event| decode_state(&event.state()));
		let pop = PopEvent {
			pathname: web_sys::window()
				.and_then(|w| w.location().pathname().ok())
				.unwrap_or_else(|| "/".to_string()),
			query: current_query(),
			state,
		};

		for listener in listeners.snapshot() {
			listener(&pop);
		}
	}) as Box<dyn FnMut(_)>);

	if let Err(e) =
		window.add_event_listener_with_callback("popstate", handler.as_ref().unchecked_ref())
	{
		tracing::warn!(error = ?e, "failed to install popstate listener");
		return;
	}
	handler.forget();
}
