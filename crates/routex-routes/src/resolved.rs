//! The outcome of a successful match.

use super::definition::{Attrs, RouteComponent};
use super::handler::TransitionHandler;
use routex_urls::{Query, create_href};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A matched route chain, root through leaf.
///
/// `components`, `on_enter` and `on_leave` always have the same length: the
/// depth of the matched chain. All three are ordered root to leaf.
pub struct ResolvedRoute<C> {
	/// The path that was matched.
	pub pathname: String,
	/// Variables extracted from the composed pattern of the leaf.
	pub vars: HashMap<String, String>,
	/// The query the route was resolved with.
	pub query: Query,
	/// `pathname` with `query` appended.
	pub full_path: String,
	/// Name of the deepest named route in the chain.
	pub name: Option<String>,
	/// Components, one per level.
	pub components: Vec<RouteComponent<C>>,
	/// Enter handlers, one per level.
	pub on_enter: Vec<TransitionHandler<C>>,
	/// Leave handlers, one per level.
	pub on_leave: Vec<TransitionHandler<C>>,
	/// Attributes merged from root to leaf, deeper levels winning.
	pub attrs: Attrs,
}

impl<C> ResolvedRoute<C> {
	/// Builds a single-level match.
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn leaf(
		pathname: &str,
		vars: HashMap<String, String>,
		query: &Query,
		name: Option<String>,
		component: RouteComponent<C>,
		on_enter: TransitionHandler<C>,
		on_leave: TransitionHandler<C>,
		attrs: Attrs,
	) -> Self {
		Self {
			pathname: pathname.to_string(),
			vars,
			query: query.clone(),
			full_path: create_href(pathname, query),
			name,
			components: vec![component],
			on_enter: vec![on_enter],
			on_leave: vec![on_leave],
			attrs,
		}
	}

	/// Puts a parent level in front of this chain.
	pub(crate) fn nest_under(
		mut self,
		name: Option<&str>,
		component: RouteComponent<C>,
		on_enter: TransitionHandler<C>,
		on_leave: TransitionHandler<C>,
		attrs: &Attrs,
	) -> Self {
		self.components.insert(0, component);
		self.on_enter.insert(0, on_enter);
		self.on_leave.insert(0, on_leave);

		let mut merged = attrs.clone();
		merged.extend(std::mem::take(&mut self.attrs));
		self.attrs = merged;

		if self.name.is_none() {
			self.name = name.map(str::to_string);
		}
		self
	}

	/// Number of levels in the matched chain.
	pub fn depth(&self) -> usize {
		self.components.len()
	}

	/// Replaces the component list, keeping everything else.
	pub fn with_components(mut self, components: Vec<RouteComponent<C>>) -> Self {
		self.components = components;
		self
	}

	#[cfg(test)]
	pub(crate) fn empty(pathname: &str) -> Self {
		Self {
			pathname: pathname.to_string(),
			vars: HashMap::new(),
			query: Query::new(),
			full_path: pathname.to_string(),
			name: None,
			components: Vec::new(),
			on_enter: Vec::new(),
			on_leave: Vec::new(),
			attrs: Attrs::new(),
		}
	}
}

impl<C: Clone> ResolvedRoute<C> {
	/// Returns the components that are already available, root to leaf.
	///
	/// Levels without a component and unresolved lazy components are skipped.
	pub fn component_values(&self) -> Vec<C> {
		self.components
			.iter()
			.filter_map(|component| component.value().cloned())
			.collect()
	}
}

impl<C: Clone> Clone for ResolvedRoute<C> {
	fn clone(&self) -> Self {
		Self {
			pathname: self.pathname.clone(),
			vars: self.vars.clone(),
			query: self.query.clone(),
			full_path: self.full_path.clone(),
			name: self.name.clone(),
			components: self.components.clone(),
			on_enter: self.on_enter.iter().map(Arc::clone).collect(),
			on_leave: self.on_leave.iter().map(Arc::clone).collect(),
			attrs: self.attrs.clone(),
		}
	}
}

impl<C: fmt::Debug> fmt::Debug for ResolvedRoute<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedRoute")
			.field("pathname", &self.pathname)
			.field("vars", &self.vars)
			.field("query", &self.query)
			.field("full_path", &self.full_path)
			.field("name", &self.name)
			.field("components", &self.components)
			.field("depth", &self.on_enter.len())
			.field("attrs", &self.attrs)
			.finish()
	}
}
