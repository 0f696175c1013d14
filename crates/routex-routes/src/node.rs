//! Runtime route nodes.

use super::definition::{Attrs, Children, RouteComponent, RouteDefinition};
use super::error::{RouteError, RouteResult};
use super::handler::TransitionHandler;
use super::pattern::PathMatcher;
use super::resolved::ResolvedRoute;
use super::settings::MatchSettings;
use once_cell::sync::OnceCell;
use routex_urls::{Query, join_paths};
use std::fmt;
use std::sync::Arc;

/// Handle to a node stored in a [`RouteTree`](super::RouteTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
	/// Position of the node in its tree's arena.
	pub fn index(self) -> usize {
		self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// One route definition placed at a position in the tree.
///
/// The matcher is compiled on first use. Child nodes are instantiated on first
/// descent and cached by the owning tree; a lazy children loader therefore
/// runs at most once per successful load.
pub(crate) struct RouteNode<C> {
	pub(crate) path: String,
	pub(crate) base_path: String,
	pub(crate) name: Option<String>,
	pub(crate) component: RouteComponent<C>,
	pub(crate) on_enter: TransitionHandler<C>,
	pub(crate) on_leave: TransitionHandler<C>,
	pub(crate) attrs: Attrs,
	pub(crate) children: Children<C>,
	matcher: OnceCell<RouteResult<Arc<PathMatcher>>>,
	pub(crate) resolved_children: futures::lock::Mutex<Option<Arc<[NodeId]>>>,
}

impl<C> RouteNode<C> {
	pub(crate) fn new(definition: RouteDefinition<C>, base_path: &str) -> Self {
		let RouteDefinition {
			path,
			name,
			component,
			on_enter,
			on_leave,
			attrs,
			children,
		} = definition;

		Self {
			path,
			base_path: base_path.to_string(),
			name,
			component,
			on_enter,
			on_leave,
			attrs,
			children,
			matcher: OnceCell::new(),
			resolved_children: futures::lock::Mutex::new(None),
		}
	}

	/// The accumulated path of this node, used as the base of its children.
	pub(crate) fn full_path(&self) -> String {
		join_paths(&self.base_path, &self.path)
	}

	/// Compiles the matcher on first call; later calls return the cached
	/// outcome, including a cached compile error.
	pub(crate) fn matcher(&self, settings: &MatchSettings) -> RouteResult<Arc<PathMatcher>> {
		self.matcher
			.get_or_init(|| PathMatcher::compile(&self.base_path, &self.path, settings).map(Arc::new))
			.clone()
	}
}

impl<C: Clone> RouteNode<C> {
	/// Matches this node alone against the whole path.
	pub(crate) fn match_self(
		&self,
		matcher: &PathMatcher,
		path: &str,
		query: &Query,
	) -> RouteResult<ResolvedRoute<C>> {
		let vars = matcher.match_exact(path).ok_or(RouteError::NotMatched)?;

		Ok(ResolvedRoute::leaf(
			path,
			vars,
			query,
			self.name.clone(),
			self.component.clone(),
			Arc::clone(&self.on_enter),
			Arc::clone(&self.on_leave),
			self.attrs.clone(),
		))
	}

	/// Puts this node in front of a chain matched by one of its children.
	pub(crate) fn wrap(&self, child: ResolvedRoute<C>) -> ResolvedRoute<C> {
		child.nest_under(
			self.name.as_deref(),
			self.component.clone(),
			Arc::clone(&self.on_enter),
			Arc::clone(&self.on_leave),
			&self.attrs,
		)
	}
}
