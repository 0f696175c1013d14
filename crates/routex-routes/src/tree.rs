//! Arena-backed route tree and the first-match resolver.

use super::definition::{Children, RouteDefinition};
use super::error::{RouteError, RouteResult};
use super::node::{NodeId, RouteNode};
use super::resolved::ResolvedRoute;
use super::settings::MatchSettings;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use routex_urls::Query;
use std::fmt;
use std::sync::Arc;

/// A tree of routes resolved against URL paths.
///
/// Top-level definitions become nodes when the tree is built. Descendants
/// become nodes the first time a path descends into their parent, and stay
/// in the arena for the lifetime of the tree.
///
/// # Example
///
/// ```
/// use routex_routes::{RouteDefinition, RouteTree};
/// use routex_urls::Query;
///
/// let tree = RouteTree::new(vec![
///     RouteDefinition::new("/").component("Layout").children(vec![
///         RouteDefinition::new("users/:id").component("User"),
///     ]),
/// ])
/// .unwrap();
///
/// let route = futures::executor::block_on(tree.resolve("/users/7", &Query::new())).unwrap();
/// assert_eq!(route.component_values(), vec!["Layout", "User"]);
/// assert_eq!(route.vars["id"], "7");
/// ```
pub struct RouteTree<C> {
	nodes: RwLock<Vec<Arc<RouteNode<C>>>>,
	roots: Vec<NodeId>,
	settings: MatchSettings,
}

impl<C> RouteTree<C>
where
	C: Clone + Send + Sync + 'static,
{
	/// Builds a tree with default [`MatchSettings`].
	///
	/// # Errors
	///
	/// Returns [`RouteError::Definition`] if any eagerly declared route is
	/// malformed.
	pub fn new(definitions: Vec<RouteDefinition<C>>) -> RouteResult<Self> {
		Self::with_settings(definitions, MatchSettings::default())
	}

	/// Builds a tree with explicit settings.
	///
	/// # Errors
	///
	/// Returns [`RouteError::Definition`] if any eagerly declared route is
	/// malformed.
	pub fn with_settings(
		definitions: Vec<RouteDefinition<C>>,
		settings: MatchSettings,
	) -> RouteResult<Self> {
		definitions.iter().try_for_each(RouteDefinition::validate)?;

		let nodes: Vec<_> = definitions
			.into_iter()
			.map(|definition| Arc::new(RouteNode::new(definition, "")))
			.collect();
		let roots = (0..nodes.len()).map(NodeId).collect();

		Ok(Self {
			nodes: RwLock::new(nodes),
			roots,
			settings,
		})
	}

	/// The top-level nodes, in declaration order.
	pub fn roots(&self) -> &[NodeId] {
		&self.roots
	}

	/// The settings patterns are compiled with.
	pub fn settings(&self) -> &MatchSettings {
		&self.settings
	}

	/// Number of nodes instantiated so far.
	pub fn len(&self) -> usize {
		self.nodes.read().len()
	}

	/// Returns `true` if the tree has no routes.
	pub fn is_empty(&self) -> bool {
		self.roots.is_empty()
	}

	/// Resolves a path against the top-level routes.
	///
	/// # Errors
	///
	/// Fails with [`RouteError::NoRoutesToResolve`] for an empty tree, and
	/// otherwise with the failure of the last top-level route tried.
	pub async fn resolve(&self, path: &str, query: &Query) -> RouteResult<ResolvedRoute<C>> {
		let route = self.resolve_first(&self.roots, path, query).await?;

		tracing::debug!(
			path = %path,
			depth = route.depth(),
			name = ?route.name,
			"resolved route"
		);
		Ok(route)
	}

	/// Tries `candidates` in order and returns the first match.
	///
	/// A later candidate is never consulted once an earlier one matched.
	///
	/// # Errors
	///
	/// Fails with [`RouteError::NoRoutesToResolve`] if `candidates` is empty.
	/// If every candidate fails, the error of the last one is returned; it is
	/// [`RouteError::NotMatched`] unless that candidate failed for another
	/// reason, such as a pattern that does not compile.
	pub async fn resolve_first(
		&self,
		candidates: &[NodeId],
		path: &str,
		query: &Query,
	) -> RouteResult<ResolvedRoute<C>> {
		let mut last_error = RouteError::NoRoutesToResolve;

		for &id in candidates {
			match self.match_node(id, path, query).await {
				Ok(route) => return Ok(route),
				Err(err) => {
					tracing::trace!(node = %id, path = %path, error = %err, "route candidate rejected");
					last_error = err;
				}
			}
		}

		Err(last_error)
	}

	/// Matches a single node, descending into its children first.
	///
	/// When the node's prefix matches, its children are tried with
	/// [`resolve_first`](Self::resolve_first). A child match is returned with
	/// this node prepended. If the children fail with
	/// [`NoRoutesToResolve`](RouteError::NoRoutesToResolve) or
	/// [`NotMatched`](RouteError::NotMatched), the node is matched on its own;
	/// any other child failure is returned as is.
	///
	/// # Errors
	///
	/// Fails with [`RouteError::NotMatched`] if neither the node nor a
	/// descendant matches, or with the error that stopped the descent.
	pub fn match_node<'a>(
		&'a self,
		id: NodeId,
		path: &'a str,
		query: &'a Query,
	) -> BoxFuture<'a, RouteResult<ResolvedRoute<C>>> {
		async move {
			let node = self.node(id)?;
			let matcher = node.matcher(&self.settings)?;

			if matcher.is_prefix_match(path) {
				let children = self.child_ids(id, &node).await?;

				match self.resolve_first(&children, path, query).await {
					Ok(child) => return Ok(node.wrap(child)),
					Err(err) if err.is_benign() => {
						tracing::trace!(node = %id, path = %path, "no child matched, matching route itself");
					}
					Err(err) => return Err(err),
				}
			}

			node.match_self(&matcher, path, query)
		}
		.boxed()
	}

	fn node(&self, id: NodeId) -> RouteResult<Arc<RouteNode<C>>> {
		self.nodes
			.read()
			.get(id.0)
			.cloned()
			.ok_or_else(|| RouteError::Definition(format!("unknown route node {}", id)))
	}

	/// Returns the children of `node`, instantiating them on first use.
	///
	/// Only a successful load is cached; a failed loader is retried on the
	/// next descent.
	async fn child_ids(&self, id: NodeId, node: &RouteNode<C>) -> RouteResult<Arc<[NodeId]>> {
		let mut resolved = node.resolved_children.lock().await;
		if let Some(ids) = resolved.as_ref() {
			return Ok(Arc::clone(ids));
		}

		let definitions = match &node.children {
			Children::Routes(routes) => routes.clone(),
			Children::Lazy(loader) => {
				tracing::debug!(node = %id, path = %node.full_path(), "loading async route children");
				let routes = loader()
					.await
					.map_err(|err| RouteError::AsyncChildren(Arc::from(err)))?;
				routes.iter().try_for_each(RouteDefinition::validate)?;
				routes
			}
		};

		let ids = self.instantiate(definitions, &node.full_path());
		*resolved = Some(Arc::clone(&ids));
		Ok(ids)
	}

	fn instantiate(&self, definitions: Vec<RouteDefinition<C>>, base_path: &str) -> Arc<[NodeId]> {
		let mut nodes = self.nodes.write();
		definitions
			.into_iter()
			.map(|definition| {
				let id = NodeId(nodes.len());
				nodes.push(Arc::new(RouteNode::new(definition, base_path)));
				id
			})
			.collect()
	}
}

impl<C> fmt::Debug for RouteTree<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteTree")
			.field("roots", &self.roots)
			.field("nodes", &self.nodes.read().len())
			.field("settings", &self.settings)
			.finish()
	}
}
