//! Declarative route definitions.
//!
//! A [`RouteDefinition`] is the immutable input describing one routable path
//! segment: its pattern, optional component, lifecycle handlers, attributes
//! and children. Children are either declared eagerly or produced by an async
//! loader the first time the route's prefix matches.

use super::error::{BoxError, RouteError, RouteResult};
use super::handler::{HandlerContext, HandlerResult, TransitionHandler, handler_fn, noop_handler};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Route attributes, shallow-merged from root to leaf.
pub type Attrs = serde_json::Map<String, serde_json::Value>;

/// Loader producing a component asynchronously.
pub type ComponentLoader<C> = Arc<dyn Fn() -> BoxFuture<'static, Result<C, BoxError>> + Send + Sync>;

/// Loader producing child route definitions asynchronously.
pub type ChildrenLoader<C> =
	Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<RouteDefinition<C>>, BoxError>> + Send + Sync>;

/// The component attached to a route level.
pub enum RouteComponent<C> {
	/// No component at this level.
	Empty,
	/// A component available immediately.
	Ready(C),
	/// A component loaded on demand during a transition.
	Lazy(ComponentLoader<C>),
}

impl<C: Clone> RouteComponent<C> {
	/// Returns the component if it is already available.
	pub fn value(&self) -> Option<&C> {
		match self {
			Self::Ready(component) => Some(component),
			Self::Empty | Self::Lazy(_) => None,
		}
	}

	/// Returns `true` if the component still has to be loaded.
	pub fn is_lazy(&self) -> bool {
		matches!(self, Self::Lazy(_))
	}

	/// Loads a lazy component; other variants are returned as they are.
	pub async fn resolve(&self) -> Result<Self, BoxError> {
		match self {
			Self::Lazy(loader) => Ok(Self::Ready(loader().await?)),
			other => Ok(other.clone()),
		}
	}
}

impl<C: Clone> Clone for RouteComponent<C> {
	fn clone(&self) -> Self {
		match self {
			Self::Empty => Self::Empty,
			Self::Ready(component) => Self::Ready(component.clone()),
			Self::Lazy(loader) => Self::Lazy(Arc::clone(loader)),
		}
	}
}

impl<C: fmt::Debug> fmt::Debug for RouteComponent<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => f.write_str("Empty"),
			Self::Ready(component) => f.debug_tuple("Ready").field(component).finish(),
			Self::Lazy(_) => f.write_str("Lazy(..)"),
		}
	}
}

impl<C: PartialEq> PartialEq for RouteComponent<C> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Empty, Self::Empty) => true,
			(Self::Ready(a), Self::Ready(b)) => a == b,
			(Self::Lazy(a), Self::Lazy(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

/// Where a route's children come from.
pub enum Children<C> {
	/// Children declared up front.
	Routes(Vec<RouteDefinition<C>>),
	/// Children produced by an async loader, invoked at most once per node.
	Lazy(ChildrenLoader<C>),
}

impl<C: Clone> Clone for Children<C> {
	fn clone(&self) -> Self {
		match self {
			Self::Routes(routes) => Self::Routes(routes.clone()),
			Self::Lazy(loader) => Self::Lazy(Arc::clone(loader)),
		}
	}
}

impl<C> Default for Children<C> {
	fn default() -> Self {
		Self::Routes(Vec::new())
	}
}

/// A single route definition.
///
/// # Example
///
/// ```
/// use routex_routes::RouteDefinition;
///
/// let routes = vec![
///     RouteDefinition::new("/")
///         .component("Layout")
///         .children(vec![
///             RouteDefinition::new("").component("Index"),
///             RouteDefinition::new("users/:id{\\d+}").name("user").component("User"),
///         ]),
/// ];
/// # let _ = routes;
/// ```
pub struct RouteDefinition<C> {
	pub(crate) path: String,
	pub(crate) name: Option<String>,
	pub(crate) component: RouteComponent<C>,
	pub(crate) on_enter: TransitionHandler<C>,
	pub(crate) on_leave: TransitionHandler<C>,
	pub(crate) attrs: Attrs,
	pub(crate) children: Children<C>,
}

impl<C: 'static> RouteDefinition<C> {
	/// Creates a definition for `path` with no component, no children and
	/// no-op handlers.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			name: None,
			component: RouteComponent::Empty,
			on_enter: noop_handler(),
			on_leave: noop_handler(),
			attrs: Attrs::new(),
			children: Children::default(),
		}
	}

	/// Sets the route name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets a component available immediately.
	pub fn component(mut self, component: C) -> Self {
		self.component = RouteComponent::Ready(component);
		self
	}

	/// Sets a component loaded during the transition.
	pub fn lazy_component<F, Fut>(mut self, loader: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<C, BoxError>> + Send + 'static,
	{
		self.component = RouteComponent::Lazy(Arc::new(move || loader().boxed()));
		self
	}

	/// Declares child routes up front.
	pub fn children(mut self, children: Vec<RouteDefinition<C>>) -> Self {
		self.children = Children::Routes(children);
		self
	}

	/// Declares child routes produced by an async loader.
	pub fn lazy_children<F, Fut>(mut self, loader: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Vec<RouteDefinition<C>>, BoxError>> + Send + 'static,
	{
		self.children = Children::Lazy(Arc::new(move || loader().boxed()));
		self
	}

	/// Sets the handler run when the route is entered.
	pub fn on_enter<F, Fut>(mut self, handler: F) -> Self
	where
		F: Fn(HandlerContext<C>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = HandlerResult> + Send + 'static,
	{
		self.on_enter = handler_fn(handler);
		self
	}

	/// Sets the handler run when the route is left.
	pub fn on_leave<F, Fut>(mut self, handler: F) -> Self
	where
		F: Fn(HandlerContext<C>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = HandlerResult> + Send + 'static,
	{
		self.on_leave = handler_fn(handler);
		self
	}

	/// Adds a single attribute.
	pub fn attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.attrs.insert(key.into(), value.into());
		self
	}

	/// Replaces all attributes.
	pub fn attrs(mut self, attrs: Attrs) -> Self {
		self.attrs = attrs;
		self
	}

	/// Returns the path pattern.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Returns the route name.
	pub fn route_name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Validates this definition and its eagerly declared descendants.
	///
	/// # Errors
	///
	/// Returns [`RouteError::Definition`] if a path carries a query string or
	/// a fragment.
	pub fn validate(&self) -> RouteResult<()> {
		if let Some(c) = self.path.chars().find(|c| matches!(c, '?' | '#')) {
			return Err(RouteError::Definition(format!(
				"route path `{}` should not contain `{}`",
				self.path, c
			)));
		}

		if let Children::Routes(children) = &self.children {
			children.iter().try_for_each(RouteDefinition::validate)?;
		}

		Ok(())
	}
}

impl<C: Clone> Clone for RouteDefinition<C> {
	fn clone(&self) -> Self {
		Self {
			path: self.path.clone(),
			name: self.name.clone(),
			component: self.component.clone(),
			on_enter: Arc::clone(&self.on_enter),
			on_leave: Arc::clone(&self.on_leave),
			attrs: self.attrs.clone(),
			children: self.children.clone(),
		}
	}
}

impl<C: fmt::Debug> fmt::Debug for RouteDefinition<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let children = match &self.children {
			Children::Routes(routes) => format!("{} routes", routes.len()),
			Children::Lazy(_) => "lazy".to_string(),
		};

		f.debug_struct("RouteDefinition")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("component", &self.component)
			.field("attrs", &self.attrs)
			.field("children", &children)
			.finish()
	}
}
