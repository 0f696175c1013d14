//! The transition orchestrator.
//!
//! A [`Router`] owns the route tree, the committed route and the history
//! backend. [`Router::run`] moves from the committed route to the route
//! matching a path:
//!
//! 1. resolve the path (`not_found` listeners fire if nothing matches)
//! 2. notify `change_start` listeners
//! 3. run the outgoing route's `on_leave` handlers, leaf to root
//! 4. run the incoming route's `on_enter` handlers, root to leaf
//! 5. load lazy components
//! 6. commit, notify `change_success` listeners and write history
//!
//! A failure at steps 3 to 5 notifies `change_fail` listeners and leaves the
//! committed route untouched. Handlers run one at a time; a handler never
//! starts before the previous one has settled.
//!
//! Runs are not serialized. Two overlapping calls to [`Router::run`] proceed
//! independently and commit in whichever order they finish, so callers that
//! need ordering should wait for one navigation before starting the next.

use crate::error::{RouterError, RouterResult};
use crate::handler::{BoundHandler, HandlerWrapper, identity_wrapper, wrapper_fn};
use crate::history::{History, HistoryEntry, MemoryHistory, PopEvent};
use crate::listeners::{Listeners, Subscription};
use futures::channel::mpsc;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use routex_routes::{
	HandlerContext, HandlerResult, MatchSettings, ResolvedRoute, RouteDefinition, RouteResult,
	RouteTree,
};
use routex_urls::{Query, create_href, split_href};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Called once per transition with its outcome.
pub type TransitionCallback<C> =
	Arc<dyn Fn(Result<&Arc<ResolvedRoute<C>>, &RouterError>) + Send + Sync>;

type ChangeStartListener<C> =
	dyn Fn(Option<&Arc<ResolvedRoute<C>>>, &Arc<ResolvedRoute<C>>) + Send + Sync;
type ChangeSuccessListener<C> = dyn Fn(&Arc<ResolvedRoute<C>>) + Send + Sync;
type ChangeFailListener<C> = dyn Fn(&RouterError, Option<&Arc<ResolvedRoute<C>>>) + Send + Sync;
type NotFoundListener = dyn Fn(&str, &Query) + Send + Sync;

/// How a committed transition is written to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryWrite {
	/// Requested by the application: replace an entry without state, push
	/// otherwise.
	Navigate,
	/// Requested by a pop event: the browser already moved, so only fill in
	/// state the entry is missing.
	Pop { has_state: bool },
}

/// Unregisters a pop listener when the `listen` future is dropped.
struct PopListenerGuard(Subscription);

impl Drop for PopListenerGuard {
	fn drop(&mut self) {
		self.0.unsubscribe();
	}
}

/// Client-side router.
///
/// # Example
///
/// ```
/// use routex_router::Router;
/// use routex_routes::RouteDefinition;
/// use routex_urls::Query;
///
/// let router = Router::new(vec![
///     RouteDefinition::new("/").component("Layout").lazy_children(|| async {
///         Ok(vec![RouteDefinition::new("test").component("Test")])
///     }),
/// ])
/// .unwrap();
///
/// let route = futures::executor::block_on(router.run("/test", Query::new())).unwrap();
/// assert_eq!(route.component_values(), vec!["Layout", "Test"]);
/// assert_eq!(router.current_route().unwrap().pathname, "/test");
/// ```
pub struct Router<C> {
	tree: RouteTree<C>,
	history: Arc<dyn History>,
	current: RwLock<Option<Arc<ResolvedRoute<C>>>>,
	on_transition: Option<TransitionCallback<C>>,
	enter_wrapper: RwLock<HandlerWrapper<C>>,
	leave_wrapper: RwLock<HandlerWrapper<C>>,
	change_start: Arc<Listeners<ChangeStartListener<C>>>,
	change_success: Arc<Listeners<ChangeSuccessListener<C>>>,
	change_fail: Arc<Listeners<ChangeFailListener<C>>>,
	not_found: Arc<Listeners<NotFoundListener>>,
	pop_listener: Mutex<Option<Subscription>>,
}

impl<C> Router<C>
where
	C: Clone + Send + Sync + 'static,
{
	/// Creates a router over an in-memory history starting at `/`.
	///
	/// # Errors
	///
	/// Returns [`RouteError::Definition`](routex_routes::RouteError::Definition)
	/// if a route definition is malformed.
	pub fn new(routes: Vec<RouteDefinition<C>>) -> RouteResult<Self> {
		Self::builder(routes).build()
	}

	/// Starts configuring a router.
	pub fn builder(routes: Vec<RouteDefinition<C>>) -> RouterBuilder<C> {
		RouterBuilder::new(routes)
	}

	/// The last committed route; `None` before the first successful run.
	pub fn current_route(&self) -> Option<Arc<ResolvedRoute<C>>> {
		self.current.read().clone()
	}

	/// The route tree.
	pub fn tree(&self) -> &RouteTree<C> {
		&self.tree
	}

	/// The history backend.
	pub fn history(&self) -> &dyn History {
		self.history.as_ref()
	}

	/// Builds an href for `path`, merging any query string already on it
	/// with `query`.
	pub fn create_href(&self, path: &str, query: &Query) -> String {
		create_href(path, query)
	}

	/// Transitions to the route matching `path`.
	///
	/// On success the committed route is returned with its lazy components
	/// loaded, and history is updated: the current entry is replaced if it has
	/// no state (such as on the first run), otherwise a new entry is pushed.
	///
	/// # Errors
	///
	/// - [`RouterError::RouteNotFound`] if no route matches
	/// - [`RouterError::OnLeaveRejected`] or [`RouterError::OnEnterRejected`]
	///   if a lifecycle handler rejects
	/// - [`RouterError::ComponentResolution`] if a lazy component fails to load
	pub async fn run(&self, path: &str, query: Query) -> RouterResult<Arc<ResolvedRoute<C>>> {
		self.transition(path, query, HistoryWrite::Navigate).await
	}

	/// Transitions to an href, splitting off its query string.
	///
	/// # Errors
	///
	/// Fails like [`run`](Self::run).
	pub async fn navigate(&self, href: &str) -> RouterResult<Arc<ResolvedRoute<C>>> {
		let (path, query) = split_href(href);
		self.run(path, query).await
	}

	/// Transitions to the location the history backend currently points at.
	///
	/// # Errors
	///
	/// Fails like [`run`](Self::run).
	pub async fn start(&self) -> RouterResult<Arc<ResolvedRoute<C>>> {
		let path = self.history.pathname();
		let query = self.history.query();
		self.run(&path, query).await
	}

	/// Follows pop events from the history backend.
	///
	/// The pop listener is registered when this method is called. A router
	/// has at most one: calling `listen` again unregisters the previous
	/// listener, and the future returned by the earlier call completes.
	///
	/// The returned future processes events one at a time, running a
	/// transition for each. It completes once the router is dropped.
	/// Dropping the future unregisters its listener.
	pub fn listen(self: &Arc<Self>) -> BoxFuture<'static, ()> {
		let (tx, mut rx) = mpsc::unbounded::<PopEvent>();
		let subscription = self
			.history
			.add_pop_state_listener(Arc::new(move |event: &PopEvent| {
				// The receiver is gone once the listen future is dropped
				let _ = tx.unbounded_send(event.clone());
			}));
		let replaced = self.pop_listener.lock().replace(subscription.clone());
		if let Some(previous) = replaced {
			previous.unsubscribe();
		}
		let guard = PopListenerGuard(subscription);
		let router = Arc::downgrade(self);

		async move {
			let _guard = guard;
			while let Some(event) = rx.next().await {
				let Some(router) = router.upgrade() else {
					break;
				};
				let write = HistoryWrite::Pop {
					has_state: event.state.is_some(),
				};

				if let Err(e) = router.transition(&event.pathname, event.query, write).await {
					tracing::debug!(path = %event.pathname, error = %e, "pop transition failed");
				}
			}
		}
		.boxed()
	}

	/// Replaces the wrapper `on_enter` handlers are invoked through.
	pub fn wrap_on_enter_handler<F, Fut>(&self, wrapper: F)
	where
		F: Fn(BoundHandler<C>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = HandlerResult> + Send + 'static,
	{
		*self.enter_wrapper.write() = wrapper_fn(wrapper);
	}

	/// Replaces the wrapper `on_leave` handlers are invoked through.
	pub fn wrap_on_leave_handler<F, Fut>(&self, wrapper: F)
	where
		F: Fn(BoundHandler<C>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = HandlerResult> + Send + 'static,
	{
		*self.leave_wrapper.write() = wrapper_fn(wrapper);
	}

	/// Called with the committed route and the resolved next route when a
	/// transition starts.
	pub fn add_change_start_listener<F>(&self, listener: F) -> Subscription
	where
		F: Fn(Option<&Arc<ResolvedRoute<C>>>, &Arc<ResolvedRoute<C>>) + Send + Sync + 'static,
	{
		self.change_start.add(Arc::new(listener))
	}

	/// Called with the newly committed route.
	pub fn add_change_success_listener<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&Arc<ResolvedRoute<C>>) + Send + Sync + 'static,
	{
		self.change_success.add(Arc::new(listener))
	}

	/// Called with the failure and the route that stays committed.
	pub fn add_change_fail_listener<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&RouterError, Option<&Arc<ResolvedRoute<C>>>) + Send + Sync + 'static,
	{
		self.change_fail.add(Arc::new(listener))
	}

	/// Called with the path and query that matched no route.
	pub fn add_not_found_listener<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&str, &Query) + Send + Sync + 'static,
	{
		self.not_found.add(Arc::new(listener))
	}

	async fn transition(
		&self,
		path: &str,
		query: Query,
		write: HistoryWrite,
	) -> RouterResult<Arc<ResolvedRoute<C>>> {
		let next = match self.tree.resolve(path, &query).await {
			Ok(route) => Arc::new(route),
			Err(source) => {
				tracing::warn!(path = %path, reason = %source, "route not found");
				for listener in self.not_found.snapshot() {
					listener(path, &query);
				}
				let err = RouterError::RouteNotFound {
					path: path.to_string(),
					source,
				};
				self.finish(Err(&err));
				return Err(err);
			}
		};

		let previous = self.current_route();
		for listener in self.change_start.snapshot() {
			listener(previous.as_ref(), &next);
		}

		match self.run_stages(previous.clone(), next).await {
			Ok(route) => {
				self.commit(&route, write);
				Ok(route)
			}
			Err(err) => {
				tracing::warn!(path = %path, error = %err, "transition rejected");
				for listener in self.change_fail.snapshot() {
					listener(&err, previous.as_ref());
				}
				self.finish(Err(&err));
				Err(err)
			}
		}
	}

	async fn run_stages(
		&self,
		previous: Option<Arc<ResolvedRoute<C>>>,
		next: Arc<ResolvedRoute<C>>,
	) -> RouterResult<Arc<ResolvedRoute<C>>> {
		if let Some(outgoing) = &previous {
			let wrapper = self.leave_wrapper.read().clone();
			tracing::debug!(
				path = %outgoing.pathname,
				handlers = outgoing.on_leave.len(),
				"running on_leave handlers"
			);
			for handler in outgoing.on_leave.iter().rev() {
				let context = HandlerContext::new(previous.clone(), Arc::clone(&next));
				wrapper(BoundHandler::new(Arc::clone(handler), context))
					.await
					.map_err(|e| RouterError::OnLeaveRejected(Arc::from(e)))?;
			}
		}

		let wrapper = self.enter_wrapper.read().clone();
		tracing::debug!(
			path = %next.pathname,
			handlers = next.on_enter.len(),
			"running on_enter handlers"
		);
		for handler in &next.on_enter {
			let context = HandlerContext::new(previous.clone(), Arc::clone(&next));
			wrapper(BoundHandler::new(Arc::clone(handler), context))
				.await
				.map_err(|e| RouterError::OnEnterRejected(Arc::from(e)))?;
		}

		tracing::debug!(path = %next.pathname, "resolving components");
		let mut components = Vec::with_capacity(next.depth());
		for component in &next.components {
			let loaded = component
				.resolve()
				.await
				.map_err(|e| RouterError::ComponentResolution(Arc::from(e)))?;
			components.push(loaded);
		}

		Ok(Arc::new(ResolvedRoute::clone(&next).with_components(components)))
	}

	fn commit(&self, route: &Arc<ResolvedRoute<C>>, write: HistoryWrite) {
		*self.current.write() = Some(Arc::clone(route));
		tracing::info!(path = %route.pathname, name = ?route.name, "route committed");

		for listener in self.change_success.snapshot() {
			listener(route);
		}

		let entry = HistoryEntry::from_route(route);
		match write {
			HistoryWrite::Navigate if self.history.state().is_some() => {
				tracing::debug!(href = %route.full_path, "pushing history entry");
				self.history.push_state(&entry, &route.full_path);
			}
			HistoryWrite::Navigate | HistoryWrite::Pop { has_state: false } => {
				tracing::debug!(href = %route.full_path, "replacing history entry");
				self.history.replace_state(&entry, &route.full_path);
			}
			HistoryWrite::Pop { has_state: true } => {
				tracing::debug!(href = %route.full_path, "history already at popped entry");
			}
		}

		self.finish(Ok(route));
	}

	fn finish(&self, outcome: Result<&Arc<ResolvedRoute<C>>, &RouterError>) {
		if let Some(callback) = &self.on_transition {
			callback(outcome);
		}
	}
}

impl<C> Drop for Router<C> {
	fn drop(&mut self) {
		if let Some(subscription) = self.pop_listener.get_mut().take() {
			subscription.unsubscribe();
		}
	}
}

impl<C: 'static> fmt::Debug for Router<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("tree", &self.tree)
			.field(
				"current",
				&self.current.read().as_ref().map(|route| route.full_path.clone()),
			)
			.field("change_start_listeners", &self.change_start.len())
			.field("change_success_listeners", &self.change_success.len())
			.field("change_fail_listeners", &self.change_fail.len())
			.field("not_found_listeners", &self.not_found.len())
			.field("listening", &self.pop_listener.lock().is_some())
			.finish_non_exhaustive()
	}
}

/// Builder for [`Router`].
pub struct RouterBuilder<C> {
	routes: Vec<RouteDefinition<C>>,
	history: Option<Arc<dyn History>>,
	on_transition: Option<TransitionCallback<C>>,
	enter_wrapper: Option<HandlerWrapper<C>>,
	leave_wrapper: Option<HandlerWrapper<C>>,
	settings: MatchSettings,
}

impl<C> RouterBuilder<C>
where
	C: Clone + Send + Sync + 'static,
{
	/// Starts a builder for `routes`.
	pub fn new(routes: Vec<RouteDefinition<C>>) -> Self {
		Self {
			routes,
			history: None,
			on_transition: None,
			enter_wrapper: None,
			leave_wrapper: None,
			settings: MatchSettings::default(),
		}
	}

	/// Sets the history backend. Defaults to a [`MemoryHistory`] at `/`.
	///
	/// Pass an `Arc` to keep a handle to the backend.
	pub fn history<H: History + 'static>(mut self, history: H) -> Self {
		self.history = Some(Arc::new(history));
		self
	}

	/// Sets the callback invoked once per transition with its outcome.
	pub fn on_transition<F>(mut self, callback: F) -> Self
	where
		F: Fn(Result<&Arc<ResolvedRoute<C>>, &RouterError>) + Send + Sync + 'static,
	{
		self.on_transition = Some(Arc::new(callback));
		self
	}

	/// Sets the initial `on_enter` wrapper.
	pub fn on_enter_wrapper<F, Fut>(mut self, wrapper: F) -> Self
	where
		F: Fn(BoundHandler<C>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = HandlerResult> + Send + 'static,
	{
		self.enter_wrapper = Some(wrapper_fn(wrapper));
		self
	}

	/// Sets the initial `on_leave` wrapper.
	pub fn on_leave_wrapper<F, Fut>(mut self, wrapper: F) -> Self
	where
		F: Fn(BoundHandler<C>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = HandlerResult> + Send + 'static,
	{
		self.leave_wrapper = Some(wrapper_fn(wrapper));
		self
	}

	/// Sets the pattern compilation settings.
	pub fn settings(mut self, settings: MatchSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Builds the router.
	///
	/// # Errors
	///
	/// Returns [`RouteError::Definition`](routex_routes::RouteError::Definition)
	/// if a route definition is malformed.
	pub fn build(self) -> RouteResult<Router<C>> {
		let tree = RouteTree::with_settings(self.routes, self.settings)?;

		Ok(Router {
			tree,
			history: self
				.history
				.unwrap_or_else(|| Arc::new(MemoryHistory::default())),
			current: RwLock::new(None),
			on_transition: self.on_transition,
			enter_wrapper: RwLock::new(self.enter_wrapper.unwrap_or_else(identity_wrapper)),
			leave_wrapper: RwLock::new(self.leave_wrapper.unwrap_or_else(identity_wrapper)),
			change_start: Listeners::new(),
			change_success: Listeners::new(),
			change_fail: Listeners::new(),
			not_found: Listeners::new(),
			pop_listener: Mutex::new(None),
		})
	}
}

impl<C> fmt::Debug for RouterBuilder<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterBuilder")
			.field("routes", &self.routes.len())
			.field("has_history", &self.history.is_some())
			.field("settings", &self.settings)
			.finish_non_exhaustive()
	}
}
