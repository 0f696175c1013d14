//! Reducer-style transition state.
//!
//! [`RouterStore`] listens to a [`Router`]'s events, turns each into a
//! [`RouterAction`] and folds it into a [`RouterState`] with
//! [`RouterState::reduce`]. Dispatching [`RouterAction::TransitionTo`]
//! starts a transition instead of changing the state directly.

use crate::error::{RouterError, RouterResult};
use crate::listeners::{Listeners, Subscription};
use crate::router::Router;
use parking_lot::RwLock;
use routex_routes::ResolvedRoute;
use routex_urls::Query;
use std::fmt;
use std::sync::Arc;

/// Where the router is in its transition lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransitionStatus {
	/// No route has been resolved yet.
	#[default]
	Initial,
	/// Handlers are running for a pending route.
	Transitioning,
	/// The last transition settled, successfully or not.
	Transitioned,
}

/// Something that happened to the router, or a request to it.
#[derive(Debug, Clone)]
pub enum RouterAction<C> {
	/// A transition started.
	ChangeStart {
		/// The committed route.
		route: Option<Arc<ResolvedRoute<C>>>,
		/// The route being transitioned to.
		next_route: Arc<ResolvedRoute<C>>,
	},
	/// A transition committed.
	ChangeSuccess {
		/// The committed route.
		route: Arc<ResolvedRoute<C>>,
	},
	/// A transition failed.
	ChangeFail {
		/// The route that stays committed.
		route: Option<Arc<ResolvedRoute<C>>>,
		/// Why the transition failed.
		error: RouterError,
	},
	/// A path matched no route.
	NotFound {
		/// The unmatched path.
		path: String,
		/// Its query.
		query: Query,
	},
	/// Request a transition.
	TransitionTo {
		/// Path to transition to.
		path: String,
		/// Query to transition with.
		query: Query,
	},
}

/// Transition state derived from router events.
#[derive(Debug, Clone)]
pub struct RouterState<C> {
	/// Lifecycle status.
	pub status: TransitionStatus,
	/// The committed route.
	pub route: Option<Arc<ResolvedRoute<C>>>,
	/// The route being transitioned to, while transitioning.
	pub next_route: Option<Arc<ResolvedRoute<C>>>,
	/// The failure of the last transition, if it failed.
	pub error: Option<RouterError>,
}

impl<C> Default for RouterState<C> {
	fn default() -> Self {
		Self {
			status: TransitionStatus::Initial,
			route: None,
			next_route: None,
			error: None,
		}
	}
}

impl<C> RouterState<C> {
	/// Returns the state after `action`.
	pub fn reduce(&self, action: &RouterAction<C>) -> Self {
		match action {
			RouterAction::ChangeStart { next_route, .. } => Self {
				status: TransitionStatus::Transitioning,
				route: self.route.clone(),
				next_route: Some(Arc::clone(next_route)),
				error: None,
			},
			RouterAction::ChangeSuccess { route } => Self {
				status: TransitionStatus::Transitioned,
				route: Some(Arc::clone(route)),
				next_route: None,
				error: None,
			},
			RouterAction::ChangeFail { route, error } => Self {
				status: TransitionStatus::Transitioned,
				route: route.clone(),
				next_route: None,
				error: Some(error.clone()),
			},
			RouterAction::NotFound { .. } | RouterAction::TransitionTo { .. } => Self {
				status: self.status,
				route: self.route.clone(),
				next_route: self.next_route.clone(),
				error: self.error.clone(),
			},
		}
	}
}

type StateListener<C> = dyn Fn(&RouterState<C>, &RouterAction<C>) + Send + Sync;

/// Reduces `action` into `state` and notifies `observers`.
///
/// The reduction happens under one write guard so concurrent events never
/// overwrite each other; observers run after the guard is released.
fn apply<C>(
	state: &RwLock<RouterState<C>>,
	observers: &Listeners<StateListener<C>>,
	action: &RouterAction<C>,
) where
	C: Clone + Send + Sync + 'static,
{
	let next = {
		let mut current = state.write();
		let next = current.reduce(action);
		*current = next.clone();
		next
	};
	for observer in observers.snapshot() {
		observer(&next, action);
	}
}

/// Read access to a store's state, handed to lifecycle handlers through
/// their context's extensions.
pub struct StoreHandle<C> {
	state: Arc<RwLock<RouterState<C>>>,
}

impl<C> StoreHandle<C> {
	/// The state at this moment.
	pub fn state(&self) -> RouterState<C> {
		let state = self.state.read();
		RouterState {
			status: state.status,
			route: state.route.clone(),
			next_route: state.next_route.clone(),
			error: state.error.clone(),
		}
	}
}

impl<C> Clone for StoreHandle<C> {
	fn clone(&self) -> Self {
		Self {
			state: Arc::clone(&self.state),
		}
	}
}

/// Transition state kept in sync with a router.
pub struct RouterStore<C> {
	router: Arc<Router<C>>,
	state: Arc<RwLock<RouterState<C>>>,
	observers: Arc<Listeners<StateListener<C>>>,
	subscriptions: Vec<Subscription>,
}

impl<C> RouterStore<C>
where
	C: Clone + Send + Sync + 'static,
{
	/// Starts following `router`'s events.
	///
	/// Both handler wrappers of the router are replaced so that every
	/// `on_enter` and `on_leave` handler finds a [`StoreHandle`] in its
	/// context's extensions.
	pub fn attach(router: Arc<Router<C>>) -> Self {
		let state = Arc::new(RwLock::new(RouterState::default()));
		let observers = Listeners::<StateListener<C>>::new();

		let on_event = {
			let state = Arc::clone(&state);
			let observers = Arc::clone(&observers);
			move |action: RouterAction<C>| apply(&state, &observers, &action)
		};
		let on_event = Arc::new(on_event);

		let subscriptions = vec![
			router.add_change_start_listener({
				let on_event = Arc::clone(&on_event);
				move |route, next_route| {
					on_event(RouterAction::ChangeStart {
						route: route.cloned(),
						next_route: Arc::clone(next_route),
					})
				}
			}),
			router.add_change_success_listener({
				let on_event = Arc::clone(&on_event);
				move |route| {
					on_event(RouterAction::ChangeSuccess {
						route: Arc::clone(route),
					})
				}
			}),
			router.add_change_fail_listener({
				let on_event = Arc::clone(&on_event);
				move |error, route| {
					on_event(RouterAction::ChangeFail {
						route: route.cloned(),
						error: error.clone(),
					})
				}
			}),
			router.add_not_found_listener({
				let on_event = Arc::clone(&on_event);
				move |path, query| {
					on_event(RouterAction::NotFound {
						path: path.to_string(),
						query: query.clone(),
					})
				}
			}),
		];

		let handle = StoreHandle {
			state: Arc::clone(&state),
		};
		let enter_handle = handle.clone();
		router.wrap_on_enter_handler(move |bound| bound.with(enter_handle.clone()).invoke());
		router.wrap_on_leave_handler(move |bound| bound.with(handle.clone()).invoke());

		Self {
			router,
			state,
			observers,
			subscriptions,
		}
	}

	/// The router this store follows.
	pub fn router(&self) -> &Arc<Router<C>> {
		&self.router
	}

	/// The state at this moment.
	pub fn state(&self) -> RouterState<C> {
		StoreHandle {
			state: Arc::clone(&self.state),
		}
		.state()
	}

	/// Registers a callback run after every state change.
	pub fn subscribe<F>(&self, observer: F) -> Subscription
	where
		F: Fn(&RouterState<C>, &RouterAction<C>) + Send + Sync + 'static,
	{
		self.observers.add(Arc::new(observer))
	}

	/// Runs the router's initial transition to the history's current
	/// location.
	///
	/// # Errors
	///
	/// Fails like [`Router::run`].
	pub async fn start(&self) -> RouterResult<()> {
		self.router.start().await.map(|_| ())
	}

	/// Applies an action.
	///
	/// [`RouterAction::TransitionTo`] runs a transition; the state then
	/// follows from the events it emits. Every other action is reduced
	/// directly.
	///
	/// # Errors
	///
	/// Fails like [`Router::run`] for [`RouterAction::TransitionTo`].
	pub async fn dispatch(&self, action: RouterAction<C>) -> RouterResult<()> {
		match action {
			RouterAction::TransitionTo { path, query } => {
				self.router.run(&path, query).await.map(|_| ())
			}
			action => {
				apply(&self.state, &self.observers, &action);
				Ok(())
			}
		}
	}

	/// Stops following the router's events.
	///
	/// The router keeps the handler wrappers installed by
	/// [`attach`](Self::attach).
	pub fn detach(self) -> Arc<Router<C>> {
		for subscription in &self.subscriptions {
			subscription.unsubscribe();
		}
		self.router
	}
}

impl<C: 'static> fmt::Debug for RouterStore<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterStore")
			.field("status", &self.state.read().status)
			.field("observers", &self.observers.len())
			.field("subscriptions", &self.subscriptions.len())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use routex_routes::RouteDefinition;
	use rstest::rstest;

	async fn resolved(path: &str) -> Arc<ResolvedRoute<&'static str>> {
		let router = Router::new(vec![RouteDefinition::new("/:page").component("page")]).unwrap();
		router.run(path, Query::new()).await.unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_reduce_lifecycle() {
		// Arrange
		let first = resolved("/one").await;
		let second = resolved("/two").await;
		let initial = RouterState::<&'static str>::default();

		// Act
		let started = initial.reduce(&RouterAction::ChangeStart {
			route: None,
			next_route: Arc::clone(&first),
		});
		let committed = started.reduce(&RouterAction::ChangeSuccess {
			route: Arc::clone(&first),
		});
		let restarted = committed.reduce(&RouterAction::ChangeStart {
			route: Some(Arc::clone(&first)),
			next_route: Arc::clone(&second),
		});
		let failed = restarted.reduce(&RouterAction::ChangeFail {
			route: Some(Arc::clone(&first)),
			error: RouterError::OnEnterRejected(Arc::new(std::io::Error::other("denied"))),
		});

		// Assert
		assert_eq!(initial.status, TransitionStatus::Initial);
		assert_eq!(started.status, TransitionStatus::Transitioning);
		assert!(started.route.is_none());
		assert_eq!(started.next_route.as_ref().map(|r| r.pathname.as_str()), Some("/one"));
		assert_eq!(committed.status, TransitionStatus::Transitioned);
		assert!(committed.next_route.is_none());
		assert_eq!(restarted.route.as_ref().map(|r| r.pathname.as_str()), Some("/one"));
		assert_eq!(failed.status, TransitionStatus::Transitioned);
		assert_eq!(failed.route.as_ref().map(|r| r.pathname.as_str()), Some("/one"));
		assert!(failed.error.is_some());
	}

	#[rstest]
	#[tokio::test]
	async fn test_concurrent_events_are_not_lost() {
		let committed = resolved("/one").await;
		let pending = resolved("/two").await;

		for _ in 0..100 {
			let state = RwLock::new(RouterState::<&'static str>::default());
			let observers = Listeners::<StateListener<&'static str>>::new();
			let success = RouterAction::ChangeSuccess {
				route: Arc::clone(&committed),
			};
			let start = RouterAction::ChangeStart {
				route: None,
				next_route: Arc::clone(&pending),
			};

			std::thread::scope(|scope| {
				scope.spawn(|| apply(&state, &*observers, &success));
				scope.spawn(|| apply(&state, &*observers, &start));
			});

			// ChangeStart keeps the committed route, so it survives either order
			let route = state.read().route.clone();
			assert_eq!(route.map(|r| r.pathname.clone()), Some("/one".to_string()));
		}
	}

	#[rstest]
	fn test_not_found_keeps_state() {
		let state = RouterState::<&'static str>::default();

		let next = state.reduce(&RouterAction::NotFound {
			path: "/missing".to_string(),
			query: Query::new(),
		});

		assert_eq!(next.status, TransitionStatus::Initial);
		assert!(next.route.is_none());
	}
}
