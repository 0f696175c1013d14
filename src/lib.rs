//! # Routex
//!
//! Client-side route resolution and transitions for single-page applications.
//!
//! Routex matches a URL path against a declarative, nested route tree and
//! moves the application from one matched route to the next: it runs the
//! `on_leave` handlers of the outgoing route, the `on_enter` handlers of the
//! incoming one, loads lazy components, and keeps a history backend in sync.
//! Rendering is left to the application, which consumes the ordered component
//! list of the committed route.
//!
//! It is a unified interface over the following crates:
//!
//! - `routex-urls`: slash normalization, query strings and hrefs
//! - `routex-routes`: route definitions, the pattern compiler and the route tree
//! - `routex-router`: the transition orchestrator and history backends
//!
//! ## Feature Flags
//!
//! - `store` (default): reducer-style transition state driven by router events
//!
//! ## Quick Example
//!
//! ```
//! use routex::prelude::*;
//!
//! let router = Router::new(vec![
//!     RouteDefinition::new("/")
//!         .component("Layout")
//!         .children(vec![
//!             RouteDefinition::new("").component("Index"),
//!             RouteDefinition::new("users/:id{\\d+}").name("user").component("User"),
//!         ]),
//! ])
//! .unwrap();
//!
//! let route = futures::executor::block_on(router.navigate("/users/42?tab=posts")).unwrap();
//!
//! assert_eq!(route.component_values(), vec!["Layout", "User"]);
//! assert_eq!(route.vars["id"], "42");
//! assert_eq!(route.name.as_deref(), Some("user"));
//! assert_eq!(route.full_path, "/users/42?tab=posts");
//! ```

pub use routex_router as router;
pub use routex_routes as routes;
pub use routex_urls as urls;

pub use routex_router::{
	BoundHandler, History, HistoryEntry, MemoryHistory, PopEvent, Router, RouterBuilder,
	RouterError, RouterResult, Subscription,
};
#[cfg(target_arch = "wasm32")]
pub use routex_router::BrowserHistory;
pub use routex_routes::{
	HandlerContext, MatchSettings, PathMatcher, ResolvedRoute, RouteComponent, RouteDefinition,
	RouteError, RouteTree,
};
pub use routex_urls::{Query, QueryValue, create_href};

#[cfg(feature = "store")]
pub use routex_router::store::{RouterAction, RouterState, RouterStore, StoreHandle, TransitionStatus};

/// Commonly used types.
pub mod prelude {
	pub use crate::{
		BoundHandler, HandlerContext, History, HistoryEntry, MatchSettings, MemoryHistory, Query,
		QueryValue, ResolvedRoute, RouteDefinition, RouteError, Router, RouterError, Subscription,
		create_href,
	};

	#[cfg(feature = "store")]
	pub use crate::{RouterAction, RouterStore, TransitionStatus};
}
