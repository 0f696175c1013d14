//! Transition orchestration for routex.
//!
//! The [`Router`] resolves paths against a route tree, runs the lifecycle
//! handlers of the outgoing and incoming routes in order, loads lazy
//! components and commits the result to a [`History`] backend.
//!
//! ## Feature Flags
//!
//! - `store`: [`store::RouterStore`], reducer-style transition state driven by
//!   router events
//!
//! ## Example
//!
//! ```
//! use routex_router::{Router, history::MemoryHistory};
//! use routex_routes::RouteDefinition;
//! use routex_urls::Query;
//! use std::sync::Arc;
//!
//! let history = Arc::new(MemoryHistory::new("/"));
//! let router = Router::builder(vec![
//!     RouteDefinition::new("/").component("Home"),
//!     RouteDefinition::new("/about").component("About"),
//! ])
//! .history(Arc::clone(&history))
//! .build()
//! .unwrap();
//!
//! futures::executor::block_on(async {
//!     router.run("/", Query::new()).await.unwrap();
//!     router.run("/about", Query::new()).await.unwrap();
//! });
//!
//! assert_eq!(history.hrefs(), vec!["/", "/about"]);
//! ```

pub mod error;
pub mod handler;
pub mod history;
mod listeners;
pub mod router;
#[cfg(feature = "store")]
pub mod store;

pub use error::{RouterError, RouterResult};
pub use handler::{BoundHandler, HandlerWrapper, identity_wrapper, wrapper_fn};
#[cfg(target_arch = "wasm32")]
pub use history::BrowserHistory;
pub use history::{History, HistoryEntry, MemoryHistory, PopEvent, PopListener};
pub use listeners::Subscription;
pub use router::{Router, RouterBuilder, TransitionCallback};
