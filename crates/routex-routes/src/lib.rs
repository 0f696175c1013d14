//! Route definitions and hierarchical route resolution for routex.
//!
//! Routes are declared as a tree of [`RouteDefinition`]s. A [`RouteTree`]
//! compiles each route's pattern on first use and resolves a path to a
//! [`ResolvedRoute`]: the chain of matched levels with their components,
//! lifecycle handlers, merged attributes and extracted variables.
//!
//! ## Patterns
//!
//! A pattern is literal text with variables of the form `:name` or
//! `:name{regex}`. Patterns nest: a child's pattern is appended to the
//! accumulated pattern of its ancestors, and a variable name may only appear
//! once along that chain.
//!
//! ```
//! use routex_routes::{MatchSettings, PathMatcher};
//!
//! let matcher = PathMatcher::compile("", "/:a-:b", &MatchSettings::default()).unwrap();
//! let vars = matcher.match_exact("/10-11").unwrap();
//! assert_eq!(vars["a"], "10");
//! assert_eq!(vars["b"], "11");
//! ```
//!
//! ## Resolution
//!
//! Siblings are tried in declaration order and the first match wins. A route
//! whose prefix matches is descended into; if none of its children match, the
//! route is matched on its own. See [`RouteTree::match_node`] for the exact
//! fallback rules.

pub mod definition;
pub mod error;
pub mod handler;
pub mod node;
pub mod pattern;
pub mod resolved;
pub mod settings;
pub mod tree;

pub use definition::{Attrs, Children, ChildrenLoader, ComponentLoader, RouteComponent, RouteDefinition};
pub use error::{BoxError, RouteError, RouteResult, SharedError};
pub use handler::{
	Extensions, HandlerContext, HandlerResult, TransitionHandler, handler_fn, noop_handler,
};
pub use node::NodeId;
pub use pattern::PathMatcher;
pub use resolved::ResolvedRoute;
pub use settings::MatchSettings;
pub use tree::RouteTree;
