//! Error types for route definition and resolution.

use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by user-supplied handlers and loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reference-counted error, used where a cause must be shared between
/// several observers.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type for route operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors raised while building or resolving a route tree.
///
/// [`RouteError::NoRoutesToResolve`] and [`RouteError::NotMatched`] are the
/// two benign outcomes of a failed match. A node whose children fail with one
/// of them falls back to matching itself; any other variant propagates.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RouteError {
	/// Malformed route definition.
	#[error("invalid route definition: {0}")]
	Definition(String),

	/// The same variable name appears twice in one composed pattern.
	#[error("route parameter `{name}` is already defined in pattern `{pattern}`")]
	DuplicateParameter {
		/// Name of the repeated variable.
		name: String,
		/// Composed pattern (ancestors included) being compiled.
		pattern: String,
	},

	/// The pattern could not be compiled into a matcher.
	#[error("invalid route pattern `{pattern}`: {reason}")]
	InvalidPattern {
		/// Composed pattern being compiled.
		pattern: String,
		/// Why compilation failed.
		reason: String,
	},

	/// An async children loader failed.
	#[error("async route children could not be resolved: {0}")]
	AsyncChildren(#[source] SharedError),

	/// The candidate list was empty.
	#[error("no routes to resolve")]
	NoRoutesToResolve,

	/// No candidate pattern matched the path.
	#[error("route did not match")]
	NotMatched,
}

impl RouteError {
	/// Returns `true` for the outcomes after which a parent route may fall
	/// back to matching itself.
	pub fn is_benign(&self) -> bool {
		matches!(self, Self::NoRoutesToResolve | Self::NotMatched)
	}
}
