//! Error types for router transitions.

use routex_routes::{RouteError, SharedError};
use thiserror::Error;

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Why a transition did not commit.
///
/// Cloneable so the same error can be handed to `change_fail` listeners, the
/// transition callback and the caller of [`Router::run`](crate::Router::run).
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RouterError {
	/// No top-level route matched the path.
	#[error("route not found: {path}")]
	RouteNotFound {
		/// The path that failed to resolve.
		path: String,
		/// The resolution failure.
		#[source]
		source: RouteError,
	},

	/// An `on_leave` handler of the outgoing route rejected.
	#[error("on_leave handlers rejected: {0}")]
	OnLeaveRejected(#[source] SharedError),

	/// An `on_enter` handler of the incoming route rejected.
	#[error("on_enter handlers rejected: {0}")]
	OnEnterRejected(#[source] SharedError),

	/// A lazy component loader failed.
	#[error("components cannot be resolved: {0}")]
	ComponentResolution(#[source] SharedError),
}

impl RouterError {
	/// Returns `true` if the path did not resolve to any route.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::RouteNotFound { .. })
	}
}
