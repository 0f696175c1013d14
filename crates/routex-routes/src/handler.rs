//! Route lifecycle handlers.
//!
//! Every route carries an `on_enter` and an `on_leave` handler. Both receive a
//! [`HandlerContext`] describing the transition and return a future; a
//! rejected future cancels the transition.

use super::error::BoxError;
use super::resolved::ResolvedRoute;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a lifecycle handler.
pub type HandlerResult = Result<(), BoxError>;

/// A type-erased lifecycle handler.
pub type TransitionHandler<C> =
	Arc<dyn Fn(HandlerContext<C>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wraps a closure returning a future into a [`TransitionHandler`].
pub fn handler_fn<C: 'static, F, Fut>(handler: F) -> TransitionHandler<C>
where
	F: Fn(HandlerContext<C>) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = HandlerResult> + Send + 'static,
{
	Arc::new(move |ctx| handler(ctx).boxed())
}

/// The default handler, which resolves immediately.
pub fn noop_handler<C: 'static>() -> TransitionHandler<C> {
	Arc::new(|_ctx| futures::future::ready(Ok(())).boxed())
}

/// Values injected into a handler invocation by an integration layer.
///
/// Keyed by type; inserting a second value of the same type replaces the
/// first.
#[derive(Default, Clone)]
pub struct Extensions {
	map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
	/// Creates an empty set of extensions.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a value, replacing any previous value of the same type.
	pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
		self.map.insert(TypeId::of::<T>(), Arc::new(value));
	}

	/// Returns the value of type `T`, if present.
	pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
		self.map
			.get(&TypeId::of::<T>())
			.and_then(|value| value.downcast_ref::<T>())
	}

	/// Returns `true` if no values are present.
	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}
}

impl fmt::Debug for Extensions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Extensions")
			.field("len", &self.map.len())
			.finish()
	}
}

/// Arguments passed to a lifecycle handler.
///
/// For `on_leave`, `previous` is the route being left; for `on_enter` it is
/// the route committed before this transition (`None` on the first run).
pub struct HandlerContext<C> {
	/// The committed route at the time the transition started.
	pub previous: Option<Arc<ResolvedRoute<C>>>,
	/// The route being transitioned to.
	pub next: Arc<ResolvedRoute<C>>,
	/// Values injected by a handler wrapper.
	pub extensions: Extensions,
}

impl<C> HandlerContext<C> {
	/// Creates a context without extensions.
	pub fn new(previous: Option<Arc<ResolvedRoute<C>>>, next: Arc<ResolvedRoute<C>>) -> Self {
		Self {
			previous,
			next,
			extensions: Extensions::new(),
		}
	}
}

impl<C> Clone for HandlerContext<C> {
	fn clone(&self) -> Self {
		Self {
			previous: self.previous.clone(),
			next: Arc::clone(&self.next),
			extensions: self.extensions.clone(),
		}
	}
}

impl<C> fmt::Debug for HandlerContext<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HandlerContext")
			.field("previous", &self.previous.as_ref().map(|r| r.pathname.as_str()))
			.field("next", &self.next.pathname)
			.field("extensions", &self.extensions)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[derive(Debug, PartialEq)]
	struct Dispatch(&'static str);

	#[rstest]
	fn test_extensions_insert_and_get() {
		let mut extensions = Extensions::new();
		assert!(extensions.is_empty());

		extensions.insert(Dispatch("store"));
		extensions.insert(7_u32);

		assert_eq!(extensions.get::<Dispatch>(), Some(&Dispatch("store")));
		assert_eq!(extensions.get::<u32>(), Some(&7));
		assert_eq!(extensions.get::<String>(), None);
	}

	#[rstest]
	fn test_extensions_replace_same_type() {
		let mut extensions = Extensions::new();
		extensions.insert(1_u8);
		extensions.insert(2_u8);

		assert_eq!(extensions.get::<u8>(), Some(&2));
	}

	#[rstest]
	#[tokio::test]
	async fn test_noop_handler_resolves() {
		let handler = noop_handler::<&'static str>();
		let next = Arc::new(ResolvedRoute::<&'static str>::empty("/"));

		let result = handler(HandlerContext::new(None, next)).await;

		assert!(result.is_ok());
	}
}
