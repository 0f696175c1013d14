//! Handler wrapping.
//!
//! The router never calls a route's `on_enter` or `on_leave` handler
//! directly. It binds the handler to its [`HandlerContext`] and passes the
//! resulting [`BoundHandler`] to a [`HandlerWrapper`], which decides how to
//! invoke it. The default wrapper invokes it unchanged; an integration layer
//! installs its own wrapper to inject values through
//! [`BoundHandler::with`].

use futures::FutureExt;
use futures::future::BoxFuture;
use routex_routes::{Extensions, HandlerContext, HandlerResult, TransitionHandler};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A lifecycle handler with its arguments already applied.
pub struct BoundHandler<C> {
	handler: TransitionHandler<C>,
	context: HandlerContext<C>,
}

impl<C> BoundHandler<C> {
	pub(crate) fn new(handler: TransitionHandler<C>, context: HandlerContext<C>) -> Self {
		Self { handler, context }
	}

	/// The arguments the handler will receive.
	pub fn context(&self) -> &HandlerContext<C> {
		&self.context
	}

	/// Values the handler will receive alongside the transition.
	pub fn extensions_mut(&mut self) -> &mut Extensions {
		&mut self.context.extensions
	}

	/// Adds a value the handler can read from its context's extensions.
	pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
		self.context.extensions.insert(value);
		self
	}

	/// Calls the handler.
	pub fn invoke(self) -> BoxFuture<'static, HandlerResult> {
		(self.handler)(self.context)
	}
}

impl<C> fmt::Debug for BoundHandler<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BoundHandler")
			.field("context", &self.context)
			.finish_non_exhaustive()
	}
}

/// Decides how a bound handler is invoked.
pub type HandlerWrapper<C> =
	Arc<dyn Fn(BoundHandler<C>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// The default wrapper, which invokes the handler unchanged.
pub fn identity_wrapper<C: 'static>() -> HandlerWrapper<C> {
	Arc::new(BoundHandler::invoke)
}

/// Wraps a closure returning a future into a [`HandlerWrapper`].
pub fn wrapper_fn<C: 'static, F, Fut>(wrapper: F) -> HandlerWrapper<C>
where
	F: Fn(BoundHandler<C>) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = HandlerResult> + Send + 'static,
{
	Arc::new(move |bound| wrapper(bound).boxed())
}
