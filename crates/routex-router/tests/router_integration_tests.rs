//! Integration tests for the router
//!
//! These tests verify the transition lifecycle:
//! 1. Resolution, not-found handling and history writes
//! 2. Handler ordering and rejection
//! 3. Lazy components
//! 4. Listener registration and handler wrapping
//! 5. Pop event synchronization

use futures::FutureExt;
use futures::StreamExt;
use futures::channel::mpsc;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use routex_router::{
	History, HistoryEntry, MemoryHistory, PopListener, Router, RouterError, Subscription,
};
use routex_routes::{BoxError, HandlerContext, HandlerResult, RouteDefinition};
use routex_urls::{Query, QueryValue};
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type Component = &'static str;
type Definition = RouteDefinition<Component>;
type Log = Arc<Mutex<Vec<String>>>;

/// A history that records every write before delegating to memory.
#[derive(Default)]
struct RecordingHistory {
	inner: MemoryHistory,
	writes: Mutex<Vec<String>>,
}

impl RecordingHistory {
	fn writes(&self) -> Vec<String> {
		self.writes.lock().clone()
	}
}

impl History for RecordingHistory {
	fn state(&self) -> Option<HistoryEntry> {
		self.inner.state()
	}

	fn pathname(&self) -> String {
		self.inner.pathname()
	}

	fn query(&self) -> Query {
		self.inner.query()
	}

	fn push_state(&self, entry: &HistoryEntry, href: &str) {
		self.writes.lock().push(format!("push {href}"));
		self.inner.push_state(entry, href);
	}

	fn replace_state(&self, entry: &HistoryEntry, href: &str) {
		self.writes.lock().push(format!("replace {href}"));
		self.inner.replace_state(entry, href);
	}

	fn add_pop_state_listener(&self, listener: PopListener) -> Subscription {
		self.inner.add_pop_state_listener(listener)
	}
}

/// A handler that logs its start and end around a yield point.
fn record(
	log: &Log,
	label: &'static str,
) -> impl Fn(HandlerContext<Component>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static {
	let log = Arc::clone(log);
	move |_ctx| {
		let log = Arc::clone(&log);
		async move {
			log.lock().push(format!("{label} start"));
			tokio::task::yield_now().await;
			log.lock().push(format!("{label} end"));
			Ok(())
		}
		.boxed()
	}
}

fn reject(message: &'static str) -> impl Fn(HandlerContext<Component>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static {
	move |_ctx| async move { Err::<(), BoxError>(message.into()) }.boxed()
}

fn lazy_routes() -> Vec<Definition> {
	vec![
		Definition::new("/")
			.component("a")
			.lazy_children(|| async { Ok(vec![Definition::new("test").component("b")]) }),
	]
}

#[rstest]
#[tokio::test]
async fn test_run_resolves_async_children() {
	// Arrange
	let router = Router::new(lazy_routes()).unwrap();

	// Act
	let route = router.run("/test", Query::new()).await.unwrap();

	// Assert
	assert_eq!(route.pathname, "/test");
	assert_eq!(route.component_values(), vec!["a", "b"]);
	assert!(route.vars.is_empty());
	assert!(Arc::ptr_eq(&route, &router.current_route().unwrap()));
}

#[rstest]
#[tokio::test]
async fn test_not_found_fires_once_and_rejects() {
	// Arrange
	let outcomes = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&outcomes);
	let router = Router::builder(vec![Definition::new("/test/:variable{\\d+}").component("a")])
		.on_transition(move |outcome| {
			sink.lock().push(outcome.map(|route| route.pathname.clone()).map_err(|e| e.is_not_found()));
		})
		.build()
		.unwrap();
	let not_found = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&not_found);
	router.add_not_found_listener(move |path, _query| {
		assert_eq!(path, "/test/abcd");
		counter.fetch_add(1, Ordering::SeqCst);
	});
	let started = Arc::new(AtomicUsize::new(0));
	let start_counter = Arc::clone(&started);
	router.add_change_start_listener(move |_, _| {
		start_counter.fetch_add(1, Ordering::SeqCst);
	});

	// Act
	let result = router.run("/test/abcd", Query::new()).await;

	// Assert
	assert!(matches!(result, Err(RouterError::RouteNotFound { ref path, .. }) if path == "/test/abcd"));
	assert_eq!(not_found.load(Ordering::SeqCst), 1);
	assert_eq!(started.load(Ordering::SeqCst), 0);
	assert_eq!(*outcomes.lock(), vec![Err(true)]);
	assert!(router.current_route().is_none());
}

#[rstest]
#[tokio::test]
async fn test_first_run_replaces_then_pushes() {
	let history = Arc::new(RecordingHistory::default());
	let router = Router::builder(vec![
		Definition::new("/").component("home"),
		Definition::new("/test").component("test"),
	])
	.history(Arc::clone(&history))
	.build()
	.unwrap();

	router.run("/", Query::new()).await.unwrap();
	router.run("/test", Query::new()).await.unwrap();

	assert_eq!(history.writes(), vec!["replace /", "push /test"]);
	assert_eq!(history.state().map(|entry| entry.path), Some("/test".to_string()));
}

#[rstest]
#[tokio::test]
async fn test_history_entry_carries_name_vars_and_query() {
	let history = Arc::new(MemoryHistory::default());
	let router = Router::builder(vec![Definition::new("/users/:id").name("user").component("user")])
		.history(Arc::clone(&history))
		.build()
		.unwrap();

	router.navigate("/users/7?tab=posts").await.unwrap();

	let entry = history.state().unwrap();
	assert_eq!(entry.name.as_deref(), Some("user"));
	assert_eq!(entry.vars.get("id").map(String::as_str), Some("7"));
	assert_eq!(entry.query.get("tab"), Some(&QueryValue::from("posts")));
	assert_eq!(entry.path, "/users/7");
	assert_eq!(history.hrefs(), vec!["/users/7?tab=posts"]);
}

#[rstest]
#[tokio::test]
async fn test_on_enter_rejection_keeps_current_route() {
	// Arrange
	let router = Router::new(vec![
		Definition::new("/").component("home"),
		Definition::new("/private").component("private").on_enter(reject("forbidden")),
	])
	.unwrap();
	let home = router.run("/", Query::new()).await.unwrap();
	let failures = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&failures);
	router.add_change_fail_listener(move |error, previous| {
		sink.lock().push((error.to_string(), previous.map(|route| route.pathname.clone())));
	});

	// Act
	let result = router.run("/private", Query::new()).await;

	// Assert
	let err = result.unwrap_err();
	assert!(matches!(err, RouterError::OnEnterRejected(_)));
	assert!(Arc::ptr_eq(&router.current_route().unwrap(), &home));
	assert_eq!(
		*failures.lock(),
		vec![("on_enter handlers rejected: forbidden".to_string(), Some("/".to_string()))]
	);
}

#[rstest]
#[tokio::test]
async fn test_on_leave_rejection_aborts_before_enter() {
	let log: Log = Arc::default();
	let router = Router::new(vec![
		Definition::new("/editor").component("editor").on_leave(reject("unsaved changes")),
		Definition::new("/other").component("other").on_enter(record(&log, "other")),
	])
	.unwrap();
	router.run("/editor", Query::new()).await.unwrap();

	let result = router.run("/other", Query::new()).await;

	assert!(matches!(result, Err(RouterError::OnLeaveRejected(_))));
	assert!(log.lock().is_empty());
	assert_eq!(router.current_route().unwrap().pathname, "/editor");
}

#[rstest]
#[tokio::test]
async fn test_handlers_run_sequentially_in_order() {
	// Arrange
	let log: Log = Arc::default();
	let router = Router::new(vec![
		Definition::new("/")
			.on_enter(record(&log, "enter root"))
			.on_leave(record(&log, "leave root"))
			.children(vec![
				Definition::new("a")
					.on_enter(record(&log, "enter a"))
					.on_leave(record(&log, "leave a"))
					.children(vec![
						Definition::new("b")
							.on_enter(record(&log, "enter b"))
							.on_leave(record(&log, "leave b")),
					]),
				Definition::new("c").on_enter(record(&log, "enter c")),
			]),
	])
	.unwrap();
	router.run("/a/b", Query::new()).await.unwrap();
	log.lock().clear();

	// Act
	router.run("/c", Query::new()).await.unwrap();

	// Assert
	let expected: Vec<String> = [
		"leave b", "leave a", "leave root", "enter root", "enter c",
	]
	.iter()
	.flat_map(|label| [format!("{label} start"), format!("{label} end")])
	.collect();
	assert_eq!(*log.lock(), expected);
}

#[rstest]
#[tokio::test]
async fn test_first_run_skips_leave_handlers() {
	let log: Log = Arc::default();
	let router = Router::new(vec![
		Definition::new("/")
			.on_enter(record(&log, "enter"))
			.on_leave(record(&log, "leave")),
	])
	.unwrap();

	router.run("/", Query::new()).await.unwrap();

	assert_eq!(*log.lock(), vec!["enter start", "enter end"]);
}

#[rstest]
#[tokio::test]
async fn test_lazy_components_are_loaded_before_commit() {
	let router = Router::new(vec![
		Definition::new("/")
			.component("layout")
			.children(vec![Definition::new("page").lazy_component(|| async { Ok("page") })]),
	])
	.unwrap();

	let route = router.run("/page", Query::new()).await.unwrap();

	assert_eq!(route.component_values(), vec!["layout", "page"]);
	assert!(route.components.iter().all(|c| !c.is_lazy()));
}

#[rstest]
#[tokio::test]
async fn test_component_failure_rejects_transition() {
	let router = Router::new(vec![
		Definition::new("/broken").lazy_component(|| async { Err::<Component, BoxError>("chunk failed".into()) }),
	])
	.unwrap();

	let result = router.run("/broken", Query::new()).await;

	let err = result.unwrap_err();
	assert!(matches!(err, RouterError::ComponentResolution(_)));
	assert!(err.to_string().contains("chunk failed"));
	assert!(router.current_route().is_none());
}

#[rstest]
#[tokio::test]
async fn test_change_listeners_and_unsubscribe() {
	// Arrange
	let router = Router::new(vec![
		Definition::new("/").component("home"),
		Definition::new("/about").component("about"),
	])
	.unwrap();
	let events: Log = Arc::default();
	let sink = Arc::clone(&events);
	router.add_change_start_listener(move |previous, next| {
		sink.lock().push(format!(
			"start {} -> {}",
			previous.map_or("none", |route| route.pathname.as_str()),
			next.pathname
		));
	});
	let sink = Arc::clone(&events);
	let success = router.add_change_success_listener(move |route| {
		sink.lock().push(format!("success {}", route.pathname));
	});

	// Act
	router.run("/", Query::new()).await.unwrap();
	success.unsubscribe();
	success.unsubscribe();
	router.run("/about", Query::new()).await.unwrap();

	// Assert
	assert_eq!(
		*events.lock(),
		vec!["start none -> /", "success /", "start / -> /about"]
	);
}

#[rstest]
#[tokio::test]
async fn test_wrapper_injects_values_into_handlers() {
	#[derive(Clone)]
	struct Dispatch(&'static str);

	let seen: Log = Arc::default();
	let sink = Arc::clone(&seen);
	let router = Router::new(vec![Definition::new("/").on_enter(move |ctx: HandlerContext<Component>| {
		let sink = Arc::clone(&sink);
		async move {
			match ctx.extensions.get::<Dispatch>() {
				Some(dispatch) => {
					sink.lock().push(dispatch.0.to_string());
					Ok(())
				}
				None => Err::<(), BoxError>("dispatch missing".into()),
			}
		}
	})])
	.unwrap();
	router.wrap_on_enter_handler(|bound| bound.with(Dispatch("store")).invoke());

	router.run("/", Query::new()).await.unwrap();

	assert_eq!(*seen.lock(), vec!["store"]);
}

#[rstest]
fn test_create_href_merges_query() {
	let router = Router::<Component>::new(Vec::new()).unwrap();
	let mut query = Query::new();
	query.insert("a".to_string(), QueryValue::from(vec!["1", "0"]));

	assert_eq!(router.create_href("/?b=1", &query), "/?b=1&a%5B%5D=1&a%5B%5D=0");
	assert_eq!(router.create_href("/", &Query::new()), "/");
}

#[rstest]
#[tokio::test]
async fn test_pop_event_runs_transition_without_pushing() {
	// Arrange
	let history = Arc::new(MemoryHistory::default());
	let (tx, mut transitions) = mpsc::unbounded();
	let router = Arc::new(
		Router::builder(vec![
			Definition::new("/").component("home"),
			Definition::new("/test").component("test"),
		])
		.history(Arc::clone(&history))
		.on_transition(move |outcome| {
			let _ = tx.unbounded_send(outcome.map(|route| route.pathname.clone()).map_err(|e| e.to_string()));
		})
		.build()
		.unwrap(),
	);
	tokio::spawn(router.listen());
	router.run("/", Query::new()).await.unwrap();
	router.run("/test", Query::new()).await.unwrap();
	assert_eq!(transitions.next().await, Some(Ok("/".to_string())));
	assert_eq!(transitions.next().await, Some(Ok("/test".to_string())));

	// Act
	assert!(history.back());
	let popped = transitions.next().await;

	// Assert
	assert_eq!(popped, Some(Ok("/".to_string())));
	assert_eq!(router.current_route().unwrap().pathname, "/");
	assert_eq!(history.hrefs(), vec!["/", "/test"]);
	assert_eq!(history.index(), 0);
}

#[rstest]
#[tokio::test]
async fn test_pop_to_entry_without_state_replaces_it() {
	// Arrange
	let history = Arc::new(MemoryHistory::new("/"));
	history.push_state(
		&HistoryEntry {
			path: "/test".to_string(),
			..HistoryEntry::default()
		},
		"/test",
	);
	let (tx, mut transitions) = mpsc::unbounded();
	let router = Arc::new(
		Router::builder(vec![Definition::new("/").component("home")])
			.history(Arc::clone(&history))
			.on_transition(move |outcome| {
				let _ = tx.unbounded_send(outcome.is_ok());
			})
			.build()
			.unwrap(),
	);
	tokio::spawn(router.listen());

	// Act
	assert!(history.back());
	let popped = transitions.next().await;

	// Assert
	assert_eq!(popped, Some(true));
	assert_eq!(history.state().map(|entry| entry.path), Some("/".to_string()));
	assert_eq!(history.len(), 2);
}

#[rstest]
#[tokio::test]
async fn test_start_uses_history_location() {
	let history = MemoryHistory::new("/users/3?tab=a");
	let router = Router::builder(vec![Definition::new("/users/:id").component("user")])
		.history(history)
		.build()
		.unwrap();

	let route = router.start().await.unwrap();

	assert_eq!(route.vars["id"], "3");
	assert_eq!(route.full_path, "/users/3?tab=a");
}

#[rstest]
#[tokio::test]
async fn test_listen_again_replaces_previous_listener() {
	// Arrange
	let history = Arc::new(MemoryHistory::default());
	let router = Arc::new(
		Router::builder(vec![
			Definition::new("/").component("home"),
			Definition::new("/a").component("a"),
		])
		.history(Arc::clone(&history))
		.build()
		.unwrap(),
	);
	let (tx, mut committed) = mpsc::unbounded();
	router.add_change_success_listener(move |route| {
		let _ = tx.unbounded_send(route.pathname.clone());
	});
	let first = router.listen();
	let second = router.listen();
	router.run("/", Query::new()).await.unwrap();
	router.run("/a", Query::new()).await.unwrap();
	assert_eq!(committed.next().await, Some("/".to_string()));
	assert_eq!(committed.next().await, Some("/a".to_string()));

	// Act
	first.await;
	let listening = tokio::spawn(second);
	assert!(history.back());
	let popped = committed.next().await;
	for _ in 0..10 {
		tokio::task::yield_now().await;
	}

	// Assert
	assert_eq!(popped, Some("/".to_string()));
	assert!(committed.try_next().is_err());
	assert_eq!(history.listener_count(), 1);
	listening.abort();
}

#[rstest]
#[tokio::test]
async fn test_dropping_listen_future_unregisters_listener() {
	let history = Arc::new(MemoryHistory::default());
	let router = Arc::new(
		Router::builder(vec![Definition::new("/").component("home")])
			.history(Arc::clone(&history))
			.build()
			.unwrap(),
	);

	let listening = router.listen();
	assert_eq!(history.listener_count(), 1);
	drop(listening);

	assert_eq!(history.listener_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_listen_completes_when_router_dropped() {
	let history = Arc::new(MemoryHistory::default());
	let router = Arc::new(
		Router::builder(vec![Definition::new("/").component("home")])
			.history(Arc::clone(&history))
			.build()
			.unwrap(),
	);
	let listening = tokio::spawn(router.listen());

	drop(router);
	listening.await.unwrap();

	assert_eq!(history.listener_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_leave_wrapper_injects_values_into_handlers() {
	// Arrange
	#[derive(Clone)]
	struct Dispatch(&'static str);

	let seen: Log = Arc::default();
	let sink = Arc::clone(&seen);
	let router = Router::new(vec![
		Definition::new("/").on_leave(move |ctx: HandlerContext<Component>| {
			let sink = Arc::clone(&sink);
			async move {
				match ctx.extensions.get::<Dispatch>() {
					Some(dispatch) => {
						sink.lock().push(format!("{} leaving for {}", dispatch.0, ctx.next.pathname));
						Ok(())
					}
					None => Err::<(), BoxError>("dispatch missing".into()),
				}
			}
		}),
		Definition::new("/next"),
	])
	.unwrap();
	router.wrap_on_leave_handler(|bound| bound.with(Dispatch("store")).invoke());
	router.run("/", Query::new()).await.unwrap();

	// Act
	let result = router.run("/next", Query::new()).await;

	// Assert
	assert!(result.is_ok());
	assert_eq!(*seen.lock(), vec!["store leaving for /next"]);
}

#[rstest]
#[tokio::test]
async fn test_builder_installs_both_wrappers() {
	// Arrange
	#[derive(Clone)]
	struct Stage(&'static str);

	fn report(log: &Log) -> impl Fn(HandlerContext<Component>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static {
		let log = Arc::clone(log);
		move |ctx| {
			let log = Arc::clone(&log);
			async move {
				let stage = ctx.extensions.get::<Stage>().map_or("none", |stage| stage.0);
				log.lock().push(format!("{stage} {}", ctx.next.pathname));
				Ok(())
			}
			.boxed()
		}
	}

	let log: Log = Arc::default();
	let router = Router::builder(vec![
		Definition::new("/").on_enter(report(&log)).on_leave(report(&log)),
		Definition::new("/next").on_enter(report(&log)),
	])
	.on_enter_wrapper(|bound| bound.with(Stage("enter")).invoke())
	.on_leave_wrapper(|bound| bound.with(Stage("leave")).invoke())
	.build()
	.unwrap();

	// Act
	router.run("/", Query::new()).await.unwrap();
	router.run("/next", Query::new()).await.unwrap();

	// Assert
	assert_eq!(*log.lock(), vec!["enter /", "leave /next", "enter /next"]);
}
