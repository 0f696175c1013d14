//! Href construction.

use super::query::{Query, parse_query, stringify_query};

/// Splits an href into its path and parsed query.
///
/// ```
/// use routex_urls::{QueryValue, split_href};
///
/// let (path, query) = split_href("/users?page=3");
/// assert_eq!(path, "/users");
/// assert_eq!(query.get("page"), Some(&QueryValue::from("3")));
/// ```
pub fn split_href(href: &str) -> (&str, Query) {
	match href.find('?') {
		Some(index) => (&href[..index], parse_query(&href[index..])),
		None => (href, Query::new()),
	}
}

/// Builds an href from a path and query parameters.
///
/// A query string already present on `path` is parsed and merged with
/// `query`; explicit parameters win on key collision. When the merged query
/// is empty no `?` is appended.
///
/// # Examples
///
/// ```
/// use routex_urls::{Query, QueryValue, create_href};
///
/// assert_eq!(create_href("/?", &Query::new()), "/");
///
/// let mut query = Query::new();
/// query.insert("a".to_string(), QueryValue::from("1"));
/// assert_eq!(create_href("/?a=0&b=1", &query), "/?a=1&b=1");
/// ```
pub fn create_href(path: &str, query: &Query) -> String {
	let (base, mut merged) = split_href(path);

	for (key, value) in query {
		merged.insert(key.clone(), value.clone());
	}

	if merged.is_empty() {
		base.to_string()
	} else {
		format!("{}?{}", base, stringify_query(&merged))
	}
}
