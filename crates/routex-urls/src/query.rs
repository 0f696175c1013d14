//! Query maps and their string encoding.
//!
//! List values use the bracket convention (`key[]=v1&key[]=v2`). Keys keep
//! their insertion order so that an encoded query is stable across
//! parse/stringify cycles.

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Characters left untouched by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'!')
	.remove(b'~')
	.remove(b'*')
	.remove(b'\'')
	.remove(b'(')
	.remove(b')');

/// Suffix marking a list-valued key.
const LIST_SUFFIX: &str = "[]";

/// A query parameter map in insertion order.
pub type Query = IndexMap<String, QueryValue>;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
	/// A scalar value (`key=value`).
	Single(String),
	/// A list value (`key[]=a&key[]=b`).
	List(Vec<String>),
}

impl QueryValue {
	/// Returns the scalar value, or the last element of a list.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Single(value) => Some(value),
			Self::List(values) => values.last().map(String::as_str),
		}
	}

	/// Returns all values as a slice-like vector of borrowed strings.
	pub fn values(&self) -> Vec<&str> {
		match self {
			Self::Single(value) => vec![value.as_str()],
			Self::List(values) => values.iter().map(String::as_str).collect(),
		}
	}

	/// Appends a value, turning a scalar into a list.
	fn append(&mut self, value: String) {
		match self {
			Self::Single(existing) => {
				let first = std::mem::take(existing);
				*self = Self::List(vec![first, value]);
			}
			Self::List(values) => values.push(value),
		}
	}
}

impl From<&str> for QueryValue {
	fn from(value: &str) -> Self {
		Self::Single(value.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(value: String) -> Self {
		Self::Single(value)
	}
}

impl<T: Into<String>> From<Vec<T>> for QueryValue {
	fn from(values: Vec<T>) -> Self {
		Self::List(values.into_iter().map(Into::into).collect())
	}
}

fn encode(component: &str) -> String {
	utf8_percent_encode(component, COMPONENT).to_string()
}

fn decode(component: &str) -> String {
	let spaced = component.replace('+', " ");
	percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Parses a `location.search`-style string.
///
/// Only input starting with `?` is treated as a query; anything else yields
/// an empty map.
///
/// # Examples
///
/// ```
/// use routex_urls::{QueryValue, parse_query};
///
/// let query = parse_query("?page=2&tag%5B%5D=a&tag%5B%5D=b");
/// assert_eq!(query.get("page"), Some(&QueryValue::from("2")));
/// assert_eq!(query.get("tag"), Some(&QueryValue::from(vec!["a", "b"])));
///
/// assert!(parse_query("page=2").is_empty());
/// ```
pub fn parse_query(search: &str) -> Query {
	match search.strip_prefix('?') {
		Some(rest) => parse_query_string(rest),
		None => Query::new(),
	}
}

/// Parses a raw query string (without the leading `?`).
///
/// Bracket keys collect into lists; a scalar key repeated more than once is
/// combined into a list as well.
pub fn parse_query_string(input: &str) -> Query {
	let mut query = Query::new();

	for pair in input.split('&').filter(|pair| !pair.is_empty()) {
		let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
		let key = decode(raw_key);
		let value = decode(raw_value);

		if key.is_empty() {
			continue;
		}

		match key.strip_suffix(LIST_SUFFIX) {
			Some(base) if !base.is_empty() => match query.get_mut(base) {
				Some(existing) => existing.append(value),
				None => {
					query.insert(base.to_string(), QueryValue::List(vec![value]));
				}
			},
			_ => match query.get_mut(&key) {
				Some(existing) => existing.append(value),
				None => {
					query.insert(key, QueryValue::Single(value));
				}
			},
		}
	}

	query
}

/// Encodes a query map using the bracket convention for lists.
///
/// Returns an empty string for an empty map; empty lists are skipped.
pub fn stringify_query(query: &Query) -> String {
	let mut pairs = Vec::new();

	for (key, value) in query {
		match value {
			QueryValue::Single(value) => {
				pairs.push(format!("{}={}", encode(key), encode(value)));
			}
			QueryValue::List(values) => {
				let list_key = encode(&format!("{}{}", key, LIST_SUFFIX));
				for value in values {
					pairs.push(format!("{}={}", list_key, encode(value)));
				}
			}
		}
	}

	pairs.join("&")
}
