//! URL utilities for routex.
//!
//! This crate holds the small, dependency-light helpers shared by the route
//! tree and the router:
//!
//! - [`slashes`]: path slash normalization used by the pattern compiler
//! - [`query`]: query maps and their bracket-convention string encoding
//! - [`href`]: href construction that merges an existing query string with
//!   explicit parameters
//!
//! ## Example
//!
//! ```
//! use routex_urls::{Query, QueryValue, create_href};
//!
//! let mut query = Query::new();
//! query.insert("tags".to_string(), QueryValue::from(vec!["a", "b"]));
//!
//! assert_eq!(create_href("/posts?page=2", &query), "/posts?page=2&tags%5B%5D=a&tags%5B%5D=b");
//! ```

pub mod href;
pub mod query;
pub mod slashes;

pub use href::{create_href, split_href};
pub use query::{Query, QueryValue, parse_query, parse_query_string, stringify_query};
pub use slashes::{join_paths, normalize_slashes, trim_trailing_slash};
