//! Path pattern compilation.
//!
//! A route pattern is made of literal text and variable placeholders:
//!
//! - `:name` captures one path segment (anything except `/`)
//! - `:name{regex}` captures whatever `regex` matches
//!
//! A pattern is always compiled together with the accumulated path of its
//! ancestors, so `/users/:id` nested under `/org/:org` compiles as
//! `/org/:org/users/:id`. Variable names must be unique across that composed
//! pattern.
//!
//! Each compiled pattern yields two matchers over the same expression: an
//! exact one anchored at both ends, and a prefix one that accepts trailing
//! content and is used to decide whether a route's children are worth
//! resolving.

use super::error::{RouteError, RouteResult};
use super::settings::MatchSettings;
use regex::{Regex, RegexBuilder};
use routex_urls::join_paths;
use std::collections::HashMap;
use std::fmt;

/// Capture used for variables without a custom pattern.
const DEFAULT_VARIABLE_PATTERN: &str = "[^/]+";

/// A declared variable and the capture group holding its value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Variable {
	name: String,
	group: usize,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathMatcher {
	/// The composed pattern string (ancestors included).
	pattern: String,
	/// Anchored at both ends.
	exact: Regex,
	/// Anchored at the start only.
	prefix: Regex,
	/// Variables in declaration order.
	variables: Vec<Variable>,
}

impl PathMatcher {
	/// Compiles `pattern` nested under `base_path`.
	///
	/// # Errors
	///
	/// Returns [`RouteError::DuplicateParameter`] if a variable name is
	/// declared twice in the composed pattern, and
	/// [`RouteError::InvalidPattern`] if the pattern is too long, a custom
	/// variable pattern is malformed, or the resulting regex exceeds the
	/// configured size limit.
	///
	/// # Examples
	///
	/// ```
	/// use routex_routes::{MatchSettings, PathMatcher};
	///
	/// let matcher = PathMatcher::compile("/users", ":id{\\d+}", &MatchSettings::default()).unwrap();
	/// let vars = matcher.match_exact("/users/42").unwrap();
	/// assert_eq!(vars.get("id"), Some(&"42".to_string()));
	/// assert!(matcher.match_exact("/users/abc").is_none());
	/// ```
	pub fn compile(base_path: &str, pattern: &str, settings: &MatchSettings) -> RouteResult<Self> {
		Self::from_composed(&join_paths(base_path, pattern), settings)
	}

	/// Compiles an already composed pattern.
	pub fn from_composed(pattern: &str, settings: &MatchSettings) -> RouteResult<Self> {
		if pattern.len() > settings.max_pattern_length {
			return Err(RouteError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: format!(
					"pattern length {} exceeds maximum allowed length of {} bytes",
					pattern.len(),
					settings.max_pattern_length
				),
			});
		}

		let (body, variables) = compile_pattern(pattern)?;
		let exact = build_regex(pattern, &format!("^(?:{})/?$", body), settings)?;
		let prefix = build_regex(pattern, &format!("^(?:{})/?", body), settings)?;

		tracing::debug!(
			pattern = %pattern,
			variables = variables.len(),
			"compiled route pattern"
		);

		Ok(Self {
			pattern: pattern.to_string(),
			exact,
			prefix,
			variables,
		})
	}

	/// Returns the composed pattern string.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the variable names in declaration order.
	pub fn variable_names(&self) -> impl Iterator<Item = &str> {
		self.variables.iter().map(|v| v.name.as_str())
	}

	/// Matches the whole path, returning the extracted variables.
	pub fn match_exact(&self, path: &str) -> Option<HashMap<String, String>> {
		self.extract(&self.exact, path)
	}

	/// Matches the start of the path, allowing arbitrary trailing content.
	pub fn match_prefix(&self, path: &str) -> Option<HashMap<String, String>> {
		self.extract(&self.prefix, path)
	}

	/// Checks whether the whole path matches.
	pub fn is_match(&self, path: &str) -> bool {
		self.exact.is_match(path)
	}

	/// Checks whether something under this pattern could match the path.
	pub fn is_prefix_match(&self, path: &str) -> bool {
		self.prefix.is_match(path)
	}

	fn extract(&self, regex: &Regex, path: &str) -> Option<HashMap<String, String>> {
		let captures = regex.captures(path)?;

		Some(
			self.variables
				.iter()
				.map(|variable| {
					let value = captures
						.get(variable.group)
						.map(|m| m.as_str())
						.unwrap_or_default();
					(variable.name.clone(), value.to_string())
				})
				.collect(),
		)
	}
}

impl fmt::Display for PathMatcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.pattern)
	}
}

impl PartialEq for PathMatcher {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

fn build_regex(pattern: &str, source: &str, settings: &MatchSettings) -> RouteResult<Regex> {
	RegexBuilder::new(source)
		.case_insensitive(settings.case_insensitive)
		.size_limit(settings.regex_size_limit)
		.build()
		.map_err(|e| RouteError::InvalidPattern {
			pattern: pattern.to_string(),
			reason: e.to_string(),
		})
}

fn is_identifier_start(c: char) -> bool {
	c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

/// Translates a composed pattern into a regex body and its variables.
///
/// Literal text is escaped. Each variable becomes one capture group; inner
/// groups of a custom pattern shift the group index of later variables.
fn compile_pattern(pattern: &str) -> RouteResult<(String, Vec<Variable>)> {
	let mut body = String::new();
	let mut literal = String::new();
	let mut variables: Vec<Variable> = Vec::new();
	let mut next_group = 1;
	let mut chars = pattern.chars().peekable();

	while let Some(c) = chars.next() {
		if c != ':' || !chars.peek().copied().is_some_and(is_identifier_start) {
			literal.push(c);
			continue;
		}

		let mut name = String::new();
		while let Some(&next) = chars.peek() {
			if !is_identifier_continue(next) {
				break;
			}
			name.push(next);
			chars.next();
		}

		if variables.iter().any(|v| v.name == name) {
			return Err(RouteError::DuplicateParameter {
				name,
				pattern: pattern.to_string(),
			});
		}

		let custom = if chars.peek() == Some(&'{') {
			chars.next(); // consume '{'
			Some(read_braced(&mut chars).ok_or_else(|| RouteError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: format!("unterminated pattern for parameter `{}`", name),
			})?)
		} else {
			None
		};

		let inner_groups = match &custom {
			Some(custom) => count_inner_groups(pattern, &name, custom)?,
			None => 0,
		};

		body.push_str(&regex::escape(&literal));
		literal.clear();
		body.push('(');
		body.push_str(custom.as_deref().unwrap_or(DEFAULT_VARIABLE_PATTERN));
		body.push(')');

		variables.push(Variable {
			name,
			group: next_group,
		});
		next_group += 1 + inner_groups;
	}

	body.push_str(&regex::escape(&literal));

	Ok((body, variables))
}

/// Reads a custom variable pattern up to its closing brace.
///
/// Nested braces (regex repetitions such as `\d{4}`) and backslash escapes
/// are kept intact. Returns `None` if the closing brace is missing.
fn read_braced(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
	let mut custom = String::new();
	let mut depth = 1;

	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				custom.push(c);
				custom.push(chars.next()?);
			}
			'{' => {
				depth += 1;
				custom.push(c);
			}
			'}' => {
				depth -= 1;
				if depth == 0 {
					return Some(custom);
				}
				custom.push(c);
			}
			_ => custom.push(c),
		}
	}

	None
}

/// Counts the capturing groups inside a custom variable pattern.
fn count_inner_groups(pattern: &str, name: &str, custom: &str) -> RouteResult<usize> {
	if custom.is_empty() {
		return Err(RouteError::InvalidPattern {
			pattern: pattern.to_string(),
			reason: format!("empty pattern for parameter `{}`", name),
		});
	}

	let compiled = Regex::new(custom).map_err(|e| RouteError::InvalidPattern {
		pattern: pattern.to_string(),
		reason: format!("invalid pattern for parameter `{}`: {}", name, e),
	})?;

	// captures_len() includes the implicit whole-match group
	Ok(compiled.captures_len() - 1)
}
