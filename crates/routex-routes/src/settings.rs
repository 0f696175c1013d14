//! Pattern compilation settings.

use serde::{Deserialize, Serialize};

/// Default maximum length of a composed pattern, in bytes.
pub const DEFAULT_MAX_PATTERN_LENGTH: usize = 1024;

/// Default size limit for a compiled matcher regex, in bytes.
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20; // 1 MiB

/// Settings applied when route patterns are compiled.
///
/// Missing fields fall back to their defaults when deserialized, so a partial
/// configuration is enough:
///
/// ```
/// use routex_routes::MatchSettings;
///
/// let settings: MatchSettings = serde_json::from_str(r#"{ "case_insensitive": false }"#).unwrap();
/// assert!(!settings.case_insensitive);
/// assert_eq!(settings.max_pattern_length, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
	/// Match paths case-insensitively.
	pub case_insensitive: bool,
	/// Reject composed patterns longer than this many bytes.
	pub max_pattern_length: usize,
	/// Size limit handed to the regex compiler.
	pub regex_size_limit: usize,
}

impl Default for MatchSettings {
	fn default() -> Self {
		Self {
			case_insensitive: true,
			max_pattern_length: DEFAULT_MAX_PATTERN_LENGTH,
			regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
		}
	}
}

impl MatchSettings {
	/// Sets case sensitivity.
	pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
		self.case_insensitive = case_insensitive;
		self
	}

	/// Sets the maximum composed pattern length.
	pub fn with_max_pattern_length(mut self, max_pattern_length: usize) -> Self {
		self.max_pattern_length = max_pattern_length;
		self
	}
}
