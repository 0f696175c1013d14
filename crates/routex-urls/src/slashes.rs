//! Path slash normalization.

/// Collapses every run of consecutive `/` characters into a single `/`.
///
/// # Examples
///
/// ```
/// use routex_urls::normalize_slashes;
///
/// assert_eq!(normalize_slashes("//users///42/"), "/users/42/");
/// ```
pub fn normalize_slashes(path: &str) -> String {
	let mut normalized = String::with_capacity(path.len());
	let mut previous_was_slash = false;

	for c in path.chars() {
		if c == '/' {
			if previous_was_slash {
				continue;
			}
			previous_was_slash = true;
		} else {
			previous_was_slash = false;
		}
		normalized.push(c);
	}

	normalized
}

/// Removes a single trailing `/`, if present.
///
/// Only one slash is removed; run [`normalize_slashes`] first when the input
/// may end with several.
pub fn trim_trailing_slash(path: &str) -> &str {
	path.strip_suffix('/').unwrap_or(path)
}

/// Joins a base path and a child path the way nested routes are composed:
/// `base + "/" + path`, slashes collapsed, one trailing slash removed.
///
/// The root joins to an empty string, which the pattern compiler turns into a
/// matcher for both `""` and `"/"`.
///
/// # Examples
///
/// ```
/// use routex_urls::join_paths;
///
/// assert_eq!(join_paths("/users", ":id"), "/users/:id");
/// assert_eq!(join_paths("", "/"), "");
/// assert_eq!(join_paths("/", "test/"), "/test");
/// ```
pub fn join_paths(base: &str, path: &str) -> String {
	let joined = normalize_slashes(&format!("{}/{}", base, path));
	trim_trailing_slash(&joined).to_string()
}
