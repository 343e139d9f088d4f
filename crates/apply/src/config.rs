//! Sweep configuration.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::Result;

/// Extensions the suggestion service understands out of the box.
const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

/// Options for resolving scan targets and talking to the service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplyConfig {
	/// File extensions eligible for a sweep, with or without a leading dot.
	pub supported_extensions: Vec<String>,
	/// Walk into hidden files and directories.
	pub include_hidden: bool,
	/// Follow symbolic links while walking directories.
	pub follow_symlinks: bool,
	/// Honor `.ignore` files.
	pub respect_ignore_files: bool,
	/// Honor `.gitignore` files inside git repositories.
	pub git_ignore: bool,
	/// Honor the global git excludes file.
	pub git_global: bool,
	/// Honor `.git/info/exclude`.
	pub git_exclude: bool,
	/// Maximum directory depth, unlimited when `None`.
	pub max_depth: Option<usize>,
	/// Per-request timeout in milliseconds, `0` waits indefinitely.
	pub request_timeout_ms: u64,
}

impl Default for ApplyConfig {
	fn default() -> Self {
		Self {
			supported_extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
			include_hidden: false,
			follow_symlinks: false,
			respect_ignore_files: true,
			git_ignore: true,
			git_global: true,
			git_exclude: true,
			max_depth: None,
			request_timeout_ms: 0,
		}
	}
}

impl ApplyConfig {
	/// Parses a TOML document, filling absent keys with defaults.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Ok(toml::from_str(source)?)
	}

	/// Normalized extension set: lower-case, no leading dot, no blanks.
	pub fn extension_set(&self) -> HashSet<String> {
		self.supported_extensions
			.iter()
			.map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
			.filter(|ext| !ext.is_empty())
			.collect()
	}

	/// Request timeout for the service client.
	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}
