//! Expansion of user supplied paths into scan targets.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::ApplyConfig;
use crate::host::{ActivityLog, LogRecord};
use crate::{Error, Result};

/// A file with a supported extension, queued for processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanTarget {
	uri: Url,
}

impl ScanTarget {
	/// Builds a target from an absolute file path.
	pub fn from_path(path: &Path) -> Result<Self> {
		let uri = Url::from_file_path(path).map_err(|()| Error::InvalidTarget(path.display().to_string()))?;
		Ok(Self { uri })
	}

	/// The document URL.
	pub fn uri(&self) -> &Url {
		&self.uri
	}

	/// Canonical string form used for deduplication.
	pub fn key(&self) -> &str {
		self.uri.as_str()
	}
}

impl fmt::Display for ScanTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.uri.as_str())
	}
}

#[derive(Debug, Clone)]
struct WalkOptions {
	include_hidden: bool,
	follow_symlinks: bool,
	respect_ignore_files: bool,
	git_ignore: bool,
	git_global: bool,
	git_exclude: bool,
	max_depth: Option<usize>,
}

/// Resolves files and directories into a deduplicated list of [`ScanTarget`]s.
pub struct ScanTargetResolver {
	extensions: Arc<HashSet<String>>,
	walk: WalkOptions,
	log: Arc<dyn ActivityLog>,
}

impl fmt::Debug for ScanTargetResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScanTargetResolver")
			.field("extensions", &self.extensions)
			.field("walk", &self.walk)
			.finish_non_exhaustive()
	}
}

impl ScanTargetResolver {
	/// Creates a resolver honoring `config`'s extensions and ignore rules.
	pub fn new(config: &ApplyConfig, log: Arc<dyn ActivityLog>) -> Self {
		Self {
			extensions: Arc::new(config.extension_set()),
			walk: WalkOptions {
				include_hidden: config.include_hidden,
				follow_symlinks: config.follow_symlinks,
				respect_ignore_files: config.respect_ignore_files,
				git_ignore: config.git_ignore,
				git_global: config.git_global,
				git_exclude: config.git_exclude,
				max_depth: config.max_depth,
			},
			log,
		}
	}

	/// Expands `inputs` in order.
	///
	/// Each URL appears once, at the position it was first produced. Inputs
	/// that fail to resolve are logged and skipped. Once `cancel` fires no
	/// further inputs are started and the targets collected so far are
	/// returned.
	pub async fn resolve(&self, inputs: &[PathBuf], cancel: &CancellationToken) -> Vec<ScanTarget> {
		let mut collected: IndexMap<String, ScanTarget> = IndexMap::new();

		for input in inputs {
			if cancel.is_cancelled() {
				tracing::debug!(input = %input.display(), "resolve.cancelled");
				break;
			}

			match self.resolve_input(input, cancel).await {
				Ok(files) => {
					for target in files {
						if cancel.is_cancelled() {
							break;
						}
						collected.entry(target.key().to_owned()).or_insert(target);
					}
				}
				Err(error) => {
					tracing::warn!(input = %input.display(), %error, "resolve.input.failed");
					self.log
						.record(LogRecord::error("Failed to resolve scan target", &error).with_path(input.display().to_string()));
				}
			}
		}

		tracing::debug!(inputs = inputs.len(), targets = collected.len(), "resolve.done");
		collected.into_values().collect()
	}

	async fn resolve_input(&self, input: &Path, cancel: &CancellationToken) -> Result<Vec<ScanTarget>> {
		let path = tokio::fs::canonicalize(input).await.map_err(Error::io(input))?;
		let metadata = tokio::fs::metadata(&path).await.map_err(Error::io(input))?;

		if !metadata.is_dir() {
			return if has_supported_extension(&path, &self.extensions) {
				Ok(vec![ScanTarget::from_path(&path)?])
			} else {
				Ok(Vec::new())
			};
		}

		// Surface an unreadable root as a failure of this input.
		drop(tokio::fs::read_dir(&path).await.map_err(Error::io(input))?);

		let walker = build_walk(&path, &self.walk);
		let extensions = Arc::clone(&self.extensions);
		let cancel = cancel.clone();
		let files = tokio::task::spawn_blocking(move || collect_files(walker, &extensions, &cancel)).await?;

		files.iter().map(|file| ScanTarget::from_path(file)).collect()
	}
}

fn collect_files(walker: WalkBuilder, extensions: &HashSet<String>, cancel: &CancellationToken) -> Vec<PathBuf> {
	let mut files = Vec::new();
	for entry in walker.build() {
		if cancel.is_cancelled() {
			break;
		}
		let entry = match entry {
			Ok(entry) => entry,
			Err(error) => {
				tracing::warn!(%error, "resolve.walk.entry_failed");
				continue;
			}
		};
		if !entry.file_type().is_some_and(|ty| ty.is_file()) {
			continue;
		}
		if has_supported_extension(entry.path(), extensions) {
			files.push(entry.into_path());
		}
	}
	files
}

fn has_supported_extension(path: &Path, extensions: &HashSet<String>) -> bool {
	path.extension()
		.and_then(OsStr::to_str)
		.is_some_and(|ext| extensions.contains(&ext.to_ascii_lowercase()))
}

fn build_walk(root: &Path, options: &WalkOptions) -> WalkBuilder {
	let mut walker = WalkBuilder::new(root);

	walker
		.hidden(!options.include_hidden)
		.follow_links(options.follow_symlinks)
		.git_ignore(options.git_ignore)
		.git_global(options.git_global)
		.git_exclude(options.git_exclude)
		.ignore(options.respect_ignore_files)
		.parents(true)
		.max_depth(options.max_depth)
		.sort_by_file_name(|a, b| a.cmp(b));

	walker
}

#[cfg(test)]
mod tests;
