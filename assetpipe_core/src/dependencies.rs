use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use crate::PipelineResult;

/// Paths touched while rendering, used to fingerprint a render for cache
/// invalidation.
///
/// The first path ever registered is the file being rendered and is never
/// recorded, even when registered again later. Every other path is kept once,
/// in registration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
	first: Option<PathBuf>,
	paths: Vec<PathBuf>,
	seen: HashSet<PathBuf>,
}

impl DependencyTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, path: impl Into<PathBuf>) {
		let path = path.into();

		let Some(first) = &self.first else {
			tracing::trace!(path = %path.display(), "skipping first dependency");
			self.first = Some(path);
			return;
		};

		if *first != path && self.seen.insert(path.clone()) {
			tracing::trace!(path = %path.display(), "registered dependency");
			self.paths.push(path);
		}
	}

	pub fn paths(&self) -> &[PathBuf] {
		&self.paths
	}

	/// Whether any dependency, including the skipped first one, has been
	/// registered.
	pub fn is_initialized(&self) -> bool {
		self.first.is_some()
	}

	pub fn clear(&mut self) {
		self.first = None;
		self.paths.clear();
		self.seen.clear();
	}

	/// Build the staleness fingerprint: one `<path>:<mtime>` line per
	/// dependency, joined with `\n`. The modification time is in whole seconds
	/// since the Unix epoch.
	pub fn fingerprint(&self) -> PipelineResult<String> {
		fingerprint_paths(&self.paths)
	}
}

/// Fingerprint an arbitrary list of paths in the same format as
/// [`DependencyTracker::fingerprint`].
pub fn fingerprint_paths<P: AsRef<Path>>(paths: &[P]) -> PipelineResult<String> {
	let lines = paths
		.iter()
		.map(|path| {
			let path = path.as_ref();
			Ok(format!("{}:{}", path.display(), modified_unix_secs(path)?))
		})
		.collect::<PipelineResult<Vec<_>>>()?;

	Ok(lines.join("\n"))
}

/// Recover the dependency paths from a stored fingerprint. Lines without a
/// `:<mtime>` suffix are ignored.
pub fn fingerprint_dependencies(fingerprint: &str) -> Vec<PathBuf> {
	fingerprint
		.lines()
		.filter_map(|line| line.rsplit_once(':'))
		.filter(|(_, secs)| secs.parse::<u64>().is_ok())
		.map(|(path, _)| PathBuf::from(path))
		.collect()
}

/// Compare a stored fingerprint against a freshly computed one.
pub fn is_stale(previous: &str, current: &str) -> bool {
	previous != current
}

fn modified_unix_secs(path: &Path) -> PipelineResult<u64> {
	let modified = std::fs::metadata(path)?.modified()?;
	Ok(modified
		.duration_since(UNIX_EPOCH)
		.map_or(0, |duration| duration.as_secs()))
}
