use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use walkdir::WalkDir;

use crate::PipelineError;
use crate::PipelineResult;

/// Logical names of a single type mapped to their absolute paths, in the
/// order they were first indexed.
///
/// Re-inserting an existing name replaces its path but keeps its original
/// position, so the iteration order always reflects first discovery.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
	entries: Vec<(String, PathBuf)>,
	positions: HashMap<String, usize>,
}

impl TypeIndex {
	pub(crate) fn insert(&mut self, name: String, path: PathBuf) {
		if let Some(&position) = self.positions.get(&name) {
			self.entries[position].1 = path;
			return;
		}

		self.positions.insert(name.clone(), self.entries.len());
		self.entries.push((name, path));
	}

	pub fn get(&self, name: &str) -> Option<&Path> {
		self.positions
			.get(name)
			.map(|&position| self.entries[position].1.as_path())
	}

	pub fn contains(&self, name: &str) -> bool {
		self.positions.contains_key(name)
	}

	/// Iterate `(logical name, absolute path)` pairs in index order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
		self.entries
			.iter()
			.map(|(name, path)| (name.as_str(), path.as_path()))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// A point-in-time snapshot of every file and directory below a set of base
/// directories.
#[derive(Debug, Clone, Default)]
pub struct AssetIndex {
	files: HashMap<String, TypeIndex>,
	directories: HashMap<String, PathBuf>,
}

impl AssetIndex {
	/// Walk each base directory in order and index its contents.
	///
	/// Children are visited before their parent directory. Symbolic links are
	/// neither indexed nor traversed. When two files share a type and logical
	/// name the one found in the later base directory wins. Entries matching an
	/// exclusion pattern, and everything below an excluded directory, are left
	/// out.
	pub fn build(base_directories: &[PathBuf], exclude: &GlobSet) -> PipelineResult<Self> {
		let mut index = Self::default();

		for base_directory in base_directories {
			let base = std::path::absolute(base_directory)?;
			let walker = WalkDir::new(&base)
				.follow_links(false)
				.contents_first(true)
				.min_depth(1)
				.sort_by_file_name();

			let mut file_count = 0usize;
			let mut directory_count = 0usize;

			for entry in walker {
				let entry = entry.map_err(|e| {
					PipelineError::Walk {
						path: base.display().to_string(),
						reason: e.to_string(),
					}
				})?;

				if entry.path_is_symlink() {
					continue;
				}

				let relative = relative_key(&base, entry.path());
				if is_excluded(&relative, exclude) {
					continue;
				}

				if entry.file_type().is_dir() {
					index.directories.insert(relative, entry.path().to_path_buf());
					directory_count += 1;
					continue;
				}

				let Some((name, file_type)) = split_logical_name(&relative) else {
					tracing::warn!(file = %entry.path().display(), "skipping file without a type");
					continue;
				};

				index
					.files
					.entry(file_type.to_string())
					.or_default()
					.insert(name.to_string(), entry.path().to_path_buf());
				file_count += 1;
			}

			tracing::debug!(
				base = %base.display(),
				files = file_count,
				directories = directory_count,
				"indexed base directory"
			);
		}

		Ok(index)
	}

	pub fn file(&self, name: &str, file_type: &str) -> Option<&Path> {
		self.files.get(file_type)?.get(name)
	}

	pub fn has_file(&self, name: &str, file_type: &str) -> bool {
		self.files
			.get(file_type)
			.is_some_and(|files| files.contains(name))
	}

	/// All files of the given type, or `None` when no file of that type was
	/// indexed.
	pub fn files_of(&self, file_type: &str) -> Option<&TypeIndex> {
		self.files.get(file_type)
	}

	/// Indexed types in sorted order.
	pub fn types(&self) -> Vec<&str> {
		let mut types: Vec<&str> = self.files.keys().map(String::as_str).collect();
		types.sort_unstable();
		types
	}

	pub fn directory(&self, name: &str) -> Option<&Path> {
		self.directories.get(name).map(PathBuf::as_path)
	}

	pub fn has_directory(&self, name: &str) -> bool {
		self.directories.contains_key(name)
	}

	pub fn directories(&self) -> impl Iterator<Item = (&str, &Path)> {
		self.directories
			.iter()
			.map(|(name, path)| (name.as_str(), path.as_path()))
	}

	pub fn file_count(&self) -> usize {
		self.files.values().map(TypeIndex::len).sum()
	}
}

/// Split a relative file path into its logical name and type.
///
/// The basename is split on its first `.`. The type is the component directly
/// after that dot, so `lib/jquery.min.js` yields `("lib/jquery", "min")`.
/// Returns `None` when the basename has no dot or the type is empty.
pub fn split_logical_name(relative: &str) -> Option<(&str, &str)> {
	let basename_start = relative.rfind('/').map_or(0, |slash| slash + 1);
	let dot = basename_start + relative[basename_start..].find('.')?;
	let rest = &relative[dot + 1..];
	let file_type = rest.split_once('.').map_or(rest, |(file_type, _)| file_type);

	if file_type.is_empty() {
		return None;
	}

	Some((&relative[..dot], file_type))
}

/// Build a `GlobSet` from a list of exclusion patterns. Invalid patterns are
/// ignored.
pub fn build_exclude_set(patterns: &[String]) -> GlobSet {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		match Glob::new(pattern) {
			Ok(glob) => {
				builder.add(glob);
			}
			Err(e) => tracing::warn!(pattern = %pattern, error = %e, "ignoring invalid exclude pattern"),
		}
	}
	builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// An entry is excluded when its relative path or any of its parent
/// directories matches a pattern.
fn is_excluded(relative: &str, exclude: &GlobSet) -> bool {
	!exclude.is_empty()
		&& Path::new(relative)
			.ancestors()
			.filter(|ancestor| !ancestor.as_os_str().is_empty())
			.any(|ancestor| exclude.is_match(ancestor))
}

fn relative_key(base: &Path, path: &Path) -> String {
	path.strip_prefix(base)
		.unwrap_or(path)
		.to_string_lossy()
		.replace('\\', "/")
}
