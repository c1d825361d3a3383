use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::DirectiveRenderer;
use crate::PipelineError;
use crate::PipelineResult;
use crate::Renderer;
use crate::config::PipelineConfig;
use crate::dependencies::DependencyTracker;
use crate::filters::FilterRegistry;
use crate::filters::Vars;
use crate::guard::PipelineId;
use crate::guard::RenderGuard;
use crate::guard::current_render;
use crate::index::AssetIndex;
use crate::index::build_exclude_set;

/// Logical name of the entry file when none is given to
/// [`Pipeline::process`].
pub const DEFAULT_MAIN_FILE_NAME: &str = "application";

/// How deep [`Pipeline::files_under`] looks below the requested directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Depth {
	#[default]
	Unlimited,
	/// Only names with at most this many `/`-separated segments below the
	/// directory.
	Limited(usize),
}

/// Result of [`Pipeline::directory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryLookup<'a> {
	/// The root of the base directories. It always exists but has no single
	/// path.
	Root,
	Path(&'a Path),
}

/// Indexes a set of base directories and renders entry files out of them.
///
/// A pipeline is meant for one logical render session: processed files and
/// dependencies accumulate across calls to [`Pipeline::process`] and are only
/// cleared by [`Pipeline::reset`].
pub struct Pipeline {
	id: PipelineId,
	base_directories: Vec<PathBuf>,
	index: AssetIndex,
	processed_files: HashSet<PathBuf>,
	dependencies: DependencyTracker,
	main_file_name: String,
	filters: Arc<FilterRegistry>,
	renderer: Arc<dyn Renderer>,
}

impl fmt::Debug for Pipeline {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Pipeline")
			.field("id", &self.id)
			.field("base_directories", &self.base_directories)
			.field("main_file_name", &self.main_file_name)
			.field("files", &self.index.file_count())
			.field("processed_files", &self.processed_files.len())
			.field("dependencies", &self.dependencies.paths().len())
			.field("dependencies_initialized", &self.dependencies.is_initialized())
			.finish_non_exhaustive()
	}
}

impl Pipeline {
	/// Index the given base directories with the default renderer and the
	/// shared filter registry. Pass a one-element array for a single
	/// directory.
	pub fn new<I, P>(base_directories: I) -> PipelineResult<Self>
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		Self::builder().base_directories(base_directories).build()
	}

	pub fn builder() -> PipelineBuilder {
		PipelineBuilder::default()
	}

	/// Build a pipeline from a loaded `assetpipe.toml`. Relative directories
	/// are resolved against `root`.
	pub fn from_config(root: &Path, config: &PipelineConfig) -> PipelineResult<Self> {
		Self::builder()
			.base_directories(config.base_directories(root))
			.exclude(config.exclude.iter().cloned())
			.main_file_name(&config.main)
			.build()
	}

	pub fn id(&self) -> PipelineId {
		self.id
	}

	pub fn base_directories(&self) -> &[PathBuf] {
		&self.base_directories
	}

	pub fn index(&self) -> &AssetIndex {
		&self.index
	}

	pub fn main_file_name(&self) -> &str {
		&self.main_file_name
	}

	pub fn filters(&self) -> &FilterRegistry {
		&self.filters
	}

	pub fn has_file(&self, name: &str, file_type: &str) -> bool {
		self.index.has_file(name, file_type)
	}

	/// Absolute path of the file with the given logical name and type.
	pub fn file(&self, name: &str, file_type: &str) -> PipelineResult<&Path> {
		self.index
			.file(name, file_type)
			.ok_or_else(|| PipelineError::file_not_found(name, file_type))
	}

	/// Path of the entry file for `file_type`.
	pub fn main_file(&self, file_type: &str) -> PipelineResult<&Path> {
		self.file(&self.main_file_name, file_type)
	}

	/// Names made only of `/` and `.` (including the empty name) refer to the
	/// root and always exist. A trailing `/` is ignored, as in
	/// [`Pipeline::files_under`].
	pub fn has_directory(&self, name: &str) -> bool {
		is_root_name(name) || self.index.has_directory(name.trim_end_matches('/'))
	}

	pub fn directory(&self, name: &str) -> PipelineResult<DirectoryLookup<'_>> {
		if is_root_name(name) {
			return Ok(DirectoryLookup::Root);
		}

		self.index
			.directory(name.trim_end_matches('/'))
			.map(DirectoryLookup::Path)
			.ok_or_else(|| PipelineError::DirectoryNotFound(name.to_string()))
	}

	/// Mark `path` as processed, returning whether it already was.
	pub fn has_processed_file(&mut self, path: impl AsRef<Path>) -> bool {
		let path = path.as_ref();
		if self.processed_files.contains(path) {
			return true;
		}

		self.processed_files.insert(path.to_path_buf());
		false
	}

	/// Logical names of unprocessed files of `file_type` below `directory`, in
	/// index order.
	///
	/// Depth counts the `/`-separated segments left in a name once the
	/// directory prefix is removed, so below `a` the name `a/b` has depth 1 and
	/// `a/b/c` depth 2.
	pub fn files_under(&self, directory: &str, file_type: &str, depth: Depth) -> Vec<String> {
		let Some(files) = self.index.files_of(file_type) else {
			return Vec::new();
		};
		let prefix = if is_root_name(directory) {
			""
		} else {
			directory.trim_end_matches('/')
		};

		files
			.iter()
			.filter(|(_, path)| !self.processed_files.contains(*path))
			.filter_map(|(name, _)| {
				let remainder = name.strip_prefix(prefix)?;
				if !prefix.is_empty() && !remainder.is_empty() && !remainder.starts_with('/') {
					return None;
				}

				let segments = remainder.trim_matches('/').split('/').count();
				match depth {
					Depth::Limited(limit) if segments > limit => None,
					_ => Some(name.to_string()),
				}
			})
			.collect()
	}

	/// Register a file read during the render. The first path ever registered
	/// is the file being rendered and is not recorded.
	pub fn add_dependency(&mut self, path: impl Into<PathBuf>) {
		self.dependencies.add(path);
	}

	pub fn dependencies(&self) -> &[PathBuf] {
		self.dependencies.paths()
	}

	/// The staleness fingerprint of every recorded dependency.
	pub fn dependencies_file_content(&self) -> PipelineResult<String> {
		self.dependencies.fingerprint()
	}

	/// Forget processed files and dependencies so the pipeline can start a new
	/// render session.
	pub fn reset(&mut self) {
		self.processed_files.clear();
		self.dependencies.clear();
	}

	/// Render the entry file of `file_type`.
	///
	/// When `main_file` is given it replaces the entry name for this and every
	/// later call. Fails with [`PipelineError::Reentrancy`] when any pipeline
	/// in the process is already rendering.
	pub fn process(
		&mut self,
		file_type: &str,
		main_file: Option<&str>,
		vars: &Vars,
	) -> PipelineResult<String> {
		let _guard = RenderGuard::acquire(self.id)?;

		if let Some(main_file) = main_file.filter(|name| !name.is_empty()) {
			main_file.clone_into(&mut self.main_file_name);
		}

		let file = format!("{}.{file_type}", self.main_file_name);
		tracing::debug!(pipeline = %self.id, file = %file, "rendering");

		let renderer = Arc::clone(&self.renderer);
		renderer.render(self, &file, vars)
	}

	/// Whether this pipeline currently holds the render slot.
	pub fn is_rendering(&self) -> bool {
		current_render().is_ok_and(|id| id == self.id)
	}

	/// Run `content` through the named filter.
	pub fn apply_filter(
		&self,
		content: &str,
		filter: &str,
		file: &Path,
		vars: &Vars,
	) -> PipelineResult<String> {
		tracing::trace!(filter, file = %file.display(), "applying filter");
		self.filters.get(filter)?.apply(content, file, vars)
	}
}

#[derive(Default)]
pub struct PipelineBuilder {
	base_directories: Vec<PathBuf>,
	exclude: Vec<String>,
	main_file_name: Option<String>,
	filters: Option<Arc<FilterRegistry>>,
	renderer: Option<Arc<dyn Renderer>>,
}

impl PipelineBuilder {
	#[must_use]
	pub fn base_directory(mut self, directory: impl Into<PathBuf>) -> Self {
		self.base_directories.push(directory.into());
		self
	}

	#[must_use]
	pub fn base_directories<I, P>(mut self, directories: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		self.base_directories
			.extend(directories.into_iter().map(Into::into));
		self
	}

	/// Glob patterns, relative to each base directory, of entries to leave out
	/// of the index.
	#[must_use]
	pub fn exclude<I, S>(mut self, patterns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.exclude.extend(patterns.into_iter().map(Into::into));
		self
	}

	#[must_use]
	pub fn main_file_name(mut self, name: impl Into<String>) -> Self {
		self.main_file_name = Some(name.into());
		self
	}

	#[must_use]
	pub fn filters(mut self, filters: Arc<FilterRegistry>) -> Self {
		self.filters = Some(filters);
		self
	}

	#[must_use]
	pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
		self.renderer = Some(Arc::new(renderer));
		self
	}

	/// Index the base directories and create the pipeline.
	pub fn build(self) -> PipelineResult<Pipeline> {
		let exclude = build_exclude_set(&self.exclude);
		let index = AssetIndex::build(&self.base_directories, &exclude)?;
		let id = PipelineId::next();

		tracing::debug!(
			pipeline = %id,
			base_directories = self.base_directories.len(),
			files = index.file_count(),
			"created pipeline"
		);

		Ok(Pipeline {
			id,
			base_directories: self.base_directories,
			index,
			processed_files: HashSet::new(),
			dependencies: DependencyTracker::new(),
			main_file_name: self
				.main_file_name
				.unwrap_or_else(|| DEFAULT_MAIN_FILE_NAME.to_string()),
			filters: self.filters.unwrap_or_else(FilterRegistry::shared),
			renderer: self
				.renderer
				.unwrap_or_else(|| Arc::new(DirectiveRenderer)),
		})
	}
}

fn is_root_name(name: &str) -> bool {
	name.trim_matches(|c| c == '/' || c == '.').is_empty()
}
