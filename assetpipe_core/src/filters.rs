use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::OnceLock;

use crate::PipelineError;
use crate::PipelineResult;

/// Variables made available to the renderer and to every filter during a
/// render.
pub type Vars = HashMap<String, serde_json::Value>;

/// A named transformation applied to rendered content.
pub trait Filter: Send + Sync {
	fn apply(&self, content: &str, file: &Path, vars: &Vars) -> PipelineResult<String>;
}

impl<F> Filter for F
where
	F: Fn(&str, &Path, &Vars) -> PipelineResult<String> + Send + Sync,
{
	fn apply(&self, content: &str, file: &Path, vars: &Vars) -> PipelineResult<String> {
		self(content, file, vars)
	}
}

type FilterFactory = Box<dyn Fn() -> Arc<dyn Filter> + Send + Sync>;

struct FilterEntry {
	factory: FilterFactory,
	instance: OnceLock<Arc<dyn Filter>>,
}

impl FilterEntry {
	fn new(factory: FilterFactory) -> Self {
		Self {
			factory,
			instance: OnceLock::new(),
		}
	}

	fn get(&self) -> Arc<dyn Filter> {
		Arc::clone(self.instance.get_or_init(|| (self.factory)()))
	}
}

/// Maps filter names to factories. Each filter is constructed on first use and
/// the instance is reused for the lifetime of the registry.
pub struct FilterRegistry {
	entries: BTreeMap<String, FilterEntry>,
}

impl fmt::Debug for FilterRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FilterRegistry")
			.field("filters", &self.names())
			.finish()
	}
}

impl FilterRegistry {
	pub fn builder() -> FilterRegistryBuilder {
		FilterRegistryBuilder::default()
	}

	/// The process-wide registry holding the built-in filters. Pipelines use it
	/// unless given a registry of their own.
	pub fn shared() -> Arc<Self> {
		static SHARED: OnceLock<Arc<FilterRegistry>> = OnceLock::new();
		Arc::clone(SHARED.get_or_init(|| Arc::new(Self::builder().with_builtins().build())))
	}

	/// Resolve a filter by name, constructing it if this is its first use.
	pub fn get(&self, name: &str) -> PipelineResult<Arc<dyn Filter>> {
		self.entries
			.get(name)
			.map(FilterEntry::get)
			.ok_or_else(|| PipelineError::UnknownFilter(name.to_string()))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Registered filter names in sorted order.
	pub fn names(&self) -> Vec<&str> {
		self.entries.keys().map(String::as_str).collect()
	}

	/// Whether the named filter has been constructed yet.
	pub fn is_instantiated(&self, name: &str) -> bool {
		self.entries
			.get(name)
			.is_some_and(|entry| entry.instance.get().is_some())
	}
}

#[derive(Default)]
pub struct FilterRegistryBuilder {
	entries: BTreeMap<String, FilterEntry>,
}

impl FilterRegistryBuilder {
	/// Register a factory. A later registration under the same name replaces
	/// the earlier one.
	#[must_use]
	pub fn register<F, T>(mut self, name: impl Into<String>, factory: F) -> Self
	where
		F: Fn() -> T + Send + Sync + 'static,
		T: Filter + 'static,
	{
		let factory: FilterFactory = Box::new(move || -> Arc<dyn Filter> { Arc::new(factory()) });
		self.entries.insert(name.into(), FilterEntry::new(factory));
		self
	}

	/// Register an already constructed filter.
	#[must_use]
	pub fn register_instance(mut self, name: impl Into<String>, filter: Arc<dyn Filter>) -> Self {
		let entry = FilterEntry::new(Box::new(move || Arc::clone(&filter)));
		self.entries.insert(name.into(), entry);
		self
	}

	#[must_use]
	pub fn with_builtins(self) -> Self {
		self.register("trim", || Trim)
			.register("normalize_newlines", || NormalizeNewlines)
			.register("interpolate", || Interpolate)
	}

	pub fn build(self) -> FilterRegistry {
		FilterRegistry {
			entries: self.entries,
		}
	}
}

/// Strip leading and trailing whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trim;

impl Filter for Trim {
	fn apply(&self, content: &str, _file: &Path, _vars: &Vars) -> PipelineResult<String> {
		Ok(content.trim().to_string())
	}
}

/// Convert CRLF and lone CR line endings to LF.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeNewlines;

impl Filter for NormalizeNewlines {
	fn apply(&self, content: &str, _file: &Path, _vars: &Vars) -> PipelineResult<String> {
		Ok(normalize_line_endings(content))
	}
}

/// Substitute `{{ name }}` placeholders with render variables. Unknown names
/// are an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpolate;

impl Filter for Interpolate {
	fn apply(&self, content: &str, _file: &Path, vars: &Vars) -> PipelineResult<String> {
		render_template(content, vars)
	}
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Render content through minijinja using the given variables. Content without
/// template syntax is returned unchanged. A placeholder naming a variable that
/// is not set fails with [`PipelineError::TemplateRender`], whatever other
/// variables are present.
#[allow(clippy::implicit_hasher)]
pub fn render_template(content: &str, vars: &Vars) -> PipelineResult<String> {
	if !has_template_syntax(content) {
		return Ok(content.to_string());
	}

	let mut env = minijinja::Environment::new();
	env.set_keep_trailing_newline(true);
	env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
	env.add_template("__inline__", content)
		.map_err(|e| PipelineError::TemplateRender(e.to_string()))?;

	let template = env
		.get_template("__inline__")
		.map_err(|e| PipelineError::TemplateRender(e.to_string()))?;

	let ctx = minijinja::Value::from_serialize(vars);
	template
		.render(ctx)
		.map_err(|e| PipelineError::TemplateRender(e.to_string()))
}

fn has_template_syntax(content: &str) -> bool {
	content.contains("{{") || content.contains("{%") || content.contains("{#")
}
