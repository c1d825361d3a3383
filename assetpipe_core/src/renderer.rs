use std::path::Path;
use std::path::PathBuf;

use crate::Depth;
use crate::Pipeline;
use crate::PipelineError;
use crate::PipelineResult;
use crate::filters::Vars;
use crate::filters::normalize_line_endings;
use crate::index::split_logical_name;

/// Turns a logical file into content.
///
/// The renderer is handed the active pipeline so it can look up files,
/// register dependencies, list and mark files, and apply filters while it
/// works. `file` is the logical name joined to its type, e.g.
/// `application.css`.
pub trait Renderer: Send + Sync {
	fn render(&self, pipeline: &mut Pipeline, file: &str, vars: &Vars) -> PipelineResult<String>;
}

impl<F> Renderer for F
where
	F: Fn(&mut Pipeline, &str, &Vars) -> PipelineResult<String> + Send + Sync,
{
	fn render(&self, pipeline: &mut Pipeline, file: &str, vars: &Vars) -> PipelineResult<String> {
		self(pipeline, file, vars)
	}
}

/// A header directive found at the top of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Directive {
	/// `require <name>`: Include a single file of the same type.
	Require(String),
	/// `require_directory <dir>`: Include the files directly inside `dir`.
	RequireDirectory(String),
	/// `require_tree <dir>`: Include every file below `dir`.
	RequireTree(String),
	/// `filter <name>`: Run the file's output through a filter.
	Filter(String),
}

const DIRECTIVE_PREFIXES: [&str; 3] = ["//=", "#=", "*="];
const HEADER_COMMENT_PREFIXES: [&str; 4] = ["//", "/*", "*", "#="];

/// Renders files that declare their own dependencies in a leading comment
/// header:
///
/// ```css
/// /*
///  *= require reset
///  *= require_tree components
///  *= filter trim
///  */
/// body { margin: 0; }
/// ```
///
/// Required files are rendered first, each at most once per session, and
/// concatenated ahead of the file's own body. Every file read is registered
/// as a dependency of the render.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveRenderer;

impl Renderer for DirectiveRenderer {
	fn render(&self, pipeline: &mut Pipeline, file: &str, vars: &Vars) -> PipelineResult<String> {
		let (name, file_type) =
			split_logical_name(file).ok_or_else(|| PipelineError::file_not_found(file, ""))?;
		let path = pipeline.file(name, file_type)?.to_path_buf();
		pipeline.has_processed_file(&path);

		render_path(pipeline, &path, file_type, vars)
	}
}

fn render_path(
	pipeline: &mut Pipeline,
	path: &Path,
	file_type: &str,
	vars: &Vars,
) -> PipelineResult<String> {
	pipeline.add_dependency(path);

	let source = normalize_line_endings(&std::fs::read_to_string(path)?);
	let (directives, body) = parse_header(&source, path)?;
	let mut parts = Vec::new();
	let mut filters = Vec::new();

	for directive in directives {
		match directive {
			Directive::Require(name) => {
				let required = pipeline.file(&name, file_type)?.to_path_buf();
				if !pipeline.has_processed_file(&required) {
					parts.push(render_path(pipeline, &required, file_type, vars)?);
				}
			}
			Directive::RequireDirectory(directory) => {
				render_under(pipeline, &directory, file_type, Depth::Limited(1), vars, &mut parts)?;
			}
			Directive::RequireTree(directory) => {
				render_under(pipeline, &directory, file_type, Depth::Unlimited, vars, &mut parts)?;
			}
			Directive::Filter(name) => filters.push(name),
		}
	}

	parts.push(body);
	let mut content = concat(&parts);

	for filter in &filters {
		content = pipeline.apply_filter(&content, filter, path, vars)?;
	}

	tracing::debug!(file = %path.display(), filters = filters.len(), "rendered file");
	Ok(content)
}

fn render_under(
	pipeline: &mut Pipeline,
	directory: &str,
	file_type: &str,
	depth: Depth,
	vars: &Vars,
	parts: &mut Vec<String>,
) -> PipelineResult<()> {
	pipeline.directory(directory)?;

	for name in pipeline.files_under(directory, file_type, depth) {
		let path: PathBuf = pipeline.file(&name, file_type)?.to_path_buf();
		// An earlier file in this listing may already have required it.
		if pipeline.has_processed_file(&path) {
			continue;
		}
		parts.push(render_path(pipeline, &path, file_type, vars)?);
	}

	Ok(())
}

/// Split `source` into its header directives and the remaining body. Directive
/// lines are removed from the body; every other line is kept.
pub fn parse_header(source: &str, path: &Path) -> PipelineResult<(Vec<Directive>, String)> {
	let mut directives = Vec::new();
	let mut body = Vec::new();
	let mut in_header = true;

	for (index, line) in source.split_inclusive('\n').enumerate() {
		let trimmed = line.trim();

		if in_header {
			if let Some(rest) = DIRECTIVE_PREFIXES
				.iter()
				.find_map(|prefix| trimmed.strip_prefix(prefix))
			{
				directives.push(parse_directive(rest, path, index + 1)?);
				continue;
			}

			in_header = trimmed.is_empty()
				|| HEADER_COMMENT_PREFIXES
					.iter()
					.any(|prefix| trimmed.starts_with(prefix));
		}

		body.push(line);
	}

	Ok((directives, body.concat()))
}

fn parse_directive(text: &str, path: &Path, line: usize) -> PipelineResult<Directive> {
	let invalid = || {
		PipelineError::InvalidDirective {
			file: path.display().to_string(),
			line,
			directive: text.trim().to_string(),
		}
	};

	let mut words = text.split_whitespace();
	let keyword = words.next().ok_or_else(invalid)?;
	let argument = words.next().ok_or_else(invalid)?.to_string();
	if words.next().is_some() {
		return Err(invalid());
	}

	match keyword {
		"require" => Ok(Directive::Require(argument)),
		"require_directory" => Ok(Directive::RequireDirectory(argument)),
		"require_tree" => Ok(Directive::RequireTree(argument)),
		"filter" => Ok(Directive::Filter(argument)),
		_ => Err(invalid()),
	}
}

/// Join rendered parts, inserting a newline only where a part does not
/// already end with one.
fn concat(parts: &[String]) -> String {
	let mut output = String::new();
	for part in parts.iter().filter(|part| !part.is_empty()) {
		if !output.is_empty() && !output.ends_with('\n') {
			output.push('\n');
		}
		output.push_str(part);
	}
	output
}
