use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum PipelineError {
	#[error(transparent)]
	#[diagnostic(code(assetpipe::io_error))]
	Io(#[from] std::io::Error),

	#[error("file not found: `{name}` of type `{file_type}`")]
	#[diagnostic(
		code(assetpipe::file_not_found),
		help("check that `{name}.{file_type}` exists under one of the base directories")
	)]
	FileNotFound { name: String, file_type: String },

	#[error("directory not found: `{0}`")]
	#[diagnostic(code(assetpipe::directory_not_found))]
	DirectoryNotFound(String),

	#[error("there is still a pipeline render running")]
	#[diagnostic(
		code(assetpipe::reentrancy),
		help("only one render may be active per process; wait for it to finish")
	)]
	Reentrancy,

	#[error("there is no pipeline render running")]
	#[diagnostic(code(assetpipe::no_active_render))]
	NoActiveRender,

	#[error("failed to walk `{path}`: {reason}")]
	#[diagnostic(code(assetpipe::walk))]
	Walk { path: String, reason: String },

	#[error("unknown filter: `{0}`")]
	#[diagnostic(
		code(assetpipe::unknown_filter),
		help("built-in filters: trim, normalize_newlines, interpolate")
	)]
	UnknownFilter(String),

	#[error("filter `{name}` failed: {reason}")]
	#[diagnostic(code(assetpipe::filter))]
	Filter { name: String, reason: String },

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(assetpipe::template_render))]
	TemplateRender(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(assetpipe::config_parse),
		help("check that assetpipe.toml is valid TOML with `directories`, `main` and `[vars]`")
	)]
	ConfigParse(String),

	#[error("invalid directive `{directive}` in {file} on line {line}")]
	#[diagnostic(
		code(assetpipe::invalid_directive),
		help("supported directives: require, require_directory, require_tree, filter")
	)]
	InvalidDirective {
		file: String,
		line: usize,
		directive: String,
	},
}

impl PipelineError {
	pub(crate) fn file_not_found(name: impl Into<String>, file_type: impl Into<String>) -> Self {
		Self::FileNotFound {
			name: name.into(),
			file_type: file_type.into(),
		}
	}
}

pub type PipelineResult<T> = Result<T, PipelineError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
