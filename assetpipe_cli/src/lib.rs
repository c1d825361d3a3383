use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compile asset bundles from indexed source directories.",
	long_about = "assetpipe indexes one or more asset directories by logical name and type, then \
	              renders an entry file by following the `require` directives in its comment \
	              header.\n\nQuick start:\n  assetpipe list          Show every indexed file\n  \
	              assetpipe render css    Render `application.css`\n  assetpipe check out.css \
	              Verify a rendered bundle is still fresh"
)]
pub struct AssetpipeCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Render the entry file of a type.
	///
	/// Looks up the main file (`application` unless configured otherwise) with
	/// the given type and renders it, pulling in every file its header
	/// requires. With `--output` the result is written to disk together with a
	/// `<output>.deps` fingerprint used by `assetpipe check`.
	Render {
		/// The file type to render, e.g. `css` or `js`.
		file_type: String,

		/// Logical name of the entry file. Overrides `main` from
		/// `assetpipe.toml`.
		#[arg(long)]
		main: Option<String>,

		/// A render variable as `key=value`. Values are parsed as JSON when
		/// possible and used as plain strings otherwise. May be repeated.
		#[arg(long = "var", value_parser = parse_var)]
		vars: Vec<(String, serde_json::Value)>,

		/// Write the rendered content to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// Print the files the entry file of a type depends on.
	///
	/// Renders the entry file and lists every file that was read, except the
	/// entry file itself.
	Deps {
		/// The file type to render.
		file_type: String,

		/// Logical name of the entry file.
		#[arg(long)]
		main: Option<String>,
	},
	/// Check whether a rendered file is stale.
	///
	/// Compares the `<output>.deps` fingerprint written by `assetpipe render
	/// --output` against the current modification times of the recorded
	/// dependencies. Exits with a non-zero status code when anything changed.
	Check {
		/// The rendered file whose fingerprint should be checked.
		output: PathBuf,
	},
	/// List indexed files.
	///
	/// Without a type, prints every type followed by its logical names. With a
	/// type, prints only the names of that type in index order.
	List {
		/// Only list files of this type.
		file_type: Option<String>,
	},
}

/// Parse a `key=value` render variable.
pub fn parse_var(input: &str) -> Result<(String, serde_json::Value), String> {
	let (key, value) = input
		.split_once('=')
		.ok_or_else(|| format!("invalid variable `{input}`: expected `key=value`"))?;

	if key.is_empty() {
		return Err(format!("invalid variable `{input}`: the key is empty"));
	}

	let value = serde_json::from_str(value)
		.unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

	Ok((key.to_string(), value))
}
