use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use assetpipe_cli::AssetpipeCli;
use assetpipe_cli::Commands;
use assetpipe_core::Pipeline;
use assetpipe_core::PipelineError;
use assetpipe_core::Vars;
use assetpipe_core::config::PipelineConfig;
use assetpipe_core::fingerprint_dependencies;
use assetpipe_core::fingerprint_paths;
use assetpipe_core::is_stale;
use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
	let args = AssetpipeCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Render {
			file_type,
			main,
			vars,
			output,
		}) => run_render(&args, file_type, main.as_deref(), vars, output.as_deref()),
		Some(Commands::Deps { file_type, main }) => run_deps(&args, file_type, main.as_deref()),
		Some(Commands::Check { output }) => run_check(output),
		Some(Commands::List { file_type }) => run_list(&args, file_type.as_deref()),
		None => {
			eprintln!("No subcommand specified. Run `assetpipe --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<PipelineError>() {
				Ok(pipeline_err) => {
					let report: miette::Report = (*pipeline_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr. `ASSETPIPE_LOG` takes an `EnvFilter` directive and
/// `--verbose` forces `debug`.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_env("ASSETPIPE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &AssetpipeCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Load `assetpipe.toml` (or the defaults) and index the configured
/// directories.
fn load_pipeline(args: &AssetpipeCli) -> CliResult<(Pipeline, Vars)> {
	let root = resolve_root(args);
	let config = PipelineConfig::load(&root)?.unwrap_or_default();
	let vars = config.vars()?;
	let pipeline = Pipeline::from_config(&root, &config)?;

	Ok((pipeline, vars))
}

fn run_render(
	args: &AssetpipeCli,
	file_type: &str,
	main: Option<&str>,
	cli_vars: &[(String, serde_json::Value)],
	output: Option<&Path>,
) -> CliResult<bool> {
	let (mut pipeline, mut vars) = load_pipeline(args)?;
	vars.extend(cli_vars.iter().cloned());

	let content = pipeline.process(file_type, main, &vars)?;

	let Some(output) = output else {
		print!("{content}");
		return Ok(true);
	};

	let fingerprint = pipeline.dependencies_file_content()?;
	if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(output, &content)?;
	std::fs::write(deps_path(output), fingerprint)?;

	println!(
		"{} {} ({} dependencies)",
		colored!("Rendered", green),
		output.display(),
		pipeline.dependencies().len()
	);

	Ok(true)
}

fn run_deps(args: &AssetpipeCli, file_type: &str, main: Option<&str>) -> CliResult<bool> {
	let root = resolve_root(args);
	let (mut pipeline, vars) = load_pipeline(args)?;
	pipeline.process(file_type, main, &vars)?;

	for path in pipeline.dependencies() {
		println!("{}", make_relative(path, &root));
	}

	Ok(true)
}

/// Returns `false` when the output is stale.
fn run_check(output: &Path) -> CliResult<bool> {
	let deps = deps_path(output);
	let previous = std::fs::read_to_string(&deps)
		.map_err(|e| format!("could not read fingerprint {}: {e}", deps.display()))?;
	let paths = fingerprint_dependencies(&previous);

	let current = match fingerprint_paths(&paths) {
		Ok(current) => current,
		Err(PipelineError::Io(e)) if e.kind() == ErrorKind::NotFound => {
			eprintln!(
				"{} {} is stale: a dependency no longer exists.",
				colored!("Check failed:", red),
				output.display()
			);
			return Ok(false);
		}
		Err(e) => return Err(e.into()),
	};

	if !is_stale(&previous, &current) {
		println!("Check passed: {} is up to date.", output.display());
		return Ok(true);
	}

	eprintln!(
		"{} {} is stale.",
		colored!("Check failed:", red),
		output.display()
	);
	print_diff(&previous, &current);

	Ok(false)
}

fn run_list(args: &AssetpipeCli, file_type: Option<&str>) -> CliResult<bool> {
	let (pipeline, _) = load_pipeline(args)?;
	let index = pipeline.index();

	if let Some(file_type) = file_type {
		for (name, _) in index.files_of(file_type).into_iter().flat_map(|files| files.iter()) {
			println!("{name}");
		}
		return Ok(true);
	}

	if index.file_count() == 0 {
		println!("No files indexed.");
		return Ok(true);
	}

	for file_type in index.types() {
		let Some(files) = index.files_of(file_type) else {
			continue;
		};
		println!("{} ({})", colored!(file_type, bold), files.len());
		for (name, _) in files.iter() {
			println!("  {name}");
		}
	}

	Ok(true)
}

fn deps_path(output: &Path) -> PathBuf {
	let mut path = output.as_os_str().to_owned();
	path.push(".deps");
	PathBuf::from(path)
}

/// Print a unified diff between two strings, colorized.
fn print_diff(previous: &str, current: &str) {
	let diff = TextDiff::from_lines(previous, current);
	for change in diff.iter_all_changes() {
		let line = change.value().trim_end_matches('\n');
		match change.tag() {
			ChangeTag::Delete => {
				eprintln!("  {}", colored!(format!("-{line}"), red));
			}
			ChangeTag::Insert => {
				eprintln!("  {}", colored!(format!("+{line}"), green));
			}
			ChangeTag::Equal => {
				eprintln!("   {line}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
	path.strip_prefix(&root)
		.unwrap_or(path)
		.display()
		.to_string()
}
