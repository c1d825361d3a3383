use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::PipelineError;
use crate::PipelineResult;
use crate::filters::Vars;
use crate::pipeline::DEFAULT_MAIN_FILE_NAME;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"assetpipe.toml",
	".assetpipe.toml",
	".config/assetpipe.toml",
];

/// Base directory used when the config does not list any.
pub const DEFAULT_BASE_DIRECTORY: &str = "assets";

/// Configuration loaded from an `assetpipe.toml` file.
///
/// ```toml
/// # Later directories override earlier ones on name collisions.
/// directories = ["assets", "vendor/assets"]
/// main = "application"
/// exclude = ["**/*.bak"]
///
/// [vars]
/// title = "Home"
/// ```
#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
	/// Base directories to index, relative to the project root.
	#[serde(default = "default_directories")]
	pub directories: Vec<PathBuf>,
	/// Logical name of the entry file.
	#[serde(default = "default_main")]
	pub main: String,
	/// Glob patterns of files and directories to leave out of the index.
	#[serde(default)]
	pub exclude: Vec<String>,
	/// Variables passed to every render.
	#[serde(default)]
	pub vars: toml::Table,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			directories: default_directories(),
			main: default_main(),
			exclude: Vec::new(),
			vars: toml::Table::new(),
		}
	}
}

fn default_directories() -> Vec<PathBuf> {
	vec![PathBuf::from(DEFAULT_BASE_DIRECTORY)]
}

fn default_main() -> String {
	DEFAULT_MAIN_FILE_NAME.to_string()
}

impl PipelineConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> PipelineResult<Option<PipelineConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: PipelineConfig =
			toml::from_str(&content).map_err(|e| PipelineError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %config_path.display(), "loaded config");
		Ok(Some(config))
	}

	/// Configured base directories resolved against `root`, in order.
	pub fn base_directories(&self, root: &Path) -> Vec<PathBuf> {
		self.directories
			.iter()
			.map(|directory| root.join(directory))
			.collect()
	}

	/// The `[vars]` table converted to render variables.
	pub fn vars(&self) -> PipelineResult<Vars> {
		self.vars
			.iter()
			.map(|(key, value)| Ok((key.clone(), toml_to_json(value.clone())?)))
			.collect()
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> PipelineResult<serde_json::Value> {
	let json = match value {
		toml::Value::String(s) => serde_json::Value::String(s),
		toml::Value::Integer(i) => serde_json::Value::Number(i.into()),
		toml::Value::Float(f) => {
			serde_json::Value::Number(serde_json::Number::from_f64(f).ok_or_else(|| {
				PipelineError::ConfigParse(format!("unconvertible float value in [vars]: {f}"))
			})?)
		}
		toml::Value::Boolean(b) => serde_json::Value::Bool(b),
		toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: PipelineResult<Vec<serde_json::Value>> =
				arr.into_iter().map(toml_to_json).collect();
			serde_json::Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = serde_json::Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v)?);
			}
			serde_json::Value::Object(map)
		}
	};

	Ok(json)
}
