#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;

pub fn assetpipe_cmd() -> Command {
	let mut cmd = Command::cargo_bin("assetpipe").unwrap_or_else(|e| panic!("{e}"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("ASSETPIPE_LOG");
	cmd
}

/// Write `content` to `relative` below `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

/// A project with an `assets/` directory holding a stylesheet bundle and a
/// script.
pub fn stylesheet_project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	write_file(
		tmp.path(),
		"assets/application.css",
		"/*\n *= require reset\n *= require_tree components\n */\nbody { margin: 0; }\n",
	)?;
	write_file(tmp.path(), "assets/reset.css", "* { box-sizing: border-box; }\n")?;
	write_file(
		tmp.path(),
		"assets/components/card.css",
		".card { padding: 1rem; }\n",
	)?;
	write_file(tmp.path(), "assets/application.js", "console.log(1);\n")?;
	Ok(tmp)
}
