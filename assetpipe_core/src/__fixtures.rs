use std::path::Path;

use tempfile::TempDir;

use crate::AnyResult;

/// Write `content` to `relative` below `root`, creating parent directories.
pub(crate) fn write_file(root: &Path, relative: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

/// A temporary directory holding the given `(relative path, content)` files.
pub(crate) fn asset_tree(files: &[(&str, &str)]) -> AnyResult<TempDir> {
	let tmp = tempfile::tempdir()?;
	for (relative, content) in files {
		write_file(tmp.path(), relative, content)?;
	}
	Ok(tmp)
}

/// A stylesheet tree where the entry file pulls in a shared reset and every
/// component.
pub(crate) fn stylesheet_tree() -> AnyResult<TempDir> {
	asset_tree(&[
		(
			"application.css",
			"/*\n *= require reset\n *= require_tree components\n */\nbody { margin: 0; }\n",
		),
		("reset.css", "* { box-sizing: border-box; }\n"),
		(
			"components/button.css",
			"/*\n *= require reset\n */\n.button { color: red; }\n",
		),
		("components/card.css", ".card { padding: 1rem; }\n"),
	])
}
