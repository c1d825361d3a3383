mod common;

use std::time::Duration;
use std::time::SystemTime;

use assetpipe_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

fn render_to(tmp: &std::path::Path, output: &std::path::Path) {
	common::assetpipe_cmd()
		.arg("render")
		.arg("css")
		.arg("--output")
		.arg(output)
		.arg("--path")
		.arg(tmp)
		.assert()
		.success();
}

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let tmp = common::stylesheet_project()?;
	let output = tmp.path().join("application.css");
	render_to(tmp.path(), &output);

	common::assetpipe_cmd()
		.arg("check")
		.arg(&output)
		.assert()
		.success()
		.stdout(predicates::str::contains("up to date"));

	Ok(())
}

#[test]
fn check_fails_when_a_dependency_changes() -> AnyEmptyResult {
	let tmp = common::stylesheet_project()?;
	let output = tmp.path().join("application.css");
	render_to(tmp.path(), &output);

	let reset = std::fs::File::options()
		.write(true)
		.open(tmp.path().join("assets/reset.css"))?;
	reset.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))?;
	drop(reset);

	common::assetpipe_cmd()
		.arg("check")
		.arg(&output)
		.assert()
		.code(1)
		.stderr(
			predicates::str::contains("is stale")
				.and(predicates::str::contains("reset.css:1000000")),
		);

	Ok(())
}

#[test]
fn check_fails_when_a_dependency_is_removed() -> AnyEmptyResult {
	let tmp = common::stylesheet_project()?;
	let output = tmp.path().join("application.css");
	render_to(tmp.path(), &output);

	std::fs::remove_file(tmp.path().join("assets/components/card.css"))?;

	common::assetpipe_cmd()
		.arg("check")
		.arg(&output)
		.assert()
		.code(1)
		.stderr(predicates::str::contains("no longer exists"));

	Ok(())
}

#[test]
fn check_without_fingerprint_errors() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::assetpipe_cmd()
		.arg("check")
		.arg(tmp.path().join("never-rendered.css"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("could not read fingerprint"));

	Ok(())
}
