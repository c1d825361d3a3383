mod common;

use assetpipe_cli::parse_var;
use assetpipe_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use rstest::rstest;
use similar_asserts::assert_eq;

#[test]
fn render_prints_the_bundle() -> AnyEmptyResult {
	let tmp = common::stylesheet_project()?;

	let output = common::assetpipe_cmd()
		.arg("render")
		.arg("css")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	assert_eq!(
		String::from_utf8(output.stdout)?,
		"* { box-sizing: border-box; }\n.card { padding: 1rem; }\n/*\n */\nbody { margin: 0; \
		 }\n"
	);

	Ok(())
}

#[test]
fn render_writes_output_and_fingerprint() -> AnyEmptyResult {
	let tmp = common::stylesheet_project()?;
	let output = tmp.path().join("public/application.css");

	common::assetpipe_cmd()
		.arg("render")
		.arg("css")
		.arg("--output")
		.arg(&output)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("2 dependencies"));

	assert!(output.is_file());
	let fingerprint = std::fs::read_to_string(tmp.path().join("public/application.css.deps"))?;
	let lines: Vec<&str> = fingerprint.lines().collect();
	assert_eq!(lines.len(), 2);
	assert!(lines[0].contains("reset.css:"));
	assert!(lines[1].contains("card.css:"));

	Ok(())
}

#[test]
fn render_interpolates_vars_from_config_and_flags() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		tmp.path(),
		"assetpipe.toml",
		"directories = [\"src\"]\nmain = \"theme\"\n\n[vars]\ncolor = \"red\"\nsize = 1\n",
	)?;
	common::write_file(
		tmp.path(),
		"src/theme.css",
		"/*\n *= filter interpolate\n */\na { color: {{ color }}; size: {{ size }}; }\n",
	)?;

	common::assetpipe_cmd()
		.arg("render")
		.arg("css")
		.arg("--var")
		.arg("size=2")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("a { color: red; size: 2; }"));

	Ok(())
}

#[test]
fn render_missing_main_file_fails() -> AnyEmptyResult {
	let tmp = common::stylesheet_project()?;

	common::assetpipe_cmd()
		.arg("render")
		.arg("css")
		.arg("--main")
		.arg("missing")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("missing").and(predicates::str::contains("css")));

	Ok(())
}

#[test]
fn deps_lists_everything_but_the_entry_file() -> AnyEmptyResult {
	let tmp = common::stylesheet_project()?;

	common::assetpipe_cmd()
		.arg("deps")
		.arg("css")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("reset.css")
				.and(predicates::str::contains("card.css"))
				.and(predicates::str::contains("application.css").not()),
		);

	Ok(())
}

#[test]
fn list_shows_types_and_names() -> AnyEmptyResult {
	let tmp = common::stylesheet_project()?;

	let output = common::assetpipe_cmd()
		.arg("list")
		.arg("css")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());
	assert_eq!(
		String::from_utf8(output.stdout)?,
		"application\ncomponents/card\nreset\n"
	);

	common::assetpipe_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("css (3)").and(predicates::str::contains("js (1)")));

	Ok(())
}

#[rstest]
#[case::string("title=Home", "title", serde_json::json!("Home"))]
#[case::number("count=3", "count", serde_json::json!(3))]
#[case::boolean("debug=true", "debug", serde_json::json!(true))]
#[case::equals_in_value("query=a=b", "query", serde_json::json!("a=b"))]
#[case::empty_value("blank=", "blank", serde_json::json!(""))]
fn parse_var_cases(
	#[case] input: &str,
	#[case] key: &str,
	#[case] value: serde_json::Value,
) -> AnyEmptyResult {
	assert_eq!(parse_var(input)?, (key.to_string(), value));
	Ok(())
}

#[rstest]
#[case::missing_equals("title")]
#[case::empty_key("=value")]
fn parse_var_rejects_invalid_input(#[case] input: &str) {
	assert!(parse_var(input).is_err());
}
