#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

#[test]
fn envelope_json_output_has_archive_metadata() {
	let json = run_json(vec!["envelope".to_owned(), fixture_path("pairing_record.json").display().to_string()]);

	assert_eq!(json["$archiver"], "NSKeyedArchiver");
	assert_eq!(json["$version"], 100_000);
	assert!(json["$top"]["root"]["$uid"].as_u64().is_some(), "expected root reference in $top");

	let objects = json["$objects"].as_array().expect("expected $objects array");
	assert_eq!(objects[0], "$null");
	assert!(objects.iter().any(|item| item.as_str() == Some("pairing-host")));
}

#[test]
fn envelope_deduplicates_repeated_service_names() {
	let json = run_json(vec!["envelope".to_owned(), fixture_path("pairing_record.json").display().to_string()]);

	let objects = json["$objects"].as_array().expect("expected $objects array");
	let lockdown_slots = objects.iter().filter(|item| **item == serde_json::json!("lockdown")).count();
	assert_eq!(lockdown_slots, 1, "repeated strings should share one slot");
}

#[test]
fn archive_json_summary_reports_written_bytes() {
	let output = std::env::temp_dir().join("keyarchive_unit_cli.plist");
	let json = run_json(vec![
		"archive".to_owned(),
		fixture_path("pairing_record.json").display().to_string(),
		"--format".to_owned(),
		"binary".to_owned(),
		"--output".to_owned(),
		output.display().to_string(),
		"--json".to_owned(),
	]);

	assert_eq!(json["format"], "binary");
	assert!(json["bytes"].as_u64().is_some_and(|count| count > 8));

	let written = std::fs::read(&output).expect("output file exists");
	assert!(written.starts_with(b"bplist00"));
	let _ = std::fs::remove_file(&output);
}

fn run_json(args: Vec<String>) -> Value {
	let output = Command::new(env!("CARGO_BIN_EXE_keyarchive")).args(&args).output().expect("command executes");

	assert!(output.status.success(), "command should succeed");
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn fixture_path(name: &str) -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}
