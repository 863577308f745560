//! End-to-end tests of the `phonocat` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const MANIFEST: &str = "\
| Link | ISO 639-3 Code | ISO 639 Language Name | Wiktionary Language Name | Script | Dialect | Filtered | Narrow/Broad | # of entries |
|---|---|---|---|---|---|---|---|---|
| [TSV](aar_latn_broad.tsv) | aar | Afar | Afar | Latin | | False | Broad | 2 |
| [TSV](ara_arab_broad.tsv) | ara | Arabic | Arabic | Arabic | | False | Broad | 1 |
| [TSV](arc_syrc_broad.tsv) | arc | Official Aramaic (700-300 BCE) | Aramaic | Syriac | | False | Broad | 1 |
";

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, content: &str| fs::write(dir.path().join(name), content).unwrap();
    write("README.md", MANIFEST);
    write("aar_latn_broad.tsv", "abba\ta b b a\nabe\ta b e\n");
    write("ara_arab_broad.tsv", "كتاب\tk i t a ː b\n");
    write("arc_syrc_broad.tsv", "ܟܬܒܐ\tk θ a β\n");
    dir
}

fn phonocat(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_phonocat"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_validate_clean() {
    let dir = fixture();
    let output = phonocat(dir.path(), &["validate", "README.md", "--format", "json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["errors"], 0);
    assert_eq!(report["indexed"], 3);
    assert_eq!(report["files"].as_array().unwrap().len(), 3);
}

#[test]
fn test_validate_count_mismatch_is_warning() {
    let dir = fixture();
    fs::write(dir.path().join("aar_latn_broad.tsv"), "abba\ta b b a\n").unwrap();

    let output = phonocat(dir.path(), &["validate", "README.md"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("count_mismatch"));

    let output = phonocat(dir.path(), &["validate", "README.md", "--deny-warnings"]);
    assert!(!output.status.success());
}

#[test]
fn test_validate_strict_fails() {
    let dir = fixture();
    fs::write(dir.path().join("arc_syrc_broad.tsv"), "only-one-column\n").unwrap();

    let output = phonocat(dir.path(), &["validate", "README.md"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("schema_violation"));

    let output = phonocat(dir.path(), &["validate", "README.md", "--strict"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("validation failed"));
}

#[test]
fn test_lookup() {
    let dir = fixture();
    let output = phonocat(
        dir.path(),
        &["lookup", "README.md", "aar", "Latin", "--depth", "broad", "--rows", "1", "--format", "csv"],
    );
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("aar_latn_broad.tsv"));
    assert!(text.contains("1,abba,a b b a"));

    let output = phonocat(
        dir.path(),
        &["lookup", "README.md", "aar", "Latin", "--depth", "narrow"],
    );
    assert!(!output.status.success());
    assert!(stdout(&output).contains("no entry for"));
}

#[test]
fn test_languages_excludes_prefix_neighbours() {
    let dir = fixture();
    let output = phonocat(dir.path(), &["languages", "README.md", "ara", "--format", "json"]);
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["language_code"], "ara");
}

#[test]
fn test_query_and_summary() {
    let dir = fixture();
    let output = phonocat(
        dir.path(),
        &["query", "README.md", "--script", "Arabic", "--script", "Syriac", "--format", "json"],
    );
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 2);

    let output = phonocat(dir.path(), &["summary", "README.md", "--format", "json"]);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["datasets"], 3);
    assert_eq!(summary["entries"], 4);
    assert_eq!(summary["languages"], 3);
}

#[test]
fn test_malformed_manifest_exits_non_zero() {
    let dir = fixture();
    fs::write(
        dir.path().join("README.md"),
        MANIFEST.replace("| Latin | | False | Broad | 2 |", "| Latin | | False | | 2 |"),
    )
    .unwrap();

    let output = phonocat(dir.path(), &["summary", "README.md"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed manifest row 1"));
}
