//! Integration tests for loading and querying a registry.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use phonocat_core::{
    Depth, EntryKey, Error, Query, Registry, RegistryConfig, Severity, ValidationIssue,
    ValidationMode,
};

struct TestContext {
    dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Write `rows` lines whose words are in the script named by the file.
    fn write_rows(&self, name: &str, rows: usize) {
        let stem = if name.contains("_arab_") {
            "كتاب"
        } else if name.contains("_syrc_") {
            "ܟܬܒܐ"
        } else {
            "w"
        };
        let content: String = (0..rows).map(|i| format!("{stem}{i}\tt {i}\n")).collect();
        self.write(name, &content);
    }

    fn manifest(&self, rows: &[&str]) {
        let mut text = String::from(
            "# Languages\n\n\
             | Link | ISO 639-3 Code | ISO 639 Language Name | Wiktionary Language Name | Script | Dialect | Filtered | Narrow/Broad | # of entries |\n\
             | :---- | :----: | :----: | :----: | :----: | :----: | :----: | :----: | :----: |\n",
        );
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        self.write("README.md", &text);
    }

    fn load(&self) -> Result<Registry, Error> {
        Registry::load(self.path().join("README.md"))
    }

    fn load_with(&self, config: RegistryConfig) -> Result<Registry, Error> {
        Registry::load_with(self.path().join("README.md"), config)
    }
}

fn setup_corpus(ctx: &TestContext) {
    ctx.manifest(&[
        "| [TSV](tsv/aar_latn_broad.tsv) | aar | Afar | Afar | Latin | | False | Broad | 1,582 |",
        "| [TSV](tsv/ara_arab_broad.tsv) | ara | Arabic | Arabic | Arabic | | False | Broad | 40 |",
        "| [TSV](tsv/ara_arab_narrow.tsv) | ara | Arabic | Arabic | Arabic | | False | Narrow | 12 |",
        "| [TSV](tsv/arc_syrc_broad.tsv) | arc | Official Aramaic (700-300 BCE) | Aramaic | Syriac | | False | Broad | 9 |",
        "| [TSV](tsv/eng_latn_uk_broad.tsv) | eng | English | English | Latin | UK | False | Broad | 30 |",
        "| [TSV](tsv/eng_latn_us_broad.tsv) | eng | English | English | Latin | US | False | Broad | 35 |",
        "| [TSV](tsv/eng_latn_us_broad_filtered.tsv) | eng | English | English | Latin | US | True | Broad | 33 |",
        "| [TSV](tsv/eng_latn_us_narrow.tsv) | eng | English | English | Latin | US | False | Narrow | 8 |",
    ]);
    ctx.write_rows("tsv/aar_latn_broad.tsv", 1582);
    ctx.write_rows("tsv/ara_arab_broad.tsv", 40);
    ctx.write_rows("tsv/ara_arab_narrow.tsv", 12);
    ctx.write_rows("tsv/arc_syrc_broad.tsv", 9);
    ctx.write_rows("tsv/eng_latn_uk_broad.tsv", 30);
    ctx.write_rows("tsv/eng_latn_us_broad.tsv", 35);
    ctx.write_rows("tsv/eng_latn_us_broad_filtered.tsv", 33);
    ctx.write_rows("tsv/eng_latn_us_narrow.tsv", 8);
}

#[test]
fn test_clean_load() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);

    let registry = ctx.load().unwrap();
    assert_eq!(registry.len(), 8);
    assert!(registry.report().is_clean(), "{:?}", registry.report().issues);
    assert_eq!(registry.report().files.len(), 8);
    assert_eq!(registry.report().rows_scanned(), 1582 + 40 + 12 + 9 + 30 + 35 + 33 + 8);
}

#[test]
fn test_every_entry_finds_itself() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    let registry = ctx.load().unwrap();

    for entry in registry.iter() {
        let found = registry
            .lookup(
                &entry.language_code,
                &entry.script,
                entry.dialect(),
                entry.filtered,
                entry.depth,
            )
            .unwrap();
        assert_eq!(found, entry);
        assert_eq!(registry.get(&entry.key()), Some(entry));
    }
}

#[test]
fn test_lookup_never_returns_a_neighbour() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    let registry = ctx.load().unwrap();

    let e = registry
        .lookup("eng", "Latin", Some("US"), true, Depth::Broad)
        .unwrap();
    assert!(e.filtered);
    assert_eq!(e.file_reference, "tsv/eng_latn_us_broad_filtered.tsv");

    // UK has no narrow or filtered entry.
    for (filtered, depth) in [(true, Depth::Broad), (false, Depth::Narrow)] {
        let err = registry
            .lookup("eng", "Latin", Some("UK"), filtered, depth)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    // Unmarked dialect is distinct from any named one.
    assert!(registry
        .lookup("eng", "Latin", None, false, Depth::Broad)
        .is_err());
}

#[test]
fn test_count_mismatch_is_reported_not_fatal() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    ctx.write_rows("tsv/aar_latn_broad.tsv", 1580);

    let registry = ctx.load().unwrap();
    assert_eq!(registry.len(), 8);
    assert_eq!(registry.report().count_mismatches(), vec![(1582, 1580)]);
    assert!(!registry.report().has_errors());
    assert!(registry
        .lookup("aar", "Latin", None, false, Depth::Broad)
        .is_ok());
}

#[test]
fn test_duplicate_key_fails_load() {
    let ctx = TestContext::new();
    ctx.manifest(&[
        "| [TSV](a.tsv) | aar | Afar | Afar | Latin | | False | Broad | 1 |",
        "| [TSV](b.tsv) | aar | Afar | Afar | Latin | | False | Broad | 1 |",
    ]);

    match ctx.load() {
        Err(Error::DuplicateKey {
            key,
            first_row,
            second_row,
        }) => {
            assert_eq!(key, EntryKey::new("aar", "Latin", Depth::Broad));
            assert_eq!((first_row, second_row), (1, 2));
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
}

#[test]
fn test_missing_depth_fails_load() {
    let ctx = TestContext::new();
    ctx.manifest(&[
        "| [TSV](a.tsv) | aar | Afar | Afar | Latin | | False | Broad | 1 |",
        "| [TSV](b.tsv) | abk | Abkhaz | Abkhaz | Cyrillic | | False | | 1 |",
    ]);

    match ctx.load() {
        Err(Error::MalformedEntry { row, field, .. }) => {
            assert_eq!(row, 2);
            assert_eq!(field, "depth");
        }
        other => panic!("expected MalformedEntry, got {other:?}"),
    }
}

#[test]
fn test_entries_for_language_excludes_other_codes() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    let registry = ctx.load().unwrap();

    let ara = registry.entries_for_language("ara");
    assert_eq!(ara.len(), 2);
    assert!(ara.iter().all(|e| e.language_code == "ara" && e.script == "Arabic"));
    assert_eq!(
        ara.iter().map(|e| e.depth).collect::<Vec<_>>(),
        [Depth::Broad, Depth::Narrow]
    );

    let again: Vec<_> = registry.entries_for_language("ara");
    assert_eq!(ara, again);
}

#[test]
fn test_query_composition() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    let registry = ctx.load().unwrap();

    let files = |q: &Query| -> Vec<String> {
        registry
            .query(q)
            .map(|e| e.file_reference.clone())
            .collect()
    };

    assert_eq!(
        files(&Query::new().language("eng").depth(Depth::Narrow)),
        ["tsv/eng_latn_us_narrow.tsv"]
    );
    assert_eq!(
        files(&Query::new().scripts(["Arabic", "Syriac"]).depth(Depth::Broad)),
        ["tsv/ara_arab_broad.tsv", "tsv/arc_syrc_broad.tsv"]
    );
    assert_eq!(files(&Query::new().filtered(true)).len(), 1);
    assert_eq!(files(&Query::new().min_entries(35)).len(), 3);
    assert!(files(&Query::new().language("deu")).is_empty());
}

#[test]
fn test_schema_violation_excludes_entry() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    ctx.write("tsv/arc_syrc_broad.tsv", "a\tA\nb\tB\tC\n");

    let registry = ctx.load().unwrap();
    assert_eq!(registry.len(), 7);
    assert_eq!(
        registry.report().excluded,
        vec![EntryKey::new("arc", "Syriac", Depth::Broad)]
    );

    let errors: Vec<_> = registry.report().errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        ValidationIssue::SchemaViolation { line: 2, .. }
    ));
    assert_eq!(errors[0].severity(), Severity::Error);
}

#[test]
fn test_missing_file_in_strict_mode() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    fs::remove_file(ctx.path().join("tsv/ara_arab_narrow.tsv")).unwrap();

    let err = ctx
        .load_with(RegistryConfig::default().strict(true).with_workers(3))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationIssue::Unreadable { .. })
    ));
}

#[test]
fn test_data_dir_override() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    let manifest = fs::read_to_string(ctx.path().join("README.md")).unwrap();
    ctx.write("meta/README.md", &manifest);

    let registry = Registry::load_with(
        ctx.path().join("meta/README.md"),
        RegistryConfig::new(ctx.path()),
    )
    .unwrap();
    assert!(registry.report().is_clean());
    assert_eq!(registry.data_dir(), ctx.path());
}

#[test]
fn test_json_manifest() {
    let ctx = TestContext::new();
    ctx.write(
        "catalog.json",
        r#"[
            {"file": "aar_latn_broad.tsv", "language_code": "aar", "language_name": "Afar",
             "script": "Latin", "filtered": false, "depth": "Broad", "entry_count": 2}
        ]"#,
    );
    ctx.write_rows("aar_latn_broad.tsv", 2);

    let registry = Registry::load(ctx.path().join("catalog.json")).unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.report().is_clean());
}

#[test]
fn test_language_table_cross_check() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    ctx.write(
        "languages.json",
        r#"{
            "aar": {"iso639_name": "Afar", "wiktionary_name": "Afar", "script": {"latn": "Latin"}},
            "ara": {"iso639_name": "Arabic", "wiktionary_name": "Arabic", "script": {"arab": "Arabic"}},
            "eng": {"iso639_name": "English", "wiktionary_name": "English", "script": {"latn": "Latin"}}
        }"#,
    );

    let config = RegistryConfig::default()
        .with_validation(ValidationMode::Lazy)
        .with_languages(ctx.path().join("languages.json"));
    let registry = ctx.load_with(config).unwrap();

    let kinds: Vec<_> = registry.report().issues.iter().map(|i| i.kind()).collect();
    assert_eq!(kinds, ["unknown_language"]);
    assert_eq!(registry.report().issues[0].row(), 4);
    assert_eq!(registry.len(), 8);
}

#[test]
fn test_concurrent_readers() {
    let ctx = TestContext::new();
    setup_corpus(&ctx);
    let registry = Arc::new(ctx.load().unwrap());

    let expected: Vec<EntryKey> = registry.iter().map(|e| e.key()).collect();
    let expected = Arc::new(expected);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                for round in 0..500 {
                    let key = &expected[(t + round) % expected.len()];
                    let entry = registry.get(key).unwrap();
                    assert!(entry.has_key(key));

                    let langs: Vec<_> = registry
                        .query(&Query::new().language(key.language_code.clone()))
                        .map(|e| e.row)
                        .collect();
                    let direct: Vec<_> = registry
                        .entries_for_language(&key.language_code)
                        .iter()
                        .map(|e| e.row)
                        .collect();
                    assert_eq!(langs, direct);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
