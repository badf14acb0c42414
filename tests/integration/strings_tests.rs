//! Integration tests for string table generation
//!
//! These tests run the generator against the patch fixtures and check the
//! generated resource documents.

use resmerge::config::{MissingKeyPolicy, StringsConfig};
use resmerge::strings::{
    nodes_at_depth, ResourceNode, StringTableGenerator, StringTableUnwrapper, UnwrapError, ENTRY_DEPTH,
    SHARED_ARRAYS, STRINGS_FILE,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Parse a generated document and return its entries
fn read_entries(path: &Path) -> Vec<ResourceNode> {
    let contents = fs::read_to_string(path).expect("Failed to read output");
    let root = ResourceNode::parse_document(&contents).expect("Output should be well-formed");
    assert_eq!(root.tag(), "resources");
    root.children().to_vec()
}

fn leaf_text(node: &ResourceNode) -> &str {
    match node {
        ResourceNode::Leaf { text, .. } => text,
        other => panic!("Expected a leaf, got {:?}", other),
    }
}

fn find<'a>(entries: &'a [ResourceNode], key: &str) -> Vec<&'a ResourceNode> {
    entries.iter().filter(|e| e.key() == Some(key)).collect()
}

fn write_patch(path: &Path, entries: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        path,
        format!(
            "<resources><app id=\"youtube\"><patch id=\"p\">{}</patch></app></resources>",
            entries
        ),
    )
    .unwrap();
}

// ============================================================================
// Fixture-based generation
// ============================================================================

#[test]
fn test_generate_fixture_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("generated");

    let stats = StringTableGenerator::default()
        .generate(&fixtures_path().join("addresources"), &output)
        .expect("Generation should succeed");

    let variants: Vec<_> = stats.variants.iter().map(|v| v.variant.as_str()).collect();
    assert_eq!(variants, vec!["values", "values-de"]);

    let entries = read_entries(&output.join("values").join(STRINGS_FILE));
    let names: Vec<_> = entries.iter().filter_map(|e| e.key()).collect();
    assert_eq!(
        names,
        vec![
            "revanced_settings_title",
            "revanced_settings_confirm_user_dialog_title",
            "revanced_reset",
            "revanced_sb_enable_sb",
            "revanced_sb_enable_sb_sum",
            "revanced_sb_skip_sponsor_button_text",
            "revanced_pref_import_export_title",
        ]
    );

    let german = read_entries(&output.join("values-de").join(STRINGS_FILE));
    assert_eq!(german.len(), 4);
    assert_eq!(leaf_text(find(&german, "revanced_reset")[0]), "Zurücksetzen");
}

#[test]
fn test_first_occurrence_wins_in_document_order() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("generated");
    StringTableGenerator::default()
        .generate(&fixtures_path().join("addresources"), &output)
        .unwrap();

    let entries = read_entries(&output.join("values").join(STRINGS_FILE));
    let resets = find(&entries, "revanced_reset");
    assert_eq!(resets.len(), 1, "Duplicate key should be written once");
    assert_eq!(leaf_text(resets[0]), "Reset", "The first declaration should win");
}

#[test]
fn test_shared_arrays_keep_structure() {
    let temp_dir = TempDir::new().unwrap();
    let input = fixtures_path().join("addresources");
    let output = temp_dir.path().join("generated");
    let stats = StringTableGenerator::default().generate(&input, &output).unwrap();

    assert_eq!(stats.arrays.entries, 3);
    assert_eq!(stats.arrays.duplicates, 1);

    let source = fs::read_to_string(input.join(SHARED_ARRAYS)).unwrap();
    let source_root = ResourceNode::parse_document(&source).unwrap();
    let source_entries = nodes_at_depth(&source_root, ENTRY_DEPTH);

    let entries = read_entries(&output.join(SHARED_ARRAYS));
    assert_eq!(&entries[0], source_entries[0]);
    assert_eq!(&entries[1], source_entries[1]);
    assert_eq!(&entries[2], source_entries[3]);

    let items: Vec<_> = entries[0].children().iter().map(leaf_text).collect();
    assert_eq!(
        items,
        vec!["@string/revanced_sb_duration_short", "@string/revanced_sb_duration_long"]
    );
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_scope_isolation_between_variant_and_arrays() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    write_patch(&input.join("values").join(STRINGS_FILE), r#"<string name="foo">from strings</string>"#);
    write_patch(
        &input.join(SHARED_ARRAYS),
        r#"<string-array name="foo"><item>from arrays</item></string-array>"#,
    );

    StringTableGenerator::default().generate(&input, &output).unwrap();

    let strings = read_entries(&output.join("values").join(STRINGS_FILE));
    let arrays = read_entries(&output.join(SHARED_ARRAYS));
    assert_eq!(find(&strings, "foo").len(), 1);
    assert_eq!(find(&arrays, "foo").len(), 1);
    assert_eq!(find(&arrays, "foo")[0].tag(), "string-array");
}

#[test]
fn test_variants_do_not_share_keys() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    write_patch(&input.join("values").join(STRINGS_FILE), r#"<string name="k">en</string>"#);
    write_patch(&input.join("values-fr").join(STRINGS_FILE), r#"<string name="k">fr</string>"#);
    write_patch(&input.join(SHARED_ARRAYS), "");

    StringTableGenerator::default().generate(&input, &output).unwrap();

    let french = read_entries(&output.join("values-fr").join(STRINGS_FILE));
    assert_eq!(leaf_text(find(&french, "k")[0]), "fr");
}

#[test]
fn test_text_round_trip_of_special_characters() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("strings.xml");
    let output = temp_dir.path().join("out/strings.xml");
    let original = r#"if (a < b && c > d) say "hi" & 'bye'"#;
    write_patch(
        &input,
        r#"<string name="code">if (a &lt; b &amp;&amp; c &gt; d) say &quot;hi&quot; &amp; &apos;bye&apos;</string>"#,
    );

    StringTableUnwrapper::new().unwrap(&input, &output).unwrap();

    let entries = read_entries(&output);
    assert_eq!(leaf_text(&entries[0]), original);
}

#[test]
fn test_deeply_nested_entry() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("strings.xml");
    let output = temp_dir.path().join("out/strings.xml");
    write_patch(
        &input,
        r#"<plurals name="videos" tools:ignore="UnusedQuantity">
               <item quantity="one">%d video</item>
               <item quantity="other"><xliff:g id="count">%d</xliff:g> videos</item>
           </plurals>"#,
    );

    StringTableUnwrapper::new().unwrap(&input, &output).unwrap();

    let entries = read_entries(&output);
    let plurals = &entries[0];
    assert_eq!(plurals.attribute("tools:ignore"), Some("UnusedQuantity"));
    let items = plurals.children();
    assert_eq!(items[0].attribute("quantity"), Some("one"));
    assert_eq!(leaf_text(&items[0]), "%d video");
    // Mixed content keeps its element children only
    assert_eq!(items[1].children().len(), 1);
    assert_eq!(items[1].children()[0].tag(), "xliff:g");
    assert_eq!(leaf_text(&items[1].children()[0]), "%d");
}

#[test]
fn test_rerun_overwrites_previous_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("strings.xml");
    let output = temp_dir.path().join("out/strings.xml");

    write_patch(&input, r#"<string name="a">old</string><string name="b">B</string>"#);
    StringTableUnwrapper::new().unwrap(&input, &output).unwrap();
    write_patch(&input, r#"<string name="a">new</string>"#);
    StringTableUnwrapper::new().unwrap(&input, &output).unwrap();

    let entries = read_entries(&output);
    assert_eq!(entries.len(), 1);
    assert_eq!(leaf_text(&entries[0]), "new");
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_malformed_variant_fails_generation() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    write_patch(&input.join("values").join(STRINGS_FILE), "");
    fs::create_dir_all(input.join("values-es")).unwrap();
    fs::write(input.join("values-es").join(STRINGS_FILE), "<resources><app>").unwrap();
    write_patch(&input.join(SHARED_ARRAYS), "");

    let err = StringTableGenerator::default()
        .generate(&input, &temp_dir.path().join("out"))
        .unwrap_err();

    assert!(matches!(err, UnwrapError::Parse { ref path, .. } if path.ends_with("values-es/strings.xml")));
}

#[test]
fn test_missing_arrays_fails_generation() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    write_patch(&input.join("values").join(STRINGS_FILE), "");

    let err = StringTableGenerator::default()
        .generate(&input, &temp_dir.path().join("out"))
        .unwrap_err();

    assert!(matches!(err, UnwrapError::Io { ref path, .. } if path.ends_with(SHARED_ARRAYS)));
}

#[test]
fn test_missing_key_policy() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("strings.xml");
    let output = temp_dir.path().join("out/strings.xml");
    write_patch(&input, r#"<string name="a">A</string><string>anonymous</string>"#);

    let err = StringTableUnwrapper::new().unwrap(&input, &output).unwrap_err();
    assert!(matches!(err, UnwrapError::SchemaViolation { position: 2, .. }));

    let config = StringsConfig {
        missing_key: MissingKeyPolicy::Keep,
        ..StringsConfig::default()
    };
    let stats = StringTableUnwrapper::from_config(&config).unwrap(&input, &output).unwrap();
    assert_eq!(stats.entries, 2);
}
