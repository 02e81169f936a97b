//! Test harness for the loader against fixture files.
//!
//! Every `test/yaml/*.yaml` file must load, and must equal the JSON in the
//! matching `test/json/*.json` file when one exists. Files whose name starts
//! with `stream-` are loaded as multi-document streams and compared against
//! a JSON array of documents. Every `test/error/*.yaml` file must fail, with
//! a message starting with the text of the matching `.error` file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use libyaml11::{load_all_with_options, load_with_options, LoadOptions, Value};
use num_traits::ToPrimitive;
use serde_json::json;

/// Convert a loaded value to JSON for comparison.
///
/// Non-finite floats become the strings `.nan`, `.inf` and `-.inf`; bytes
/// become an array of numbers; timestamps become RFC 3339 strings; integers
/// beyond 64 bits become decimal strings.
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Integer(n) => {
            if let Some(i) = n.to_i64() {
                json!(i)
            } else if let Some(u) = n.to_u64() {
                json!(u)
            } else {
                json!(n.to_string())
            }
        }
        Value::Float(f) => {
            if f.is_nan() {
                json!(".nan")
            } else if f.is_infinite() {
                json!(if *f > 0.0 { ".inf" } else { "-.inf" })
            } else {
                json!(f)
            }
        }
        Value::String(s) => json!(s),
        Value::Bytes(b) => json!(b),
        Value::Timestamp(t) => json!(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Sequence(items) => {
            serde_json::Value::Array(items.borrow().iter().map(to_json).collect())
        }
        Value::Mapping(entries) => serde_json::Value::Object(
            entries
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
    }
}

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All files matching `pattern` under a subdirectory of test/, sorted.
fn fixture_files(subdir: &str, pattern: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join(pattern);
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .unwrap()
        .flatten()
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Read the expected JSON for a .yaml fixture.
fn read_expected_json(yaml_path: &Path) -> Option<serde_json::Value> {
    let basename = yaml_path.file_stem().unwrap().to_string_lossy();
    let json_path = test_root().join("json").join(format!("{}.json", basename));
    let text = fs::read_to_string(json_path).ok()?;
    Some(serde_json::from_str(&text).unwrap())
}

/// Read the expected error message prefix for an error fixture.
fn read_expected_error(yaml_path: &Path) -> Option<String> {
    fs::read_to_string(yaml_path.with_extension("error"))
        .ok()
        .map(|text| text.trim().to_string())
}

/// Run a single fixture expected to load.
fn run_yaml_test(path: &Path) -> Result<(), String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    let filename = file_name(path);
    let options = LoadOptions::new().filename(filename.clone());

    let loaded = if filename.starts_with("stream-") {
        load_all_with_options(&content, options)
            .map(|docs| serde_json::Value::Array(docs.iter().map(to_json).collect()))
    } else {
        load_with_options(&content, options)
            .map(|doc| doc.as_ref().map_or(serde_json::Value::Null, to_json))
    };
    let actual = loaded.map_err(|e| format!("{}: Unexpected load error: {}", filename, e))?;

    match read_expected_json(path) {
        Some(expected) if expected != actual => Err(format!(
            "{}: Output mismatch\n    expected: {}\n    actual:   {}",
            filename, expected, actual
        )),
        Some(_) => {
            println!("  {} => {}", filename, actual);
            Ok(())
        }
        None => {
            println!("  {} => {} (no expected output)", filename, actual);
            Ok(())
        }
    }
}

/// Run a single fixture expected to fail.
fn run_error_test(path: &Path) -> Result<(), String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    let filename = file_name(path);
    let options = LoadOptions::new().filename(filename.clone());

    match load_all_with_options(&content, options) {
        Ok(docs) => Err(format!(
            "{}: Expected load error, but got success: {:?}",
            filename, docs
        )),
        Err(e) => {
            let actual = e.to_string();
            match read_expected_error(path) {
                Some(expected) if !actual.starts_with(&expected) => Err(format!(
                    "{}: Error mismatch\n    expected: {}\n    actual:   {}",
                    filename, expected, actual
                )),
                Some(_) => {
                    println!("  {} => error (as expected)", filename);
                    Ok(())
                }
                None => {
                    println!(
                        "  {} => error: {} (no .error file to compare)",
                        filename, actual
                    );
                    Ok(())
                }
            }
        }
    }
}

fn run_all(label: &str, files: &[PathBuf], run: fn(&Path) -> Result<(), String>) {
    assert!(!files.is_empty(), "No {} fixtures found!", label);
    println!("\nRunning {} {} fixtures:", files.len(), label);

    let mut passed = 0;
    let mut errors: Vec<String> = Vec::new();
    for file in files {
        match run(file) {
            Ok(()) => passed += 1,
            Err(e) => errors.push(e),
        }
    }

    println!("\nResults: {} passed, {} failed", passed, errors.len());
    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }

    assert!(errors.is_empty(), "{} {} fixtures failed", errors.len(), label);
}

#[test]
fn test_all_yaml_fixtures() {
    run_all("yaml", &fixture_files("yaml", "*.yaml"), run_yaml_test);
}

#[test]
fn test_all_error_fixtures() {
    run_all("error", &fixture_files("error", "*.yaml"), run_error_test);
}

#[test]
fn test_every_fixture_has_expected_output() {
    for path in fixture_files("yaml", "*.yaml") {
        assert!(
            read_expected_json(&path).is_some(),
            "{} has no expected JSON",
            file_name(&path)
        );
    }
    for path in fixture_files("error", "*.yaml") {
        assert!(
            read_expected_error(&path).is_some(),
            "{} has no .error file",
            file_name(&path)
        );
    }
}
