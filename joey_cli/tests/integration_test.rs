use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper struct to manage source and target documents
struct TestFixture {
    temp_dir: TempDir,
    source_dir: PathBuf,
    target_dir: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with source and target directories
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source_dir = temp_dir.path().join("source");
        let target_dir = temp_dir.path().join("target");

        fs::create_dir(&source_dir).expect("Failed to create source dir");
        fs::create_dir(&target_dir).expect("Failed to create target dir");

        TestFixture {
            temp_dir,
            source_dir,
            target_dir,
        }
    }

    fn create_source_file(&self, name: &str, content: &str) -> PathBuf {
        create_file(&self.source_dir, name, content)
    }

    fn create_target_file(&self, name: &str, content: &str) -> PathBuf {
        create_file(&self.target_dir, name, content)
    }

    /// Create a file next to the source and target directories
    fn create_file(&self, name: &str, content: &str) -> PathBuf {
        create_file(self.temp_dir.path(), name, content)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    fn source(&self) -> &Path {
        &self.source_dir
    }

    fn target(&self) -> &Path {
        &self.target_dir
    }
}

fn create_file(base: &Path, name: &str, content: &str) -> PathBuf {
    let file_path = base.join(name);
    fs::write(&file_path, content).expect("Failed to write file");
    file_path
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("Non UTF-8 path")
}

/// Helper to run the CLI binary with an empty config directory
fn run_cli(args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_joey_cli");
    let config_dir = TempDir::new().expect("Failed to create config dir");
    Command::new(exe)
        .args(args)
        .env("XDG_CONFIG_HOME", config_dir.path())
        .env("APPDATA", config_dir.path())
        .env("HOME", config_dir.path())
        .output()
        .expect("Failed to execute command")
}

/// Helper to run CLI and expect success
fn run_cli_success(args: &[&str]) -> std::process::Output {
    let output = run_cli(args);
    if !output.status.success() {
        eprintln!("STDOUT:\n{}", String::from_utf8_lossy(&output.stdout));
        eprintln!("STDERR:\n{}", String::from_utf8_lossy(&output.stderr));
        panic!("Command failed with status: {}", output.status);
    }
    output
}

/// Helper to run CLI and parse its JSON output
fn run_cli_json(args: &[&str]) -> serde_json::Value {
    let output = run_cli_success(args);
    serde_json::from_slice(&output.stdout).expect("stdout is not valid JSON")
}

#[test]
fn test_identical_files() {
    let fixture = TestFixture::new();
    let source = fixture.create_file("a.json", r#"{"id": 42, "title": "The Prince"}"#);
    let target = fixture.create_file("b.json", r#"{"title": "The Prince", "id": 42}"#);

    let results = run_cli_json(&["diff", arg(&source), arg(&target), "--no-progress"]);

    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["changes"], serde_json::json!([]));
}

#[test]
fn test_changes_in_traversal_order() {
    let fixture = TestFixture::new();
    let source = fixture.create_file(
        "a.json",
        r#"{"title": "The Prince", "author": "Niccolò Machiavelli", "publishedOn": "1532", "reviewsCount": 9614}"#,
    );
    let target = fixture.create_file(
        "b.json",
        r#"{"title": "Il Principe", "starsCount": 8562, "author": "Nicolas Machiavelli", "publishedOn": 1532, "isbn": "978-0140449150"}"#,
    );

    let results = run_cli_json(&["diff", arg(&source), arg(&target), "--no-progress"]);
    let changes = results[0]["changes"].as_array().unwrap();

    let paths: Vec<&str> = changes.iter().map(|c| c["path"].as_str().unwrap()).collect();
    assert_eq!(
        paths,
        vec!["title", "author", "publishedOn", "reviewsCount", "starsCount", "isbn"]
    );
    assert_eq!(
        changes[2]["meta"]["reason"],
        "type changed from \"string\" to \"number\""
    );
    assert_eq!(changes[3]["meta"]["op"], "remove");
    assert!(changes[3].get("target").is_none());
    assert_eq!(changes[4]["meta"]["op"], "add");
    assert_eq!(changes[5]["meta"]["op"], "add");
}

#[test]
fn test_ignore_and_flags() {
    let fixture = TestFixture::new();
    let source = fixture.create_file("a.json", r#"{"book": {"title": "x", "secret": 1}}"#);
    let target = fixture.create_file(
        "b.json",
        r#"{"book": {"title": "y", "secret": 2}, "extra": true}"#,
    );

    let results = run_cli_json(&[
        "diff",
        arg(&source),
        arg(&target),
        "--no-progress",
        "-i",
        "secret",
        "--allow-new-target-properties",
        "--path-as-array",
    ]);

    assert_eq!(
        results[0]["changes"],
        serde_json::json!([{
            "path": ["book", "title"],
            "source": "x",
            "target": "y",
            "meta": {"op": "replace", "reason": "different strings"}
        }])
    );
}

#[test]
fn test_config_file_rules() {
    let fixture = TestFixture::new();
    let config = fixture.create_file(
        "joey.toml",
        r#"
blacklist = ["reviewsCount"]

[[preprocessors]]
pattern = "starsCount"
kind = "default"
value = 0

[[differs]]
pattern = "starsCount"
kind = "non_decreasing"
reason = "number of stars decreased"
"#,
    );
    let source = fixture.create_file("a.json", r#"{"starsCount": 8562, "reviewsCount": 1}"#);
    let target = fixture.create_file("b.json", r#"{"starsCount": null, "reviewsCount": 2}"#);

    let results = run_cli_json(&[
        "diff",
        arg(&source),
        arg(&target),
        "--no-progress",
        "--config",
        arg(&config),
    ]);

    assert_eq!(
        results[0]["changes"],
        serde_json::json!([{
            "path": "starsCount",
            "source": 8562,
            "target": null,
            "meta": {
                "op": "replace",
                "reason": "number of stars decreased",
                "delta": -8562,
                "preprocessor": {"source": 8562, "target": 0}
            }
        }])
    );
}

#[test]
fn test_directories_paired_by_name() {
    let fixture = TestFixture::new();
    fixture.create_source_file("book.json", r#"{"id": 1}"#);
    fixture.create_source_file("only_source.json", "{}");
    fixture.create_target_file("book.json", r#"{"id": 2}"#);
    fixture.create_target_file("only_target.json", "{}");

    let results = run_cli_json(&[
        "diff",
        arg(fixture.source()),
        arg(fixture.target()),
        "--no-progress",
    ]);

    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0]["source"].as_str().unwrap().ends_with("book.json"));
    assert_eq!(results[0]["changes"][0]["path"], "id");
}

#[test]
fn test_output_directory_receives_one_file_per_pair() {
    let fixture = TestFixture::new();
    let source = fixture.create_file("book.json", r#"{"id": 1}"#);
    fixture.create_target_file("first.json", r#"{"id": 1}"#);
    fixture.create_target_file("second.json", r#"{"id": 2}"#);
    let out = fixture.path("out");
    fs::create_dir(&out).unwrap();

    let output = run_cli_success(&[
        "diff",
        arg(&source),
        arg(fixture.target()),
        "--no-progress",
        "-o",
        arg(&out),
    ]);
    assert!(output.stdout.is_empty());

    let first: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("first.json")).unwrap()).unwrap();
    let second: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("second.json")).unwrap()).unwrap();
    assert_eq!(first["changes"], serde_json::json!([]));
    assert_eq!(second["changes"][0]["meta"]["reason"], "different numbers");
}

#[test]
fn test_yaml_documents() {
    let fixture = TestFixture::new();
    let source = fixture.create_file("a.yaml", "title: The Prince\ngenres: [classics]\n");
    let target = fixture.create_file("b.json", r#"{"title": "The Prince", "genres": ["classic"]}"#);

    let results = run_cli_json(&["diff", arg(&source), arg(&target), "--no-progress"]);
    assert_eq!(results[0]["changes"][0]["path"], "genres.0");
}

#[test]
fn test_unknown_yaml_tag_fails() {
    let fixture = TestFixture::new();
    let source = fixture.create_file("a.yaml", "when: !date 2020-01-01\n");
    let target = fixture.create_file("b.yaml", "when: 2020-01-01\n");

    let output = run_cli(&["diff", arg(&source), arg(&target), "--no-progress"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown type"));
}

#[test]
fn test_file_pair_with_output_directory_fails() {
    let fixture = TestFixture::new();
    let source = fixture.create_file("a.json", "{}");
    let target = fixture.create_file("b.json", "{}");

    let output = run_cli(&["diff", arg(&source), arg(&target), "-o", arg(fixture.source())]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("please specify an output file"));
}

#[test]
fn test_missing_paths_fail() {
    let fixture = TestFixture::new();
    let output = run_cli(&["diff", arg(&fixture.path("nope.json")), arg(fixture.target())]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_json_fails() {
    let fixture = TestFixture::new();
    let source = fixture.create_file("a.json", "{\"a\": ");
    let target = fixture.create_file("b.json", "{}");

    let output = run_cli(&["diff", arg(&source), arg(&target)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("a.json"));
}

#[test]
fn test_init_writes_loadable_config() {
    let fixture = TestFixture::new();
    let config = fixture.path("conf/joey.toml");

    run_cli_success(&["init", arg(&config)]);
    assert!(config.is_file());

    let again = run_cli(&["init", arg(&config)]);
    assert!(!again.status.success());
    run_cli_success(&["init", arg(&config), "--force"]);

    let source = fixture.create_file("a.json", "[1]");
    let target = fixture.create_file("b.json", "[1]");
    let results = run_cli_json(&[
        "diff",
        arg(&source),
        arg(&target),
        "--no-progress",
        "-c",
        arg(&config),
    ]);
    assert_eq!(results[0]["changes"], serde_json::json!([]));
}
