use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docqa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docqa");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("geography.txt"),
        "Paris is the capital of France. Berlin is the capital of Germany.\n\n\
         Madrid is the capital of Spain. Lisbon lies on the Atlantic coast.",
    )
    .unwrap();
    fs::write(
        files_dir.join("rivers.txt"),
        "The Nile is the longest river in Africa. The Amazon carries the most water. \
         The Danube crosses ten countries. The Thames flows through London.",
    )
    .unwrap();

    let config_content = r#"[passages]
window_size = 1

[retrieval]
top_k = 3

[extractor]
provider = "lexical"
"#;

    let config_path = config_dir.join("docqa.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docqa(config_path: Option<&Path>, args: &[&str]) -> (String, String, bool) {
    let binary = docqa_binary();
    let mut cmd = Command::new(&binary);
    if let Some(config_path) = config_path {
        cmd.arg("--config").arg(config_path);
    }
    let output = cmd
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docqa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_ask_across_files() {
    let (tmp, config_path) = setup_test_env();
    let files = tmp.path().join("files");
    let geo = files.join("geography.txt");
    let rivers = files.join("rivers.txt");

    let (stdout, stderr, success) = run_docqa(
        Some(&config_path),
        &[
            "ask",
            "What is the capital of France?",
            "--file",
            geo.to_str().unwrap(),
            "--file",
            rivers.to_str().unwrap(),
        ],
    );
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(
        stdout.starts_with("1. Paris"),
        "best answer should be Paris, got: {}",
        stdout
    );
    assert!(stdout.contains("source: geography.txt"));
}

#[test]
fn test_ask_inline_text_without_config() {
    let (stdout, stderr, success) = run_docqa(
        None,
        &[
            "ask",
            "What is the capital of France?",
            "--text",
            "Paris is the capital of France.",
            "--top-k",
            "1",
        ],
    );
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("1. Paris"), "got: {}", stdout);
    assert!(!stdout.contains("2. "));
}

#[test]
fn test_ask_unanswerable_question() {
    let (tmp, config_path) = setup_test_env();
    let rivers = tmp.path().join("files").join("rivers.txt");

    let (stdout, _, success) = run_docqa(
        Some(&config_path),
        &[
            "ask",
            "Who invented the telephone?",
            "--file",
            rivers.to_str().unwrap(),
        ],
    );
    assert!(success);
    assert!(stdout.contains("No answers found."), "got: {}", stdout);
}

#[test]
fn test_ask_requires_a_source() {
    let (_, stderr, success) = run_docqa(None, &["ask", "Anything?"]);
    assert!(!success);
    assert!(stderr.contains("--file") || stderr.contains("--text"));
}

#[test]
fn test_ask_rejects_file_and_text_together() {
    let (tmp, config_path) = setup_test_env();
    let geo = tmp.path().join("files").join("geography.txt");
    let (_, _, success) = run_docqa(
        Some(&config_path),
        &[
            "ask",
            "Anything?",
            "--file",
            geo.to_str().unwrap(),
            "--text",
            "Some text.",
        ],
    );
    assert!(!success);
}

#[test]
fn test_ask_blank_question_fails() {
    let (_, stderr, success) = run_docqa(None, &["ask", "   ", "--text", "Some text here."]);
    assert!(!success);
    assert!(stderr.contains("question must not be empty"), "got: {}", stderr);
}

#[test]
fn test_passages_with_window_override() {
    let (tmp, config_path) = setup_test_env();
    let geo = tmp.path().join("files").join("geography.txt");

    let (stdout, stderr, success) = run_docqa(
        Some(&config_path),
        &["passages", geo.to_str().unwrap(), "--window-size", "2"],
    );
    assert!(success, "passages failed: {}", stderr);
    assert!(stdout.contains("sentences: 4"), "got: {}", stdout);
    assert!(stdout.contains("passages:  3"), "got: {}", stdout);
    assert!(stdout.contains("[passage 0] chars 0..65"), "got: {}", stdout);
    assert!(stdout.contains("Paris is the capital of France. Berlin is the capital of Germany."));
}

#[test]
fn test_passages_short_file_has_none() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("short.txt");
    fs::write(&path, "Just one sentence.").unwrap();

    let (stdout, _, success) = run_docqa(None, &["passages", path.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("passages:  0"), "got: {}", stdout);
}

#[test]
fn test_invalid_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("bad.toml");
    fs::write(&config_path, "[passages]\nwindow_size = 0\n").unwrap();

    let (_, stderr, success) = run_docqa(
        Some(&config_path),
        &["ask", "Why?", "--text", "Because."],
    );
    assert!(!success);
    assert!(stderr.contains("window_size"), "got: {}", stderr);
}
