//! File-format tests: DOCX, TXT (UTF-8 and Latin-1) and malformed input,
//! driven through the `docqa` binary.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn docqa_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("docqa");
    path
}

/// Minimal docx (ZIP) whose word/document.xml holds one paragraph per entry.
fn minimal_docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn run_docqa(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(docqa_binary())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docqa: {}", e));
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn file_support_docx_ask() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("handbook.docx");
    fs::write(
        &path,
        minimal_docx_with_paragraphs(&[
            "The office opens at nine.",
            "Lunch is served in the cafeteria.",
            "The manager is Alice Moreau.",
        ]),
    )
    .unwrap();

    let (stdout, stderr, success) = run_docqa(&[
        "ask",
        "Who is the manager?",
        "--file",
        path_str(&path),
        "--window-size",
        "1",
    ]);
    assert!(success, "ask failed: {}", stderr);
    assert!(stdout.starts_with("1. Alice Moreau"), "got: {}", stdout);
    assert!(stdout.contains("source: handbook.docx"));
}

#[test]
fn file_support_docx_paragraphs_split_sentences() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.docx");
    fs::write(
        &path,
        minimal_docx_with_paragraphs(&["First point.", "Second point.", "Third point."]),
    )
    .unwrap();

    let (stdout, stderr, success) = run_docqa(&["passages", path_str(&path), "--window-size", "2"]);
    assert!(success, "passages failed: {}", stderr);
    assert!(stdout.contains("sentences: 3"), "got: {}", stdout);
    assert!(stdout.contains("First point. Second point."));
}

#[test]
fn file_support_latin1_text() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("menu.txt");
    // "The café serves crème brûlée." in Latin-1.
    fs::write(
        &path,
        b"The caf\xE9 serves cr\xE8me br\xFBl\xE9e. It opens at noon.",
    )
    .unwrap();

    let (stdout, stderr, success) = run_docqa(&["passages", path_str(&path), "--window-size", "1"]);
    assert!(success, "passages failed: {}", stderr);
    assert!(stdout.contains("The café serves crème brûlée."), "got: {}", stdout);
}

#[test]
fn file_support_corrupt_pdf_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.pdf");
    fs::write(&path, b"not a valid pdf").unwrap();

    let (_, stderr, success) = run_docqa(&["passages", path_str(&path)]);
    assert!(!success);
    assert!(stderr.contains("PDF extraction failed"), "got: {}", stderr);
}

#[test]
fn file_support_unsupported_extension_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data.xlsx");
    fs::write(&path, b"PK").unwrap();

    let (_, stderr, success) = run_docqa(&["ask", "What?", "--file", path_str(&path)]);
    assert!(!success);
    assert!(stderr.contains("unsupported file type"), "got: {}", stderr);
}

#[test]
fn file_support_empty_text_file_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.txt");
    fs::write(&path, "   \n\n  ").unwrap();

    let (_, stderr, success) = run_docqa(&["ask", "What?", "--file", path_str(&path)]);
    assert!(!success);
    assert!(stderr.contains("empty"), "got: {}", stderr);
}
