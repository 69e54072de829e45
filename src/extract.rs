//! Text extraction for uploaded files (PDF, DOCX, TXT).
//!
//! Uploads arrive as bytes plus a filename; the extension picks the
//! decoder and this module returns plain UTF-8 text. Extraction never
//! panics: malformed input becomes an [`ExtractError`] and the upload is
//! rejected.

use std::io::Read;

use thiserror::Error;

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const DOCX_BODY: &str = "word/document.xml";

/// File formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    /// Classify by extension (case-insensitive). `None` for anything else.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0} (expected .pdf, .docx or .txt)")]
    UnsupportedFileType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Ooxml(String),
    #[error("text decoding failed: {0}")]
    Text(String),
}

/// Extract text from `bytes`, choosing the decoder from `filename`.
pub fn extract_file(bytes: &[u8], filename: &str) -> Result<String, ExtractError> {
    let kind = FileKind::from_filename(filename)
        .ok_or_else(|| ExtractError::UnsupportedFileType(filename.to_string()))?;
    extract_text(bytes, kind)
}

pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
    match kind {
        FileKind::Pdf => extract_pdf(bytes),
        FileKind::Docx => extract_docx(bytes),
        FileKind::Txt => decode_text(bytes),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// UTF-8 first (BOM stripped); anything else is read as Latin-1.
fn decode_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if bytes.contains(&0) {
        return Err(ExtractError::Text(
            "file looks binary (contains NUL bytes)".to_string(),
        ));
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "upload is not UTF-8; decoding as Latin-1");
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
    }
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let xml = read_zip_entry_bounded(&mut archive, DOCX_BODY, MAX_XML_ENTRY_BYTES)?;
    paragraph_text(&xml)
}

/// Concatenate `w:t` runs, one line per `w:p` paragraph.
fn paragraph_text(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            zip.start_file(DOCX_BODY, options).unwrap();
            let xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_file_kind_from_filename() {
        assert_eq!(FileKind::from_filename("report.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_filename("a.b.docx"), Some(FileKind::Docx));
        assert_eq!(FileKind::from_filename("notes.txt"), Some(FileKind::Txt));
        assert_eq!(FileKind::from_filename("sheet.xlsx"), None);
        assert_eq!(FileKind::from_filename("README"), None);
    }

    #[test]
    fn test_unsupported_extension_returns_error() {
        let err = extract_file(b"foo", "data.bin").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", FileKind::Pdf).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_invalid_zip_returns_error_for_docx() {
        let err = extract_text(b"not a zip", FileKind::Docx).unwrap_err();
        assert!(matches!(err, ExtractError::Ooxml(_)));
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let bytes = docx_with_body(
            r#"<w:p><w:r><w:t>The sky is </w:t></w:r><w:r><w:t xml:space="preserve">blue.</w:t></w:r></w:p><w:p><w:r><w:t>Fish &amp; chips.</w:t></w:r></w:p>"#,
        );
        let text = extract_text(&bytes, FileKind::Docx).unwrap();
        assert_eq!(text, "The sky is blue.\nFish & chips.\n");
    }

    #[test]
    fn test_docx_without_body_errors() {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        let err = extract_text(&buf.into_inner(), FileKind::Docx).unwrap_err();
        assert!(err.to_string().contains(DOCX_BODY));
    }

    #[test]
    fn test_txt_utf8_with_bom() {
        let text = extract_text(b"\xEF\xBB\xBFcaf\xC3\xA9", FileKind::Txt).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_txt_latin1_fallback() {
        let text = extract_text(b"caf\xE9 au lait", FileKind::Txt).unwrap();
        assert_eq!(text, "café au lait");
    }

    #[test]
    fn test_txt_utf8_with_nul_rejected() {
        let err = extract_text(b"abc\x00def", FileKind::Txt).unwrap_err();
        assert!(matches!(err, ExtractError::Text(_)));
    }

    #[test]
    fn test_txt_binary_rejected() {
        let err = extract_text(b"\x00\xFF\x00\xFE", FileKind::Txt).unwrap_err();
        assert!(matches!(err, ExtractError::Text(_)));
    }
}
