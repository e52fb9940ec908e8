//! Best-effort plain text from uploaded resumes.
//!
//! Each format is handled by an ordered list of strategies. Every strategy is a pure
//! function over bytes producing a `Candidate`; `best_candidate` picks the first one
//! that clears the usability floor, or the longest one when none does.
//!
//! No I/O, no shared state. Handlers run `Extractor::extract` on the blocking pool.

pub mod docx;
pub mod handlers;
pub mod normalize;
pub mod pdf;
pub mod upload;

use serde::Serialize;
use tracing::debug;

use crate::extraction::normalize::normalize_whitespace;

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    PlainText,
    Pdf,
    WordPackage,
}

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Returned when neither the declared MIME type nor the file extension is supported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported media type: {0}")]
pub struct UnsupportedMediaType(pub String);

impl MediaType {
    /// Resolves the media type from the declared MIME type, falling back to the
    /// file extension when the MIME type is missing or generic.
    pub fn detect(content_type: Option<&str>, file_name: &str) -> Result<Self, UnsupportedMediaType> {
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

        if let Some(mime) = mime {
            return match mime.as_str() {
                "text/plain" | "text/markdown" => Ok(MediaType::PlainText),
                "application/pdf" => Ok(MediaType::Pdf),
                DOCX_MIME => Ok(MediaType::WordPackage),
                _ => Err(UnsupportedMediaType(mime)),
            };
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "txt" | "md" => Ok(MediaType::PlainText),
            "pdf" => Ok(MediaType::Pdf),
            "docx" => Ok(MediaType::WordPackage),
            _ => Err(UnsupportedMediaType(if extension.is_empty() {
                file_name.to_string()
            } else {
                format!(".{extension}")
            })),
        }
    }
}

/// One uploaded document. Built once per extraction call.
#[derive(Debug, Clone)]
pub struct InputDocument {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureHint {
    SuggestPaste,
}

/// Outcome of one extraction.
///
/// `success` implies `text` is at least the usability floor long.
/// A failure always has empty `text` and a `failure_hint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    pub success: bool,
    pub failure_hint: Option<FailureHint>,
    /// Name of the strategy whose candidate was selected, if any produced text.
    pub strategy: Option<&'static str>,
}

impl ExtractionResult {
    fn succeeded(text: String, strategy: &'static str) -> Self {
        Self {
            text,
            success: true,
            failure_hint: None,
            strategy: Some(strategy),
        }
    }

    fn low_yield(strategy: Option<&'static str>) -> Self {
        Self {
            text: String::new(),
            success: false,
            failure_hint: Some(FailureHint::SuggestPaste),
            strategy,
        }
    }
}

/// Text produced by a single strategy. Its confidence is its length in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: &'static str,
    pub text: String,
}

impl Candidate {
    pub fn new(source: &'static str, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Selection rule shared by every pipeline.
///
/// Candidates are consumed lazily in order. The first one with at least `floor`
/// characters wins immediately. Otherwise the longest non-empty candidate wins,
/// with ties going to the earlier strategy.
pub fn best_candidate<I>(candidates: I, floor: usize) -> Option<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut best: Option<Candidate> = None;
    for candidate in candidates {
        let len = candidate.char_len();
        debug!(source = candidate.source, chars = len, "extraction candidate");
        if len == 0 {
            continue;
        }
        if len >= floor {
            return Some(candidate);
        }
        if best.as_ref().map_or(true, |b| len > b.char_len()) {
            best = Some(candidate);
        }
    }
    best
}

/// Stateless dispatcher over the three supported formats.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    min_chars: usize,
}

impl Extractor {
    pub fn new(min_chars: usize) -> Self {
        Self {
            min_chars: min_chars.max(1),
        }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn extract(&self, document: &InputDocument) -> ExtractionResult {
        let candidate = match document.media_type {
            MediaType::PlainText => Some(Candidate::new("plain-text", decode_plain_text(&document.bytes))),
            MediaType::Pdf => pdf::extract_pdf_text(&document.bytes, self.min_chars),
            MediaType::WordPackage => docx::extract_docx_text(&document.bytes, self.min_chars),
        };

        let Some(candidate) = candidate else {
            return ExtractionResult::low_yield(None);
        };

        let text = normalize_whitespace(&candidate.text);
        if text.chars().count() < self.min_chars {
            debug!(
                file = %document.file_name,
                source = candidate.source,
                chars = text.chars().count(),
                floor = self.min_chars,
                "extraction below usability floor"
            );
            return ExtractionResult::low_yield(Some(candidate.source));
        }

        ExtractionResult::succeeded(text, candidate.source)
    }
}

fn decode_plain_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    /// Builds a minimal single-page PDF around an uncompressed content stream.
    pub fn pdf_with_content(content: &str) -> Vec<u8> {
        let mut pdf = String::from("%PDF-1.4\n");
        pdf.push_str("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        pdf.push_str("2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
        pdf.push_str(
            "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>\nendobj\n",
        );
        pdf.push_str(&format!(
            "4 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
            content.len(),
            content
        ));
        pdf.push_str("trailer\n<< /Root 1 0 R >>\n%%EOF\n");
        pdf.into_bytes()
    }

    /// Wraps `body_xml` (the children of `<w:body>`) in a DOCX package.
    pub fn docx_with_body(body_xml: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
        );
        zip_with_parts(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", document.as_str()),
        ])
    }

    pub fn zip_with_parts(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    pub fn paragraph(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    const RESUME_TEXT: &str = "Jane Doe\nSenior Software Engineer\n\nBuilt payment systems in Rust and Go for eight years.";

    fn doc(bytes: Vec<u8>, media_type: MediaType) -> InputDocument {
        InputDocument {
            bytes,
            media_type,
            file_name: "resume".to_string(),
        }
    }

    #[test]
    fn test_detect_by_mime() {
        assert_eq!(MediaType::detect(Some("application/pdf"), "x"), Ok(MediaType::Pdf));
        assert_eq!(
            MediaType::detect(Some("text/plain; charset=utf-8"), "x"),
            Ok(MediaType::PlainText)
        );
        assert_eq!(MediaType::detect(Some(DOCX_MIME), "x"), Ok(MediaType::WordPackage));
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(MediaType::detect(None, "cv.PDF"), Ok(MediaType::Pdf));
        assert_eq!(
            MediaType::detect(Some("application/octet-stream"), "cv.docx"),
            Ok(MediaType::WordPackage)
        );
        assert_eq!(MediaType::detect(None, "notes.txt"), Ok(MediaType::PlainText));
    }

    #[test]
    fn test_detect_rejects_images() {
        assert_eq!(
            MediaType::detect(Some("image/png"), "photo.png"),
            Err(UnsupportedMediaType("image/png".to_string()))
        );
        assert!(MediaType::detect(None, "photo.jpeg").is_err());
        assert!(MediaType::detect(None, "README").is_err());
    }

    #[test]
    fn test_best_candidate_first_above_floor_wins() {
        let picked = best_candidate(
            vec![
                Candidate::new("a", "short"),
                Candidate::new("b", "long enough text"),
                Candidate::new("c", "an even longer text than b"),
            ],
            10,
        )
        .unwrap();
        assert_eq!(picked.source, "b");
    }

    #[test]
    fn test_best_candidate_longest_when_all_below_floor() {
        let picked = best_candidate(
            vec![
                Candidate::new("a", "abc"),
                Candidate::new("b", "abcdef"),
                Candidate::new("c", "abcd"),
            ],
            100,
        )
        .unwrap();
        assert_eq!(picked.source, "b");
    }

    #[test]
    fn test_best_candidate_tie_prefers_earlier() {
        let picked = best_candidate(
            vec![Candidate::new("a", "Alpha\nBeta"), Candidate::new("b", "Alpha Beta")],
            50,
        )
        .unwrap();
        assert_eq!(picked.source, "a");
    }

    #[test]
    fn test_best_candidate_skips_empty() {
        assert!(best_candidate(vec![Candidate::new("a", ""), Candidate::new("b", "")], 5).is_none());
    }

    #[test]
    fn test_best_candidate_is_lazy() {
        let mut evaluated = Vec::new();
        let picked = best_candidate(
            ["first strategy output", "second"].into_iter().map(|t| {
                evaluated.push(t);
                Candidate::new("s", t)
            }),
            5,
        );
        assert!(picked.is_some());
        assert_eq!(evaluated, vec!["first strategy output"]);
    }

    #[test]
    fn test_plain_text_equals_normalized_input() {
        let extractor = Extractor::new(20);
        let raw = "  Jane Doe\r\nSenior Software Engineer\r\n\r\n\r\n\r\nRust, Go, Postgres  ";
        let result = extractor.extract(&doc(raw.as_bytes().to_vec(), MediaType::PlainText));
        assert!(result.success);
        assert_eq!(result.text, normalize_whitespace(raw));
        assert_eq!(normalize_whitespace(&result.text), result.text);
    }

    #[test]
    fn test_plain_text_strips_bom() {
        let extractor = Extractor::new(10);
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(b"Hello resume reader");
        let result = extractor.extract(&doc(bytes, MediaType::PlainText));
        assert_eq!(result.text, "Hello resume reader");
    }

    #[test]
    fn test_short_plain_text_is_low_yield() {
        let extractor = Extractor::new(50);
        let result = extractor.extract(&doc(b"too short".to_vec(), MediaType::PlainText));
        assert!(!result.success);
        assert!(result.text.is_empty());
        assert_eq!(result.failure_hint, Some(FailureHint::SuggestPaste));
    }

    #[test]
    fn test_pdf_dispatch() {
        let extractor = Extractor::new(20);
        let content = "BT /F1 12 Tf 72 720 Td (Jane Doe, Staff Engineer at Example Corp) Tj ET";
        let result = extractor.extract(&doc(pdf_with_content(content), MediaType::Pdf));
        assert!(result.success, "{result:?}");
        assert!(result.text.contains("Jane Doe, Staff Engineer at Example Corp"));
    }

    #[test]
    fn test_image_only_pdf_suggests_paste() {
        let extractor = Extractor::new(50);
        let mut bytes = b"%PDF-1.4\n1 0 obj\n<< /Type /XObject /Subtype /Image /Width 2 /Height 2 /Length 8 >>\nstream\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0x4a, 0x46]);
        bytes.extend_from_slice(b"\nendstream\nendobj\n%%EOF\n");
        let result = extractor.extract(&doc(bytes, MediaType::Pdf));
        assert!(!result.success);
        assert!(result.text.is_empty());
        assert_eq!(result.failure_hint, Some(FailureHint::SuggestPaste));
    }

    #[test]
    fn test_docx_dispatch_keeps_paragraphs() {
        let extractor = Extractor::new(20);
        let body: String = RESUME_TEXT
            .lines()
            .map(paragraph)
            .collect();
        let result = extractor.extract(&doc(docx_with_body(&body), MediaType::WordPackage));
        assert!(result.success, "{result:?}");
        assert_eq!(result.text, RESUME_TEXT);
        assert_eq!(result.strategy, Some("docx-paragraphs"));
    }

    #[test]
    fn test_empty_docx_suggests_paste() {
        let extractor = Extractor::new(20);
        let result = extractor.extract(&doc(docx_with_body(""), MediaType::WordPackage));
        assert!(!result.success);
        assert_eq!(result.failure_hint, Some(FailureHint::SuggestPaste));
    }

    #[test]
    fn test_floor_is_at_least_one() {
        assert_eq!(Extractor::new(0).min_chars(), 1);
    }
}
