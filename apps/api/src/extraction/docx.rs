//! Word-processing package reader.
//!
//! DOCX files are ZIP packages; body text lives in `word/document.xml` as `<w:t>`
//! runs grouped into `<w:p>` paragraphs. Three strategies, most structured first:
//! paragraph-aware scan, flat run scan, and a raw scan over the undecompressed bytes
//! for packages the ZIP reader rejects.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::extraction::{best_candidate, Candidate};

const DOCUMENT_PART: &str = "word/document.xml";
/// Upper bound on the decompressed size of the document part.
const MAX_DOCUMENT_PART_BYTES: u64 = 32 * 1024 * 1024;

static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:p(?:\s[^>]*[^/>])?>(.*?)</w:p>").unwrap());
static RUN_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:(tab)\s*/>|<w:(br|cr)(?:\s[^>]*)?/>").unwrap()
});
static TEXT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>([^<]*)</w:t>").unwrap());
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(amp|lt|gt|quot|apos|#[0-9]+|#x[0-9A-Fa-f]+);").unwrap());

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("invalid ZIP package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to read word/document.xml: {0}")]
    Io(#[from] std::io::Error),

    #[error("word/document.xml exceeds the decompressed size limit")]
    TooLarge,
}

/// Runs the DOCX pipeline. Never fails: package errors fall back to scanning the
/// raw bytes for text runs.
pub fn extract_docx_text(bytes: &[u8], floor: usize) -> Option<Candidate> {
    match read_document_part(bytes) {
        Ok(Some(xml)) => {
            let strategies: [(&'static str, fn(&str) -> String); 2] = [
                ("docx-paragraphs", paragraph_text),
                ("docx-text-runs", flat_run_text),
            ];
            best_candidate(
                strategies
                    .into_iter()
                    .map(|(name, run)| Candidate::new(name, run(&xml))),
                floor,
            )
        }
        Ok(None) => {
            info!("DOCX package has no {DOCUMENT_PART}");
            None
        }
        Err(e) => {
            debug!(error = %e, "DOCX package unreadable, scanning raw bytes");
            best_candidate(
                [Candidate::new("docx-raw-text-runs", raw_run_text(bytes))],
                floor,
            )
        }
    }
}

/// Opens the package and returns the main document part, or `None` if the package
/// has no such part.
pub fn read_document_part(bytes: &[u8]) -> Result<Option<String>, DocxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    let part = match archive.by_name(DOCUMENT_PART) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut xml = String::new();
    part.take(MAX_DOCUMENT_PART_BYTES + 1)
        .read_to_string(&mut xml)?;
    if xml.len() as u64 > MAX_DOCUMENT_PART_BYTES {
        return Err(DocxError::TooLarge);
    }
    Ok(Some(xml))
}

/// Paragraph-aware scan: runs inside one `<w:p>` are concatenated, paragraphs are
/// joined with newlines.
pub fn paragraph_text(xml: &str) -> String {
    let paragraphs: Vec<String> = PARAGRAPH
        .captures_iter(xml)
        .map(|p| {
            let mut line = String::new();
            for run in RUN_CONTENT.captures_iter(&p[1]) {
                if let Some(text) = run.get(1) {
                    line.push_str(&decode_entities(text.as_str()));
                } else if run.get(2).is_some() {
                    line.push('\t');
                } else if run.get(3).is_some() {
                    line.push('\n');
                }
            }
            line
        })
        .collect();
    paragraphs.join("\n").trim().to_string()
}

/// Flat scan: every `<w:t>` in the document joined by spaces.
pub fn flat_run_text(xml: &str) -> String {
    TEXT_RUN
        .captures_iter(xml)
        .map(|run| decode_entities(&run[1]))
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last resort for mislabeled or corrupt packages.
pub fn raw_run_text(bytes: &[u8]) -> String {
    flat_run_text(&String::from_utf8_lossy(bytes))
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .unwrap_or_else(|| entity[1..].parse::<u32>())
                    .ok()
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
