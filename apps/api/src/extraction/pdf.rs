//! PDF text recovery: a layout-aware parse first, then token-level heuristics.
//!
//! Strategies, in order:
//! 1. `pdf-layout`: the `pdf-extract` crate, for well-formed files.
//! 2. `pdf-text-operators`: `Tj`/`'`/`TJ` operands inside `BT … ET` blocks plus a sweep
//!    for any parenthesized run that reads like natural language.
//! 3. `pdf-stream-words`: readable words scraped out of `stream … endstream` bodies.
//!
//! Flate-compressed streams are inflated and scanned alongside the raw bytes.
//! Nothing here returns an error: every failure degrades to an empty candidate.

use std::collections::HashSet;
use std::io::Read;
use std::ops::Range;

use flate2::read::ZlibDecoder;
use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use tracing::{debug, warn};

use crate::extraction::normalize::{collapse_spaces, normalize_whitespace};
use crate::extraction::{best_candidate, Candidate};

/// Upper bound on the inflated size of a single stream.
const MAX_INFLATED_STREAM_BYTES: u64 = 8 * 1024 * 1024;
/// Upper bound on the inflated size of all streams in one document, per pass.
const MAX_INFLATED_TOTAL_BYTES: u64 = 32 * 1024 * 1024;
/// A stream must contain more than this many alphabetic words to count as text.
const MIN_STREAM_WORDS: usize = 5;
/// `TJ` adjustments more negative than this are rendered as a word gap.
const TJ_WORD_GAP: f64 = -200.0;

static TEXT_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\bBT\b(.*?)\bET\b").unwrap());
static SHOW_OPERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\(((?:[^()\\]|\\.)*)\)\s*(?:Tj|')|\[((?:[^\]\\]|\\.)*)\]\s*TJ"#).unwrap()
});
static ARRAY_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\(((?:[^()\\]|\\.)*)\)|(-?\d+(?:\.\d+)?|-?\.\d+)").unwrap()
});
static PAREN_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\(((?:[^()\\]|\\.){3,})\)").unwrap());
static STREAM_BODY: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"(?s-u)\bstream\r?\n(.*?)endstream").unwrap());

/// Content-stream operators that survive the stream-words pass as bare tokens.
const OPERATOR_TOKENS: &[&str] = &[
    "BT", "ET", "Tf", "Td", "TD", "Tm", "Tj", "TJ", "T*", "Tc", "Tw", "Tz", "TL", "Tr", "Ts",
    "re", "cm", "Do", "BI", "EI", "ID", "gs", "rg", "RG", "cs", "CS", "sc", "SC", "scn", "SCN",
    "obj", "endobj",
];

/// Runs the PDF strategy pipeline and returns the selected candidate.
pub fn extract_pdf_text(bytes: &[u8], floor: usize) -> Option<Candidate> {
    let strategies: [(&'static str, fn(&[u8]) -> String); 3] = [
        ("pdf-layout", layout_text),
        ("pdf-text-operators", scan_text_operators),
        ("pdf-stream-words", scan_stream_words),
    ];
    best_candidate(
        strategies
            .iter()
            .map(|&(name, run)| Candidate::new(name, run(bytes))),
        floor,
    )
}

/// Full parse via `pdf-extract`. The crate panics on some malformed inputs, so the
/// call is isolated with `catch_unwind`.
fn layout_text(bytes: &[u8]) -> String {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => normalize_whitespace(&text),
        Ok(Err(e)) => {
            debug!(error = ?e, "pdf-extract could not parse document");
            String::new()
        }
        Err(_) => {
            warn!("pdf-extract panicked; falling back to token scan");
            String::new()
        }
    }
}

/// Recovers text shown by `Tj`, `'` and `TJ` operators, plus any parenthesized
/// run elsewhere in the file that looks like prose.
pub fn scan_text_operators(bytes: &[u8]) -> String {
    let segments = content_segments(bytes);
    let mut fragments: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut block_spans: Vec<Vec<Range<usize>>> = Vec::with_capacity(segments.len());

    for segment in &segments {
        let mut spans = Vec::new();
        for block in TEXT_BLOCK.captures_iter(segment) {
            if let Some(whole) = block.get(0) {
                spans.push(whole.range());
            }
            for op in SHOW_OPERATOR.captures_iter(&block[1]) {
                let fragment = match (op.get(1), op.get(2)) {
                    (Some(single), _) => unescape_pdf_string(single.as_str()),
                    (None, Some(array)) => join_array_runs(array.as_str()),
                    (None, None) => continue,
                };
                push_fragment(&mut fragments, &mut seen, &fragment);
            }
        }
        block_spans.push(spans);
    }

    // Supplementary sweep: catches strings outside recognised text blocks. Runs
    // inside a block were already read (or deliberately skipped) above.
    for (segment, spans) in segments.iter().zip(&block_spans) {
        let mut spans = spans.iter().peekable();
        for run in PAREN_RUN.captures_iter(segment) {
            let Some(whole) = run.get(0) else { continue };
            let start = whole.start();
            while spans.peek().is_some_and(|span| span.end <= start) {
                spans.next();
            }
            if spans.peek().is_some_and(|span| span.contains(&start)) {
                continue;
            }
            let fragment = collapse_spaces(&unescape_pdf_string(&run[1]));
            if looks_like_prose(&fragment) {
                push_fragment(&mut fragments, &mut seen, &fragment);
            }
        }
    }

    collapse_spaces(&fragments.join(" "))
}

/// Secondary pass: scrape readable words out of stream bodies that contain enough
/// alphabetic words to plausibly be text.
pub fn scan_stream_words(bytes: &[u8]) -> String {
    let mut kept: Vec<String> = Vec::new();

    for stream in stream_bodies(bytes, MAX_INFLATED_TOTAL_BYTES) {
        let body = stream.inflated.as_deref().unwrap_or(stream.raw);
        let printable: String = body
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    ' '
                }
            })
            .collect();

        let tokens: Vec<&str> = printable
            .split_whitespace()
            .map(|w| w.trim_matches(|c| c == '(' || c == ')' || c == '[' || c == ']'))
            .collect();

        let alphabetic_words = tokens
            .iter()
            .filter(|w| w.len() > 2 && w.chars().all(|c| c.is_ascii_alphabetic()))
            .count();
        if alphabetic_words <= MIN_STREAM_WORDS {
            continue;
        }

        kept.extend(
            tokens
                .into_iter()
                .filter(|w| is_readable_token(w))
                .map(String::from),
        );
    }

    kept.join(" ")
}

fn push_fragment(fragments: &mut Vec<String>, seen: &mut HashSet<String>, raw: &str) {
    let fragment = collapse_spaces(raw);
    if fragment.is_empty() || !seen.insert(fragment.clone()) {
        return;
    }
    fragments.push(fragment);
}

/// Concatenates the strings of a `TJ` array. Large negative kerning adjustments
/// mark a word boundary.
fn join_array_runs(array: &str) -> String {
    let mut out = String::new();
    for element in ARRAY_ELEMENT.captures_iter(array) {
        if let Some(s) = element.get(1) {
            out.push_str(&unescape_pdf_string(s.as_str()));
        } else if let Some(n) = element.get(2) {
            if n.as_str().parse::<f64>().is_ok_and(|v| v < TJ_WORD_GAP) {
                out.push(' ');
            }
        }
    }
    out
}

/// Decodes PDF literal-string escapes: `\n \r \t \b \f \( \) \\`, octal `\ddd`,
/// and backslash line continuations.
pub fn unescape_pdf_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') | Some('f') => out.push(' '),
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n') => {}
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(next) => {
                            value = value * 8 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from((value & 0xff) as u8));
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn looks_like_prose(text: &str) -> bool {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 2
        && text.chars().all(|c| {
            c.is_alphanumeric() || c.is_whitespace() || ".,;:'\"!?@&%$#/-+*()[]_".contains(c)
        })
}

fn is_readable_token(token: &str) -> bool {
    !token.is_empty()
        && !token.starts_with('/')
        && !OPERATOR_TOKENS.contains(&token)
        && token.chars().any(|c| c.is_ascii_alphabetic())
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".,;:'@&%$#/-+".contains(c))
}

/// The whole file plus every inflatable stream, each decoded one byte per char so
/// structural markers survive regardless of the text encoding.
fn content_segments(bytes: &[u8]) -> Vec<String> {
    let mut segments = vec![latin1(bytes)];
    segments.extend(
        stream_bodies(bytes, MAX_INFLATED_TOTAL_BYTES)
            .into_iter()
            .filter_map(|stream| stream.inflated)
            .map(|inflated| latin1(&inflated)),
    );
    segments
}

/// One `stream … endstream` body. `inflated` is set when the body carried a zlib
/// header and the document's inflation budget was not yet spent.
struct StreamBody<'a> {
    raw: &'a [u8],
    inflated: Option<Vec<u8>>,
}

/// Collects stream bodies, inflating at most `budget` bytes across the whole
/// document. Streams past the budget are kept raw.
fn stream_bodies(bytes: &[u8], budget: u64) -> Vec<StreamBody<'_>> {
    let mut remaining = budget;
    let mut streams = Vec::new();

    for body in STREAM_BODY.captures_iter(bytes).filter_map(|c| c.get(1)) {
        let raw = body.as_bytes();
        let inflated = if remaining > 0 {
            inflate(raw, remaining.min(MAX_INFLATED_STREAM_BYTES))
        } else {
            None
        };
        if let Some(out) = &inflated {
            remaining = remaining.saturating_sub(out.len() as u64);
            if remaining == 0 {
                warn!(budget, "PDF inflation budget spent; remaining streams scanned raw");
            }
        }
        streams.push(StreamBody { raw, inflated });
    }
    streams
}

fn inflate(body: &[u8], limit: u64) -> Option<Vec<u8>> {
    if body.first() != Some(&0x78) {
        return None;
    }
    let mut out = Vec::new();
    let result = ZlibDecoder::new(body).take(limit).read_to_end(&mut out);
    match result {
        Ok(_) => Some(out),
        // Truncated streams still yield a usable prefix.
        Err(_) if !out.is_empty() => Some(out),
        Err(e) => {
            debug!(error = %e, "failed to inflate PDF stream");
            None
        }
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
