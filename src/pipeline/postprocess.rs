//! Post-processing: deterministic cleanup of the model's quiz reply.
//!
//! The model is told to answer with a bare JSON object, but it still wraps
//! the object in ` ```json ... ``` ` fences now and then, or leaks
//! zero-width characters copied from the PDF. These rules undo that
//! without touching the JSON itself. Anything still unparseable after
//! cleanup is reported as an upstream format error by the caller.
//!
//! ## Rule Order
//!
//! Normalise line endings first so the fence regex sees `\n`. Invisible
//! characters are trimmed from the edges before the fence rule, so a BOM in
//! front of the opening fence does not hide it, and again inside the fence.
//! Characters inside the JSON are left alone: a soft hyphen in a question
//! is the model's text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Zero-width and formatting characters that may surround the reply.
const INVISIBLE_CHARS: [char; 6] = [
    '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
];

/// Apply all cleanup rules to the raw model text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Trim whitespace and invisible Unicode from both ends
/// 3. Strip outer code fences, with or without a `json` tag
/// 4. Trim again inside the fences
pub fn clean_reply(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_code_fences(trim_edges(&s));
    trim_edges(&s).to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Trim invisible edges ─────────────────────────────────────────────

fn trim_edges(input: &str) -> &str {
    input.trim_matches(|c: char| c.is_whitespace() || INVISIBLE_CHARS.contains(&c))
}

// ── Rule 3: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\n(.*?)\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}
