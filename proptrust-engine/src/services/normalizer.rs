//! Deterministic text normalization
//!
//! The normalizer is the stability anchor of the pipeline: OCR output is
//! noisy, and the fingerprint depends on the cleaned text being
//! byte-for-byte identical for identical inputs across runs and processes.
//! Steps run in a fixed order; no step consults ambient state.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::NormalizedText;

/// Maximum size of normalized text in bytes.
const MAX_TEXT_BYTES: usize = 1024 * 1024;

/// Page header/footer boilerplate emitted by the record portals.
static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)First\s+Previous\s+Next\s+Last").unwrap(),
        Regex::new(r"(?i)Print\s*Page[_\s]*No[.:]?\s*\d+").unwrap(),
        Regex::new(r"(?i)Page\s+\d+\s+of\s+\d+").unwrap(),
        Regex::new(r"https?://\S+|www\.\S+").unwrap(),
    ]
});

/// A token is in numeric context when it is built only of digits, digit
/// confusables and numeric separators, with at least one real digit.
static NUMERIC_CONTEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9OlISB/,.\-]*$").unwrap());
static HAS_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").unwrap());

/// Clean raw OCR text.
///
/// Fixed step order: Unicode NFC, control-character stripping (newline
/// survives), boilerplate removal, whitespace collapsing, OCR-confusable
/// repair inside numeric-context tokens, truncation to 1 MiB.
pub fn normalize(raw: &str) -> NormalizedText {
    // Unicode NFC
    let text: String = raw.nfc().collect();

    // Strip control characters except newline
    let text: String = text
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect();

    // Remove repeated page header/footer boilerplate
    let mut text = text;
    for pattern in BOILERPLATE.iter() {
        text = pattern.replace_all(&text, " ").into_owned();
    }

    // Collapse whitespace runs: horizontal runs become one space, runs
    // containing a newline become one newline
    let text = collapse_whitespace(&text);

    // Repair digit confusables inside numeric-context tokens only
    let text = repair_confusables(&text);

    // Truncate on a char boundary
    let text = truncate_bytes(&text, MAX_TEXT_BYTES);

    let text = text.trim().to_string();
    let chars_cleaned = text.chars().count();
    NormalizedText {
        text,
        chars_cleaned,
    }
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut run_has_newline = false;
    let mut in_run = false;
    for c in input.chars() {
        if c.is_whitespace() {
            in_run = true;
            if c == '\n' {
                run_has_newline = true;
            }
        } else {
            if in_run {
                out.push(if run_has_newline { '\n' } else { ' ' });
                in_run = false;
                run_has_newline = false;
            }
            out.push(c);
        }
    }
    if in_run {
        out.push(if run_has_newline { '\n' } else { ' ' });
    }
    out
}

/// Published confusable table. Substitutions apply only inside tokens that
/// match the numeric context, so names and ordinary words are untouched.
fn repair_confusables(input: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    for token in input.split(' ') {
        if HAS_DIGIT.is_match(token) && NUMERIC_CONTEXT.is_match(token) {
            tokens.push(
                token
                    .chars()
                    .map(|c| match c {
                        'O' => '0',
                        'l' | 'I' => '1',
                        'S' => '5',
                        'B' => '8',
                        other => other,
                    })
                    .collect(),
            );
        } else {
            tokens.push(token.to_string());
        }
    }
    tokens.join(" ")
}

fn truncate_bytes(input: &str, max: usize) -> &str {
    if input.len() <= max {
        return input;
    }
    let mut end = max;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_give_identical_bytes() {
        let raw = "Survey  No. 45/2A\n\n\nOwner:   RAVI KUMAR \u{0007} First Previous Next Last";
        let a = normalize(raw);
        let b = normalize(raw);
        assert_eq!(a.text.as_bytes(), b.text.as_bytes());
        assert_eq!(a.chars_cleaned, b.chars_cleaned);
    }

    #[test]
    fn control_chars_removed_newline_kept() {
        let out = normalize("line one\u{0000}\u{0008}\nline two");
        assert_eq!(out.text, "line one\nline two");
    }

    #[test]
    fn whitespace_runs_collapse() {
        let out = normalize("a  \t  b\n \n  c");
        assert_eq!(out.text, "a b\nc");
    }

    #[test]
    fn boilerplate_is_stripped() {
        let out = normalize("owner data First Previous Next Last Print Page No: 3 more data");
        assert_eq!(out.text, "owner data more data");
    }

    #[test]
    fn confusables_fixed_only_in_numeric_tokens() {
        // "5O,OOO" is an OCR-mangled amount; "Olga" is a name.
        let out = normalize("Amount 5O,OOO paid by Olga");
        assert_eq!(out.text, "Amount 50,000 paid by Olga");
    }

    #[test]
    fn survey_numbers_with_letters_are_untouched() {
        let out = normalize("Survey No. 45/2A");
        assert_eq!(out.text, "Survey No. 45/2A");
    }

    #[test]
    fn nfc_applied() {
        // e + combining acute normalizes to precomposed form
        let out = normalize("caf\u{0065}\u{0301}");
        assert_eq!(out.text, "caf\u{00e9}");
    }

    #[test]
    fn oversized_input_truncates_at_char_boundary() {
        let raw = "ಕ".repeat(600_000); // 3 bytes per char
        let out = normalize(&raw);
        assert!(out.text.len() <= MAX_TEXT_BYTES);
        assert!(out.text.chars().all(|c| c == 'ಕ'));
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = normalize("");
        assert_eq!(out.text, "");
        assert_eq!(out.chars_cleaned, 0);
    }
}
