//! Parses a finalized assistant message into a bounded menu of
//! quick-reply options.
//!
//! The assistant is instructed to answer recommendation questions with
//! a short numbered list, but the formatting is LLM-authored prose and
//! only loosely follows that shape. The extractor therefore works as a
//! tolerant line-oriented state machine rather than a strict parser:
//! absence of matches is not an error, it just means no quick-reply
//! menu is shown.

use once_cell::sync::Lazy;
use regex::Regex;

/// At most this many options are surfaced; later numbered entries in
/// the text are silently dropped.
pub const MAX_SUGGESTIONS: usize = 4;

/// A selectable option extracted from assistant text.
///
/// Derived data: recomputed from the latest finalized assistant
/// message, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionOption {
    /// The option's single-digit label, as text.
    pub number: String,
    /// The title taken from the header line.
    pub title: String,
    /// The normalized header plus the option's body text.
    pub full_text: String,
}

// Tolerates the loose formats the model produces: optional bold
// markers, an optional "Option" word, a single digit, then `.`, `)`
// or `:` before the title. A body line starting with "digit + period"
// also matches; that misfire is a known limitation of the heuristic
// and is pinned by a test below.
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:\*\*)?\s*(?:option\s*)?([0-9])\s*[.):]\s*(?:\*\*)?\s*(.*)$",
    )
    .expect("invalid option header pattern")
});

/// Extracts up to [`MAX_SUGGESTIONS`] numbered options from the given
/// text.
///
/// Must only be invoked against finalized (non-streaming) text. The
/// function is pure and recomputes from scratch on every call.
pub fn extract_options(text: &str) -> Vec<SuggestionOption> {
    let mut options = Vec::new();
    let mut current: Option<SuggestionOption> = None;

    for line in text.lines() {
        if let Some(caps) = HEADER_RE.captures(line) {
            if let Some(option) = current.take() {
                options.push(option);
            }
            let number = caps[1].to_owned();
            let title = caps[2]
                .trim()
                .trim_end_matches("**")
                .trim_end_matches(':')
                .trim()
                .to_owned();
            let full_text = format!("Option {number}: {title}");
            current = Some(SuggestionOption {
                number,
                title,
                full_text,
            });
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            // A blank separator, or pre-amble spacing before the
            // first option.
            continue;
        }
        if let Some(option) = &mut current {
            option.full_text.push(' ');
            option.full_text.push_str(trimmed);
        }
    }
    if let Some(option) = current {
        options.push(option);
    }

    options.truncate(MAX_SUGGESTIONS);
    options
}
