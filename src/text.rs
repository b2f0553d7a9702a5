//! Text segmentation for long inputs.
//!
//! Providers cap the length of a single request, so long text is cut into
//! segments that each become one provider call. Cuts prefer sentence ends
//! (`.`, `!`, `?`) and fall back to a hard cut on character boundaries when a
//! single sentence is longer than the limit. Joining the segments gives back
//! the input text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default per-request character limit.
pub const DEFAULT_MAX_CHARS: usize = 2000;

// A sentence is everything up to and including one terminator; the trailing
// remainder without a terminator is its own match. Together they tile the input.
static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]*[.!?]|[^.!?]+").expect("sentence pattern is valid"));

/// A portion of input text sent to the provider in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub index: usize,
    pub text: String,
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Text that already fits is returned as a single chunk, unchanged.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in SENTENCE_RE.find_iter(text).map(|m| m.as_str()) {
        let len = sentence.chars().count();
        if current_len + len <= max_chars {
            current.push_str(sentence);
            current_len += len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if len > max_chars {
            chunks.extend(hard_split(sentence, max_chars));
        } else {
            current.push_str(sentence);
            current_len = len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split into numbered segments, dropping whitespace-only pieces.
///
/// Indices are contiguous from zero so they can double as chunk order.
pub fn segments(text: &str, max_chars: usize) -> Vec<TextSegment> {
    split_text(text, max_chars)
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .enumerate()
        .map(|(index, text)| TextSegment { index, text })
        .collect()
}

fn hard_split(sentence: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}
