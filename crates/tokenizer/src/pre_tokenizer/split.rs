//! Whitespace and punctuation splitting.

use super::PreToken;
use regex::Regex;
use std::sync::OnceLock;
use unicode_categories::UnicodeCategories;

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+").expect("Invalid regex pattern"))
}

/// ASCII punctuation (which BERT treats as punctuation even where Unicode
/// calls it a symbol, like `$` or `+`) or any Unicode `P*` char.
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_punctuation()
}

/// Split on runs of whitespace, dropping the whitespace.
pub fn split_whitespace(text: &str) -> Vec<PreToken> {
    word_regex()
        .find_iter(text)
        .map(|m| PreToken::new(m.as_str(), (m.start(), m.end())))
        .collect()
}

/// Split `text` around punctuation chars, each emitted on its own.
///
/// `base` is the byte position of `text` in the normalized string.
pub fn split_punctuation(text: &str, base: usize, out: &mut Vec<PreToken>) {
    let mut run_start = None;
    for (i, c) in text.char_indices() {
        if is_punctuation(c) {
            if let Some(start) = run_start.take() {
                out.push(PreToken::new(&text[start..i], (base + start, base + i)));
            }
            let end = i + c.len_utf8();
            out.push(PreToken::new(&text[i..end], (base + i, base + end)));
        } else if run_start.is_none() {
            run_start = Some(i);
        }
    }
    if let Some(start) = run_start {
        out.push(PreToken::new(&text[start..], (base + start, base + text.len())));
    }
}
