//! GPT-2 style byte-level pre-tokenization.
//!
//! Text is split with the GPT-2 pattern, then every byte of each piece is
//! replaced by its visible char from [`subtok_core::byte_level`], so a
//! space becomes `Ġ`, a newline `Ċ`, and so on.

use super::PreToken;
use fancy_regex::Regex;
use std::sync::OnceLock;
use subtok_core::byte_level::byte_encoder;
use subtok_core::{Result, TokenizerError};

const GPT2_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

fn gpt2_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GPT2_PATTERN).expect("Invalid regex pattern"))
}

// Byte range of the char containing byte `pos`.
fn char_range(text: &str, pos: usize) -> (usize, usize) {
    let mut start = pos;
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let len = text[start..].chars().next().map_or(1, char::len_utf8);
    (start, start + len)
}

/// Split `text` and map each piece to the byte-level alphabet.
///
/// With `add_prefix_space`, a space is prepended when the text does not
/// already start with whitespace; that space maps to an empty range at 0.
pub fn split_byte_level(text: &str, add_prefix_space: bool) -> Result<Vec<PreToken>> {
    let prefixed = add_prefix_space && !text.is_empty() && !text.starts_with(char::is_whitespace);
    let shift = usize::from(prefixed);
    let work = if prefixed {
        format!(" {}", text)
    } else {
        text.to_owned()
    };

    let table = byte_encoder();
    let bytes = work.as_bytes();
    let mut tokens = Vec::new();
    for found in gpt2_regex().find_iter(&work) {
        let found = found
            .map_err(|e| TokenizerError::State(format!("Byte-level split failed: {}", e)))?;
        let (start, end) = (found.start(), found.end());

        let mut value = String::with_capacity((end - start) * 2);
        let mut alignments = Vec::with_capacity((end - start) * 2);
        for (pos, &byte) in bytes.iter().enumerate().take(end).skip(start) {
            let c = table[usize::from(byte)];
            value.push(c);
            let range = if pos < shift {
                (0, 0)
            } else {
                char_range(text, pos - shift)
            };
            alignments.extend(std::iter::repeat(range).take(c.len_utf8()));
        }
        let offsets = (start.saturating_sub(shift), end - shift);
        tokens.push(PreToken::with_alignments(value, offsets, alignments));
    }
    Ok(tokens)
}
