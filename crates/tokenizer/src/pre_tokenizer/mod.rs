//! Pre-tokenization pipeline.
//!
//! A pre-tokenizer cuts the normalized text into words before the model
//! runs. Every [`PreToken`] remembers the byte range it covers in the
//! normalized text so model offsets can be mapped back onto it.

pub mod byte_level;
pub mod split;

use serde::{Deserialize, Serialize};
use subtok_core::Result;

/// A word handed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreToken {
    /// Text the model sees
    pub value: String,
    /// Byte range in the normalized text
    pub offsets: (usize, usize),
    // One normalized range per byte of `value`, when `value` is not a plain
    // slice of the normalized text.
    alignments: Option<Vec<(usize, usize)>>,
}

impl PreToken {
    /// A pre-token that is a verbatim slice of the normalized text.
    pub fn new(value: impl Into<String>, offsets: (usize, usize)) -> Self {
        Self {
            value: value.into(),
            offsets,
            alignments: None,
        }
    }

    /// A pre-token whose bytes map to the given normalized ranges.
    pub fn with_alignments(
        value: String,
        offsets: (usize, usize),
        alignments: Vec<(usize, usize)>,
    ) -> Self {
        Self {
            value,
            offsets,
            alignments: Some(alignments),
        }
    }

    /// Map a byte range of `value` to a byte range of the normalized text.
    pub fn normalized_range(&self, start: usize, end: usize) -> (usize, usize) {
        match &self.alignments {
            None => (self.offsets.0 + start, self.offsets.0 + end),
            Some(alignments) if start < end && end <= alignments.len() => {
                (alignments[start].0, alignments[end - 1].1)
            }
            Some(alignments) => {
                let at = alignments.get(start).map_or(self.offsets.1, |a| a.0);
                (at, at)
            }
        }
    }
}

/// Strategy used to split normalized text into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PreTokenizer {
    /// Split on runs of whitespace
    Whitespace,
    /// Isolate every punctuation char
    Punctuation,
    /// Whitespace split, then punctuation split
    Bert,
    /// GPT-2 style split over the byte-to-unicode alphabet
    ByteLevel { add_prefix_space: bool },
}

impl PreTokenizer {
    pub fn byte_level() -> Self {
        Self::ByteLevel {
            add_prefix_space: true,
        }
    }

    /// Split `text` into pre-tokens, in order.
    pub fn pre_tokenize(&self, text: &str) -> Result<Vec<PreToken>> {
        Ok(match self {
            Self::Whitespace => split::split_whitespace(text),
            Self::Punctuation => {
                let mut tokens = Vec::new();
                split::split_punctuation(text, 0, &mut tokens);
                tokens
            }
            Self::Bert => {
                let mut tokens = Vec::new();
                for word in split::split_whitespace(text) {
                    split::split_punctuation(&word.value, word.offsets.0, &mut tokens);
                }
                tokens
            }
            Self::ByteLevel { add_prefix_space } => {
                byte_level::split_byte_level(text, *add_prefix_space)?
            }
        })
    }

    /// Chars a trainer must keep in its alphabet for this pre-tokenizer.
    pub fn alphabet(&self) -> Vec<char> {
        match self {
            Self::ByteLevel { .. } => subtok_core::byte_level::byte_encoder().to_vec(),
            _ => Vec::new(),
        }
    }
}
