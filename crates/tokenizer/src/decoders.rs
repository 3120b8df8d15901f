//! Decoders turning token strings back into text.

use serde::{Deserialize, Serialize};
use subtok_core::byte_level::decode_chars;

/// How to join decoded tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Decoder {
    /// Strip the continuing-subword prefix, space-separate whole words
    WordPiece { prefix: String, cleanup: bool },
    /// Map the byte-level alphabet back to bytes, then read them as UTF-8
    ByteLevel,
    /// Turn the end-of-word suffix into a space
    Bpe { suffix: String },
}

impl Decoder {
    pub fn wordpiece() -> Self {
        Self::WordPiece {
            prefix: "##".to_owned(),
            cleanup: true,
        }
    }

    pub fn decode(&self, tokens: &[String]) -> String {
        match self {
            Self::WordPiece { prefix, cleanup } => {
                let mut text = String::new();
                for (i, token) in tokens.iter().enumerate() {
                    match token.strip_prefix(prefix.as_str()) {
                        Some(rest) if i > 0 => text.push_str(rest),
                        _ => {
                            if i > 0 {
                                text.push(' ');
                            }
                            text.push_str(token);
                        }
                    }
                }
                if *cleanup {
                    cleanup_spaces(&text)
                } else {
                    text
                }
            }
            Self::ByteLevel => {
                let bytes = decode_chars(&tokens.concat());
                String::from_utf8_lossy(&bytes).into_owned()
            }
            Self::Bpe { suffix } => {
                let last = tokens.len().saturating_sub(1);
                tokens
                    .iter()
                    .enumerate()
                    .map(|(i, token)| token.replace(suffix.as_str(), if i == last { "" } else { " " }))
                    .collect()
            }
        }
    }
}

/// Remove the spaces tokenization put before punctuation and contractions.
pub fn cleanup_spaces(text: &str) -> String {
    text.replace(" .", ".")
        .replace(" ?", "?")
        .replace(" !", "!")
        .replace(" ,", ",")
        .replace(" ' ", "'")
        .replace(" n't", "n't")
        .replace(" 'm", "'m")
        .replace(" do not", " don't")
        .replace(" 's", "'s")
        .replace(" 've", "'ve")
        .replace(" 're", "'re")
}
