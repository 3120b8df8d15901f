//! Format definitions for tokenizer serialization.
//!
//! A saved tokenizer is a directory holding the model files plus a
//! `tokenizer.json` that describes the rest of the pipeline and points at
//! those files by name.

use crate::added_vocabulary::AddedToken;
use crate::decoders::Decoder;
use crate::models::{BpeOptions, WordPieceOptions};
use crate::normalizer::Normalizer;
use crate::pre_tokenizer::PreTokenizer;
use crate::processors::PostProcessor;
use crate::utils::{PaddingParams, TruncationParams};
use serde::{Deserialize, Serialize};

/// BPE vocabulary: JSON object from token to id.
pub const VOCAB_JSON: &str = "vocab.json";
/// BPE merges, one pair per line after a version header.
pub const MERGES_TXT: &str = "merges.txt";
/// WordPiece vocabulary, one token per line.
pub const VOCAB_TXT: &str = "vocab.txt";
/// Pipeline description.
pub const TOKENIZER_JSON: &str = "tokenizer.json";

/// Header written on the first line of `merges.txt`.
pub const MERGES_HEADER: &str = "#version: 0.2";

/// Model section of `tokenizer.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializedModel {
    Bpe {
        vocab: String,
        merges: String,
        #[serde(default)]
        options: BpeOptions,
    },
    WordPiece {
        vocab: String,
        #[serde(default)]
        options: WordPieceOptions,
    },
}

/// An added token together with the id it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedAddedToken {
    pub id: u32,
    #[serde(flatten)]
    pub token: AddedToken,
}

/// Complete tokenizer serialization format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedTokenizer {
    /// Crate version that wrote the file
    pub version: String,
    pub model: SerializedModel,
    #[serde(default)]
    pub normalizer: Option<Normalizer>,
    #[serde(default)]
    pub pre_tokenizer: Option<PreTokenizer>,
    #[serde(default)]
    pub post_processor: Option<PostProcessor>,
    #[serde(default)]
    pub decoder: Option<Decoder>,
    #[serde(default)]
    pub truncation: Option<TruncationParams>,
    #[serde(default)]
    pub padding: Option<PaddingParams>,
    /// Added tokens in insertion order
    #[serde(default)]
    pub added_tokens: Vec<SerializedAddedToken>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_roundtrip() {
        let tokenizer_data = SerializedTokenizer {
            version: "0.3.0".to_string(),
            model: SerializedModel::Bpe {
                vocab: VOCAB_JSON.to_string(),
                merges: MERGES_TXT.to_string(),
                options: BpeOptions::default(),
            },
            normalizer: Some(Normalizer::Nfc),
            pre_tokenizer: Some(PreTokenizer::byte_level()),
            post_processor: None,
            decoder: Some(Decoder::ByteLevel),
            truncation: Some(TruncationParams::default()),
            padding: None,
            added_tokens: vec![SerializedAddedToken {
                id: 7,
                token: AddedToken::special("<s>"),
            }],
        };

        let json = serde_json::to_string(&tokenizer_data).unwrap();
        let deserialized: SerializedTokenizer = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, tokenizer_data);
    }

    #[test]
    fn test_missing_sections_default() {
        let json = r#"{"version":"0.3.0","model":{"type":"WordPiece","vocab":"vocab.txt"}}"#;
        let deserialized: SerializedTokenizer = serde_json::from_str(json).unwrap();
        assert_eq!(
            deserialized.model,
            SerializedModel::WordPiece {
                vocab: VOCAB_TXT.to_string(),
                options: WordPieceOptions::default(),
            }
        );
        assert!(deserialized.normalizer.is_none());
        assert!(deserialized.added_tokens.is_empty());
    }
}
