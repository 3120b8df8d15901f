//! Error types for the subtok libraries.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type shared by every subtok crate.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Malformed vocabulary or merges content
    #[error("Format error: {0}")]
    Format(String),

    /// A merges line that does not hold exactly two tokens
    #[error("Invalid merge at line {line}: '{content}'")]
    InvalidMerge { line: usize, content: String },

    /// A token a post-processor needs is absent from the vocabulary
    #[error("Missing special token: {0}")]
    MissingSpecialToken(String),

    /// Invalid or conflicting configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The caller supplied input the requested operation cannot handle
    #[error("Input error: {0}")]
    Input(String),

    /// Internal invariant violation
    #[error("Internal state error: {0}")]
    State(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error raised while encoding one input of a batch
    #[error("Input {index} of batch failed: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<TokenizerError>,
    },

    /// Unknown token ID
    #[error("Unknown token ID: {0}")]
    UnknownTokenId(u32),

    /// Unknown token string
    #[error("Unknown token: {0}")]
    UnknownToken(String),
}

impl TokenizerError {
    /// Attach a file path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }

    /// Attach the index of the failing batch input.
    pub fn in_batch(self, index: usize) -> Self {
        Self::Batch {
            index,
            source: Box::new(self),
        }
    }
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_error_carries_index() {
        let err = TokenizerError::Input("second sequence not provided".into()).in_batch(3);
        let message = err.to_string();
        assert!(message.contains("Input 3"));
        assert!(message.contains("second sequence not provided"));
    }

    #[test]
    fn test_invalid_merge_carries_line() {
        let err = TokenizerError::InvalidMerge {
            line: 7,
            content: "a b c".into(),
        };
        assert_eq!(err.to_string(), "Invalid merge at line 7: 'a b c'");
    }
}
