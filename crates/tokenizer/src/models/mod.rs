//! Subword models.

pub mod bpe;
pub mod wordpiece;

pub use bpe::{Bpe, BpeBuilder, BpeOptions};
pub use wordpiece::{WordPiece, WordPieceBuilder, WordPieceOptions};

use std::path::{Path, PathBuf};
use subtok_core::{Result, Token, Vocabulary};

/// The model turning pre-tokens into tokens.
#[derive(Debug, Clone)]
pub enum Model {
    Bpe(Bpe),
    WordPiece(WordPiece),
}

impl Model {
    /// Tokenize one pre-token. Offsets are relative to `word`.
    pub fn tokenize(&self, word: &str) -> Result<Vec<Token>> {
        match self {
            Self::Bpe(bpe) => bpe.tokenize(word),
            Self::WordPiece(wordpiece) => Ok(wordpiece.tokenize(word)),
        }
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        match self {
            Self::Bpe(bpe) => bpe.token_to_id(token),
            Self::WordPiece(wordpiece) => wordpiece.token_to_id(token),
        }
    }

    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        match self {
            Self::Bpe(bpe) => bpe.id_to_token(id),
            Self::WordPiece(wordpiece) => wordpiece.id_to_token(id),
        }
    }

    pub fn vocab(&self) -> &Vocabulary {
        match self {
            Self::Bpe(bpe) => bpe.vocab(),
            Self::WordPiece(wordpiece) => wordpiece.vocab(),
        }
    }

    /// One past the highest id, where added tokens start.
    pub fn vocab_size(&self) -> usize {
        match self {
            Self::Bpe(bpe) => bpe.vocab_size(),
            Self::WordPiece(wordpiece) => wordpiece.vocab_size(),
        }
    }

    pub fn unk_token(&self) -> Option<&str> {
        match self {
            Self::Bpe(bpe) => bpe.unk_token(),
            Self::WordPiece(wordpiece) => Some(wordpiece.unk_token()),
        }
    }

    /// Write the model files into `dir`, returning their paths.
    pub fn save(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        match self {
            Self::Bpe(bpe) => bpe.save(dir),
            Self::WordPiece(wordpiece) => wordpiece.save(dir),
        }
    }
}

impl From<Bpe> for Model {
    fn from(bpe: Bpe) -> Self {
        Self::Bpe(bpe)
    }
}

impl From<WordPiece> for Model {
    fn from(wordpiece: WordPiece) -> Self {
        Self::WordPiece(wordpiece)
    }
}
