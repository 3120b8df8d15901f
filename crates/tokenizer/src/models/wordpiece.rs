//! WordPiece model: greedy longest-match-first over the vocabulary.

use crate::io::{format, load, save};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use subtok_core::{Result, Token, TokenizerError, Vocabulary};

/// Options of a WordPiece model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordPieceOptions {
    pub unk_token: String,
    pub continuing_subword_prefix: String,
    /// Words with more chars than this become the unknown token
    pub max_input_chars_per_word: usize,
}

impl Default for WordPieceOptions {
    fn default() -> Self {
        Self {
            unk_token: "[UNK]".to_owned(),
            continuing_subword_prefix: "##".to_owned(),
            max_input_chars_per_word: 100,
        }
    }
}

/// Builder for [`WordPiece`].
#[derive(Default)]
pub struct WordPieceBuilder {
    options: WordPieceOptions,
    vocab: Vocabulary,
    file: Option<PathBuf>,
}

impl WordPieceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the vocabulary from a `vocab.txt` file.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn vocab(mut self, vocab: Vocabulary) -> Self {
        self.vocab = vocab;
        self
    }

    pub fn options(mut self, options: WordPieceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn unk_token(mut self, token: impl Into<String>) -> Self {
        self.options.unk_token = token.into();
        self
    }

    pub fn continuing_subword_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.continuing_subword_prefix = prefix.into();
        self
    }

    pub fn max_input_chars_per_word(mut self, max: usize) -> Self {
        self.options.max_input_chars_per_word = max;
        self
    }

    pub fn build(self) -> Result<WordPiece> {
        let vocab = match self.file {
            Some(path) => load::read_vocab_txt(&path)?,
            None => self.vocab,
        };
        let unk_id = vocab.get_id(&self.options.unk_token).ok_or_else(|| {
            TokenizerError::InvalidConfig(format!(
                "WordPiece unknown token '{}' is not in the vocabulary",
                self.options.unk_token
            ))
        })?;
        log::debug!("WordPiece model with {} tokens", vocab.len());
        Ok(WordPiece {
            vocab,
            unk_id,
            options: self.options,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WordPiece {
    vocab: Vocabulary,
    unk_id: u32,
    options: WordPieceOptions,
}

impl WordPiece {
    pub fn builder() -> WordPieceBuilder {
        WordPieceBuilder::new()
    }

    /// Load a model from a `vocab.txt` file with default options.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        WordPieceBuilder::new().file(path.as_ref()).build()
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn options(&self) -> &WordPieceOptions {
        &self.options
    }

    pub fn unk_token(&self) -> &str {
        &self.options.unk_token
    }

    fn unk(&self, word: &str) -> Vec<Token> {
        vec![Token::new(
            self.unk_id,
            self.options.unk_token.clone(),
            (0, word.len()),
        )]
    }

    /// Tokenize one pre-token. Offsets are byte ranges within `word`.
    pub fn tokenize(&self, word: &str) -> Vec<Token> {
        if word.is_empty() {
            return Vec::new();
        }
        if word.chars().count() > self.options.max_input_chars_per_word {
            return self.unk(word);
        }

        // Candidate ends, longest first.
        let boundaries: Vec<usize> = word
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect();

        let mut tokens = Vec::new();
        let mut candidate = String::with_capacity(word.len() + 2);
        let mut start = 0;
        while start < word.len() {
            let mut found = None;
            for &end in boundaries.iter().rev().take_while(|&&end| end > start) {
                candidate.clear();
                if start > 0 {
                    candidate.push_str(&self.options.continuing_subword_prefix);
                }
                candidate.push_str(&word[start..end]);
                if let Some(id) = self.vocab.get_id(&candidate) {
                    found = Some((id, end));
                    break;
                }
            }
            let Some((id, end)) = found else {
                return self.unk(word);
            };
            tokens.push(Token::new(id, candidate.clone(), (start, end)));
            start = end;
        }
        tokens
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.vocab.get_id(token)
    }

    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        self.vocab.get_token(id)
    }

    /// One past the highest id in the vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.vocab.next_id() as usize
    }

    /// Write `vocab.txt` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let path = dir.join(format::VOCAB_TXT);
        save::write_vocab_txt(&self.vocab, &path)?;
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> WordPiece {
        let mut vocab = Vocabulary::new();
        for token in ["[UNK]", "un", "##want", "##ed", "runn", "##ing", "want"] {
            vocab.add_token(token);
        }
        WordPiece::builder().vocab(vocab).build().unwrap()
    }

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_longest_match() {
        let wp = model();
        let unwanted = wp.tokenize("unwanted");
        assert_eq!(values(&unwanted), vec!["un", "##want", "##ed"]);
        let offsets: Vec<_> = unwanted.iter().map(|t| t.offsets).collect();
        assert_eq!(offsets, vec![(0, 2), (2, 6), (6, 8)]);

        assert_eq!(values(&wp.tokenize("running")), vec!["runn", "##ing"]);
    }

    #[test]
    fn test_unknown_word() {
        let wp = model();
        let tokens = wp.tokenize("unwantedX");
        assert_eq!(values(&tokens), vec!["[UNK]"]);
        assert_eq!(tokens[0].offsets, (0, 9));
        assert_eq!(tokens[0].id, 0);
    }

    #[test]
    fn test_too_long_word() {
        let mut vocab = Vocabulary::new();
        vocab.add_token("[UNK]");
        vocab.add_token("a");
        vocab.add_token("##a");
        let wp = WordPiece::builder()
            .vocab(vocab)
            .max_input_chars_per_word(3)
            .build()
            .unwrap();
        assert_eq!(wp.tokenize("aaa").len(), 3);
        assert_eq!(values(&wp.tokenize("aaaa")), vec!["[UNK]"]);
    }

    #[test]
    fn test_missing_unk_token() {
        let mut vocab = Vocabulary::new();
        vocab.add_token("a");
        let result = WordPiece::builder().vocab(vocab).build();
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let files = model().save(dir.path()).unwrap();
        let reloaded = WordPiece::from_file(&files[0]).unwrap();
        assert_eq!(reloaded.token_to_id("##ing"), Some(5));
        assert_eq!(values(&reloaded.tokenize("unwanted")).len(), 3);
    }
}
