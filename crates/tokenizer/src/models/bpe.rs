//! Byte-pair encoding model.
//!
//! Each pre-token is split into one symbol per char, then merges are applied
//! lowest rank first until none applies. Results are cached per word unless
//! dropout makes them non-deterministic.

use crate::io::{format, load, save};
use crate::utils::cache::{CacheStats, EncodingCache, DEFAULT_CACHE_CAPACITY};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use subtok_core::{MergeRules, Result, Token, TokenizerError, Vocabulary, Word};

/// Options of a BPE model, independent of its vocabulary and merges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BpeOptions {
    /// Number of words kept in the encode cache; 0 disables it
    pub cache_capacity: usize,
    /// Probability of skipping each merge
    pub dropout: Option<f32>,
    /// Seed making dropout reproducible
    pub dropout_seed: Option<u64>,
    pub unk_token: Option<String>,
    pub continuing_subword_prefix: Option<String>,
    pub end_of_word_suffix: Option<String>,
    /// Fuse consecutive unknown chars into one unknown token
    pub fuse_unk: bool,
    /// Words with more chars than this become a single unknown token
    pub max_word_length: Option<usize>,
}

impl Default for BpeOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            dropout: None,
            dropout_seed: None,
            unk_token: None,
            continuing_subword_prefix: None,
            end_of_word_suffix: None,
            fuse_unk: false,
            max_word_length: None,
        }
    }
}

enum MergeSource {
    Pairs(Vec<(String, String)>),
    Rules(MergeRules),
}

/// Builder for [`Bpe`].
pub struct BpeBuilder {
    options: BpeOptions,
    vocab: Vocabulary,
    merges: MergeSource,
    files: Option<(PathBuf, PathBuf)>,
}

impl Default for BpeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BpeBuilder {
    pub fn new() -> Self {
        Self {
            options: BpeOptions::default(),
            vocab: Vocabulary::new(),
            merges: MergeSource::Pairs(Vec::new()),
            files: None,
        }
    }

    /// Read the vocabulary from `vocab.json` and the merges from `merges.txt`.
    pub fn files(mut self, vocab: impl Into<PathBuf>, merges: impl Into<PathBuf>) -> Self {
        self.files = Some((vocab.into(), merges.into()));
        self
    }

    /// Use an in-memory vocabulary and merges given as token pairs in rank order.
    pub fn vocab_and_merges(mut self, vocab: Vocabulary, merges: Vec<(String, String)>) -> Self {
        self.vocab = vocab;
        self.merges = MergeSource::Pairs(merges);
        self
    }

    /// Use a vocabulary and an already resolved merge table, e.g. from a trainer.
    pub fn merge_rules(mut self, vocab: Vocabulary, merges: MergeRules) -> Self {
        self.vocab = vocab;
        self.merges = MergeSource::Rules(merges);
        self
    }

    pub fn options(mut self, options: BpeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.options.cache_capacity = capacity;
        self
    }

    pub fn dropout(mut self, dropout: f32) -> Self {
        self.options.dropout = Some(dropout);
        self
    }

    pub fn dropout_seed(mut self, seed: u64) -> Self {
        self.options.dropout_seed = Some(seed);
        self
    }

    pub fn unk_token(mut self, token: impl Into<String>) -> Self {
        self.options.unk_token = Some(token.into());
        self
    }

    pub fn continuing_subword_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.continuing_subword_prefix = Some(prefix.into());
        self
    }

    pub fn end_of_word_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.options.end_of_word_suffix = Some(suffix.into());
        self
    }

    pub fn fuse_unk(mut self, fuse: bool) -> Self {
        self.options.fuse_unk = fuse;
        self
    }

    pub fn max_word_length(mut self, length: usize) -> Self {
        self.options.max_word_length = Some(length);
        self
    }

    pub fn build(self) -> Result<Bpe> {
        if let Some(p) = self.options.dropout {
            if !(0.0..=1.0).contains(&p) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "dropout must be within [0, 1], got {}",
                    p
                )));
            }
        }

        let (vocab, merges) = match self.files {
            Some((vocab_path, merges_path)) => {
                let vocab = load::read_vocab_json(&vocab_path)?;
                let merges = load::read_merges(&merges_path)?;
                (vocab, MergeSource::Pairs(merges))
            }
            None => (self.vocab, self.merges),
        };
        let merges = match merges {
            MergeSource::Rules(rules) => rules,
            MergeSource::Pairs(pairs) => resolve_merges(
                &vocab,
                &pairs,
                self.options.continuing_subword_prefix.as_deref(),
            )?,
        };

        log::debug!(
            "BPE model with {} tokens and {} merges",
            vocab.len(),
            merges.len()
        );
        let cache = (self.options.cache_capacity > 0)
            .then(|| EncodingCache::with_capacity(self.options.cache_capacity));
        Ok(Bpe {
            vocab,
            merges,
            cache,
            options: self.options,
        })
    }
}

// Turn token pairs into id-level merges. The merged token drops the
// continuing-subword prefix of its right half.
fn resolve_merges(
    vocab: &Vocabulary,
    pairs: &[(String, String)],
    prefix: Option<&str>,
) -> Result<MergeRules> {
    let lookup = |token: &str| {
        vocab.get_id(token).ok_or_else(|| {
            TokenizerError::Format(format!("Merge token '{}' is missing from the vocabulary", token))
        })
    };

    let mut rules = MergeRules::with_capacity(pairs.len());
    for (rank, (left, right)) in pairs.iter().enumerate() {
        let left_id = lookup(left)?;
        let right_id = lookup(right)?;
        let tail = prefix
            .and_then(|p| right.strip_prefix(p))
            .unwrap_or(right);
        let new_id = lookup(&format!("{}{}", left, tail))?;
        rules.add_merge((left_id, right_id), rank as u32, new_id);
    }
    Ok(rules)
}

/// A BPE model.
#[derive(Debug, Clone)]
pub struct Bpe {
    vocab: Vocabulary,
    merges: MergeRules,
    cache: Option<EncodingCache<String, Word>>,
    options: BpeOptions,
}

impl Bpe {
    pub fn builder() -> BpeBuilder {
        BpeBuilder::new()
    }

    /// Load a model from `vocab.json` and `merges.txt`.
    pub fn from_files(vocab: impl AsRef<Path>, merges: impl AsRef<Path>) -> Result<Self> {
        BpeBuilder::new()
            .files(vocab.as_ref(), merges.as_ref())
            .build()
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn merges(&self) -> &MergeRules {
        &self.merges
    }

    pub fn options(&self) -> &BpeOptions {
        &self.options
    }

    pub fn unk_token(&self) -> Option<&str> {
        self.options.unk_token.as_deref()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(EncodingCache::stats)
    }

    fn dropout(&self) -> Option<f32> {
        self.options.dropout.filter(|&p| p > 0.0)
    }

    /// Tokenize one pre-token. Offsets are byte ranges within `word`.
    pub fn tokenize(&self, word: &str) -> Result<Vec<Token>> {
        if word.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(max) = self.options.max_word_length {
            if word.chars().count() > max {
                return Ok(match self.unk_id()? {
                    Some((id, unk)) => vec![Token::new(id, unk.to_owned(), (0, word.len()))],
                    None => Vec::new(),
                });
            }
        }

        let cacheable = self.dropout().is_none();
        if cacheable {
            if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(word)) {
                return self.word_to_tokens(&hit);
            }
        }

        let merged = self.merge_word(word)?;
        let tokens = self.word_to_tokens(&merged)?;
        if cacheable {
            if let Some(cache) = &self.cache {
                cache.set(word.to_owned(), merged);
            }
        }
        Ok(tokens)
    }

    fn unk_id(&self) -> Result<Option<(u32, &str)>> {
        match self.unk_token() {
            None => Ok(None),
            Some(unk) => self
                .vocab
                .get_id(unk)
                .map(|id| Some((id, unk)))
                .ok_or_else(|| TokenizerError::UnknownToken(unk.to_owned())),
        }
    }

    fn merge_word(&self, word: &str) -> Result<Word> {
        let prefix = self.options.continuing_subword_prefix.as_deref();
        let suffix = self.options.end_of_word_suffix.as_deref();
        let char_count = word.chars().count();

        let mut symbols = Word::with_capacity(char_count);
        let mut last_was_unk = false;
        let mut surface = String::new();
        for (i, c) in word.chars().enumerate() {
            surface.clear();
            if i > 0 {
                surface.push_str(prefix.unwrap_or_default());
            }
            surface.push(c);
            if i + 1 == char_count {
                surface.push_str(suffix.unwrap_or_default());
            }

            let len = c.len_utf8();
            if let Some(id) = self.vocab.get_id(&surface) {
                symbols.add(id, len);
                last_was_unk = false;
            } else if let Some((unk_id, _)) = self.unk_id()? {
                if !(self.options.fuse_unk && last_was_unk && symbols.extend_last(unk_id, len)) {
                    symbols.add(unk_id, len);
                }
                last_was_unk = true;
            } else {
                symbols.skip(len);
            }
        }

        match (self.dropout(), self.options.dropout_seed) {
            (Some(p), Some(seed)) => {
                symbols.merge_all(&self.merges, Some(p), &mut StdRng::seed_from_u64(seed))
            }
            (dropout, _) => symbols.merge_all(&self.merges, dropout, &mut rand::thread_rng()),
        }
        Ok(symbols)
    }

    fn word_to_tokens(&self, word: &Word) -> Result<Vec<Token>> {
        word.symbols()
            .iter()
            .zip(word.offsets())
            .map(|(symbol, offsets)| {
                let value = self
                    .vocab
                    .get_token(symbol.id)
                    .ok_or(TokenizerError::UnknownTokenId(symbol.id))?;
                Ok(Token::new(symbol.id, value.to_owned(), offsets))
            })
            .collect()
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

    /// Write `vocab.json` and `merges.txt` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let vocab_path = dir.join(format::VOCAB_JSON);
        let merges_path = dir.join(format::MERGES_TXT);
        save::write_vocab_json(&self.vocab, &vocab_path)?;
        save::write_merges(&self.vocab, &self.merges, &merges_path)?;
        Ok(vec![vocab_path, merges_path])
    }
}
