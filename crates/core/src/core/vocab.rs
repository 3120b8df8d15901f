//! Vocabulary storage and lookup.
//!
//! This module provides vocabulary storage using AHashMap for fast lookups
//! and CompactString for memory-efficient string storage.

use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Forward mapping: token string -> ID
pub type Vocab = AHashMap<CompactString, u32>;

/// Reverse mapping: ID -> token string
pub type VocabR = AHashMap<u32, CompactString>;

/// Vocabulary with forward and reverse mappings.
///
/// IDs handed out by [`Vocabulary::add_token`] are dense: the next free ID is
/// always one past the highest ID in use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Forward mapping: token string -> ID
    pub vocab: Vocab,
    /// Reverse mapping: ID -> token string
    pub vocab_r: VocabR,
    next_id: u32,
}

impl Vocabulary {
    /// Create a new empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new vocabulary with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vocab: Vocab::with_capacity(capacity),
            vocab_r: VocabR::with_capacity(capacity),
            next_id: 0,
        }
    }

    /// Build a vocabulary from a token -> ID map, as found in `vocab.json`.
    ///
    /// Two tokens sharing an ID is a format error.
    pub fn from_map(map: HashMap<String, u32>) -> Result<Self> {
        let mut vocabulary = Self::with_capacity(map.len());
        for (token, id) in map {
            if let Some(existing) = vocabulary.vocab_r.get(&id) {
                return Err(TokenizerError::Format(format!(
                    "ID {} is assigned to both '{}' and '{}'",
                    id, existing, token
                )));
            }
            vocabulary.add_token_with_id(&token, id)?;
        }
        Ok(vocabulary)
    }

    /// Add a token to the vocabulary.
    ///
    /// Returns the ID assigned to the token, or its existing ID.
    pub fn add_token(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.vocab.get(token) {
            return id;
        }

        let id = self.next_id;
        let token = CompactString::new(token);
        self.vocab_r.insert(id, token.clone());
        self.vocab.insert(token, id);
        self.next_id = self.next_id.saturating_add(1);

        id
    }

    /// Add a token with a specific ID.
    ///
    /// Returns an error if the ID is already taken by another token, or the
    /// token is already present under another ID.
    pub fn add_token_with_id(&mut self, token: &str, id: u32) -> Result<()> {
        if let Some(existing) = self.vocab_r.get(&id) {
            if existing.as_str() != token {
                return Err(TokenizerError::InvalidConfig(format!(
                    "Token ID {} already exists",
                    id
                )));
            }
            return Ok(());
        }
        if let Some(&existing) = self.vocab.get(token) {
            return Err(TokenizerError::InvalidConfig(format!(
                "Token '{}' already has ID {}",
                token, existing
            )));
        }

        let next_id = id.checked_add(1).ok_or_else(|| {
            TokenizerError::Format(format!("Token '{}' has ID {}, past the last usable ID", token, id))
        })?;

        let token = CompactString::new(token);
        self.vocab_r.insert(id, token.clone());
        self.vocab.insert(token, id);
        self.next_id = self.next_id.max(next_id);

        Ok(())
    }

    /// Get the ID for a token string.
    #[inline]
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    /// Get the token string for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.vocab_r.get(&id).map(|s| s.as_str())
    }

    /// Check whether a token is present.
    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.vocab.contains_key(token)
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// The ID the next [`Vocabulary::add_token`] call would hand out.
    #[inline]
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// All entries ordered by ID.
    pub fn sorted(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self
            .vocab
            .iter()
            .map(|(token, &id)| (token.as_str(), id))
            .collect();
        entries.sort_unstable_by_key(|&(_, id)| id);
        entries
    }

    /// Copy the forward mapping into a std `HashMap`.
    pub fn to_map(&self) -> HashMap<String, u32> {
        self.vocab
            .iter()
            .map(|(token, &id)| (token.to_string(), id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_token() {
        let mut vocab = Vocabulary::new();
        let id1 = vocab.add_token("hello");
        let id2 = vocab.add_token("world");

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(vocab.get_id("hello"), Some(0));
        assert_eq!(vocab.get_id("world"), Some(1));
        assert_eq!(vocab.get_token(0), Some("hello"));
        assert_eq!(vocab.get_token(1), Some("world"));
    }

    #[test]
    fn test_add_duplicate_token() {
        let mut vocab = Vocabulary::new();
        let id1 = vocab.add_token("hello");
        let id2 = vocab.add_token("hello");

        assert_eq!(id1, id2);
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn test_add_token_with_id_keeps_ids_dense_afterwards() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id("hello", 5).unwrap();
        vocab.add_token_with_id("world", 10).unwrap();

        assert_eq!(vocab.get_id("hello"), Some(5));
        assert_eq!(vocab.get_token(10), Some("world"));
        assert_eq!(vocab.add_token("next"), 11);
    }

    #[test]
    fn test_add_token_with_taken_id() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id("hello", 0).unwrap();
        assert!(vocab.add_token_with_id("hello", 0).is_ok());
        assert!(vocab.add_token_with_id("world", 0).is_err());
        assert!(vocab.add_token_with_id("hello", 1).is_err());
    }

    #[test]
    fn test_from_map_rejects_shared_ids() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), 0);
        map.insert("b".to_string(), 0);
        assert!(matches!(
            Vocabulary::from_map(map),
            Err(TokenizerError::Format(_))
        ));
    }

    #[test]
    fn test_from_map_rejects_last_id() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), u32::MAX);
        assert!(matches!(
            Vocabulary::from_map(map),
            Err(TokenizerError::Format(_))
        ));

        let mut map = HashMap::new();
        map.insert("a".to_string(), u32::MAX - 1);
        let vocab = Vocabulary::from_map(map).unwrap();
        assert_eq!(vocab.next_id(), u32::MAX);
    }

    #[test]
    fn test_sorted() {
        let mut map = HashMap::new();
        map.insert("c".to_string(), 2);
        map.insert("a".to_string(), 0);
        map.insert("b".to_string(), 1);
        let vocab = Vocabulary::from_map(map).unwrap();
        assert_eq!(vocab.sorted(), vec![("a", 0), ("b", 1), ("c", 2)]);
    }
}
