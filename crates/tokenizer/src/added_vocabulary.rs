//! Tokens added on top of the model vocabulary.
//!
//! Added tokens are found in the raw input with an Aho-Corasick automaton
//! (leftmost-longest) before normalization, and are emitted verbatim.

use crate::models::Model;
use ahash::{AHashMap, AHashSet};
use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use subtok_core::{Result, TokenizerError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddedToken {
    pub content: String,
    /// Special tokens are dropped by `decode(.., skip_special_tokens = true)`
    #[serde(default)]
    pub special: bool,
}

impl AddedToken {
    pub fn new(content: impl Into<String>, special: bool) -> Self {
        Self {
            content: content.into(),
            special,
        }
    }

    pub fn special(content: impl Into<String>) -> Self {
        Self::new(content, true)
    }
}

impl From<&str> for AddedToken {
    fn from(content: &str) -> Self {
        Self::new(content, false)
    }
}

/// A piece of input text after added tokens were located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text to normalize and tokenize
    Text(&'a str),
    /// An added token, taken as-is
    Added { id: u32, content: &'a str },
}

#[derive(Debug, Clone, Default)]
pub struct AddedVocabulary {
    // Insertion order, for serialization.
    tokens: Vec<(AddedToken, u32)>,
    ids: AHashMap<String, u32>,
    contents: AHashMap<u32, String>,
    special_ids: AHashSet<u32>,
    matcher: Option<AhoCorasick>,
    // Pattern index -> token id.
    pattern_ids: Vec<u32>,
}

impl AddedVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Added tokens with their ids, in the order they were added.
    pub fn tokens(&self) -> &[(AddedToken, u32)] {
        &self.tokens
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        self.contents.get(&id).map(String::as_str)
    }

    pub fn is_special(&self, id: u32) -> bool {
        self.special_ids.contains(&id)
    }

    /// Add tokens, returning how many were new.
    ///
    /// A token already in the model vocabulary keeps its id; others get ids
    /// after the model vocabulary and the tokens added before them. Tokens
    /// already added are not added again, but may be promoted to special.
    pub fn add_tokens(&mut self, tokens: &[AddedToken], model: &Model) -> Result<usize> {
        let mut added = 0;
        for token in tokens {
            if token.content.is_empty() {
                continue;
            }
            if let Some(&id) = self.ids.get(&token.content) {
                if token.special {
                    self.special_ids.insert(id);
                    if let Some(entry) = self.tokens.iter_mut().find(|(_, i)| *i == id) {
                        entry.0.special = true;
                    }
                }
                continue;
            }
            let id = match model.token_to_id(&token.content) {
                Some(id) => id,
                None => self.next_id(model)?,
            };
            self.insert(token.clone(), id);
            added += 1;
        }
        if added > 0 {
            log::debug!("Added {} tokens, {} in total", added, self.len());
        }
        self.refresh()?;
        Ok(added)
    }

    /// Restore a token with a known id, as read from a saved tokenizer.
    pub fn restore(&mut self, tokens: impl IntoIterator<Item = (AddedToken, u32)>) -> Result<()> {
        for (token, id) in tokens {
            if let Some(&existing) = self.ids.get(&token.content) {
                if existing != id {
                    return Err(TokenizerError::Format(format!(
                        "Added token '{}' has ids {} and {}",
                        token.content, existing, id
                    )));
                }
                continue;
            }
            self.insert(token, id);
        }
        self.refresh()
    }

    fn next_id(&self, model: &Model) -> Result<u32> {
        let exhausted = || TokenizerError::InvalidConfig("no token ID left for added tokens".to_owned());
        let after_added = match self.contents.keys().max() {
            Some(&id) => id.checked_add(1).ok_or_else(exhausted)?,
            None => 0,
        };
        let after_model = u32::try_from(model.vocab_size()).map_err(|_| exhausted())?;
        Ok(after_model.max(after_added))
    }

    fn insert(&mut self, token: AddedToken, id: u32) {
        if token.special {
            self.special_ids.insert(id);
        }
        self.ids.insert(token.content.clone(), id);
        self.contents.insert(id, token.content.clone());
        self.tokens.push((token, id));
    }

    fn refresh(&mut self) -> Result<()> {
        if self.tokens.is_empty() {
            self.matcher = None;
            self.pattern_ids.clear();
            return Ok(());
        }
        let patterns: Vec<&str> = self.tokens.iter().map(|(t, _)| t.content.as_str()).collect();
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| TokenizerError::InvalidConfig(format!("Added tokens: {}", e)))?;
        self.pattern_ids = self.tokens.iter().map(|&(_, id)| id).collect();
        self.matcher = Some(matcher);
        Ok(())
    }

    /// Cut `text` around the added tokens it contains.
    pub fn split<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        let mut last = 0;
        if let Some(matcher) = &self.matcher {
            for found in matcher.find_iter(text) {
                if found.start() > last {
                    segments.push(Segment::Text(&text[last..found.start()]));
                }
                segments.push(Segment::Added {
                    id: self.pattern_ids[found.pattern().as_usize()],
                    content: &text[found.start()..found.end()],
                });
                last = found.end();
            }
        }
        if last < text.len() {
            segments.push(Segment::Text(&text[last..]));
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WordPiece;
    use subtok_core::Vocabulary;

    fn model() -> Model {
        let mut vocab = Vocabulary::new();
        for token in ["[UNK]", "[CLS]", "hello"] {
            vocab.add_token(token);
        }
        WordPiece::builder().vocab(vocab).build().unwrap().into()
    }

    #[test]
    fn test_ids_reuse_model_or_follow_it() {
        let model = model();
        let mut added = AddedVocabulary::new();
        let count = added
            .add_tokens(
                &[
                    AddedToken::special("[CLS]"),
                    AddedToken::special("[MASK]"),
                    AddedToken::from("<new>"),
                ],
                &model,
            )
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(added.token_to_id("[CLS]"), Some(1));
        assert_eq!(added.token_to_id("[MASK]"), Some(3));
        assert_eq!(added.token_to_id("<new>"), Some(4));
        assert!(added.is_special(3));
        assert!(!added.is_special(4));

        // Already present: not re-added.
        assert_eq!(added.add_tokens(&[AddedToken::from("[MASK]")], &model).unwrap(), 0);
        assert_eq!(added.len(), 3);
    }

    #[test]
    fn test_split_leftmost_longest() {
        let mut added = AddedVocabulary::new();
        added
            .add_tokens(&["<a>".into(), "<a><b>".into()], &model())
            .unwrap();

        let segments = added.split("x<a><b>y<a>");
        assert_eq!(
            segments,
            vec![
                Segment::Text("x"),
                Segment::Added {
                    id: 4,
                    content: "<a><b>"
                },
                Segment::Text("y"),
                Segment::Added {
                    id: 3,
                    content: "<a>"
                },
            ]
        );
    }

    #[test]
    fn test_split_without_tokens() {
        let added = AddedVocabulary::new();
        assert_eq!(added.split("plain"), vec![Segment::Text("plain")]);
        assert!(added.split("").is_empty());
    }

    #[test]
    fn test_no_id_left() {
        let mut added = AddedVocabulary::new();
        added.restore([(AddedToken::from("<last>"), u32::MAX)]).unwrap();
        let err = added.add_tokens(&["<next>".into()], &model()).unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidConfig(_)));
        assert_eq!(added.token_to_id("<next>"), None);
    }

    #[test]
    fn test_restore_conflict() {
        let mut added = AddedVocabulary::new();
        added
            .restore([(AddedToken::special("<s>"), 5), (AddedToken::special("<s>"), 5)])
            .unwrap();
        assert_eq!(added.id_to_token(5), Some("<s>"));

        let err = added.restore([(AddedToken::special("<s>"), 6)]).unwrap_err();
        assert!(matches!(err, TokenizerError::Format(_)));
    }
}
