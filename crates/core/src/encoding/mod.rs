//! The per-input result of tokenization.
//!
//! An [`Encoding`] holds parallel arrays (ids, type ids, tokens, word ids,
//! offsets and masks) that always have the same length, plus the overflow
//! fragments truncation produced.

use crate::error::{Result, TokenizerError};
use crate::normalized::NormalizedString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A token produced by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: u32,
    pub value: String,
    /// Byte offsets in the normalized text
    pub offsets: (usize, usize),
}

impl Token {
    pub fn new(id: u32, value: String, offsets: (usize, usize)) -> Self {
        Self { id, value, offsets }
    }
}

/// Which side padding goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddingDirection {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoding {
    ids: Vec<u32>,
    type_ids: Vec<u32>,
    tokens: Vec<String>,
    word_ids: Vec<Option<u32>>,
    offsets: Vec<(usize, usize)>,
    special_tokens_mask: Vec<u32>,
    attention_mask: Vec<u32>,
    overflowing: Vec<Encoding>,
    normalized: Option<Arc<NormalizedString>>,
}

impl Encoding {
    pub fn with_capacity(len: usize) -> Self {
        Self {
            ids: Vec::with_capacity(len),
            type_ids: Vec::with_capacity(len),
            tokens: Vec::with_capacity(len),
            word_ids: Vec::with_capacity(len),
            offsets: Vec::with_capacity(len),
            special_tokens_mask: Vec::with_capacity(len),
            attention_mask: Vec::with_capacity(len),
            overflowing: Vec::new(),
            normalized: None,
        }
    }

    /// Build an encoding from model output.
    ///
    /// `word_ids[i]` is the pre-token the `i`-th token came from.
    pub fn from_tokens(tokens: Vec<Token>, word_ids: Vec<Option<u32>>, type_id: u32) -> Self {
        let mut encoding = Self::with_capacity(tokens.len());
        for (token, word_id) in tokens.into_iter().zip(word_ids) {
            encoding.push(token, word_id, type_id, false);
        }
        encoding
    }

    /// A one-token encoding for a special token.
    pub fn special(id: u32, token: &str, type_id: u32) -> Self {
        let mut encoding = Self::with_capacity(1);
        encoding.push(Token::new(id, token.to_owned(), (0, 0)), None, type_id, true);
        encoding
    }

    /// Append one real (attended) token.
    pub fn push(&mut self, token: Token, word_id: Option<u32>, type_id: u32, special: bool) {
        self.ids.push(token.id);
        self.tokens.push(token.value);
        self.offsets.push(token.offsets);
        self.word_ids.push(word_id);
        self.type_ids.push(type_id);
        self.special_tokens_mask.push(u32::from(special));
        self.attention_mask.push(1);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn type_ids(&self) -> &[u32] {
        &self.type_ids
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn word_ids(&self) -> &[Option<u32>] {
        &self.word_ids
    }

    pub fn offsets(&self) -> &[(usize, usize)] {
        &self.offsets
    }

    pub fn special_tokens_mask(&self) -> &[u32] {
        &self.special_tokens_mask
    }

    pub fn attention_mask(&self) -> &[u32] {
        &self.attention_mask
    }

    pub fn overflowing(&self) -> &[Encoding] {
        &self.overflowing
    }

    /// The normalized string this encoding was produced from.
    pub fn normalized(&self) -> Option<&NormalizedString> {
        self.normalized.as_deref()
    }

    /// Attach the normalized string, to this encoding and its fragments.
    pub fn set_normalized(&mut self, normalized: Arc<NormalizedString>) {
        for o in &mut self.overflowing {
            o.set_normalized(Arc::clone(&normalized));
        }
        self.normalized = Some(normalized);
    }

    /// Set every type id, including those of the overflow fragments.
    pub fn set_type_id(&mut self, type_id: u32) {
        self.type_ids.iter_mut().for_each(|t| *t = type_id);
        for o in &mut self.overflowing {
            o.set_type_id(type_id);
        }
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            ids: self.ids[start..end].to_vec(),
            type_ids: self.type_ids[start..end].to_vec(),
            tokens: self.tokens[start..end].to_vec(),
            word_ids: self.word_ids[start..end].to_vec(),
            offsets: self.offsets[start..end].to_vec(),
            special_tokens_mask: self.special_tokens_mask[start..end].to_vec(),
            attention_mask: self.attention_mask[start..end].to_vec(),
            overflowing: Vec::new(),
            normalized: self.normalized.clone(),
        }
    }

    fn without_overflowing(&self) -> Self {
        self.slice(0, self.len())
    }

    /// Keep the first `max_len` tokens and move the rest to `overflowing`.
    ///
    /// Fragments start every `max_len - stride` tokens, so consecutive
    /// fragments share `stride` tokens. Previous overflow is replaced.
    pub fn truncate(&mut self, max_len: usize, stride: usize) -> Result<()> {
        let len = self.len();
        if max_len >= len {
            return Ok(());
        }
        if max_len == 0 {
            let whole = std::mem::take(self);
            self.normalized = whole.normalized.clone();
            self.overflowing = vec![whole];
            return Ok(());
        }
        if stride >= max_len {
            return Err(TokenizerError::InvalidConfig(format!(
                "stride ({}) must be smaller than max length ({})",
                stride, max_len
            )));
        }

        let step = max_len - stride;
        let overflowing = (step..len)
            .step_by(step)
            .map(|start| self.slice(start, (start + max_len).min(len)))
            .collect();

        *self = Self {
            overflowing,
            ..self.slice(0, max_len)
        };
        Ok(())
    }

    /// Pad to `target_len` tokens. Overflow fragments are padded first.
    pub fn pad(
        &mut self,
        target_len: usize,
        pad_id: u32,
        pad_type_id: u32,
        pad_token: &str,
        direction: PaddingDirection,
    ) {
        for o in &mut self.overflowing {
            o.pad(target_len, pad_id, pad_type_id, pad_token, direction);
        }
        if self.len() >= target_len {
            return;
        }
        let n = target_len - self.len();

        match direction {
            PaddingDirection::Left => {
                self.ids.splice(0..0, std::iter::repeat(pad_id).take(n));
                self.type_ids
                    .splice(0..0, std::iter::repeat(pad_type_id).take(n));
                self.tokens
                    .splice(0..0, std::iter::repeat(pad_token.to_owned()).take(n));
                self.word_ids.splice(0..0, std::iter::repeat(None).take(n));
                self.offsets.splice(0..0, std::iter::repeat((0, 0)).take(n));
                self.special_tokens_mask
                    .splice(0..0, std::iter::repeat(1).take(n));
                self.attention_mask
                    .splice(0..0, std::iter::repeat(0).take(n));
            }
            PaddingDirection::Right => {
                self.ids.resize(target_len, pad_id);
                self.type_ids.resize(target_len, pad_type_id);
                self.tokens.resize(target_len, pad_token.to_owned());
                self.word_ids.resize(target_len, None);
                self.offsets.resize(target_len, (0, 0));
                self.special_tokens_mask.resize(target_len, 1);
                self.attention_mask.resize(target_len, 0);
            }
        }
    }

    /// Append `other` to this encoding.
    ///
    /// With `growing_offsets`, the offsets of `other`'s regular tokens are
    /// shifted past the largest end offset of `self`. Overflow fragments are
    /// combined as self-overflow x other, self-overflow x other-overflow,
    /// then self x other-overflow.
    pub fn merge_with(&mut self, other: Encoding, growing_offsets: bool) {
        let mut overflowing = Vec::new();
        let this = self.without_overflowing();
        let that = other.without_overflowing();

        for self_o in &self.overflowing {
            let mut merged = self_o.clone();
            merged.append(&that, growing_offsets);
            overflowing.push(merged);
            for other_o in &other.overflowing {
                let mut merged = self_o.clone();
                merged.append(other_o, growing_offsets);
                overflowing.push(merged);
            }
        }
        for other_o in &other.overflowing {
            let mut merged = this.clone();
            merged.append(other_o, growing_offsets);
            overflowing.push(merged);
        }

        self.append(&that, growing_offsets);
        self.overflowing = overflowing;
    }

    /// Concatenate encodings left to right.
    pub fn merge<I: IntoIterator<Item = Encoding>>(encodings: I, growing_offsets: bool) -> Self {
        let mut iter = encodings.into_iter();
        let mut first = iter.next().unwrap_or_default();
        for encoding in iter {
            first.merge_with(encoding, growing_offsets);
        }
        first
    }

    // Concatenate the arrays only.
    fn append(&mut self, other: &Encoding, growing_offsets: bool) {
        let shift = if growing_offsets {
            self.offsets.iter().map(|o| o.1).max().unwrap_or(0)
        } else {
            0
        };
        self.ids.extend_from_slice(&other.ids);
        self.type_ids.extend_from_slice(&other.type_ids);
        self.tokens.extend_from_slice(&other.tokens);
        self.word_ids.extend_from_slice(&other.word_ids);
        self.offsets.extend(
            other
                .offsets
                .iter()
                .zip(&other.special_tokens_mask)
                .map(|(&(start, end), &special)| {
                    if special == 1 {
                        (start, end)
                    } else {
                        (start + shift, end + shift)
                    }
                }),
        );
        self.special_tokens_mask
            .extend_from_slice(&other.special_tokens_mask);
        self.attention_mask.extend_from_slice(&other.attention_mask);
        if self.normalized.is_none() {
            self.normalized = other.normalized.clone();
        }
    }
}
