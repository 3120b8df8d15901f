//! subtok-core - data structures shared by the subtok tokenizer and trainer
//!
//! This crate provides the pieces every stage of the pipeline agrees on,
//! independent of any particular normalizer or model.
//!
//! # Features
//!
//! - Vocabulary storage using `AHashMap` and compact strings
//! - Merge tables, merge priority queues and per-word symbol lists
//! - `NormalizedString`, which tracks alignments back to the original text
//! - `Encoding`, with truncation, padding and merging
//! - The byte-to-unicode table of byte-level BPE
//!
//! # Example
//!
//! ```rust
//! use subtok_core::{NormalizedString, Vocabulary};
//!
//! let mut vocab = Vocabulary::new();
//! assert_eq!(vocab.add_token("hello"), 0);
//!
//! let mut normalized = NormalizedString::from("HÉllo");
//! normalized.lowercase().unwrap();
//! assert_eq!(normalized.normalized(), "héllo");
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

pub mod core;
pub use core::{
    MergeCandidate, MergeEntry, MergeMap, MergeRules, Pair, PairPriorityQueue, Symbol, Vocab,
    VocabR, Vocabulary, Word,
};

pub mod byte_level;
pub mod encoding;
pub mod normalized;

pub use encoding::{Encoding, PaddingDirection, Token};
pub use normalized::{NormalizationForm, NormalizedString};
