//! Core BPE data structures.
//!
//! Vocabularies, merge tables, the priority queues used by training and
//! encoding, and the symbol lists merges are applied to.

pub mod merges;
pub mod priority;
pub mod vocab;
pub mod word;

pub use merges::{MergeMap, MergeRules, Pair};
pub use priority::{MergeCandidate, MergeEntry, PairPriorityQueue};
pub use vocab::{Vocab, VocabR, Vocabulary};
pub use word::{Symbol, Word};
