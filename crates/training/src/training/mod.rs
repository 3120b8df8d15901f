//! Training infrastructure for BPE tokenizers.
//!
//! This module provides the training algorithms and utilities for
//! learning BPE merge rules from word counts.

pub mod counter;
pub mod trainer;

pub use counter::{count_pairs_parallel, count_pairs_sequential, WordCounter};
pub use trainer::{BpeTrainer, TrainingConfig, TrainingConfigBuilder};
