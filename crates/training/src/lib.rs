//! subtok-training - BPE training infrastructure
//!
//! This crate provides the training algorithms and utilities for learning
//! BPE merge rules from text data.
//!
//! # Features
//!
//! - Word counting and parallel pair frequency counting
//! - Configurable training parameters (vocab size, min frequency, alphabet
//!   limits, subword prefix and suffix, special tokens)
//! - Integration with subtok-core for vocabulary and merge operations
//!
//! # Example
//!
//! ```rust
//! use subtok_training::{BpeTrainer, TrainingConfig};
//!
//! let config = TrainingConfig::builder()
//!     .vocab_size(100)
//!     .min_frequency(2)
//!     .show_progress(false)
//!     .build()?;
//!
//! let mut trainer = BpeTrainer::new(config);
//! trainer.feed(["low", "lower", "lowest", "low"]);
//! let (vocab, merges) = trainer.train()?;
//! assert!(vocab.contains("low"));
//! assert!(!merges.is_empty());
//! # Ok::<(), subtok_training::TokenizerError>(())
//! ```

pub use subtok_core::{Result, TokenizerError};

// Training infrastructure
pub mod training;
pub use training::{BpeTrainer, TrainingConfig, TrainingConfigBuilder, WordCounter};
