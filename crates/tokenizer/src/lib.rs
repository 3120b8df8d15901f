//! subtok-tokenizer - High-level tokenizer API
//!
//! This crate assembles the tokenization pipeline on top of `subtok-core`:
//! added tokens are extracted, the rest is normalized, pre-tokenized and
//! handed to a subword model, then truncated, wrapped in special tokens and
//! padded.
//!
//! # Features
//!
//! - Builder pattern for tokenizer configuration
//! - BERT and Unicode normalizers with offset tracking
//! - Whitespace, punctuation, BERT and byte-level pre-tokenizers
//! - BPE (with dropout and an encode cache) and WordPiece models
//! - Truncation with overflow, padding and BERT/RoBERTa post-processing
//! - Parallel and cancellable batch encoding
//! - Training BPE models from text through the same pipeline
//! - Loading and saving `vocab.json`/`merges.txt`/`vocab.txt` files
//!
//! # Example
//!
//! ```rust
//! use subtok_tokenizer::{
//!     BertNormalizer, Decoder, Model, PostProcessor, PreTokenizer, Tokenizer, Vocabulary,
//!     WordPiece,
//! };
//!
//! let mut vocab = Vocabulary::new();
//! for token in ["[UNK]", "[CLS]", "[SEP]", "hello", "wor", "##ld"] {
//!     vocab.add_token(token);
//! }
//! let model: Model = WordPiece::builder().vocab(vocab).build()?.into();
//!
//! let tokenizer = Tokenizer::builder()
//!     .post_processor(PostProcessor::bert(&model)?)
//!     .model(model)
//!     .normalizer(BertNormalizer::default().into())
//!     .pre_tokenizer(PreTokenizer::Bert)
//!     .decoder(Decoder::wordpiece())
//!     .build()?;
//!
//! let encoding = tokenizer.encode("Hello World", true)?;
//! assert_eq!(encoding.tokens(), &["[CLS]", "hello", "wor", "##ld", "[SEP]"]);
//! assert_eq!(tokenizer.decode(encoding.ids(), true), "hello world");
//! # Ok::<(), subtok_tokenizer::TokenizerError>(())
//! ```

// Re-export core types
pub use subtok_core::{Encoding, NormalizedString, PaddingDirection, Result, TokenizerError, Vocabulary};
pub use subtok_training::{BpeTrainer, TrainingConfig};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{BatchEncoding, EncodeInput, Tokenizer, TokenizerBuilder};

// Pipeline stages
pub mod added_vocabulary;
pub mod decoders;
pub mod models;
pub mod normalizer;
pub mod pre_tokenizer;
pub mod processors;

pub use added_vocabulary::AddedToken;
pub use decoders::Decoder;
pub use models::{Bpe, BpeOptions, Model, WordPiece, WordPieceOptions};
pub use normalizer::{BertNormalizer, Normalizer};
pub use pre_tokenizer::{PreToken, PreTokenizer};
pub use processors::PostProcessor;

// IO/Serialization
pub mod io;

// Utilities
pub mod utils;
pub use utils::{
    CacheStats, EncodingCache, PaddingParams, PaddingStrategy, TruncationParams,
    TruncationStrategy,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
