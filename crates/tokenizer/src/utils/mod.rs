//! Utility modules for the tokenizer.
//!
//! This module contains the shared encode cache and the padding and
//! truncation parameters applied after encoding.

pub mod cache;
pub mod padding;
pub mod truncation;

pub use cache::{CacheStats, EncodingCache};
pub use padding::{pad_encodings, PaddingParams, PaddingStrategy};
pub use truncation::{truncate_encodings, TruncationParams, TruncationStrategy};
