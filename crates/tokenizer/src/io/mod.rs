//! Reading and writing tokenizer files.
//!
//! BPE models use `vocab.json` + `merges.txt`, WordPiece models use
//! `vocab.txt`, and a saved tokenizer adds a `tokenizer.json` describing
//! the rest of the pipeline.

pub mod format;
pub mod load;
pub mod save;

pub use format::{SerializedModel, SerializedTokenizer};
