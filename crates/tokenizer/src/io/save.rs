//! Writers for vocabulary, merges and pipeline files.

use super::format::{SerializedTokenizer, MERGES_HEADER};
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use subtok_core::{MergeRules, Result, TokenizerError, Vocabulary};

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| TokenizerError::io(path, e))
}

fn finish(mut writer: BufWriter<File>, path: &Path) -> Result<()> {
    writer.flush().map_err(|e| TokenizerError::io(path, e))
}

// `vocab.json` object with entries in id order.
struct IdOrdered<'a>(&'a Vocabulary);

impl Serialize for IdOrdered<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.sorted())
    }
}

/// Write a `vocab.json`, entries ordered by id.
pub fn write_vocab_json(vocab: &Vocabulary, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, &IdOrdered(vocab))?;
    finish(writer, path)
}

/// Write a `merges.txt`, one merge per line in rank order.
pub fn write_merges(vocab: &Vocabulary, merges: &MergeRules, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    let token = |id: u32| vocab.get_token(id).ok_or(TokenizerError::UnknownTokenId(id));

    writeln!(writer, "{}", MERGES_HEADER).map_err(|e| TokenizerError::io(path, e))?;
    for ((left, right), _) in merges.ordered() {
        writeln!(writer, "{} {}", token(left)?, token(right)?)
            .map_err(|e| TokenizerError::io(path, e))?;
    }
    finish(writer, path)
}

/// Write a WordPiece `vocab.txt`, one token per line in id order.
///
/// Ids are implied by line numbers, so gaps in the id space close up.
pub fn write_vocab_txt(vocab: &Vocabulary, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    for (token, _) in vocab.sorted() {
        writeln!(writer, "{}", token).map_err(|e| TokenizerError::io(path, e))?;
    }
    finish(writer, path)
}

/// Write a `tokenizer.json` pipeline description.
pub fn write_tokenizer_json(tokenizer: &SerializedTokenizer, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, tokenizer)?;
    finish(writer, path)
}
