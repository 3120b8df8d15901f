//! Readers for vocabulary, merges and pipeline files.

use super::format::SerializedTokenizer;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use subtok_core::{Result, TokenizerError, Vocabulary};

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))
}

/// Read a BPE `vocab.json` (token -> id object).
pub fn read_vocab_json(path: &Path) -> Result<Vocabulary> {
    let content = read_to_string(path)?;
    let map: HashMap<String, u32> = serde_json::from_str(&content)?;
    let vocab = Vocabulary::from_map(map)?;
    log::debug!("Read {} tokens from {}", vocab.len(), path.display());
    Ok(vocab)
}

/// Parse the content of a `merges.txt` file into token pairs, in rank order.
///
/// A leading `#version` line is skipped, as are blank lines. Every other
/// line must hold exactly two whitespace-separated tokens.
pub fn parse_merges(content: &str) -> Result<Vec<(String, String)>> {
    let mut merges = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if (index == 0 && line.starts_with("#version")) || line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(left), Some(right), None) => merges.push((left.to_owned(), right.to_owned())),
            _ => {
                return Err(TokenizerError::InvalidMerge {
                    line: index + 1,
                    content: line.to_owned(),
                })
            }
        }
    }
    Ok(merges)
}

/// Read a `merges.txt` file.
pub fn read_merges(path: &Path) -> Result<Vec<(String, String)>> {
    parse_merges(&read_to_string(path)?)
}

/// Read a WordPiece `vocab.txt`; each token's id is its zero-based line index.
pub fn read_vocab_txt(path: &Path) -> Result<Vocabulary> {
    let content = read_to_string(path)?;
    let mut vocab = Vocabulary::new();
    for (index, token) in content.lines().enumerate() {
        vocab.add_token_with_id(token, index as u32).map_err(|_| {
            TokenizerError::Format(format!(
                "Duplicate token '{}' at line {} of {}",
                token,
                index + 1,
                path.display()
            ))
        })?;
    }
    Ok(vocab)
}

/// Read a `tokenizer.json` pipeline description.
pub fn read_tokenizer_json(path: &Path) -> Result<SerializedTokenizer> {
    Ok(serde_json::from_str(&read_to_string(path)?)?)
}
