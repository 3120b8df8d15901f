//! Saving and loading whole tokenizers.

use super::{check_truncation, Tokenizer};
use crate::added_vocabulary::AddedVocabulary;
use crate::io::format::{SerializedAddedToken, SerializedModel, SerializedTokenizer, TOKENIZER_JSON};
use crate::io::{load, save};
use crate::models::{Bpe, Model, WordPiece};
use std::fs;
use std::path::{Path, PathBuf};
use subtok_core::{Result, TokenizerError};

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| TokenizerError::Format(format!("Invalid model file path {}", path.display())))
}

impl Tokenizer {
    /// Save the tokenizer into `dir`: the model files plus `tokenizer.json`.
    ///
    /// Returns the paths of every file written.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| TokenizerError::io(dir, e))?;

        let mut files = self.model.save(dir)?;
        let model = match (&self.model, files.as_slice()) {
            (Model::Bpe(bpe), [vocab, merges]) => SerializedModel::Bpe {
                vocab: file_name(vocab)?,
                merges: file_name(merges)?,
                options: bpe.options().clone(),
            },
            (Model::WordPiece(wordpiece), [vocab]) => SerializedModel::WordPiece {
                vocab: file_name(vocab)?,
                options: wordpiece.options().clone(),
            },
            _ => {
                return Err(TokenizerError::State(format!(
                    "Model wrote {} files",
                    files.len()
                )))
            }
        };

        let serialized = SerializedTokenizer {
            version: crate::VERSION.to_owned(),
            model,
            normalizer: self.normalizer.clone(),
            pre_tokenizer: self.pre_tokenizer,
            post_processor: self.post_processor.clone(),
            decoder: self.decoder.clone(),
            truncation: self.truncation.clone(),
            padding: self.padding.clone(),
            added_tokens: self
                .added_vocabulary
                .tokens()
                .iter()
                .map(|(token, id)| SerializedAddedToken {
                    id: *id,
                    token: token.clone(),
                })
                .collect(),
        };
        let path = dir.join(TOKENIZER_JSON);
        save::write_tokenizer_json(&serialized, &path)?;
        files.push(path);

        log::info!("Saved tokenizer to {}", dir.display());
        Ok(files)
    }

    /// Load a tokenizer saved with [`Tokenizer::save`].
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let serialized = load::read_tokenizer_json(&dir.join(TOKENIZER_JSON))?;
        if serialized.version != crate::VERSION {
            log::warn!(
                "Tokenizer was saved by version {}, loading with {}",
                serialized.version,
                crate::VERSION
            );
        }

        let model: Model = match serialized.model {
            SerializedModel::Bpe {
                vocab,
                merges,
                options,
            } => Bpe::builder()
                .files(dir.join(vocab), dir.join(merges))
                .options(options)
                .build()?
                .into(),
            SerializedModel::WordPiece { vocab, options } => WordPiece::builder()
                .file(dir.join(vocab))
                .options(options)
                .build()?
                .into(),
        };

        check_truncation(
            serialized.truncation.as_ref(),
            serialized.post_processor.as_ref(),
        )?;

        let mut added_vocabulary = AddedVocabulary::new();
        added_vocabulary.restore(
            serialized
                .added_tokens
                .into_iter()
                .map(|added| (added.token, added.id)),
        )?;

        log::info!(
            "Loaded tokenizer from {} ({} tokens, {} added)",
            dir.display(),
            model.vocab_size(),
            added_vocabulary.len()
        );
        Ok(Self {
            normalizer: serialized.normalizer,
            pre_tokenizer: serialized.pre_tokenizer,
            model,
            post_processor: serialized.post_processor,
            decoder: serialized.decoder,
            added_vocabulary,
            truncation: serialized.truncation,
            padding: serialized.padding,
        })
    }
}
