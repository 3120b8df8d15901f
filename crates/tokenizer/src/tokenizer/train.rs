//! Training the tokenizer's model on raw text.
//!
//! Text goes through the tokenizer's own normalizer and pre-tokenizer, so
//! the learned merges see the same words encoding will.

use super::Tokenizer;
use crate::added_vocabulary::{AddedToken, AddedVocabulary, Segment};
use crate::models::{Bpe, BpeOptions, Model};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use subtok_core::{NormalizedString, Result, TokenizerError};
use subtok_training::{BpeTrainer, TrainingConfig, WordCounter};

impl Tokenizer {
    // Added tokens plus the trainer's special tokens, which must never be
    // split into words.
    fn reserved_tokens(&self, config: &TrainingConfig) -> Result<AddedVocabulary> {
        let mut reserved = self.added_vocabulary.clone();
        let special_tokens: Vec<AddedToken> = config
            .special_tokens
            .iter()
            .cloned()
            .map(AddedToken::special)
            .collect();
        reserved.add_tokens(&special_tokens, &self.model)?;
        Ok(reserved)
    }

    // Words of `text` as the model would see them.
    fn training_words(&self, reserved: &AddedVocabulary, text: &str) -> Result<Vec<String>> {
        let mut words = Vec::new();
        for segment in reserved.split(text) {
            let Segment::Text(piece) = segment else {
                continue;
            };
            let mut normalized = NormalizedString::from(piece);
            if let Some(normalizer) = &self.normalizer {
                normalizer.normalize(&mut normalized)?;
            }
            words.extend(
                self.pre_tokenize(normalized.normalized())?
                    .into_iter()
                    .map(|pre_token| pre_token.value),
            );
        }
        Ok(words)
    }

    fn count_words<T>(
        &self,
        reserved: &AddedVocabulary,
        texts: impl ParallelIterator<Item = T>,
    ) -> Result<WordCounter>
    where
        T: AsRef<str>,
    {
        texts
            .map(|text| self.training_words(reserved, text.as_ref()))
            .try_fold(
                WordCounter::new,
                |mut counter, words: Result<Vec<String>>| -> Result<WordCounter> {
                    counter.add_words(words?);
                    Ok(counter)
                },
            )
            .try_reduce(WordCounter::new, |mut left, right| {
                left.merge(right);
                Ok(left)
            })
    }

    /// Train a new BPE model on the lines of `files`.
    pub fn train_from_files<P: AsRef<Path>>(&mut self, config: TrainingConfig, files: &[P]) -> Result<()> {
        let reserved = self.reserved_tokens(&config)?;
        let mut counter = WordCounter::new();
        for path in files {
            let path = path.as_ref();
            let content = fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
            counter.merge(self.count_words(&reserved, content.par_lines())?);
            log::info!("Counted words of {}", path.display());
        }
        self.train_on_counts(config, counter)
    }

    /// Train a new BPE model on `texts`.
    pub fn train_from_iterator<I, S>(&mut self, config: TrainingConfig, texts: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: Send,
        S: AsRef<str> + Send,
    {
        let reserved = self.reserved_tokens(&config)?;
        let counter = self.count_words(&reserved, texts.into_iter().par_bridge())?;
        self.train_on_counts(config, counter)
    }

    // Replace the model with one trained on `counter`. Added tokens are
    // given ids again against the new vocabulary.
    fn train_on_counts(&mut self, mut config: TrainingConfig, counter: WordCounter) -> Result<()> {
        if let Some(pre_tokenizer) = &self.pre_tokenizer {
            config.initial_alphabet.extend(pre_tokenizer.alphabet());
        }
        log::info!(
            "Training BPE on {} distinct words ({} in total)",
            counter.len(),
            counter.total()
        );

        let mut options = match &self.model {
            Model::Bpe(bpe) => bpe.options().clone(),
            Model::WordPiece(_) => BpeOptions::default(),
        };
        options.continuing_subword_prefix = config.continuing_subword_prefix.clone();
        options.end_of_word_suffix = config.end_of_word_suffix.clone();
        let special_tokens: Vec<AddedToken> = config
            .special_tokens
            .iter()
            .cloned()
            .map(AddedToken::special)
            .collect();

        let mut trainer = BpeTrainer::new(config);
        trainer.feed_counts(counter);
        let (vocab, merges) = trainer.train()?;
        let model: Model = Bpe::builder()
            .merge_rules(vocab, merges)
            .options(options)
            .build()?
            .into();

        let previous: Vec<AddedToken> = self
            .added_vocabulary
            .tokens()
            .iter()
            .map(|(token, _)| token.clone())
            .collect();
        let mut added_vocabulary = AddedVocabulary::new();
        added_vocabulary.add_tokens(&special_tokens, &model)?;
        added_vocabulary.add_tokens(&previous, &model)?;

        self.model = model;
        self.added_vocabulary = added_vocabulary;
        Ok(())
    }
}
