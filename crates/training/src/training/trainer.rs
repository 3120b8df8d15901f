//! BPE trainer implementation.
//!
//! Learns a vocabulary and an ordered merge table from word counts by
//! repeatedly merging the most frequent adjacent pair.

use super::counter::{count_pairs_parallel, count_pairs_sequential, WordCounter};
use ahash::{AHashMap, AHashSet};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use subtok_core::{
    MergeCandidate, MergeRules, PairPriorityQueue, Result, TokenizerError, Vocabulary, Word,
};

/// Configuration for BPE training.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Target vocabulary size
    pub vocab_size: usize,
    /// Minimum frequency for a pair to be merged
    pub min_frequency: u64,
    /// Tokens placed first in the vocabulary, in order
    pub special_tokens: Vec<String>,
    /// Keep at most this many alphabet characters
    pub limit_alphabet: Option<usize>,
    /// Characters kept in the alphabet even if unseen
    pub initial_alphabet: AHashSet<char>,
    /// Prefix for every symbol that does not start a word
    pub continuing_subword_prefix: Option<String>,
    /// Suffix for the last symbol of every word
    pub end_of_word_suffix: Option<String>,
    /// Longest merged token, in characters
    pub max_token_length: Option<usize>,
    /// Draw progress bars
    pub show_progress: bool,
    /// Whether to use parallel processing
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 30_000,
            min_frequency: 0,
            special_tokens: Vec::new(),
            limit_alphabet: None,
            initial_alphabet: AHashSet::new(),
            continuing_subword_prefix: None,
            end_of_word_suffix: None,
            max_token_length: None,
            show_progress: true,
            parallel: true,
        }
    }
}

impl TrainingConfig {
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }
}

/// Builder for [`TrainingConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    pub fn vocab_size(mut self, vocab_size: usize) -> Self {
        self.config.vocab_size = vocab_size;
        self
    }

    pub fn min_frequency(mut self, min_frequency: u64) -> Self {
        self.config.min_frequency = min_frequency;
        self
    }

    pub fn special_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.special_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit_alphabet(mut self, limit: usize) -> Self {
        self.config.limit_alphabet = Some(limit);
        self
    }

    pub fn initial_alphabet<I: IntoIterator<Item = char>>(mut self, alphabet: I) -> Self {
        self.config.initial_alphabet = alphabet.into_iter().collect();
        self
    }

    pub fn continuing_subword_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.continuing_subword_prefix = Some(prefix.into());
        self
    }

    pub fn end_of_word_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.end_of_word_suffix = Some(suffix.into());
        self
    }

    pub fn max_token_length(mut self, max: usize) -> Self {
        self.config.max_token_length = Some(max);
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn build(self) -> Result<TrainingConfig> {
        if self.config.vocab_size == 0 {
            return Err(TokenizerError::InvalidConfig(
                "vocab size must be positive".into(),
            ));
        }
        if self.config.max_token_length == Some(0) {
            return Err(TokenizerError::InvalidConfig(
                "max token length must be positive".into(),
            ));
        }
        Ok(self.config)
    }
}

/// BPE trainer.
///
/// Feed it words, then call [`BpeTrainer::train`].
#[derive(Debug, Clone, Default)]
pub struct BpeTrainer {
    config: TrainingConfig,
    words: WordCounter,
}

impl BpeTrainer {
    /// Create a new BPE trainer with the given configuration.
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            words: WordCounter::new(),
        }
    }

    /// Create a new BPE trainer with default configuration.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self::new(TrainingConfig {
            vocab_size,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn words(&self) -> &WordCounter {
        &self.words
    }

    /// Count pre-tokenized words.
    pub fn feed<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.add_words(words);
    }

    /// Merge word counts gathered elsewhere.
    pub fn feed_counts(&mut self, counts: WordCounter) {
        self.words.merge(counts);
    }

    /// Train on every word fed so far.
    ///
    /// # Returns
    /// The trained vocabulary and merge rules
    pub fn train(&self) -> Result<(Vocabulary, MergeRules)> {
        self.train_on(&self.words)
    }

    /// Train on the given word counts.
    pub fn train_on(&self, words: &WordCounter) -> Result<(Vocabulary, MergeRules)> {
        let config = &self.config;
        let mut vocab = Vocabulary::with_capacity(config.vocab_size);
        for token in &config.special_tokens {
            vocab.add_token(token);
        }

        let alphabet = self.compute_alphabet(words);
        if vocab.len() + alphabet.len() > config.vocab_size {
            return Err(TokenizerError::InvalidConfig(format!(
                "vocab size too small: {} special tokens and {} alphabet characters do not fit in {}",
                vocab.len(),
                alphabet.len(),
                config.vocab_size
            )));
        }
        for c in &alphabet {
            vocab.add_token(c.encode_utf8(&mut [0u8; 4]));
        }
        log::info!(
            "BPE training: {} distinct words, {} alphabet characters",
            words.len(),
            alphabet.len()
        );

        let (mut words_vec, counts) = self.tokenize_words(words, &mut vocab);

        let (mut pair_counts, mut positions) = if config.parallel {
            count_pairs_parallel(&words_vec, &counts)
        } else {
            count_pairs_sequential(&words_vec, &counts)
        };
        log::debug!("BPE training: {} distinct initial pairs", pair_counts.len());

        let mut queue = PairPriorityQueue::with_capacity(pair_counts.len());
        queue.extend(
            pair_counts
                .iter()
                .filter(|(_, &count)| count > 0)
                .map(|(&pair, &count)| MergeCandidate::new(pair, count as u64)),
        );

        let progress = self.progress_bar(config.vocab_size.saturating_sub(vocab.len()) as u64);
        let min_frequency = config.min_frequency.max(1);
        let max_length = config.max_token_length.unwrap_or(usize::MAX);
        let mut merges = MergeRules::with_capacity(config.vocab_size.saturating_sub(vocab.len()));

        while vocab.len() < config.vocab_size {
            let Some(top) = queue.pop() else {
                break;
            };

            let current = pair_counts.get(&top.pair).copied().unwrap_or(0);
            if top.count as i64 != current {
                if current > 0 {
                    queue.push(MergeCandidate::new(top.pair, current as u64));
                }
                continue;
            }
            if top.count < min_frequency {
                break;
            }

            let new_token = self.merged_token(&vocab, top.pair)?;
            if new_token.chars().count() > max_length {
                continue;
            }
            let new_id = vocab.add_token(&new_token);
            merges.add_merge(top.pair, merges.len() as u32, new_id);

            let mut touched: AHashMap<_, AHashSet<usize>> = AHashMap::new();
            let mut indices: Vec<usize> = positions
                .remove(&top.pair)
                .map(|set| set.into_iter().collect())
                .unwrap_or_default();
            indices.sort_unstable();
            for index in indices {
                let changes = words_vec[index].merge(top.pair.0, top.pair.1, new_id, max_length);
                for (pair, delta) in changes {
                    let weighted = i64::from(delta) * counts[index] as i64;
                    *pair_counts.entry(pair).or_insert(0) += weighted;
                    if delta > 0 {
                        touched.entry(pair).or_default().insert(index);
                    }
                }
            }

            let mut new_pairs: Vec<_> = touched.into_iter().collect();
            new_pairs.sort_unstable_by_key(|(pair, _)| *pair);
            for (pair, set) in new_pairs {
                positions.entry(pair).or_default().extend(set);
                let count = pair_counts.get(&pair).copied().unwrap_or(0);
                if count > 0 {
                    queue.push(MergeCandidate::new(pair, count as u64));
                }
            }
            pair_counts.remove(&top.pair);
            progress.inc(1);
        }

        progress.finish();
        log::info!(
            "BPE training: done, {} merges, vocabulary of {}",
            merges.len(),
            vocab.len()
        );
        Ok((vocab, merges))
    }

    // Character counts, with the initial alphabet counted as infinitely
    // frequent, trimmed to `limit_alphabet`. Returned in character order.
    fn compute_alphabet(&self, words: &WordCounter) -> Vec<char> {
        let mut alphabet: AHashMap<char, u64> = AHashMap::new();
        for (word, &count) in words.counts() {
            for c in word.chars() {
                let entry = alphabet.entry(c).or_insert(0);
                *entry = entry.saturating_add(count);
            }
        }
        for &c in &self.config.initial_alphabet {
            alphabet.insert(c, u64::MAX);
        }

        let mut kept: Vec<(char, u64)> = alphabet.into_iter().collect();
        if let Some(limit) = self.config.limit_alphabet {
            if kept.len() > limit {
                kept.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
                kept.truncate(limit);
            }
        }
        let mut chars: Vec<char> = kept.into_iter().map(|(c, _)| c).collect();
        chars.sort_unstable();
        chars
    }

    // Turn every distinct word into a symbol sequence. Characters trimmed
    // from the alphabet are left out.
    fn tokenize_words(
        &self,
        words: &WordCounter,
        vocab: &mut Vocabulary,
    ) -> (Vec<Word>, Vec<u64>) {
        let entries = words.sorted();
        let mut out = Vec::with_capacity(entries.len());
        let mut counts = Vec::with_capacity(entries.len());
        let prefix = self.config.continuing_subword_prefix.as_deref();
        let suffix = self.config.end_of_word_suffix.as_deref();

        for (word, count) in entries {
            let chars: Vec<char> = word.chars().collect();
            let mut symbols = Word::with_capacity(chars.len());
            for (i, c) in chars.iter().enumerate() {
                let mut buf = [0u8; 4];
                let base: &str = c.encode_utf8(&mut buf);
                if !vocab.contains(base) {
                    continue;
                }
                let mut surface = String::with_capacity(base.len() + 4);
                if i > 0 {
                    surface.push_str(prefix.unwrap_or(""));
                }
                surface.push_str(base);
                if i + 1 == chars.len() {
                    surface.push_str(suffix.unwrap_or(""));
                }
                symbols.add(vocab.add_token(&surface), 1);
            }
            out.push(symbols);
            counts.push(count);
        }
        (out, counts)
    }

    fn merged_token(&self, vocab: &Vocabulary, pair: (u32, u32)) -> Result<String> {
        let first = vocab
            .get_token(pair.0)
            .ok_or(TokenizerError::UnknownTokenId(pair.0))?;
        let second = vocab
            .get_token(pair.1)
            .ok_or(TokenizerError::UnknownTokenId(pair.1))?;
        let second = match self.config.continuing_subword_prefix.as_deref() {
            Some(prefix) => second.strip_prefix(prefix).unwrap_or(second),
            None => second,
        };
        Ok(format!("{}{}", first, second))
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::hidden());
        }
        let progress = ProgressBar::new(len);
        let template = "[{elapsed_precise}] {msg:<20!} {wide_bar} {pos}/{len}";
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            progress.set_style(style);
        }
        progress.set_message("Compute merges");
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer(config: TrainingConfig, words: &[(&str, u64)]) -> BpeTrainer {
        let mut trainer = BpeTrainer::new(config);
        let mut counter = WordCounter::new();
        for &(word, count) in words {
            counter.add_word_count(word, count);
        }
        trainer.feed_counts(counter);
        trainer
    }

    fn roses() -> Vec<(&'static str, u64)> {
        vec![
            ("roses", 1),
            ("are", 2),
            ("red", 1),
            ("voilets", 1),
            ("blue", 1),
            ("BERT", 1),
            ("is", 2),
            ("big", 1),
            ("and", 1),
            ("so", 1),
            ("GPT-2", 1),
        ]
    }

    fn merge_strings(vocab: &Vocabulary, merges: &MergeRules) -> Vec<(String, String)> {
        merges
            .ordered()
            .into_iter()
            .map(|((a, b), _)| {
                (
                    vocab.get_token(a).unwrap().to_string(),
                    vocab.get_token(b).unwrap().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_train_learns_frequent_merges_in_order() {
        let config = TrainingConfig::builder()
            .vocab_size(100)
            .min_frequency(2)
            .show_progress(false)
            .build()
            .unwrap();
        let (vocab, merges) = trainer(config, &roses()).train().unwrap();

        assert_eq!(
            merge_strings(&vocab, &merges),
            vec![
                ("r".to_string(), "e".to_string()),
                ("a".to_string(), "re".to_string()),
                ("i".to_string(), "s".to_string()),
            ]
        );
        for token in ["re", "are", "is", "-", "2", "B", "v"] {
            assert!(vocab.contains(token), "{}", token);
        }
        // 22 distinct characters plus 3 learned tokens.
        assert_eq!(vocab.len(), 25);
    }

    #[test]
    fn test_special_tokens_come_first() {
        let config = TrainingConfig::builder()
            .vocab_size(100)
            .special_tokens(["[PAD]", "[UNK]"])
            .show_progress(false)
            .build()
            .unwrap();
        let (vocab, _) = trainer(config, &[("ab", 1)]).train().unwrap();
        assert_eq!(vocab.get_id("[PAD]"), Some(0));
        assert_eq!(vocab.get_id("[UNK]"), Some(1));
        assert_eq!(vocab.get_id("a"), Some(2));
    }

    #[test]
    fn test_vocab_size_too_small() {
        let config = TrainingConfig::builder()
            .vocab_size(2)
            .special_tokens(["[UNK]"])
            .show_progress(false)
            .build()
            .unwrap();
        let result = trainer(config, &[("abc", 1)]).train();
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(msg)) if msg.contains("too small")));
    }

    #[test]
    fn test_empty_input_returns_seeded_vocab() {
        let config = TrainingConfig::builder()
            .vocab_size(10)
            .special_tokens(["<s>"])
            .show_progress(false)
            .build()
            .unwrap();
        let (vocab, merges) = BpeTrainer::new(config).train().unwrap();
        assert_eq!(vocab.len(), 1);
        assert!(merges.is_empty());
    }

    #[test]
    fn test_limit_alphabet_keeps_most_frequent() {
        let config = TrainingConfig::builder()
            .vocab_size(100)
            .limit_alphabet(2)
            .initial_alphabet(['z'])
            .show_progress(false)
            .build()
            .unwrap();
        let (vocab, _) = trainer(config, &[("aab", 3), ("c", 1)]).train().unwrap();
        assert!(vocab.contains("z"));
        assert!(vocab.contains("a"));
        assert!(!vocab.contains("b"));
        assert!(!vocab.contains("c"));
    }

    #[test]
    fn test_prefix_and_suffix() {
        let config = TrainingConfig::builder()
            .vocab_size(100)
            .continuing_subword_prefix("##")
            .end_of_word_suffix("</w>")
            .show_progress(false)
            .build()
            .unwrap();
        let (vocab, merges) = trainer(config, &[("ab", 5)]).train().unwrap();
        assert!(vocab.contains("##b</w>"));
        assert!(vocab.contains("ab</w>"));
        assert_eq!(merges.len(), 1);
    }

    #[test]
    fn test_max_token_length() {
        let config = TrainingConfig::builder()
            .vocab_size(100)
            .max_token_length(2)
            .show_progress(false)
            .build()
            .unwrap();
        let (vocab, _) = trainer(config, &[("abcd", 4)]).train().unwrap();
        assert!(vocab.contains("ab"));
        assert!(vocab.contains("cd"));
        assert!(!vocab.contains("abcd"));
        assert!(!vocab.contains("abc"));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let base = TrainingConfig::builder()
            .vocab_size(40)
            .show_progress(false);
        let parallel = base.clone().parallel(true).build().unwrap();
        let sequential = base.parallel(false).build().unwrap();

        let (v1, m1) = trainer(parallel, &roses()).train().unwrap();
        let (v2, m2) = trainer(sequential, &roses()).train().unwrap();
        assert_eq!(v1.sorted(), v2.sorted());
        assert_eq!(m1.ordered(), m2.ordered());
    }
}
