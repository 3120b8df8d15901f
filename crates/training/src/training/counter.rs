//! Word and pair counting for BPE training.
//!
//! Words are counted once; pairs are counted over the distinct words, in
//! parallel chunks whose local maps are reduced sequentially afterwards.

use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;
use rayon::prelude::*;
use subtok_core::{Pair, Word};

/// Pair -> weighted number of occurrences.
pub type PairCounts = AHashMap<Pair, i64>;

/// Pair -> indices of the words that contain it.
pub type PairPositions = AHashMap<Pair, AHashSet<usize>>;

/// Counter for word frequencies.
#[derive(Debug, Clone, Default)]
pub struct WordCounter {
    counts: AHashMap<CompactString, u64>,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `word`.
    pub fn add_word(&mut self, word: &str) {
        self.add_word_count(word, 1);
    }

    /// Count `count` occurrences of `word`.
    pub fn add_word_count(&mut self, word: &str, count: u64) {
        if word.is_empty() {
            return;
        }
        match self.counts.get_mut(word) {
            Some(c) => *c += count,
            None => {
                self.counts.insert(CompactString::new(word), count);
            }
        }
    }

    pub fn add_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.add_word(word.as_ref());
        }
    }

    /// Fold another counter into this one.
    pub fn merge(&mut self, other: WordCounter) {
        for (word, count) in other.counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of word occurrences.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.counts.get(word).copied()
    }

    pub fn counts(&self) -> &AHashMap<CompactString, u64> {
        &self.counts
    }

    /// Entries sorted by word, for a deterministic training order.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(word, &count)| (word.as_str(), count))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

fn count_range(words: &[Word], counts: &[u64], offset: usize) -> (PairCounts, PairPositions) {
    let mut pair_counts = PairCounts::new();
    let mut positions = PairPositions::new();
    for (i, (word, &count)) in words.iter().zip(counts).enumerate() {
        for window in word.symbols().windows(2) {
            let pair = (window[0].id, window[1].id);
            *pair_counts.entry(pair).or_insert(0) += count as i64;
            positions.entry(pair).or_default().insert(offset + i);
        }
    }
    (pair_counts, positions)
}

/// Count all pairs sequentially.
pub fn count_pairs_sequential(words: &[Word], counts: &[u64]) -> (PairCounts, PairPositions) {
    count_range(words, counts, 0)
}

/// Count all pairs in parallel.
///
/// Words are split into chunks of about `1_000_000 / threads` entries; each
/// chunk is counted on its own and the partial maps are reduced in order.
pub fn count_pairs_parallel(words: &[Word], counts: &[u64]) -> (PairCounts, PairPositions) {
    let chunk_size = (1_000_000 / rayon::current_num_threads().max(1)).max(1);
    let partials: Vec<(PairCounts, PairPositions)> = words
        .par_chunks(chunk_size)
        .zip(counts.par_chunks(chunk_size))
        .enumerate()
        .map(|(chunk, (words, counts))| count_range(words, counts, chunk * chunk_size))
        .collect();

    let mut pair_counts = PairCounts::new();
    let mut positions = PairPositions::new();
    for (local_counts, local_positions) in partials {
        for (pair, count) in local_counts {
            *pair_counts.entry(pair).or_insert(0) += count;
        }
        for (pair, set) in local_positions {
            positions.entry(pair).or_default().extend(set);
        }
    }
    (pair_counts, positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(ids: &[u32]) -> Word {
        let mut word = Word::new();
        for &id in ids {
            word.add(id, 1);
        }
        word
    }

    #[test]
    fn test_word_counter() {
        let mut counter = WordCounter::new();
        counter.add_words(["ab", "bc", "ab", ""]);
        assert_eq!(counter.len(), 2);
        assert_eq!(counter.get("ab"), Some(2));
        assert_eq!(counter.total(), 3);

        let mut other = WordCounter::new();
        other.add_word_count("bc", 4);
        counter.merge(other);
        assert_eq!(counter.sorted(), vec![("ab", 2), ("bc", 5)]);
    }

    #[test]
    fn test_count_pairs_sequential() {
        let words = vec![word(&[0, 1]), word(&[1, 2])];
        let (pairs, positions) = count_pairs_sequential(&words, &[1, 3]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.get(&(0, 1)), Some(&1));
        assert_eq!(pairs.get(&(1, 2)), Some(&3));
        assert!(positions[&(1, 2)].contains(&1));
    }

    #[test]
    fn test_count_pairs_parallel_matches_sequential() {
        // a b c / b c d / c d e
        let words = vec![word(&[0, 1, 2]), word(&[1, 2, 3]), word(&[2, 3, 4])];
        let counts = [1, 1, 2];

        let (seq, seq_pos) = count_pairs_sequential(&words, &counts);
        let (par, par_pos) = count_pairs_parallel(&words, &counts);
        assert_eq!(seq, par);
        assert_eq!(seq_pos, par_pos);
        assert_eq!(par.get(&(2, 3)), Some(&3));
        assert_eq!(par_pos[&(1, 2)].len(), 2);
    }
}
