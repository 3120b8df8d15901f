//! Merge rule management for BPE.
//!
//! Merge rules are stored using token IDs rather than strings for fast comparison.
//! A rule's rank is the order in which it was learned; lower ranks apply first.

use ahash::AHashMap;

/// A pair of token IDs that can be merged.
pub type Pair = (u32, u32);

/// Merge rule mapping: pair -> (rank, new_token_id).
pub type MergeMap = AHashMap<Pair, (u32, u32)>;

/// Collection of BPE merge rules with efficient lookup.
#[derive(Debug, Clone, Default)]
pub struct MergeRules {
    /// Merge rules: pair -> (rank, new_token_id)
    pub merges: MergeMap,
}

impl MergeRules {
    /// Create a new empty collection of merge rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new collection with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            merges: MergeMap::with_capacity(capacity),
        }
    }

    /// Add a merge rule.
    ///
    /// # Arguments
    /// * `pair` - The pair of token IDs to merge
    /// * `rank` - The priority rank (lower = higher priority)
    /// * `new_token_id` - The ID of the token created by this merge
    pub fn add_merge(&mut self, pair: Pair, rank: u32, new_token_id: u32) {
        self.merges.insert(pair, (rank, new_token_id));
    }

    /// Get the merge rule for a pair.
    ///
    /// Returns `Some((rank, new_token_id))` if this pair should be merged.
    #[inline]
    pub fn get(&self, pair: Pair) -> Option<(u32, u32)> {
        self.merges.get(&pair).copied()
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    /// All rules as `(pair, new_token_id)`, ordered by rank.
    pub fn ordered(&self) -> Vec<(Pair, u32)> {
        let mut rules: Vec<(Pair, u32, u32)> = self
            .merges
            .iter()
            .map(|(&pair, &(rank, new_id))| (pair, rank, new_id))
            .collect();
        rules.sort_unstable_by_key(|&(_, rank, _)| rank);
        rules
            .into_iter()
            .map(|(pair, _, new_id)| (pair, new_id))
            .collect()
    }
}
