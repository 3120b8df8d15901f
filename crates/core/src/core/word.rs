//! Symbol lists for applying merges to a single word.
//!
//! A [`Word`] is a flat array of [`Symbol`]s linked through `prev`/`next`
//! indices. Merging tombstones the right-hand symbol (`len == 0`) instead of
//! shifting the array, so heap entries keep pointing at stable positions.

use crate::core::merges::{MergeRules, Pair};
use crate::core::priority::MergeEntry;
use dary_heap::OctonaryHeap;
use rand::Rng;

/// One symbol of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Token ID of the symbol
    pub id: u32,
    /// Index of the previous live symbol
    pub prev: Option<usize>,
    /// Index of the next live symbol
    pub next: Option<usize>,
    /// Length of the covered text; 0 marks a removed symbol
    pub len: usize,
}

impl Symbol {
    fn absorb(&mut self, other: &Symbol, new_id: u32) {
        self.id = new_id;
        self.len += other.len;
        self.next = other.next;
    }
}

/// A word as a sequence of symbols.
///
/// At encode time `len` is measured in bytes so offsets can be read straight
/// off the symbols. The trainer measures it in code points, which is what
/// `max_token_length` limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    symbols: Vec<Symbol>,
    // Length skipped before the first symbol was added.
    pending: usize,
}

impl Word {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            symbols: Vec::with_capacity(capacity),
            pending: 0,
        }
    }

    /// Append a symbol covering `len` units of text.
    pub fn add(&mut self, id: u32, len: usize) {
        let index = self.symbols.len();
        let prev = index.checked_sub(1);
        if let Some(last) = self.symbols.last_mut() {
            last.next = Some(index);
        }
        self.symbols.push(Symbol {
            id,
            prev,
            next: None,
            len: len + std::mem::take(&mut self.pending),
        });
    }

    /// Account for `len` units of text that produced no symbol.
    ///
    /// The text is folded into the previous symbol, or into the next one when
    /// nothing has been added yet, so offsets keep covering the whole word.
    pub fn skip(&mut self, len: usize) {
        match self.symbols.last_mut() {
            Some(last) => last.len += len,
            None => self.pending += len,
        }
    }

    /// Replace the last symbol's id and widen it by `len`.
    ///
    /// Used to fuse consecutive unknown symbols.
    pub fn extend_last(&mut self, id: u32, len: usize) -> bool {
        match self.symbols.last_mut() {
            Some(last) => {
                last.id = id;
                last.len += len;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Token IDs of the live symbols, in order.
    pub fn ids(&self) -> Vec<u32> {
        self.symbols.iter().map(|s| s.id).collect()
    }

    /// Offsets of the live symbols, relative to the start of the word.
    pub fn offsets(&self) -> Vec<(usize, usize)> {
        let mut pos = 0;
        self.symbols
            .iter()
            .map(|s| {
                let start = pos;
                pos += s.len;
                (start, pos)
            })
            .collect()
    }

    /// Apply every applicable merge, lowest rank first.
    ///
    /// With `dropout`, each merge is skipped with that probability; skipped
    /// merges go back on the heap before the next merge that does happen.
    pub fn merge_all<R: Rng + ?Sized>(
        &mut self,
        merges: &MergeRules,
        dropout: Option<f32>,
        rng: &mut R,
    ) {
        let dropout = dropout.filter(|&p| p > 0.0);
        let mut queue: OctonaryHeap<MergeEntry> = self
            .symbols
            .windows(2)
            .enumerate()
            .filter_map(|(pos, window)| {
                merges
                    .get((window[0].id, window[1].id))
                    .map(|(rank, new_id)| MergeEntry { pos, rank, new_id })
            })
            .collect();
        let mut skipped = Vec::new();

        while let Some(top) = queue.pop() {
            if let Some(p) = dropout {
                if rng.gen::<f32>() < p {
                    skipped.push(top);
                    continue;
                }
            }
            queue.extend(skipped.drain(..));

            let current = self.symbols[top.pos];
            if current.len == 0 {
                continue;
            }
            let Some(next_pos) = current.next else {
                continue;
            };
            let right = self.symbols[next_pos];
            if merges.get((current.id, right.id)) != Some((top.rank, top.new_id)) {
                continue;
            }

            self.symbols[top.pos].absorb(&right, top.new_id);
            self.symbols[next_pos].len = 0;
            if let Some(after) = right.next {
                self.symbols[after].prev = Some(top.pos);
            }

            let merged = self.symbols[top.pos];
            if let Some(prev) = merged.prev {
                if let Some((rank, new_id)) = merges.get((self.symbols[prev].id, merged.id)) {
                    queue.push(MergeEntry { pos: prev, rank, new_id });
                }
            }
            if let Some(next) = merged.next {
                if let Some((rank, new_id)) = merges.get((merged.id, self.symbols[next].id)) {
                    queue.push(MergeEntry {
                        pos: top.pos,
                        rank,
                        new_id,
                    });
                }
            }
        }

        self.compact();
    }

    /// Merge every occurrence of `(c1, c2)` into `replacement`.
    ///
    /// Used by the trainer on compact words. Returns the pair count deltas
    /// caused by the merge; pairs whose merged length would exceed
    /// `max_length` are not reported as new.
    pub fn merge(
        &mut self,
        c1: u32,
        c2: u32,
        replacement: u32,
        max_length: usize,
    ) -> Vec<(Pair, i32)> {
        let mut changes = Vec::new();
        let mut i = 0;
        while i + 1 < self.symbols.len() {
            if self.symbols[i].id != c1 || self.symbols[i + 1].id != c2 {
                i += 1;
                continue;
            }
            let first = self.symbols[i];
            let second = self.symbols[i + 1];
            let merged_len = first.len + second.len;

            if i > 0 {
                let before = self.symbols[i - 1];
                changes.push(((before.id, first.id), -1));
                if before.len + merged_len <= max_length {
                    changes.push(((before.id, replacement), 1));
                }
            }

            self.symbols[i] = Symbol {
                id: replacement,
                prev: first.prev,
                next: second.next,
                len: merged_len,
            };
            self.symbols.remove(i + 1);

            if let Some(after) = self.symbols.get(i + 1).copied() {
                changes.push(((second.id, after.id), -1));
                if after.len + merged_len <= max_length {
                    changes.push(((replacement, after.id), 1));
                }
            }
            i += 1;
        }
        self.relink();
        changes
    }

    fn compact(&mut self) {
        self.symbols.retain(|s| s.len != 0);
        self.relink();
    }

    fn relink(&mut self) {
        let count = self.symbols.len();
        for (index, symbol) in self.symbols.iter_mut().enumerate() {
            symbol.prev = index.checked_sub(1);
            symbol.next = (index + 1 < count).then_some(index + 1);
        }
    }
}
