//! Normalized strings with alignments back to the original text.
//!
//! Every normalization step is expressed as a [`NormalizedString::transform`]
//! over `(char, change)` items, so the alignment table is rebuilt by one
//! routine no matter which normalizer ran.

use crate::error::{Result, TokenizerError};
use std::cmp::Ordering;
use std::ops::Range;
use unicode_categories::UnicodeCategories;
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// Unicode normalization forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationForm {
    Nfd,
    Nfc,
    Nfkd,
    Nfkc,
}

impl NormalizationForm {
    fn compatible(self) -> bool {
        matches!(self, Self::Nfkd | Self::Nfkc)
    }

    fn apply(self, chunk: &str) -> Vec<char> {
        match self {
            Self::Nfd => chunk.nfd().collect(),
            Self::Nfc => chunk.nfc().collect(),
            Self::Nfkd => chunk.nfkd().collect(),
            Self::Nfkc => chunk.nfkc().collect(),
        }
    }

    // Whether `next` has to be normalized together with `chunk`: its
    // decomposition starts with a non-starter, or normalizing both at once
    // differs from normalizing them apart (Hangul jamo, halfwidth kana with
    // a voiced mark).
    fn continues(self, chunk: &str, next: &str) -> bool {
        let first = if self.compatible() {
            next.nfkd().next()
        } else {
            next.nfd().next()
        };
        if first.is_some_and(|c| canonical_combining_class(c) != 0) {
            return true;
        }
        let mut apart = self.apply(chunk);
        apart.extend(self.apply(next));
        self.apply(&format!("{}{}", chunk, next)) != apart
    }
}

/// The original text, its normalized form, and the mapping between them.
///
/// `alignments[i]` holds the range of original code points that produced the
/// `i`-th code point of the normalized text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedString {
    original: String,
    normalized: String,
    alignments: Vec<(usize, usize)>,
}

impl From<&str> for NormalizedString {
    fn from(s: &str) -> Self {
        Self {
            original: s.to_owned(),
            normalized: s.to_owned(),
            alignments: (0..s.chars().count()).map(|i| (i, i + 1)).collect(),
        }
    }
}

impl From<String> for NormalizedString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl NormalizedString {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn alignments(&self) -> &[(usize, usize)] {
        &self.alignments
    }

    /// Byte length of the normalized text.
    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Rebuild the normalized text from `(char, change)` items.
    ///
    /// `change` is `1` for an inserted char, `0` for a char standing in for
    /// the current one, and `-n` for a char standing in for the current one
    /// after `n` chars were removed before it. `initial_offset` is the number
    /// of chars removed at the very start.
    pub fn transform<I>(&mut self, dest: I, initial_offset: usize) -> Result<()>
    where
        I: IntoIterator<Item = (char, isize)>,
    {
        let mut offset = -(initial_offset as isize);
        let mut normalized = String::with_capacity(self.normalized.len());
        let mut alignments: Vec<(usize, usize)> = Vec::with_capacity(self.alignments.len());

        for (k, (c, change)) in dest.into_iter().enumerate() {
            let idx = k as isize - offset;
            let alignment = match change.cmp(&0) {
                Ordering::Greater => {
                    offset += 1;
                    alignments.last().copied().unwrap_or((0, 0))
                }
                Ordering::Equal => self.span(idx, 0)?,
                Ordering::Less => {
                    offset += change;
                    self.span(idx, change.unsigned_abs())?
                }
            };
            normalized.push(c);
            alignments.push(alignment);
        }

        self.normalized = normalized;
        self.alignments = alignments;
        Ok(())
    }

    // Union of the alignments at positions idx..=idx + extra.
    fn span(&self, idx: isize, extra: usize) -> Result<(usize, usize)> {
        let slice = usize::try_from(idx)
            .ok()
            .and_then(|start| self.alignments.get(start..=start + extra))
            .ok_or_else(|| {
                TokenizerError::State(format!(
                    "transform reads alignment {}..={} of {}",
                    idx,
                    idx + extra as isize,
                    self.alignments.len()
                ))
            })?;
        let start = slice.iter().map(|a| a.0).min().unwrap_or(0);
        let end = slice.iter().map(|a| a.1).max().unwrap_or(0);
        Ok((start, end))
    }

    /// Apply a Unicode normalization form.
    pub fn normalize(&mut self, form: NormalizationForm) -> Result<()> {
        let mut dest: Vec<(char, isize)> = Vec::with_capacity(self.normalized.len());
        let mut carry = 0usize;
        for chunk in self.chunks(form) {
            let input = chunk.chars().count();
            let output = form.apply(chunk);
            let removed = input.saturating_sub(output.len()) + carry;
            carry = if output.is_empty() { removed } else { 0 };

            for (i, c) in output.into_iter().enumerate() {
                let change = if i == 0 {
                    -(removed as isize)
                } else if i < input {
                    0
                } else {
                    1
                };
                dest.push((c, change));
            }
        }
        self.transform(dest, 0)
    }

    // Split the normalized text into runs that normalize independently.
    fn chunks(&self, form: NormalizationForm) -> Vec<&str> {
        let s = self.normalized.as_str();
        let mut chunks = Vec::new();
        let mut start = 0;

        for (pos, c) in s.char_indices() {
            if pos == start || form.continues(&s[start..pos], &s[pos..pos + c.len_utf8()]) {
                continue;
            }
            chunks.push(&s[start..pos]);
            start = pos;
        }
        if start < s.len() {
            chunks.push(&s[start..]);
        }
        chunks
    }

    pub fn nfd(&mut self) -> Result<()> {
        self.normalize(NormalizationForm::Nfd)
    }

    pub fn nfc(&mut self) -> Result<()> {
        self.normalize(NormalizationForm::Nfc)
    }

    pub fn nfkd(&mut self) -> Result<()> {
        self.normalize(NormalizationForm::Nfkd)
    }

    pub fn nfkc(&mut self) -> Result<()> {
        self.normalize(NormalizationForm::Nfkc)
    }

    /// Lowercase every char. Chars lowercasing to several chars add insertions.
    pub fn lowercase(&mut self) -> Result<()> {
        let mut dest = Vec::with_capacity(self.normalized.len());
        for c in self.normalized.chars() {
            for (i, lower) in c.to_lowercase().enumerate() {
                dest.push((lower, if i == 0 { 0 } else { 1 }));
            }
        }
        self.transform(dest, 0)
    }

    /// Keep only the chars matching `keep`.
    ///
    /// Removed chars are attributed to the next kept char; trailing removed
    /// chars simply disappear.
    pub fn filter<F: Fn(char) -> bool>(&mut self, keep: F) -> Result<()> {
        let mut removed = 0isize;
        let mut dest = Vec::with_capacity(self.normalized.len());
        for c in self.normalized.chars() {
            if keep(c) {
                dest.push((c, -removed));
                removed = 0;
            } else {
                removed += 1;
            }
        }
        self.transform(dest, 0)
    }

    /// Decompose and drop non-spacing marks.
    pub fn strip_accents(&mut self) -> Result<()> {
        self.nfd()?;
        self.filter(|c| !c.is_mark_nonspacing())
    }

    /// Replace every char with the result of `f`, one for one.
    pub fn map<F: Fn(char) -> char>(&mut self, f: F) -> Result<()> {
        let dest: Vec<(char, isize)> = self.normalized.chars().map(|c| (f(c), 0)).collect();
        self.transform(dest, 0)
    }

    /// Concatenate `other` after `self`, shifting its alignments.
    pub fn append(&mut self, other: &NormalizedString) {
        let shift = self.original.chars().count();
        self.original.push_str(&other.original);
        self.normalized.push_str(&other.normalized);
        self.alignments.extend(
            other
                .alignments
                .iter()
                .map(|&(start, end)| (start + shift, end + shift)),
        );
    }

    /// Map a byte range of the normalized text to a byte range of the original.
    ///
    /// Returns `None` when the range is out of bounds or not on char boundaries.
    pub fn convert_offsets(&self, range: Range<usize>) -> Option<Range<usize>> {
        if range.start > range.end
            || !self.normalized.is_char_boundary(range.start)
            || !self.normalized.is_char_boundary(range.end)
        {
            return None;
        }
        let first = self.normalized[..range.start].chars().count();
        let last = first + self.normalized[range.clone()].chars().count();

        let (start, end) = if first == last {
            let at = self
                .alignments
                .get(first)
                .map(|a| a.0)
                .unwrap_or_else(|| self.alignments.last().map_or(0, |a| a.1));
            (at, at)
        } else {
            let slice = &self.alignments[first..last];
            (
                slice.iter().map(|a| a.0).min().unwrap_or(0),
                slice.iter().map(|a| a.1).max().unwrap_or(0),
            )
        };
        Some(self.original_byte(start)?..self.original_byte(end)?)
    }

    // Byte position of the `index`-th char of the original text.
    fn original_byte(&self, index: usize) -> Option<usize> {
        self.original
            .char_indices()
            .map(|(pos, _)| pos)
            .chain(std::iter::once(self.original.len()))
            .nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_alignments() {
        let n = NormalizedString::from("héllo");
        assert_eq!(n.normalized(), "héllo");
        assert_eq!(n.alignments(), &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
    }

    #[test]
    fn test_nfd_splits_alignment() {
        let mut n = NormalizedString::from("\u{e9}t\u{e9}");
        n.nfd().unwrap();
        assert_eq!(n.normalized(), "e\u{301}te\u{301}");
        assert_eq!(
            n.alignments(),
            &[(0, 1), (0, 1), (1, 2), (2, 3), (2, 3)]
        );
    }

    #[test]
    fn test_nfc_merges_alignment() {
        let mut n = NormalizedString::from("e\u{301}t");
        n.nfc().unwrap();
        assert_eq!(n.normalized(), "\u{e9}t");
        assert_eq!(n.alignments(), &[(0, 2), (2, 3)]);
    }

    #[test]
    fn test_nfc_composes_hangul_jamo() {
        let mut n = NormalizedString::from("\u{1100}\u{1161}\u{11a8}a");
        n.nfc().unwrap();
        assert_eq!(n.normalized(), "\u{ac01}a");
        assert_eq!(n.alignments(), &[(0, 3), (3, 4)]);
    }

    #[test]
    fn test_nfkc_fuses_halfwidth_voiced_marks() {
        let mut n = NormalizedString::from("\u{ff76}\u{ff9e}\u{ff8a}\u{ff9f}x");
        n.nfkc().unwrap();
        assert_eq!(n.normalized(), "\u{30ac}\u{30d1}x");
        assert_eq!(n.alignments(), &[(0, 2), (2, 4), (4, 5)]);
    }

    #[test]
    fn test_nfkd_expands_ligature() {
        let mut n = NormalizedString::from("\u{fb01}x");
        n.nfkd().unwrap();
        assert_eq!(n.normalized(), "fix");
        assert_eq!(n.alignments(), &[(0, 1), (0, 1), (1, 2)]);
    }

    #[test]
    fn test_forms_are_idempotent() {
        let input = "Ame\u{301}lie \u{fb01} \u{1100}\u{1161} \u{e9}\u{327} \u{ff76}\u{ff9e} \u{ff8a}\u{ff9f}";
        let forms = [
            NormalizationForm::Nfd,
            NormalizationForm::Nfc,
            NormalizationForm::Nfkd,
            NormalizationForm::Nfkc,
        ];
        for form in forms {
            let mut once = NormalizedString::from(input);
            once.normalize(form).unwrap();
            let mut twice = once.clone();
            twice.normalize(form).unwrap();
            assert_eq!(once, twice, "{:?}", form);
            assert_eq!(once.alignments().len(), once.normalized().chars().count());
        }
    }

    #[test]
    fn test_filter_attributes_to_next_char() {
        let mut n = NormalizedString::from("a-b--c-");
        n.filter(|c| c != '-').unwrap();
        assert_eq!(n.normalized(), "abc");
        assert_eq!(n.alignments(), &[(0, 1), (1, 3), (3, 6)]);
    }

    #[test]
    fn test_lowercase_keeps_alignments() {
        let mut n = NormalizedString::from("ABc");
        n.lowercase().unwrap();
        assert_eq!(n.normalized(), "abc");
        assert_eq!(n.alignments(), &[(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_strip_accents() {
        let mut n = NormalizedString::from("caf\u{e9}s");
        n.strip_accents().unwrap();
        assert_eq!(n.normalized(), "cafes");
        // The dropped acute is folded into the char after it.
        assert_eq!(n.alignments(), &[(0, 1), (1, 2), (2, 3), (3, 4), (3, 5)]);
    }

    #[test]
    fn test_transform_out_of_bounds_is_state_error() {
        let mut n = NormalizedString::from("ab");
        let result = n.transform(vec![('a', 0), ('b', 0), ('c', 0)], 0);
        assert!(matches!(result, Err(TokenizerError::State(_))));
    }

    #[test]
    fn test_insertions_copy_previous_alignment() {
        let mut n = NormalizedString::from("ab");
        n.transform(vec![('x', 1), ('a', 0), ('-', 1), ('b', 0)], 0)
            .unwrap();
        assert_eq!(n.normalized(), "xa-b");
        assert_eq!(n.alignments(), &[(0, 0), (0, 1), (0, 1), (1, 2)]);
    }

    #[test]
    fn test_convert_offsets() {
        let mut n = NormalizedString::from("h\u{e9}llo");
        n.nfd().unwrap();
        // "he\u{301}" is four bytes once decomposed, three in the original.
        assert_eq!(n.convert_offsets(0..4), Some(0..3));
        assert_eq!(n.convert_offsets(4..6), Some(3..5));
        assert_eq!(n.convert_offsets(4..4), Some(3..3));
        assert_eq!(n.convert_offsets(3..4), None);
        assert_eq!(n.convert_offsets(0..40), None);
    }

    #[test]
    fn test_append() {
        let mut a = NormalizedString::from("ab");
        let mut b = NormalizedString::from("C");
        b.lowercase().unwrap();
        a.append(&b);
        assert_eq!(a.original(), "abC");
        assert_eq!(a.normalized(), "abc");
        assert_eq!(a.alignments(), &[(0, 1), (1, 2), (2, 3)]);
    }
}
