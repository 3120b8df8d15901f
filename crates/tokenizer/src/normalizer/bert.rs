//! The BERT normalizer.
//!
//! Runs, in this order and depending on its flags: text cleanup, spacing
//! around CJK ideographs, lowercasing and accent stripping.

use serde::{Deserialize, Serialize};
use subtok_core::{NormalizedString, Result};
use unicode_categories::UnicodeCategories;

/// Configuration of the BERT normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BertNormalizer {
    /// Drop control chars and map every whitespace to a plain space
    pub clean_text: bool,
    /// Surround CJK ideographs with spaces
    pub handle_chinese_chars: bool,
    /// Strip accents; `None` follows `lowercase`
    pub strip_accents: Option<bool>,
    pub lowercase: bool,
}

impl Default for BertNormalizer {
    fn default() -> Self {
        Self {
            clean_text: true,
            handle_chinese_chars: true,
            strip_accents: None,
            lowercase: true,
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r') || c.is_separator_space()
}

fn is_control(c: char) -> bool {
    !matches!(c, '\t' | '\n' | '\r') && c.is_other()
}

/// Whether `c` lies in one of the CJK Unified Ideograph blocks.
pub fn is_chinese_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2B73F
            | 0x2B740..=0x2B81F
            | 0x2B820..=0x2CEAF
            | 0x2F800..=0x2FA1F
    )
}

impl BertNormalizer {
    pub fn new(
        clean_text: bool,
        handle_chinese_chars: bool,
        strip_accents: Option<bool>,
        lowercase: bool,
    ) -> Self {
        Self {
            clean_text,
            handle_chinese_chars,
            strip_accents,
            lowercase,
        }
    }

    pub fn normalize(&self, normalized: &mut NormalizedString) -> Result<()> {
        if self.clean_text {
            self.do_clean_text(normalized)?;
        }
        if self.handle_chinese_chars {
            self.do_handle_chinese_chars(normalized)?;
        }
        if self.lowercase {
            normalized.lowercase()?;
        }
        if self.strip_accents.unwrap_or(self.lowercase) {
            normalized.strip_accents()?;
        }
        Ok(())
    }

    // A CR directly followed by LF is dropped so the pair yields one space.
    fn do_clean_text(&self, normalized: &mut NormalizedString) -> Result<()> {
        let chars: Vec<char> = normalized.normalized().chars().collect();
        let mut dest = Vec::with_capacity(chars.len());
        let mut removed = 0isize;
        for (i, &c) in chars.iter().enumerate() {
            let crlf = c == '\r' && chars.get(i + 1) == Some(&'\n');
            if c == '\0' || c == char::REPLACEMENT_CHARACTER || is_control(c) || crlf {
                removed += 1;
                continue;
            }
            let c = if is_whitespace(c) { ' ' } else { c };
            dest.push((c, -removed));
            removed = 0;
        }
        normalized.transform(dest, 0)
    }

    // Pads are only added where no whitespace is already present, so running
    // the normalizer again leaves the text unchanged.
    fn do_handle_chinese_chars(&self, normalized: &mut NormalizedString) -> Result<()> {
        let chars: Vec<char> = normalized.normalized().chars().collect();
        if !chars.iter().any(|&c| is_chinese_char(c)) {
            return Ok(());
        }
        let mut dest = Vec::with_capacity(chars.len() * 3);
        for (i, &c) in chars.iter().enumerate() {
            if !is_chinese_char(c) {
                dest.push((c, 0));
                continue;
            }
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let pad_before = prev.map_or(true, |p| !is_whitespace(p) && !is_chinese_char(p));
            let pad_after = chars.get(i + 1).map_or(true, |&n| !is_whitespace(n));
            if pad_before {
                dest.push((' ', 0));
                dest.push((c, 1));
            } else {
                dest.push((c, 0));
            }
            if pad_after {
                dest.push((' ', 1));
            }
        }
        normalized.transform(dest, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_only() -> BertNormalizer {
        BertNormalizer::new(true, false, Some(false), false)
    }

    #[test]
    fn test_clean_text() {
        let mut normalized = NormalizedString::from("Hello\u{0}\tWorld\r\n");
        clean_only().normalize(&mut normalized).unwrap();

        assert_eq!(normalized.normalized(), "Hello World ");
        // NUL + tab collapse into the first space, CR + LF into the last.
        assert_eq!(normalized.alignments()[5], (5, 7));
        assert_eq!(normalized.alignments()[6], (7, 8));
        assert_eq!(normalized.alignments()[11], (12, 14));
    }

    #[test]
    fn test_chinese_chars() {
        let mut normalized = NormalizedString::from("我爱a中文");
        BertNormalizer::new(false, true, Some(false), false)
            .normalize(&mut normalized)
            .unwrap();

        assert_eq!(normalized.normalized(), " 我 爱 a 中 文 ");
        assert_eq!(normalized.convert_offsets(1..4), Some(0..3));
    }

    #[test]
    fn test_lowercase_and_accents() {
        let mut normalized = NormalizedString::from("Héllo WÖRLD");
        BertNormalizer::default().normalize(&mut normalized).unwrap();
        assert_eq!(normalized.normalized(), "hello world");

        let mut kept = NormalizedString::from("Héllo");
        BertNormalizer::new(true, true, Some(false), true)
            .normalize(&mut kept)
            .unwrap();
        assert_eq!(kept.normalized(), "héllo");
    }

    #[test]
    fn test_idempotent() {
        let normalizer = BertNormalizer::default();
        let mut once = NormalizedString::from("Ça\u{0}\tVA\r\n北京 ÉTÉ\u{3000}!");
        normalizer.normalize(&mut once).unwrap();

        let mut twice = once.clone();
        normalizer.normalize(&mut twice).unwrap();

        assert_eq!(twice.normalized(), once.normalized());
        assert_eq!(twice.alignments(), once.alignments());
    }
}
