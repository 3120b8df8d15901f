//! Normalizers applied to each input before pre-tokenization.
//!
//! A normalizer rewrites a [`NormalizedString`] in place; alignment tracking
//! is handled by the string itself, so every variant here is a thin mapping
//! onto its operations.

pub mod bert;

pub use bert::BertNormalizer;

use serde::{Deserialize, Serialize};
use subtok_core::{NormalizedString, Result};

/// Normalization step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Normalizer {
    /// Canonical composition
    Nfc,
    /// Canonical decomposition
    Nfd,
    /// Compatibility composition
    Nfkc,
    /// Compatibility decomposition
    Nfkd,
    Lowercase,
    /// NFD, then drop non-spacing marks
    StripAccents,
    Bert(BertNormalizer),
    /// Several normalizers applied in order
    Sequence { normalizers: Vec<Normalizer> },
}

impl Normalizer {
    /// Normalize `normalized` in place.
    pub fn normalize(&self, normalized: &mut NormalizedString) -> Result<()> {
        match self {
            Self::Nfc => normalized.nfc(),
            Self::Nfd => normalized.nfd(),
            Self::Nfkc => normalized.nfkc(),
            Self::Nfkd => normalized.nfkd(),
            Self::Lowercase => normalized.lowercase(),
            Self::StripAccents => normalized.strip_accents(),
            Self::Bert(bert) => bert.normalize(normalized),
            Self::Sequence { normalizers } => normalizers
                .iter()
                .try_for_each(|normalizer| normalizer.normalize(normalized)),
        }
    }

    /// Normalize a plain string, dropping alignments.
    pub fn normalize_str(&self, text: &str) -> Result<String> {
        let mut normalized = NormalizedString::from(text);
        self.normalize(&mut normalized)?;
        Ok(normalized.normalized().to_owned())
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::Bert(BertNormalizer::default())
    }
}

impl From<BertNormalizer> for Normalizer {
    fn from(bert: BertNormalizer) -> Self {
        Self::Bert(bert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nfc_normalization() {
        // e + combining acute accent
        let result = Normalizer::Nfc.normalize_str("e\u{0301}").unwrap();
        assert_eq!(result, "\u{00e9}");
    }

    #[test]
    fn test_nfd_normalization() {
        let result = Normalizer::Nfd.normalize_str("\u{00e9}").unwrap();
        assert_eq!(result, "e\u{0301}");
    }

    #[test]
    fn test_sequence_keeps_alignments() {
        let normalizer = Normalizer::Sequence {
            normalizers: vec![Normalizer::StripAccents, Normalizer::Lowercase],
        };
        let mut normalized = NormalizedString::from("CAFÉ");
        normalizer.normalize(&mut normalized).unwrap();

        assert_eq!(normalized.normalized(), "cafe");
        assert_eq!(normalized.convert_offsets(3..4), Some(3..5));
    }

    #[test]
    fn test_idempotent_forms() {
        let text = "Ǆemal ﬁ Å ｶ ｶﾞ ﾊﾟ 한국어";
        for normalizer in [
            Normalizer::Nfc,
            Normalizer::Nfd,
            Normalizer::Nfkc,
            Normalizer::Nfkd,
        ] {
            let once = normalizer.normalize_str(text).unwrap();
            let twice = normalizer.normalize_str(&once).unwrap();
            assert_eq!(once, twice, "{:?}", normalizer);
        }
    }

    #[test]
    fn test_nfkc_halfwidth_kana() {
        assert_eq!(Normalizer::Nfkc.normalize_str("ｶﾞｷﾞ").unwrap(), "ガギ");
        assert_eq!(Normalizer::Nfkc.normalize_str("ﾊﾟ").unwrap(), "パ");
    }

    #[test]
    fn test_serde_roundtrip() {
        let normalizer = Normalizer::Sequence {
            normalizers: vec![Normalizer::Nfkc, Normalizer::Bert(BertNormalizer::default())],
        };
        let json = serde_json::to_string(&normalizer).unwrap();
        let restored: Normalizer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, normalizer);
    }
}
