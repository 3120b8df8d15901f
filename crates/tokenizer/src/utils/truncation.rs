//! Truncation of single and paired encodings.

use serde::{Deserialize, Serialize};
use subtok_core::{Encoding, Result, TokenizerError};

/// Which sequence of a pair gives up tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TruncationStrategy {
    /// Trim the longer sequence, one token at a time
    #[default]
    LongestFirst,
    OnlyFirst,
    OnlySecond,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruncationParams {
    /// Maximum total length, special tokens included
    pub max_length: usize,
    /// Tokens shared by consecutive overflow fragments
    pub stride: usize,
    pub strategy: TruncationStrategy,
}

impl Default for TruncationParams {
    fn default() -> Self {
        Self {
            max_length: 512,
            stride: 0,
            strategy: TruncationStrategy::LongestFirst,
        }
    }
}

impl TruncationParams {
    pub fn validate(&self) -> Result<()> {
        self.validate_reserving(0)
    }

    /// Check the stride against the length left once `reserved` special
    /// tokens are set aside.
    pub fn validate_reserving(&self, reserved: usize) -> Result<()> {
        let budget = self.max_length.saturating_sub(reserved);
        if self.max_length > 0 && self.stride > 0 && self.stride >= budget {
            return Err(TokenizerError::InvalidConfig(format!(
                "stride ({}) must be smaller than max length ({}) minus {} special tokens",
                self.stride, self.max_length, reserved
            )));
        }
        Ok(())
    }
}

/// Truncate `first` (and `second`) so they fit in `max_length` tokens.
///
/// `max_length` is the budget left for the sequences themselves, after
/// the post-processor's special tokens are accounted for.
pub fn truncate_encodings(
    mut first: Encoding,
    mut second: Option<Encoding>,
    max_length: usize,
    params: &TruncationParams,
) -> Result<(Encoding, Option<Encoding>)> {
    let total = first.len() + second.as_ref().map_or(0, Encoding::len);
    if total <= max_length {
        return Ok((first, second));
    }
    let to_remove = total - max_length;

    match (params.strategy, second.as_mut()) {
        (TruncationStrategy::LongestFirst, None) => first.truncate(max_length, params.stride)?,
        (TruncationStrategy::LongestFirst, Some(pair)) => {
            let (mut n1, mut n2) = (first.len(), pair.len());
            // Trim the longer side; ties trim the second.
            for _ in 0..to_remove {
                if n1 > n2 {
                    n1 -= 1;
                } else {
                    n2 -= 1;
                }
            }
            first.truncate(n1, params.stride)?;
            pair.truncate(n2, params.stride)?;
        }
        (TruncationStrategy::OnlyFirst, _) => truncate_one(&mut first, to_remove, params.stride)?,
        (TruncationStrategy::OnlySecond, Some(pair)) => {
            truncate_one(pair, to_remove, params.stride)?
        }
        (TruncationStrategy::OnlySecond, None) => {
            return Err(TokenizerError::Input(
                "second sequence not provided".to_owned(),
            ))
        }
    }
    Ok((first, second))
}

fn truncate_one(encoding: &mut Encoding, to_remove: usize, stride: usize) -> Result<()> {
    if encoding.len() <= to_remove {
        return Err(TokenizerError::Input(format!(
            "sequence of {} tokens is too short to remove {} tokens",
            encoding.len(),
            to_remove
        )));
    }
    encoding.truncate(encoding.len() - to_remove, stride)
}
