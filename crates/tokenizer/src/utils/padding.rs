//! Batch padding.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use subtok_core::{Encoding, PaddingDirection};

/// Target length of padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddingStrategy {
    /// Pad to the longest encoding of the batch
    #[default]
    BatchLongest,
    /// Pad to a fixed length
    Fixed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddingParams {
    pub strategy: PaddingStrategy,
    pub direction: PaddingDirection,
    /// Round the target length up to a multiple of this
    pub pad_to_multiple_of: Option<usize>,
    pub pad_id: u32,
    pub pad_type_id: u32,
    pub pad_token: String,
}

impl Default for PaddingParams {
    fn default() -> Self {
        Self {
            strategy: PaddingStrategy::BatchLongest,
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id: 0,
            pad_type_id: 0,
            pad_token: "[PAD]".to_owned(),
        }
    }
}

impl PaddingParams {
    /// Length every encoding of `encodings` is padded to.
    pub fn target_length(&self, encodings: &[Encoding]) -> usize {
        let length = match self.strategy {
            PaddingStrategy::Fixed(length) => length,
            PaddingStrategy::BatchLongest => encodings.iter().map(Encoding::len).max().unwrap_or(0),
        };
        match self.pad_to_multiple_of {
            Some(multiple) if multiple > 0 && length % multiple != 0 => {
                length + multiple - length % multiple
            }
            _ => length,
        }
    }
}

/// Pad every encoding of the batch to the same length.
pub fn pad_encodings(encodings: &mut [Encoding], params: &PaddingParams) {
    if encodings.is_empty() {
        return;
    }
    let target = params.target_length(encodings);
    encodings.par_iter_mut().for_each(|encoding| {
        encoding.pad(
            target,
            params.pad_id,
            params.pad_type_id,
            &params.pad_token,
            params.direction,
        )
    });
}
