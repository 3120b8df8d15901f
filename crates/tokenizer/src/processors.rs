//! Post-processors adding the special tokens a model expects.

use crate::models::Model;
use serde::{Deserialize, Serialize};
use subtok_core::{Encoding, Result, TokenizerError};

/// A special token and its id.
pub type SpecialToken = (String, u32);

fn lookup(model: &Model, token: &str) -> Result<SpecialToken> {
    model
        .token_to_id(token)
        .map(|id| (token.to_owned(), id))
        .ok_or_else(|| TokenizerError::MissingSpecialToken(token.to_owned()))
}

/// Wraps encodings in their special tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PostProcessor {
    /// `[CLS] A [SEP]` and `[CLS] A [SEP] B [SEP]`; type ids 0 then 1
    Bert { sep: SpecialToken, cls: SpecialToken },
    /// `<s> A </s>` and `<s> A </s> </s> B </s>`; type ids all 0
    Roberta { sep: SpecialToken, cls: SpecialToken },
}

impl PostProcessor {
    /// BERT processing with the model's `[SEP]` and `[CLS]` tokens.
    pub fn bert(model: &Model) -> Result<Self> {
        Ok(Self::Bert {
            sep: lookup(model, "[SEP]")?,
            cls: lookup(model, "[CLS]")?,
        })
    }

    /// RoBERTa processing with the model's `</s>` and `<s>` tokens.
    pub fn roberta(model: &Model) -> Result<Self> {
        Ok(Self::Roberta {
            sep: lookup(model, "</s>")?,
            cls: lookup(model, "<s>")?,
        })
    }

    /// Number of special tokens added around one or two sequences.
    pub fn added_tokens(&self, is_pair: bool) -> usize {
        match (self, is_pair) {
            (_, false) => 2,
            (Self::Bert { .. }, true) => 3,
            (Self::Roberta { .. }, true) => 4,
        }
    }

    /// Ids of the special tokens this processor inserts.
    pub fn special_ids(&self) -> [u32; 2] {
        match self {
            Self::Bert { sep, cls } | Self::Roberta { sep, cls } => [sep.1, cls.1],
        }
    }

    pub fn process(
        &self,
        first: Encoding,
        second: Option<Encoding>,
        add_special_tokens: bool,
    ) -> Result<Encoding> {
        if !add_special_tokens {
            return Ok(match second {
                None => first,
                Some(second) => Encoding::merge([first, second], true),
            });
        }

        let encoding = match self {
            Self::Bert { sep, cls } => {
                let (sep_token, sep_id) = (sep.0.as_str(), sep.1);
                let head = Encoding::merge(
                    [
                        Encoding::special(cls.1, &cls.0, 0),
                        first,
                        Encoding::special(sep_id, sep_token, 0),
                    ],
                    false,
                );
                match second {
                    None => head,
                    Some(mut second) => {
                        second.set_type_id(1);
                        let tail = Encoding::merge(
                            [second, Encoding::special(sep_id, sep_token, 1)],
                            false,
                        );
                        Encoding::merge([head, tail], true)
                    }
                }
            }
            Self::Roberta { sep, cls } => {
                let (sep_token, sep_id) = (sep.0.as_str(), sep.1);
                let head = Encoding::merge(
                    [
                        Encoding::special(cls.1, &cls.0, 0),
                        first,
                        Encoding::special(sep_id, sep_token, 0),
                    ],
                    false,
                );
                match second {
                    None => head,
                    Some(mut second) => {
                        second.set_type_id(0);
                        let tail = Encoding::merge(
                            [
                                Encoding::special(sep_id, sep_token, 0),
                                second,
                                Encoding::special(sep_id, sep_token, 0),
                            ],
                            false,
                        );
                        Encoding::merge([head, tail], true)
                    }
                }
            }
        };
        Ok(encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subtok_core::Token;

    fn sequence(values: &[&str], first_id: u32) -> Encoding {
        let mut start = 0;
        let tokens = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let token = Token::new(first_id + i as u32, v.to_string(), (start, start + v.len()));
                start += v.len();
                token
            })
            .collect();
        Encoding::from_tokens(tokens, (0..values.len() as u32).map(Some).collect(), 0)
    }

    fn bert() -> PostProcessor {
        PostProcessor::Bert {
            sep: ("[SEP]".into(), 102),
            cls: ("[CLS]".into(), 101),
        }
    }

    #[test]
    fn test_bert_single() {
        let encoding = bert().process(sequence(&["hi", "there"], 1), None, true).unwrap();
        assert_eq!(encoding.tokens(), &["[CLS]", "hi", "there", "[SEP]"]);
        assert_eq!(encoding.ids(), &[101, 1, 2, 102]);
        assert_eq!(encoding.special_tokens_mask(), &[1, 0, 0, 1]);
        assert_eq!(encoding.attention_mask(), &[1, 1, 1, 1]);
        assert_eq!(encoding.offsets(), &[(0, 0), (0, 2), (2, 7), (0, 0)]);
        assert_eq!(encoding.word_ids(), &[None, Some(0), Some(1), None]);
    }

    #[test]
    fn test_bert_pair() {
        let encoding = bert()
            .process(sequence(&["a"], 1), Some(sequence(&["b", "c"], 5)), true)
            .unwrap();
        assert_eq!(
            encoding.tokens(),
            &["[CLS]", "a", "[SEP]", "b", "c", "[SEP]"]
        );
        assert_eq!(encoding.type_ids(), &[0, 0, 0, 1, 1, 1]);
        assert_eq!(encoding.special_tokens_mask(), &[1, 0, 1, 0, 0, 1]);
        assert_eq!(bert().added_tokens(true), 3);
    }

    #[test]
    fn test_roberta_pair() {
        let roberta = PostProcessor::Roberta {
            sep: ("</s>".into(), 2),
            cls: ("<s>".into(), 0),
        };
        let encoding = roberta
            .process(sequence(&["a"], 10), Some(sequence(&["b"], 20)), true)
            .unwrap();
        assert_eq!(encoding.tokens(), &["<s>", "a", "</s>", "</s>", "b", "</s>"]);
        assert_eq!(encoding.type_ids(), &[0; 6]);
        assert_eq!(roberta.added_tokens(true), 4);
        assert_eq!(roberta.added_tokens(false), 2);
    }

    #[test]
    fn test_without_special_tokens() {
        let encoding = bert()
            .process(sequence(&["a"], 1), Some(sequence(&["b"], 2)), false)
            .unwrap();
        assert_eq!(encoding.tokens(), &["a", "b"]);
    }

    #[test]
    fn test_overflow_fragments_are_wrapped() {
        let mut first = sequence(&["a", "b", "c"], 1);
        first.truncate(2, 0).unwrap();
        let encoding = bert().process(first, None, true).unwrap();

        assert_eq!(encoding.tokens(), &["[CLS]", "a", "b", "[SEP]"]);
        assert_eq!(encoding.overflowing().len(), 1);
        assert_eq!(
            encoding.overflowing()[0].tokens(),
            &["[CLS]", "c", "[SEP]"]
        );
    }
}
