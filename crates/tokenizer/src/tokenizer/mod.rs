//! Main tokenizer implementation.
//!
//! A [`Tokenizer`] runs each input through the pipeline: added-token
//! extraction, normalization, pre-tokenization, the model, truncation,
//! post-processing and padding.

mod serialization;
mod train;

use crate::added_vocabulary::{AddedToken, AddedVocabulary, Segment};
use crate::decoders::Decoder;
use crate::models::Model;
use crate::normalizer::Normalizer;
use crate::pre_tokenizer::{PreToken, PreTokenizer};
use crate::processors::PostProcessor;
use crate::utils::{pad_encodings, truncate_encodings, PaddingParams, TruncationParams};
use rayon::prelude::*;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subtok_core::{Encoding, NormalizedString, Result, Token, TokenizerError};

/// One sequence or a pair of sequences to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeInput<'s> {
    Single(Cow<'s, str>),
    Dual(Cow<'s, str>, Cow<'s, str>),
}

impl<'s> From<&'s str> for EncodeInput<'s> {
    fn from(text: &'s str) -> Self {
        Self::Single(Cow::Borrowed(text))
    }
}

impl From<String> for EncodeInput<'_> {
    fn from(text: String) -> Self {
        Self::Single(Cow::Owned(text))
    }
}

impl<'s> From<&'s String> for EncodeInput<'s> {
    fn from(text: &'s String) -> Self {
        Self::Single(Cow::Borrowed(text))
    }
}

impl<'s> From<(&'s str, &'s str)> for EncodeInput<'s> {
    fn from((first, second): (&'s str, &'s str)) -> Self {
        Self::Dual(Cow::Borrowed(first), Cow::Borrowed(second))
    }
}

impl From<(String, String)> for EncodeInput<'_> {
    fn from((first, second): (String, String)) -> Self {
        Self::Dual(Cow::Owned(first), Cow::Owned(second))
    }
}

/// Result of a cancellable batch encode.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEncoding {
    /// Encodings of the leading inputs that completed, in input order
    pub encodings: Vec<Encoding>,
    /// Whether the batch was stopped before every input was encoded
    pub cancelled: bool,
}

// The stride has to fit in what is left of `max_length` once the
// post-processor's tokens for a pair are reserved.
pub(crate) fn check_truncation(
    truncation: Option<&TruncationParams>,
    post_processor: Option<&PostProcessor>,
) -> Result<()> {
    match truncation {
        Some(params) => {
            params.validate_reserving(post_processor.map_or(0, |processor| processor.added_tokens(true)))
        }
        None => Ok(()),
    }
}

/// Builder for creating a tokenizer.
#[derive(Default)]
pub struct TokenizerBuilder {
    model: Option<Model>,
    normalizer: Option<Normalizer>,
    pre_tokenizer: Option<PreTokenizer>,
    post_processor: Option<PostProcessor>,
    decoder: Option<Decoder>,
    truncation: Option<TruncationParams>,
    padding: Option<PaddingParams>,
    added_tokens: Vec<AddedToken>,
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with no pipeline stage configured.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn pre_tokenizer(mut self, pre_tokenizer: PreTokenizer) -> Self {
        self.pre_tokenizer = Some(pre_tokenizer);
        self
    }

    pub fn post_processor(mut self, post_processor: PostProcessor) -> Self {
        self.post_processor = Some(post_processor);
        self
    }

    pub fn decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn truncation(mut self, truncation: TruncationParams) -> Self {
        self.truncation = Some(truncation);
        self
    }

    pub fn padding(mut self, padding: PaddingParams) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Register special tokens.
    pub fn special_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.added_tokens
            .extend(tokens.into_iter().map(AddedToken::special));
        self
    }

    /// Build the tokenizer.
    pub fn build(self) -> Result<Tokenizer> {
        let model = self
            .model
            .ok_or_else(|| TokenizerError::InvalidConfig("a model is required".to_owned()))?;
        check_truncation(self.truncation.as_ref(), self.post_processor.as_ref())?;
        let mut tokenizer = Tokenizer {
            normalizer: self.normalizer,
            pre_tokenizer: self.pre_tokenizer,
            model,
            post_processor: self.post_processor,
            decoder: self.decoder,
            added_vocabulary: AddedVocabulary::new(),
            truncation: self.truncation,
            padding: self.padding,
        };
        tokenizer.add_tokens(&self.added_tokens)?;
        Ok(tokenizer)
    }
}

/// Main tokenizer struct.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    normalizer: Option<Normalizer>,
    pre_tokenizer: Option<PreTokenizer>,
    model: Model,
    post_processor: Option<PostProcessor>,
    decoder: Option<Decoder>,
    added_vocabulary: AddedVocabulary,
    truncation: Option<TruncationParams>,
    padding: Option<PaddingParams>,
}

impl Tokenizer {
    /// A tokenizer running only `model`.
    pub fn new(model: impl Into<Model>) -> Self {
        Self {
            normalizer: None,
            pre_tokenizer: None,
            model: model.into(),
            post_processor: None,
            decoder: None,
            added_vocabulary: AddedVocabulary::new(),
            truncation: None,
            padding: None,
        }
    }

    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn normalizer(&self) -> Option<&Normalizer> {
        self.normalizer.as_ref()
    }

    pub fn pre_tokenizer(&self) -> Option<&PreTokenizer> {
        self.pre_tokenizer.as_ref()
    }

    pub fn post_processor(&self) -> Option<&PostProcessor> {
        self.post_processor.as_ref()
    }

    pub fn decoder(&self) -> Option<&Decoder> {
        self.decoder.as_ref()
    }

    pub fn truncation(&self) -> Option<&TruncationParams> {
        self.truncation.as_ref()
    }

    pub fn padding(&self) -> Option<&PaddingParams> {
        self.padding.as_ref()
    }

    pub fn added_vocabulary(&self) -> &AddedVocabulary {
        &self.added_vocabulary
    }

    pub fn with_model(&mut self, model: impl Into<Model>) -> &mut Self {
        self.model = model.into();
        self
    }

    pub fn with_normalizer(&mut self, normalizer: Option<Normalizer>) -> &mut Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_pre_tokenizer(&mut self, pre_tokenizer: Option<PreTokenizer>) -> &mut Self {
        self.pre_tokenizer = pre_tokenizer;
        self
    }

    /// Set or clear the post-processor. Fails when the configured
    /// truncation leaves no room for a stride next to its special tokens.
    pub fn with_post_processor(&mut self, post_processor: Option<PostProcessor>) -> Result<&mut Self> {
        check_truncation(self.truncation.as_ref(), post_processor.as_ref())?;
        self.post_processor = post_processor;
        Ok(self)
    }

    pub fn with_decoder(&mut self, decoder: Option<Decoder>) -> &mut Self {
        self.decoder = decoder;
        self
    }

    /// Set or clear truncation. Fails when the stride is not smaller than
    /// `max_length` minus the post-processor's special tokens.
    pub fn with_truncation(&mut self, truncation: Option<TruncationParams>) -> Result<&mut Self> {
        check_truncation(truncation.as_ref(), self.post_processor.as_ref())?;
        self.truncation = truncation;
        Ok(self)
    }

    pub fn with_padding(&mut self, padding: Option<PaddingParams>) -> &mut Self {
        self.padding = padding;
        self
    }

    /// Add tokens that are matched verbatim before normalization.
    pub fn add_tokens(&mut self, tokens: &[AddedToken]) -> Result<usize> {
        self.added_vocabulary.add_tokens(tokens, &self.model)
    }

    /// Add special tokens, which `decode` can skip.
    pub fn add_special_tokens<I, S>(&mut self, tokens: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<AddedToken> = tokens.into_iter().map(AddedToken::special).collect();
        self.add_tokens(&tokens)
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.added_vocabulary
            .token_to_id(token)
            .or_else(|| self.model.token_to_id(token))
    }

    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        self.added_vocabulary
            .id_to_token(id)
            .or_else(|| self.model.id_to_token(id))
    }

    /// Size of the id space, optionally counting added tokens.
    pub fn vocab_size(&self, with_added_tokens: bool) -> usize {
        let model = self.model.vocab_size();
        if !with_added_tokens {
            return model;
        }
        self.added_vocabulary
            .tokens()
            .iter()
            .map(|&(_, id)| id as usize + 1)
            .fold(model, usize::max)
    }

    fn pre_tokenize(&self, text: &str) -> Result<Vec<PreToken>> {
        match &self.pre_tokenizer {
            Some(pre_tokenizer) => pre_tokenizer.pre_tokenize(text),
            None if text.is_empty() => Ok(Vec::new()),
            None => Ok(vec![PreToken::new(text, (0, text.len()))]),
        }
    }

    // Run one sequence through added-token extraction, normalization,
    // pre-tokenization and the model. Offsets refer to the normalized text.
    fn encode_sequence(&self, text: &str, type_id: u32) -> Result<Encoding> {
        let mut normalized = NormalizedString::default();
        let mut tokens = Vec::new();
        let mut word_ids = Vec::new();
        let mut word = 0u32;

        for segment in self.added_vocabulary.split(text) {
            let base = normalized.len();
            match segment {
                Segment::Added { id, content } => {
                    tokens.push(Token::new(id, content.to_owned(), (base, base + content.len())));
                    word_ids.push(Some(word));
                    word += 1;
                    normalized.append(&NormalizedString::from(content));
                }
                Segment::Text(piece) => {
                    let mut piece = NormalizedString::from(piece);
                    if let Some(normalizer) = &self.normalizer {
                        normalizer.normalize(&mut piece)?;
                    }
                    for pre_token in self.pre_tokenize(piece.normalized())? {
                        for token in self.model.tokenize(&pre_token.value)? {
                            let (start, end) =
                                pre_token.normalized_range(token.offsets.0, token.offsets.1);
                            tokens.push(Token::new(token.id, token.value, (base + start, base + end)));
                            word_ids.push(Some(word));
                        }
                        word += 1;
                    }
                    normalized.append(&piece);
                }
            }
        }

        let mut encoding = Encoding::from_tokens(tokens, word_ids, type_id);
        encoding.set_normalized(Arc::new(normalized));
        Ok(encoding)
    }

    // Everything but padding.
    fn encode_unpadded<'s>(
        &self,
        input: impl Into<EncodeInput<'s>>,
        add_special_tokens: bool,
    ) -> Result<Encoding> {
        let (first, second) = match input.into() {
            EncodeInput::Single(first) => (first, None),
            EncodeInput::Dual(first, second) => (first, Some(second)),
        };
        let first = self.encode_sequence(&first, 0)?;
        let second = second
            .map(|second| self.encode_sequence(&second, 1))
            .transpose()?;

        let (first, second) = match &self.truncation {
            Some(params) => {
                let reserved = match (&self.post_processor, add_special_tokens) {
                    (Some(processor), true) => processor.added_tokens(second.is_some()),
                    _ => 0,
                };
                let budget = params.max_length.saturating_sub(reserved);
                truncate_encodings(first, second, budget, params)?
            }
            None => (first, second),
        };

        match &self.post_processor {
            Some(processor) => processor.process(first, second, add_special_tokens),
            None => Ok(Encoding::merge(std::iter::once(first).chain(second), true)),
        }
    }

    /// Encode a single sequence or a pair.
    ///
    /// # Arguments
    /// * `input` - A `&str`/`String`, or a tuple of two for a pair
    /// * `add_special_tokens` - Whether the post-processor adds its tokens
    pub fn encode<'s>(
        &self,
        input: impl Into<EncodeInput<'s>>,
        add_special_tokens: bool,
    ) -> Result<Encoding> {
        let mut encoding = self.encode_unpadded(input, add_special_tokens)?;
        if let Some(padding) = &self.padding {
            pad_encodings(std::slice::from_mut(&mut encoding), padding);
        }
        Ok(encoding)
    }

    /// Encode a batch of inputs in parallel.
    ///
    /// Results keep the input order. The first failing input aborts the
    /// batch with an error naming its index.
    pub fn encode_batch<'s, E>(&self, inputs: Vec<E>, add_special_tokens: bool) -> Result<Vec<Encoding>>
    where
        E: Into<EncodeInput<'s>> + Send,
    {
        let mut encodings = inputs
            .into_par_iter()
            .enumerate()
            .map(|(index, input)| {
                self.encode_unpadded(input, add_special_tokens)
                    .map_err(|e| e.in_batch(index))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(padding) = &self.padding {
            pad_encodings(&mut encodings, padding);
        }
        Ok(encodings)
    }

    /// Encode a batch, stopping early once `cancel` is set.
    ///
    /// Workers check the flag before each input. On cancellation the
    /// encodings of the leading inputs that did complete are returned.
    pub fn encode_batch_cancellable<'s, E>(
        &self,
        inputs: Vec<E>,
        add_special_tokens: bool,
        cancel: &AtomicBool,
    ) -> Result<BatchEncoding>
    where
        E: Into<EncodeInput<'s>> + Send,
    {
        let total = inputs.len();
        let results: Vec<Option<Result<Encoding>>> = inputs
            .into_par_iter()
            .enumerate()
            .map(|(index, input)| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                Some(
                    self.encode_unpadded(input, add_special_tokens)
                        .map_err(|e| e.in_batch(index)),
                )
            })
            .collect();

        let mut encodings = Vec::with_capacity(total);
        for result in results {
            match result {
                Some(encoding) => encodings.push(encoding?),
                None => break,
            }
        }
        let cancelled = encodings.len() < total;
        if cancelled {
            log::warn!(
                "Batch encoding cancelled after {} of {} inputs",
                encodings.len(),
                total
            );
        }

        if let Some(padding) = &self.padding {
            pad_encodings(&mut encodings, padding);
        }
        Ok(BatchEncoding {
            encodings,
            cancelled,
        })
    }

    fn is_special_id(&self, id: u32) -> bool {
        self.added_vocabulary.is_special(id)
            || self
                .post_processor
                .as_ref()
                .is_some_and(|processor| processor.special_ids().contains(&id))
    }

    /// Decode token IDs back to text.
    ///
    /// Unknown ids decode to the model's unknown token when it has one and
    /// are dropped otherwise.
    ///
    /// # Arguments
    /// * `ids` - The token IDs to decode
    /// * `skip_special_tokens` - Whether to skip special tokens during decoding
    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> String {
        let tokens: Vec<String> = ids
            .iter()
            .filter(|&&id| !(skip_special_tokens && self.is_special_id(id)))
            .filter_map(|&id| {
                self.id_to_token(id)
                    .or_else(|| self.model.unk_token())
                    .map(str::to_owned)
            })
            .collect();

        match &self.decoder {
            Some(decoder) => decoder.decode(&tokens),
            None => tokens.join(" "),
        }
    }

    /// Decode many id sequences in parallel.
    pub fn decode_batch<S>(&self, sequences: &[S], skip_special_tokens: bool) -> Vec<String>
    where
        S: AsRef<[u32]> + Sync,
    {
        sequences
            .par_iter()
            .map(|ids| self.decode(ids.as_ref(), skip_special_tokens))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bpe, WordPiece};
    use crate::normalizer::BertNormalizer;
    use crate::utils::{PaddingStrategy, TruncationStrategy};
    use subtok_core::{PaddingDirection, Vocabulary};

    fn wordpiece_vocab() -> Vocabulary {
        let mut vocab = Vocabulary::new();
        for token in [
            "[PAD]", "[UNK]", "[CLS]", "[SEP]", "un", "##want", "##ed", "runn", "##ing", ",",
            "hello", "world",
        ] {
            vocab.add_token(token);
        }
        vocab
    }

    fn bert_tokenizer() -> Tokenizer {
        let model: Model = WordPiece::builder()
            .vocab(wordpiece_vocab())
            .build()
            .unwrap()
            .into();
        let processor = PostProcessor::bert(&model).unwrap();
        Tokenizer::builder()
            .model(model)
            .normalizer(BertNormalizer::default().into())
            .pre_tokenizer(PreTokenizer::Bert)
            .post_processor(processor)
            .decoder(Decoder::wordpiece())
            .build()
            .unwrap()
    }

    fn byte_level_tokenizer() -> Tokenizer {
        let mut vocab = Vocabulary::new();
        for token in ["Ġ", "M", "i", "ĠM", "ĠMi", "."] {
            vocab.add_token(token);
        }
        let merges = vec![
            ("Ġ".to_string(), "M".to_string()),
            ("ĠM".to_string(), "i".to_string()),
        ];
        let bpe = Bpe::builder().vocab_and_merges(vocab, merges).build().unwrap();
        Tokenizer::builder()
            .model(bpe)
            .pre_tokenizer(PreTokenizer::byte_level())
            .decoder(Decoder::ByteLevel)
            .build()
            .unwrap()
    }

    #[test]
    fn test_bert_pipeline() {
        let tokenizer = bert_tokenizer();
        let encoding = tokenizer.encode("Unwanted, RUNNING", true).unwrap();

        assert_eq!(
            encoding.tokens(),
            &["[CLS]", "un", "##want", "##ed", ",", "runn", "##ing", "[SEP]"]
        );
        assert_eq!(encoding.word_ids()[1..4], [Some(0), Some(0), Some(0)]);
        assert_eq!(encoding.word_ids()[4], Some(1));
        assert_eq!(encoding.offsets()[2], (2, 6));
        assert_eq!(encoding.offsets()[5], (10, 14));

        let normalized = encoding.normalized().unwrap();
        assert_eq!(normalized.normalized(), "unwanted, running");
        assert_eq!(normalized.convert_offsets(10..14), Some(10..14));
    }

    #[test]
    fn test_pair_encoding_type_ids() {
        let tokenizer = bert_tokenizer();
        let encoding = tokenizer.encode(("hello", "world"), true).unwrap();
        assert_eq!(
            encoding.tokens(),
            &["[CLS]", "hello", "[SEP]", "world", "[SEP]"]
        );
        assert_eq!(encoding.type_ids(), &[0, 0, 0, 1, 1]);
        assert_eq!(encoding.offsets()[3], (5, 10));
    }

    #[test]
    fn test_decode() {
        let tokenizer = bert_tokenizer();
        let encoding = tokenizer.encode("unwanted running", true).unwrap();
        assert_eq!(
            tokenizer.decode(encoding.ids(), true),
            "unwanted running"
        );
        assert_eq!(
            tokenizer.decode(encoding.ids(), false),
            "[CLS] unwanted running [SEP]"
        );
        // Unknown ids fall back to the unknown token.
        assert_eq!(tokenizer.decode(&[10, 999], false), "hello [UNK]");
    }

    #[test]
    fn test_byte_level_roundtrip() {
        let tokenizer = byte_level_tokenizer();
        let encoding = tokenizer.encode("Mi Mi.", false).unwrap();
        assert_eq!(encoding.tokens(), &["ĠMi", "ĠMi", "."]);
        assert_eq!(encoding.offsets(), &[(0, 2), (2, 5), (5, 6)]);
        assert_eq!(tokenizer.decode(encoding.ids(), false), " Mi Mi.");
    }

    #[test]
    fn test_added_tokens_skip_normalization() {
        let mut tokenizer = bert_tokenizer();
        tokenizer.add_special_tokens(["[MASK]"]).unwrap();
        let mask = tokenizer.token_to_id("[MASK]").unwrap();
        assert_eq!(mask, 12);

        let encoding = tokenizer.encode("hello [MASK] world", false).unwrap();
        assert_eq!(encoding.tokens(), &["hello", "[MASK]", "world"]);
        assert_eq!(encoding.ids()[1], mask);
        assert_eq!(encoding.offsets(), &[(0, 5), (6, 12), (13, 18)]);
        assert_eq!(tokenizer.decode(encoding.ids(), true), "hello world");
        assert_eq!(tokenizer.vocab_size(true), 13);
    }

    #[test]
    fn test_truncation_reserves_special_tokens() {
        let mut tokenizer = bert_tokenizer();
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: 5,
                stride: 0,
                strategy: TruncationStrategy::LongestFirst,
            }))
            .unwrap();

        let encoding = tokenizer.encode("unwanted running", true).unwrap();
        assert_eq!(encoding.tokens(), &["[CLS]", "un", "##want", "##ed", "[SEP]"]);
        let overflow = &encoding.overflowing()[0];
        assert_eq!(overflow.tokens(), &["[CLS]", "runn", "##ing", "[SEP]"]);
    }

    #[test]
    fn test_invalid_truncation() {
        let mut tokenizer = bert_tokenizer();
        let result = tokenizer.with_truncation(Some(TruncationParams {
            max_length: 2,
            stride: 2,
            strategy: TruncationStrategy::OnlyFirst,
        }));
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));
    }

    #[test]
    fn test_stride_checked_against_special_tokens() {
        let mut tokenizer = bert_tokenizer();
        let params = TruncationParams {
            max_length: 4,
            stride: 2,
            strategy: TruncationStrategy::LongestFirst,
        };
        let result = tokenizer.with_truncation(Some(params.clone()));
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));
        assert!(tokenizer.truncation().is_none());

        // Accepted without a post-processor, then refused once one is set.
        let processor = tokenizer.post_processor().cloned();
        tokenizer.with_post_processor(None).unwrap();
        tokenizer.with_truncation(Some(params.clone())).unwrap();
        assert!(tokenizer.encode("un un un un un un", true).is_ok());
        let result = tokenizer.with_post_processor(processor);
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));

        let model = tokenizer.model().clone();
        let built = Tokenizer::builder()
            .post_processor(PostProcessor::bert(&model).unwrap())
            .model(model)
            .truncation(params)
            .build();
        assert!(matches!(built, Err(TokenizerError::InvalidConfig(_))));
    }

    #[test]
    fn test_batch_padding_and_order() {
        let mut tokenizer = bert_tokenizer();
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            direction: PaddingDirection::Right,
            ..Default::default()
        }));

        let encodings = tokenizer
            .encode_batch(vec!["hello", "unwanted running", "world"], true)
            .unwrap();
        assert_eq!(encodings.len(), 3);
        assert!(encodings.iter().all(|e| e.len() == 7));
        assert_eq!(encodings[0].tokens()[1], "hello");
        assert_eq!(encodings[2].tokens()[1], "world");
        assert_eq!(encodings[0].attention_mask(), &[1, 1, 1, 0, 0, 0, 0]);
        assert_eq!(encodings[0].ids()[3], 0);
    }

    #[test]
    fn test_batch_error_names_input() {
        let model = Bpe::builder()
            .vocab_and_merges(Vocabulary::new(), Vec::new())
            .unk_token("<unk>")
            .build()
            .unwrap();
        let tokenizer = Tokenizer::new(model);
        let err = tokenizer.encode_batch(vec!["", "x"], false).unwrap_err();
        match err {
            TokenizerError::Batch { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_cancelled_batch() {
        let tokenizer = bert_tokenizer();
        let cancel = AtomicBool::new(true);
        let batch = tokenizer
            .encode_batch_cancellable(vec!["hello", "world"], true, &cancel)
            .unwrap();
        assert!(batch.cancelled);
        assert!(batch.encodings.is_empty());

        cancel.store(false, Ordering::Relaxed);
        let batch = tokenizer
            .encode_batch_cancellable(vec!["hello", "world"], true, &cancel)
            .unwrap();
        assert!(!batch.cancelled);
        assert_eq!(batch.encodings.len(), 2);
    }

    #[test]
    fn test_decode_batch() {
        let tokenizer = bert_tokenizer();
        let decoded = tokenizer.decode_batch(&[vec![10u32], vec![11]], false);
        assert_eq!(decoded, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn test_builder_requires_model() {
        let result = Tokenizer::builder().build();
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));
    }
}
