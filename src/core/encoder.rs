//! Sentence encoding: whitespace splitting, per-word merges, and the
//! bos/eos/reverse options.

use rayon::prelude::*;
use thiserror::Error;
use tracing::error;

use super::bpe::{encode_word, Piece};
use super::model::{Model, TokenId, BOS_TOKEN, EOS_TOKEN};

/// Errors that can occur while encoding.
///
/// Encoding never fails on content (characters outside the alphabet
/// become `<UNK>`), only on configuration the model cannot honor.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot use {0} - model was trained without it")]
    SpecialTokenUnavailable(&'static str),
}

/// Options for encoding a sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingConfig {
    /// Prepend the beginning-of-sentence id. Requires the model to
    /// declare `<BOS>`.
    pub bos: bool,
    /// Append the end-of-sentence id. Requires the model to declare
    /// `<EOS>`.
    pub eos: bool,
    /// Reverse the final id sequence, bos/eos included.
    pub reverse: bool,
}

impl Model {
    /// Encode a sentence of whitespace-separated words into token ids.
    ///
    /// Each word is prefixed with the word-start marker and merged
    /// according to the model's rules, highest priority first. Runs of
    /// characters outside the alphabet collapse into a single `<UNK>`.
    pub fn encode(
        &self,
        sentence: &str,
        config: &EncodingConfig,
    ) -> Result<Vec<TokenId>, EncodeError> {
        let (ids, _) = self.encode_impl(sentence, config, false)?;
        Ok(ids)
    }

    /// Encode a sentence, also returning each output token's string form.
    ///
    /// Known ids render their recipe verbatim (word-start marker kept),
    /// `<UNK>` tokens render the original text of the unknown run they
    /// replaced, and bos/eos render their display names. With
    /// `config.reverse` both sequences are reversed.
    pub fn encode_with_pieces(
        &self,
        sentence: &str,
        config: &EncodingConfig,
    ) -> Result<(Vec<TokenId>, Vec<String>), EncodeError> {
        let (ids, pieces) = self.encode_impl(sentence, config, true)?;
        Ok((ids, pieces))
    }

    /// Encode a batch of sentences in parallel, short-circuiting on the
    /// first failure.
    pub fn encode_batch(
        &self,
        sentences: &[String],
        config: &EncodingConfig,
    ) -> Result<Vec<Vec<TokenId>>, EncodeError> {
        sentences
            .par_iter()
            .map(|sentence| self.encode(sentence, config))
            .collect()
    }

    fn encode_impl(
        &self,
        sentence: &str,
        config: &EncodingConfig,
        with_pieces: bool,
    ) -> Result<(Vec<TokenId>, Vec<String>), EncodeError> {
        let specials = self.special_tokens();
        let bos = if config.bos {
            match specials.bos_id() {
                Some(id) => Some(id),
                None => {
                    error!("cannot use bos - model was trained without it");
                    return Err(EncodeError::SpecialTokenUnavailable("bos"));
                }
            }
        } else {
            None
        };
        let eos = if config.eos {
            match specials.eos_id() {
                Some(id) => Some(id),
                None => {
                    error!("cannot use eos - model was trained without it");
                    return Err(EncodeError::SpecialTokenUnavailable("eos"));
                }
            }
        } else {
            None
        };

        let mut ids = Vec::new();
        let mut pieces = Vec::new();
        if let Some(id) = bos {
            ids.push(id);
            if with_pieces {
                pieces.push(BOS_TOKEN.to_string());
            }
        }

        let mut word_pieces: Vec<Piece> = Vec::new();
        for word in sentence.split_whitespace() {
            word_pieces.clear();
            encode_word(self, word, &mut word_pieces);
            ids.extend(word_pieces.iter().map(|piece| piece.id));
            if with_pieces {
                for piece in &word_pieces {
                    pieces.push(self.piece_string(word, piece));
                }
            }
        }

        if let Some(id) = eos {
            ids.push(id);
            if with_pieces {
                pieces.push(EOS_TOKEN.to_string());
            }
        }
        if config.reverse {
            ids.reverse();
            pieces.reverse();
        }
        Ok((ids, pieces))
    }

    /// String form of one surviving word token: the rendered recipe for
    /// known ids, the covered source text for `<UNK>` slots.
    fn piece_string(&self, word: &str, piece: &Piece) -> String {
        match self.recipe(piece.id) {
            Some(ids) => self
                .render_ids(ids)
                .unwrap_or_else(|| word[piece.start..piece.end].to_string()),
            None => word[piece.start..piece.end].to_string(),
        }
    }
}
