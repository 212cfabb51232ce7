//! Decoding token ids back into text.
//!
//! Every known id expands through its precomputed recipe, so decoding a
//! token is O(recipe length) with no searching. The word-start marker at
//! the head of a recipe renders as an ASCII space when `replace_space`
//! is requested, which is how word boundaries reappear in decoded
//! sentences.

use rayon::prelude::*;
use thiserror::Error;
use tracing::error;

use super::model::{Model, TokenId, BOS_TOKEN, EOS_TOKEN, PAD_TOKEN, UNK_TOKEN};

/// Errors that can occur while decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unknown token id {0}")]
    UnknownTokenId(TokenId),
}

impl Model {
    /// The string form of a single token id.
    ///
    /// With `replace_space`, a recipe that begins with the word-start
    /// marker drops the marker and gains a leading ASCII space instead.
    /// Ids outside the recipe table resolve to a special display name
    /// when they match one of the declared specials, and fail otherwise.
    pub fn id_to_token(&self, id: TokenId, replace_space: bool) -> Result<String, DecodeError> {
        let Some(recipe) = self.recipe(id) else {
            let specials = self.special_tokens();
            let name = if specials.unk_id() == Some(id) {
                UNK_TOKEN
            } else if specials.pad_id() == Some(id) {
                PAD_TOKEN
            } else if specials.bos_id() == Some(id) {
                BOS_TOKEN
            } else if specials.eos_id() == Some(id) {
                EOS_TOKEN
            } else {
                error!(id, "token id is neither known nor special");
                return Err(DecodeError::UnknownTokenId(id));
            };
            return Ok(name.to_string());
        };

        let (head, tail) = match recipe.split_first() {
            Some((&head, tail)) if replace_space && head == self.space_id() => (" ", tail),
            _ => ("", recipe),
        };
        let mut token = String::with_capacity(head.len() + tail.len());
        token.push_str(head);
        for &id in tail {
            match self.id_to_char(id) {
                Some(ch) => token.push(ch),
                None => {
                    error!(id, "recipe entry has no corresponding character");
                    return Err(DecodeError::UnknownTokenId(id));
                }
            }
        }
        Ok(token)
    }

    /// Decode an encoded sentence back into a string of words with
    /// spaces in between.
    pub fn decode(&self, ids: &[TokenId]) -> Result<String, DecodeError> {
        let mut sentence = String::new();
        for &id in ids {
            sentence.push_str(&self.id_to_token(id, true)?);
        }
        // Cosmetic fixups: drop the space the first word-start marker
        // produced, and close the gap a leading <BOS> leaves behind.
        if let Some(rest) = sentence.strip_prefix(' ') {
            sentence = rest.to_string();
        }
        if let Some(rest) = sentence.strip_prefix("<BOS> ") {
            sentence = format!("{BOS_TOKEN}{rest}");
        }
        Ok(sentence)
    }

    /// Decode a batch of encoded sentences in parallel, short-circuiting
    /// on the first failure.
    pub fn decode_batch(&self, sentences: &[Vec<TokenId>]) -> Result<Vec<String>, DecodeError> {
        sentences
            .par_iter()
            .map(|ids| self.decode(ids))
            .collect()
    }
}
