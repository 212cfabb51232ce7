//! Line-oriented encode/decode over readers.
//!
//! Each input line is one sentence (encoding) or one whitespace-separated
//! list of decimal token ids (decoding). The wrappers are thin: the core
//! operations work on in-memory strings, and errors from them
//! short-circuit the batch.

use std::io::{self, BufRead};

use thiserror::Error;

use super::decoder::DecodeError;
use super::encoder::{EncodeError, EncodingConfig};
use super::model::{Model, TokenId};

/// Errors that can occur in the line-oriented wrappers.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("malformed token id {0:?} in id stream")]
    MalformedInput(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Model {
    /// Encode every line of `reader` as one sentence.
    pub fn encode_stream<R: BufRead>(
        &self,
        reader: R,
        config: &EncodingConfig,
    ) -> Result<Vec<Vec<TokenId>>, StreamError> {
        let mut encoded = Vec::new();
        for line in reader.lines() {
            encoded.push(self.encode(&line?, config)?);
        }
        Ok(encoded)
    }

    /// Decode every line of `reader` as one whitespace-separated list of
    /// decimal token ids.
    pub fn decode_from_stream<R: BufRead>(&self, reader: R) -> Result<Vec<String>, StreamError> {
        let mut sentences = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let ids = line
                .split_whitespace()
                .map(|field| {
                    field
                        .parse::<TokenId>()
                        .map_err(|_| StreamError::MalformedInput(field.to_string()))
                })
                .collect::<Result<Vec<TokenId>, StreamError>>()?;
            sentences.push(self.decode(&ids)?);
        }
        Ok(sentences)
    }
}
