//! Core tokenization engine for subtok.
//!
//! This module contains the BPE model and its encode/decode machinery:
//!
//! - [`Model`]: the immutable model store: alphabet maps, ordered merge
//!   rules, rule-pair index, precomputed recipes and reverse recipes,
//!   plus the binary loader that builds it
//! - [`codec`]: fixed-width big-endian record encode/decode for the
//!   binary model format
//! - bpe: the per-word merge algorithm, a flat-array doubly linked slot
//!   list driven by a priority queue keyed on rule order, with lazy
//!   filtering of stale merge events
//! - encoder: sentence encoding with bos/eos/reverse options and
//!   rayon-parallel batches
//! - decoder: recipe-based id-to-text decoding and reverse lookups
//! - streaming: line-oriented wrappers over readers
//!
//! The model is built once from its binary dump and never mutated, so a
//! single instance can serve concurrent encode/decode calls without
//! synchronization; all per-call scratch lives on the call stack.

mod bpe;
mod codec;
mod decoder;
mod encoder;
mod model;
mod streaming;
#[cfg(test)]
pub(crate) mod test_fixture;

pub use codec::{
    CodecError, Rule, SpecialTokens, RULE_RECORD_SIZE, SPECIALS_RECORD_SIZE,
};
pub use decoder::DecodeError;
pub use encoder::{EncodeError, EncodingConfig};
pub use model::{
    Model, ModelError, TokenId, BOS_TOKEN, EOS_TOKEN, PAD_TOKEN, UNK_TOKEN,
};
pub use streaming::StreamError;
