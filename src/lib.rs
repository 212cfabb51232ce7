//! Subtok - word-level BPE subword tokenizer
//!
//! A deterministic transducer between text and token-id sequences,
//! driven by a trained merge-rule table loaded from a compact binary
//! model format:
//!
//! - Event-driven merges: a linked slot list plus a priority queue keyed
//!   by rule order (O(n log n) per word instead of rescanning)
//! - Precomputed recipes for O(1)-per-token decoding
//! - FxHashMap lookup tables throughout
//! - Rayon parallelism for batch encode/decode
//! - Line-oriented stream wrappers for file-at-a-time workloads
//!
//! # Example
//!
//! ```ignore
//! use subtok::{EncodingConfig, Model};
//!
//! let model = Model::from_file("model.bin")?;
//! let config = EncodingConfig { bos: true, eos: true, reverse: false };
//! let ids = model.encode("the quick brown fox", &config)?;
//! let text = model.decode(&ids)?;
//! ```

pub mod core;

pub use core::{
    CodecError, DecodeError, EncodeError, EncodingConfig, Model, ModelError, Rule, SpecialTokens,
    StreamError, TokenId, BOS_TOKEN, EOS_TOKEN, PAD_TOKEN, RULE_RECORD_SIZE,
    SPECIALS_RECORD_SIZE, UNK_TOKEN,
};
