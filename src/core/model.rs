//! In-memory model store and binary model loader.
//!
//! A [`Model`] is built once from a binary dump and never mutated
//! afterwards: every encode/decode operation is a pure function of
//! `(model, input)`, so a model can be shared read-only across threads
//! without synchronization.
//!
//! # Binary model format
//!
//! ```text
//! offset  size       field
//! 0       4          nChars                     (u32 BE)
//! 4       4          nRules                     (u32 BE)
//! 8       8*nChars   alphabet: (codepoint u32 BE, token id u32 BE)
//!         12*nRules  rules: (left, right, result) u32 BE each
//!         16         specials: unk, pad, bos, eos (i32 BE, -1 = absent)
//! ```
//!
//! Trailing bytes after the special-token block are ignored.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, error};

use super::codec::{
    CodecError, Rule, SpecialTokens, RULE_RECORD_SIZE, SPECIALS_RECORD_SIZE,
};

/// Numerical identifier of a subword token. Zero is a legal id.
pub type TokenId = u32;

/// Display name of the unknown token.
pub const UNK_TOKEN: &str = "<UNK>";
/// Display name of the padding token.
pub const PAD_TOKEN: &str = "<PAD>";
/// Display name of the beginning-of-sentence token.
pub const BOS_TOKEN: &str = "<BOS>";
/// Display name of the end-of-sentence token.
pub const EOS_TOKEN: &str = "<EOS>";

/// Errors that can occur while loading a model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model stream ended mid-record")]
    Truncated,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("rule operand {0} is not a previously defined token id")]
    UnknownTokenRef(TokenId),
    #[error("{0:#x} is not a Unicode scalar value")]
    InvalidCodepoint(u32),
}

/// Pack an ordered `(left, right)` id pair into the rule-index key.
#[inline]
pub(crate) fn pair_key(left: TokenId, right: TokenId) -> u64 {
    (u64::from(left) << 32) | u64::from(right)
}

/// A trained BPE model: base alphabet, ordered merge rules, and the
/// derived lookup tables that make encoding and decoding fast.
///
/// All lookups are constant expected time. Recipes (the flat sequence of
/// base-alphabet ids each token expands to) are precomputed at load time,
/// which makes decoding O(recipe length) per token.
pub struct Model {
    char2id: FxHashMap<char, TokenId>,
    id2char: FxHashMap<TokenId, char>,
    rules: Vec<Rule>,
    rule2id: FxHashMap<u64, usize>,
    recipe: FxHashMap<TokenId, Vec<TokenId>>,
    rev_recipe: FxHashMap<String, TokenId>,
    specials: SpecialTokens,
    space_id: TokenId,
}

impl Model {
    /// Load a model from a binary dump.
    ///
    /// Reads the header, `nChars` alphabet entries, `nRules` rule records
    /// and the special-token block, validating that every rule operand
    /// refers to an already-defined token. A failed load yields no model.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ModelError> {
        let n_chars = read_u32(&mut reader)? as usize;
        let n_rules = read_u32(&mut reader)? as usize;

        let mut char2id = FxHashMap::default();
        let mut id2char = FxHashMap::default();
        let mut recipe = FxHashMap::default();
        let mut rev_recipe = FxHashMap::default();

        // The smallest-numbered base character is the word-start marker.
        let mut space_id: Option<TokenId> = None;
        for _ in 0..n_chars {
            let codepoint = read_u32(&mut reader)?;
            let id = read_u32(&mut reader)?;
            let ch = char::from_u32(codepoint).ok_or_else(|| {
                error!(codepoint, id, "alphabet entry is not a scalar value");
                ModelError::InvalidCodepoint(codepoint)
            })?;
            char2id.insert(ch, id);
            id2char.insert(id, ch);
            recipe.insert(id, vec![id]);
            rev_recipe.insert(ch.to_string(), id);
            if space_id.map_or(true, |min| id < min) {
                space_id = Some(id);
            }
        }
        let space_id = space_id.unwrap_or(0);

        let mut rules = Vec::with_capacity(n_rules);
        let mut rule2id = FxHashMap::default();
        let mut buf = [0u8; RULE_RECORD_SIZE];
        for index in 0..n_rules {
            read_record(&mut reader, &mut buf)?;
            let rule = Rule::from_bytes(&buf)?;
            for operand in [rule.left, rule.right] {
                if !recipe.contains_key(&operand) {
                    error!(operand, index, "rule references an undefined token id");
                    return Err(ModelError::UnknownTokenRef(operand));
                }
            }
            // Fresh vec: recipes must never alias each other.
            let mut expansion = recipe[&rule.left].clone();
            expansion.extend_from_slice(&recipe[&rule.right]);
            let rendered = render(&expansion, &id2char)?;
            recipe.insert(rule.result, expansion);
            rev_recipe.insert(rendered, rule.result);
            rule2id.insert(pair_key(rule.left, rule.right), index);
            rules.push(rule);
        }

        let mut buf = [0u8; SPECIALS_RECORD_SIZE];
        read_record(&mut reader, &mut buf)?;
        let specials = SpecialTokens::from_bytes(&buf)?;

        // Display names map to the declared ids even when a special is
        // absent; the -1 cast is a harmless sentinel no lookup produces.
        rev_recipe.insert(UNK_TOKEN.to_string(), specials.unk as TokenId);
        rev_recipe.insert(PAD_TOKEN.to_string(), specials.pad as TokenId);
        rev_recipe.insert(BOS_TOKEN.to_string(), specials.bos as TokenId);
        rev_recipe.insert(EOS_TOKEN.to_string(), specials.eos as TokenId);

        debug!(n_chars, n_rules, space_id, "loaded BPE model");
        Ok(Model {
            char2id,
            id2char,
            rules,
            rule2id,
            recipe,
            rev_recipe,
            specials,
            space_id,
        })
    }

    /// Load a model from an in-memory dump.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ModelError> {
        Self::from_reader(data)
    }

    /// Load a model from a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// The flat base-alphabet expansion of `id`, or `None` for ids the
    /// model does not know (including special ids).
    pub fn recipe(&self, id: TokenId) -> Option<&[TokenId]> {
        self.recipe.get(&id).map(Vec::as_slice)
    }

    /// The base-alphabet id of `ch`, if `ch` is in the alphabet.
    pub fn char_to_id(&self, ch: char) -> Option<TokenId> {
        self.char2id.get(&ch).copied()
    }

    /// The codepoint behind a base-alphabet id.
    pub fn id_to_char(&self, id: TokenId) -> Option<char> {
        self.id2char.get(&id).copied()
    }

    /// The priority of the rule merging `(left, right)`, if one exists.
    /// Lower is higher priority.
    pub fn rule_index(&self, left: TokenId, right: TokenId) -> Option<usize> {
        self.rule2id.get(&pair_key(left, right)).copied()
    }

    /// The ordered rule table. A rule's index is its priority.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The id a rendered token string maps back to, if any. Special
    /// display names (`<UNK>`, `<PAD>`, `<BOS>`, `<EOS>`) resolve to
    /// their declared ids.
    pub fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.rev_recipe.get(token).copied()
    }

    /// The four reserved special-token ids.
    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.specials
    }

    /// The word-start marker id (the smallest-numbered base character).
    pub fn space_id(&self) -> TokenId {
        self.space_id
    }

    /// Total vocabulary range: `max known id + 1`, counting base
    /// characters, rule results, and declared specials.
    pub fn vocab_size(&self) -> usize {
        let max_recipe = self.recipe.keys().max().copied().unwrap_or(0);
        let specials = &self.specials;
        let max_special = [specials.unk, specials.pad, specials.bos, specials.eos]
            .into_iter()
            .filter(|&raw| raw >= 0)
            .map(|raw| raw as TokenId)
            .max()
            .unwrap_or(0);
        max_recipe.max(max_special) as usize + 1
    }

    /// Render a recipe to its character string. Fails on ids with no
    /// backing codepoint, which a well-formed model never produces.
    pub(crate) fn render_ids(&self, ids: &[TokenId]) -> Option<String> {
        let mut word = String::with_capacity(ids.len());
        for &id in ids {
            word.push(self.id2char.get(&id).copied()?);
        }
        Some(word)
    }
}

fn render(ids: &[TokenId], id2char: &FxHashMap<TokenId, char>) -> Result<String, ModelError> {
    let mut word = String::with_capacity(ids.len());
    for &id in ids {
        match id2char.get(&id) {
            Some(&ch) => word.push(ch),
            None => {
                error!(id, "recipe entry has no corresponding character");
                return Err(ModelError::UnknownTokenRef(id));
            }
        }
    }
    Ok(word)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, ModelError> {
    let mut buf = [0u8; 4];
    read_record(reader, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Fill `buf` exactly, mapping a short read to [`ModelError::Truncated`].
fn read_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), ModelError> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => ModelError::Truncated,
        _ => ModelError::Io(err),
    })
}
