//! Fixed-width binary records of the model format.
//!
//! Every multi-byte integer in the format is big-endian. The format has
//! three record shapes beyond the two-word header:
//!
//! - **Alphabet entry**: `(codepoint: u32, token id: u32)`, 8 bytes
//! - **Merge rule**: `(left: u32, right: u32, result: u32)`, 12 bytes
//! - **Special-token block**: `(unk, pad, bos, eos)` as `i32`, 16 bytes,
//!   where `-1` encodes "this model was trained without the marker"
//!
//! The functions here are pure: they translate between records and byte
//! slices and never touch a reader. Stream-driven loading lives in
//! [`super::model`].

use thiserror::Error;

use super::model::TokenId;

/// Size in bytes of one serialized merge rule.
pub const RULE_RECORD_SIZE: usize = 12;

/// Size in bytes of the serialized special-token block.
pub const SPECIALS_RECORD_SIZE: usize = 16;

/// Errors produced by the record codecs.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("record needs {expected} bytes, got {got}")]
    MalformedRecord { expected: usize, got: usize },
}

/// A single merge rule: `left` immediately followed by `right` may be
/// replaced by `result`. A rule's priority is its index in the model's
/// rule list, not part of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub left: TokenId,
    pub right: TokenId,
    pub result: TokenId,
}

impl Rule {
    /// Serialize as three big-endian `u32` words.
    pub fn to_bytes(self) -> [u8; RULE_RECORD_SIZE] {
        let mut buf = [0u8; RULE_RECORD_SIZE];
        buf[..4].copy_from_slice(&self.left.to_be_bytes());
        buf[4..8].copy_from_slice(&self.right.to_be_bytes());
        buf[8..].copy_from_slice(&self.result.to_be_bytes());
        buf
    }

    /// Deserialize from the first [`RULE_RECORD_SIZE`] bytes of `buf`.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, CodecError> {
        if buf.len() < RULE_RECORD_SIZE {
            return Err(CodecError::MalformedRecord {
                expected: RULE_RECORD_SIZE,
                got: buf.len(),
            });
        }
        Ok(Rule {
            left: read_u32(buf, 0),
            right: read_u32(buf, 4),
            result: read_u32(buf, 8),
        })
    }
}

/// The four reserved token ids of a model: unknown, padding,
/// beginning-of-sentence, end-of-sentence. `-1` means the model was
/// trained without that marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub unk: i32,
    pub pad: i32,
    pub bos: i32,
    pub eos: i32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        SpecialTokens {
            unk: -1,
            pad: -1,
            bos: -1,
            eos: -1,
        }
    }
}

impl SpecialTokens {
    /// The unknown-token id, or `None` if the model has no `<UNK>`.
    pub fn unk_id(&self) -> Option<TokenId> {
        id_of(self.unk)
    }

    /// The padding id, or `None` if the model has no `<PAD>`.
    pub fn pad_id(&self) -> Option<TokenId> {
        id_of(self.pad)
    }

    /// The beginning-of-sentence id, or `None` if the model has no `<BOS>`.
    pub fn bos_id(&self) -> Option<TokenId> {
        id_of(self.bos)
    }

    /// The end-of-sentence id, or `None` if the model has no `<EOS>`.
    pub fn eos_id(&self) -> Option<TokenId> {
        id_of(self.eos)
    }

    /// Serialize as four big-endian `i32` words in unk, pad, bos, eos order.
    pub fn to_bytes(self) -> [u8; SPECIALS_RECORD_SIZE] {
        let mut buf = [0u8; SPECIALS_RECORD_SIZE];
        buf[..4].copy_from_slice(&self.unk.to_be_bytes());
        buf[4..8].copy_from_slice(&self.pad.to_be_bytes());
        buf[8..12].copy_from_slice(&self.bos.to_be_bytes());
        buf[12..].copy_from_slice(&self.eos.to_be_bytes());
        buf
    }

    /// Deserialize from the first [`SPECIALS_RECORD_SIZE`] bytes of `buf`.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, CodecError> {
        if buf.len() < SPECIALS_RECORD_SIZE {
            return Err(CodecError::MalformedRecord {
                expected: SPECIALS_RECORD_SIZE,
                got: buf.len(),
            });
        }
        Ok(SpecialTokens {
            unk: read_u32(buf, 0) as i32,
            pad: read_u32(buf, 4) as i32,
            bos: read_u32(buf, 8) as i32,
            eos: read_u32(buf, 12) as i32,
        })
    }
}

#[inline]
fn id_of(raw: i32) -> Option<TokenId> {
    if raw >= 0 {
        Some(raw as TokenId)
    } else {
        None
    }
}

#[inline]
fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_be_bytes(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_to_bytes() {
        let rule = Rule {
            left: 1,
            right: 2,
            result: 257,
        };
        assert_eq!(rule.to_bytes(), [0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 1, 1]);
    }

    #[test]
    fn test_rule_from_bytes() {
        let buf = [0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 1, 1];
        let rule = Rule::from_bytes(&buf).unwrap();
        assert_eq!(
            rule,
            Rule {
                left: 1,
                right: 2,
                result: 257
            }
        );

        assert!(Rule::from_bytes(&buf[1..]).is_err());
        assert!(Rule::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_specials_to_bytes() {
        let specials = SpecialTokens {
            unk: 1,
            pad: 259,
            bos: 2 * 256 * 256 + 37 * 256 + 2,
            eos: -256 * 256 * 256 * 127,
        };
        assert_eq!(
            specials.to_bytes(),
            [0, 0, 0, 1, 0, 0, 1, 3, 0, 2, 37, 2, 129, 0, 0, 0]
        );
    }

    #[test]
    fn test_specials_from_bytes() {
        let buf = [0, 0, 0, 1, 0, 0, 1, 3, 0, 2, 37, 2, 129, 0, 0, 0];
        let specials = SpecialTokens::from_bytes(&buf).unwrap();
        assert_eq!(
            specials,
            SpecialTokens {
                unk: 1,
                pad: 259,
                bos: 2 * 256 * 256 + 37 * 256 + 2,
                eos: -256 * 256 * 256 * 127,
            }
        );

        assert!(SpecialTokens::from_bytes(&buf[..15]).is_err());
        assert!(SpecialTokens::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_absent_specials() {
        let specials = SpecialTokens::default();
        assert_eq!(specials.unk_id(), None);
        assert_eq!(specials.bos_id(), None);

        let specials = SpecialTokens {
            unk: 1,
            pad: 0,
            bos: 2,
            eos: 3,
        };
        assert_eq!(specials.unk_id(), Some(1));
        assert_eq!(specials.pad_id(), Some(0));
        assert_eq!(specials.bos_id(), Some(2));
        assert_eq!(specials.eos_id(), Some(3));
    }

    #[test]
    fn test_specials_roundtrip_negative() {
        let specials = SpecialTokens {
            unk: 0,
            pad: -1,
            bos: 2,
            eos: -1,
        };
        let decoded = SpecialTokens::from_bytes(&specials.to_bytes()).unwrap();
        assert_eq!(decoded, specials);
        assert_eq!(decoded.pad_id(), None);
        assert_eq!(decoded.unk_id(), Some(0));
    }
}
