//! Shared toy model used by the unit tests.
//!
//! Alphabet: a=8, b=7, c=6, d=5, `_`=4 (the word-start marker).
//! Rules, in priority order: (4,8)->9 `_a`, (4,6)->10 `_c`, (4,5)->11
//! `_d`, (4,7)->12 `_b`, (8,7)->13 `ab`, (8,8)->14 `aa`.
//! Specials: unk=1, pad=0, bos=2, eos=3.

use super::codec::{Rule, SpecialTokens};
use super::model::Model;

/// Serialize the toy model into its binary dump.
pub(crate) fn toy_model_bytes() -> Vec<u8> {
    let alphabet: [(u32, u32); 5] = [(99, 6), (98, 7), (95, 4), (100, 5), (97, 8)];
    let rules = [
        Rule { left: 4, right: 8, result: 9 },
        Rule { left: 4, right: 6, result: 10 },
        Rule { left: 4, right: 5, result: 11 },
        Rule { left: 4, right: 7, result: 12 },
        Rule { left: 8, right: 7, result: 13 },
        Rule { left: 8, right: 8, result: 14 },
    ];
    let specials = SpecialTokens {
        unk: 1,
        pad: 0,
        bos: 2,
        eos: 3,
    };

    let mut data = Vec::new();
    data.extend_from_slice(&(alphabet.len() as u32).to_be_bytes());
    data.extend_from_slice(&(rules.len() as u32).to_be_bytes());
    for (codepoint, id) in alphabet {
        data.extend_from_slice(&codepoint.to_be_bytes());
        data.extend_from_slice(&id.to_be_bytes());
    }
    for rule in rules {
        data.extend_from_slice(&rule.to_bytes());
    }
    data.extend_from_slice(&specials.to_bytes());
    data
}

/// Load the toy model.
pub(crate) fn toy_model() -> Model {
    Model::from_bytes(&toy_model_bytes()).unwrap()
}
