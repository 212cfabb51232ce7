use subtok::{Model, ModelError, Rule, SpecialTokens};

/// Binary dump of the toy model: alphabet a=8, b=7, c=6, d=5, _=4;
/// rules (4,8)->9, (4,6)->10, (4,5)->11, (4,7)->12, (8,7)->13, (8,8)->14;
/// specials unk=1, pad=0, bos=2, eos=3.
fn toy_model_bytes() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&5u32.to_be_bytes());
    data.extend_from_slice(&6u32.to_be_bytes());
    for (codepoint, id) in [(99u32, 6u32), (98, 7), (95, 4), (100, 5), (97, 8)] {
        data.extend_from_slice(&codepoint.to_be_bytes());
        data.extend_from_slice(&id.to_be_bytes());
    }
    for (left, right, result) in [
        (4u32, 8u32, 9u32),
        (4, 6, 10),
        (4, 5, 11),
        (4, 7, 12),
        (8, 7, 13),
        (8, 8, 14),
    ] {
        data.extend_from_slice(&Rule { left, right, result }.to_bytes());
    }
    data.extend_from_slice(
        &SpecialTokens {
            unk: 1,
            pad: 0,
            bos: 2,
            eos: 3,
        }
        .to_bytes(),
    );
    data
}

#[test]
fn test_load_valid_model() {
    let model = Model::from_bytes(&toy_model_bytes()).expect("model should load");
    assert_eq!(model.space_id(), 4);
    assert_eq!(model.rules().len(), 6);
    assert_eq!(model.special_tokens().bos_id(), Some(2));
    assert_eq!(model.char_to_id('a'), Some(8));
    assert_eq!(model.recipe(14), Some(&[8, 8][..]));
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let mut data = toy_model_bytes();
    data.extend_from_slice(&[0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 11]);
    data.extend_from_slice(&[0, 0, 0, 4, 0, 0, 0, 7, 0, 0, 0, 12]);
    let model = Model::from_bytes(&data).expect("trailing bytes should not matter");
    assert_eq!(model.rules().len(), 6);
    assert_eq!(model.vocab_size(), 15);
}

#[test]
fn test_truncated_special_block() {
    let data = toy_model_bytes();
    let result = Model::from_bytes(&data[..data.len() - 1]);
    assert!(matches!(result, Err(ModelError::Truncated)));
}

#[test]
fn test_truncated_final_rule() {
    let data = toy_model_bytes();
    // Drop the special block and the last byte of the final rule.
    let result = Model::from_bytes(&data[..data.len() - 17]);
    assert!(matches!(result, Err(ModelError::Truncated)));
}

#[test]
fn test_rule_with_unseen_operand() {
    let mut data = toy_model_bytes();
    // First rule starts after the header and five alphabet entries;
    // point its right operand at an id that was never defined.
    let offset = 8 + 5 * 8 + 4;
    data[offset..offset + 4].copy_from_slice(&20u32.to_be_bytes());
    let result = Model::from_bytes(&data);
    assert!(matches!(result, Err(ModelError::UnknownTokenRef(20))));
}

#[test]
fn test_header_claims_too_many_chars() {
    let mut data = toy_model_bytes();
    data[..4].copy_from_slice(&8u32.to_be_bytes());
    assert!(Model::from_bytes(&data).is_err());
}

#[test]
fn test_empty_input() {
    assert!(matches!(
        Model::from_bytes(&[]),
        Err(ModelError::Truncated)
    ));
}

#[test]
fn test_recipes_match_rule_operands() {
    let model = Model::from_bytes(&toy_model_bytes()).unwrap();
    for rule in model.rules() {
        let mut expansion = model.recipe(rule.left).unwrap().to_vec();
        expansion.extend_from_slice(model.recipe(rule.right).unwrap());
        assert_eq!(
            model.recipe(rule.result).unwrap(),
            expansion.as_slice(),
            "recipe of {} must concatenate its operands",
            rule.result
        );
    }
}

#[test]
fn test_recipe_expansion_matches_decoding() {
    let model = Model::from_bytes(&toy_model_bytes()).unwrap();
    for id in [4u32, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14] {
        let expected: String = model
            .recipe(id)
            .unwrap()
            .iter()
            .map(|&base| model.id_to_char(base).unwrap())
            .collect();
        assert_eq!(model.id_to_token(id, false).unwrap(), expected);
    }
}
