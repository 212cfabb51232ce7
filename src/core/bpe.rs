//! Event-driven per-word merge.
//!
//! The merge state is a **flat-array doubly linked list**: each slot is
//! `(id, prev, next)` stored at a stable index, so merging is O(1) and
//! slot indices can be carried as heap payloads. Candidate merges live in
//! a min-heap keyed `(rule priority, left slot index)`; the secondary key
//! makes equal-priority merges proceed left to right.
//!
//! Merging invalidates slots without removing their queued events. A
//! popped event is discarded as stale when its left slot no longer has a
//! right neighbor or when either slot's id no longer matches the rule's
//! operands. Each merge re-enqueues at most its two new neighbor pairs,
//! so a word of n characters costs O(n log n).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::model::{Model, TokenId};

const NONE: u32 = u32::MAX;

/// One position in the linked slot list.
#[derive(Clone, Copy)]
struct Slot {
    id: TokenId,
    prev: u32,
    next: u32,
    /// Byte range of this slot's source text within the word; empty for
    /// the word-start marker. Merges fuse the ranges of their operands.
    start: usize,
    end: usize,
}

/// A surviving token after all merges: its id plus the byte range of the
/// word it covers. The range is what lets `<UNK>` tokens render their
/// original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Piece {
    pub id: TokenId,
    pub start: usize,
    pub end: usize,
}

/// Tokenize one whitespace-free word, appending the surviving tokens to
/// `out`.
///
/// The word is prefixed with the model's word-start marker, and every
/// maximal run of characters outside the alphabet collapses into a single
/// `<UNK>` slot (or is dropped when the model declares no `<UNK>`).
pub(crate) fn encode_word(model: &Model, word: &str, out: &mut Vec<Piece>) {
    let mut slots: Vec<Slot> = Vec::with_capacity(word.chars().count() + 1);
    slots.push(Slot {
        id: model.space_id(),
        prev: NONE,
        next: NONE,
        start: 0,
        end: 0,
    });

    let unk_id = model.special_tokens().unk_id();
    let mut unknown_from: Option<usize> = None;
    for (pos, ch) in word.char_indices() {
        match model.char_to_id(ch) {
            Some(id) => {
                if let Some(from) = unknown_from.take() {
                    push_unknown(&mut slots, unk_id, from, pos);
                }
                push_slot(&mut slots, id, pos, pos + ch.len_utf8());
            }
            None => {
                if unknown_from.is_none() {
                    unknown_from = Some(pos);
                }
            }
        }
    }
    if let Some(from) = unknown_from {
        push_unknown(&mut slots, unk_id, from, word.len());
    }

    // Seed candidates for every adjacent pair of the initial list.
    let mut pending: BinaryHeap<Reverse<(u32, u32)>> = BinaryHeap::new();
    for left in 0..slots.len().saturating_sub(1) {
        push_candidate(model, &slots, &mut pending, left as u32);
    }

    while let Some(Reverse((priority, pos))) = pending.pop() {
        let rule = model.rules()[priority as usize];
        let left = slots[pos as usize];
        if left.next == NONE {
            continue;
        }
        let right_pos = left.next;
        let right = slots[right_pos as usize];
        // Stale event: the slots were merged away since it was queued.
        if left.id != rule.left || right.id != rule.right {
            continue;
        }

        slots[pos as usize].id = rule.result;
        slots[pos as usize].next = right.next;
        slots[pos as usize].end = right.end;
        slots[right_pos as usize] = Slot {
            id: 0,
            prev: NONE,
            next: NONE,
            start: 0,
            end: 0,
        };
        if right.next != NONE {
            slots[right.next as usize].prev = pos;
            push_candidate(model, &slots, &mut pending, pos);
        }
        if left.prev != NONE {
            push_candidate(model, &slots, &mut pending, left.prev);
        }
    }

    // Walk the survivors from the head slot.
    let mut pos = 0u32;
    while pos != NONE {
        let slot = slots[pos as usize];
        out.push(Piece {
            id: slot.id,
            start: slot.start,
            end: slot.end,
        });
        pos = slot.next;
    }
}

fn push_slot(slots: &mut Vec<Slot>, id: TokenId, start: usize, end: usize) {
    let index = slots.len() as u32;
    slots[index as usize - 1].next = index;
    slots.push(Slot {
        id,
        prev: index - 1,
        next: NONE,
        start,
        end,
    });
}

fn push_unknown(slots: &mut Vec<Slot>, unk_id: Option<TokenId>, start: usize, end: usize) {
    // A model without <UNK> drops the run entirely.
    if let Some(id) = unk_id {
        push_slot(slots, id, start, end);
    }
}

/// Queue a merge event for `left` and its right neighbor if a rule
/// covers the pair.
fn push_candidate(
    model: &Model,
    slots: &[Slot],
    pending: &mut BinaryHeap<Reverse<(u32, u32)>>,
    left: u32,
) {
    let slot = &slots[left as usize];
    if slot.next == NONE {
        return;
    }
    let right = &slots[slot.next as usize];
    if let Some(priority) = model.rule_index(slot.id, right.id) {
        pending.push(Reverse((priority as u32, left)));
    }
}
