// File: inputmask-core/src/validation.rs
//! Incremental input validation.
//!
//! `Buffer::check_val` is the single authority on whether an edit is legal. It places a
//! run of input characters starting at a caret position, one at a time, and reports
//! whether every character found a home. Already placed characters stay in place when a
//! later one is rejected.
//!
//! For each character the engine tries, in order: a matching literal in the literal run
//! at the cursor, growth of an unbounded repeat whose last copy is full when a literal
//! (or nothing) follows it, the next editable position, a switch to a sibling alternator
//! variant, entering a variant of an untouched alternator whose default variant has no
//! editable position, absorption of a typed separator that was already auto-inserted,
//! growth of a repeat that shifts the cells typed after it, and finally skipping an empty
//! optional segment (or, when not strict, the failing position) to retry further on.
//!
//! License: MIT OR APACHE 2.0

use std::ops::Range;

use log::debug;
use serde::Serialize;

use crate::buffer::{Buffer, Cell};
use crate::maskset::AltRef;

/// Result of one `check_val` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    /// True when every input character was placed or absorbed.
    pub success: bool,
    /// Index into the input of the first rejected character.
    pub failure_pos: Option<usize>,
    /// Next editable position after the last consumed character.
    pub caret: usize,
}

impl Buffer {
    /// Places `input` into the buffer starting at `start`.
    ///
    /// With `strict`, a character rejected at a required position fails the call; without
    /// it the position is skipped and the character retried at the next one. Positions
    /// filled before a failure stay filled.
    pub fn check_val(&mut self, start: usize, strict: bool, input: &[char]) -> CheckOutcome {
        let (cursor, failure_pos) = self.place_run(start.min(self.len()), strict, input);
        CheckOutcome {
            success: failure_pos.is_none(),
            failure_pos,
            caret: self.caret_from(cursor),
        }
    }

    /// Places `input` from `start`; returns the cursor after the last placed character
    /// and the input index of the first rejected one.
    fn place_run(&mut self, start: usize, strict: bool, input: &[char]) -> (usize, Option<usize>) {
        let mut cursor = start;
        for (index, ch) in input.iter().copied().enumerate() {
            match self.place_char(cursor, ch, strict) {
                Some(next) => cursor = next,
                None => {
                    debug!("Rejected '{}' (input index {}) at position {}.", ch, index, cursor);
                    return (cursor, Some(index));
                }
            }
        }
        (cursor, None)
    }

    /// Places one character; returns the cursor after it, or `None` when rejected.
    fn place_char(&mut self, cursor: usize, ch: char, strict: bool) -> Option<usize> {
        let mut at = cursor;
        loop {
            if let Some(literal) = self.literal_run_match(at, ch) {
                return Some(literal + 1);
            }

            let target = self.seek_editable(at);

            if let Some(pos) = self.try_grow(at, target, ch) {
                return Some(pos + 1);
            }
            if let Some(pos) = target {
                if self.try_place(pos, ch) {
                    return Some(pos + 1);
                }
                if let Some(next) = self.try_switch(pos, ch) {
                    return Some(next);
                }
            }
            if let Some(next) = self.try_dormant_variants(at, target, ch) {
                return Some(next);
            }
            if at == cursor && self.follows_literal(cursor, ch) {
                debug!("Absorbed separator '{}' at position {}.", ch, cursor);
                return Some(cursor);
            }
            if let Some(next) = self.try_grow_shifting(at, ch, strict) {
                return Some(next);
            }

            let pos = target?;
            if let Some(end) = self.empty_optional_segment_end(pos) {
                debug!("Skipping empty optional segment {}..{} for '{}'.", pos, end, ch);
                at = end;
            } else if !strict {
                at = pos + 1;
            } else {
                return None;
            }
        }
    }

    /// Finds `ch` among the visible literals starting at `from`, up to the next visible
    /// placeholder.
    fn literal_run_match(&self, from: usize, ch: char) -> Option<usize> {
        for pos in from..self.len() {
            if !self.is_visible(pos) {
                continue;
            }
            match self.layout.tokens[pos].literal() {
                Some(literal) if literal == ch => return Some(pos),
                Some(_) => continue,
                None => return None,
            }
        }
        None
    }

    /// True when the visible position right before `cursor` is the literal `ch`.
    fn follows_literal(&self, cursor: usize, ch: char) -> bool {
        (0..cursor)
            .rev()
            .find(|pos| self.is_visible(*pos))
            .and_then(|pos| self.layout.tokens[pos].literal())
            == Some(ch)
    }

    /// End of the outermost entirely empty optional segment containing `pos`.
    fn empty_optional_segment_end(&self, pos: usize) -> Option<usize> {
        self.layout.tokens[pos]
            .optional_groups
            .iter()
            .filter_map(|id| self.layout.optional_range(*id))
            .find(|range| !self.any_filled(range.clone()))
            .map(|range| range.end)
    }

    /// Tests `ch` at the editable position `pos` and stores it on success.
    pub(crate) fn try_place(&mut self, pos: usize, ch: char) -> bool {
        let Some(token) = self.layout.tokens.get(pos) else {
            return false;
        };
        let Some(definition) = token.definition().cloned() else {
            return false;
        };
        let chunk = token.chunk();
        let chunk_start = pos - chunk;

        let mut text = String::with_capacity(definition.cardinality);
        for cell in &self.cells[chunk_start..pos] {
            match cell {
                Cell::Filled(prev) => text.push(*prev),
                _ => return false,
            }
        }
        text.push(ch);
        if !definition.test(&text, chunk) {
            return false;
        }

        let stored = match definition.casing.or(self.maskset().settings.casing) {
            Some(casing) => casing.apply(ch, self.word_start(pos)),
            None => ch,
        };
        self.cells[pos] = Cell::Filled(stored);
        self.activate(pos);
        self.revalidate_chunk(chunk_start, pos, definition.cardinality);
        true
    }

    /// Re-tests filled cells after `pos` in the same chunk; the first failing cell and
    /// everything after it in the chunk is cleared.
    fn revalidate_chunk(&mut self, chunk_start: usize, pos: usize, cardinality: usize) {
        let chunk_end = (chunk_start + cardinality).min(self.len());
        let Some(definition) = self.layout.tokens[pos].definition().cloned() else {
            return;
        };
        let mut text: String = self.cells[chunk_start..=pos]
            .iter()
            .filter_map(|cell| match cell {
                Cell::Filled(ch) => Some(*ch),
                _ => None,
            })
            .collect();
        for next in pos + 1..chunk_end {
            let Cell::Filled(ch) = self.cells[next] else {
                return;
            };
            text.push(ch);
            if !definition.test(&text, next - chunk_start) {
                debug!("Clearing {}..{} after chunk revalidation.", next, chunk_end);
                for stale in next..chunk_end {
                    self.cells[stale] = Cell::Empty;
                }
                return;
            }
        }
    }

    fn copy_is_full(&self, range: &Range<usize>) -> bool {
        range
            .clone()
            .filter(|pos| self.is_editable(*pos))
            .all(|pos| self.cells[pos].is_filled())
    }

    fn has_room_for(&self, group: u32, copy_len: usize) -> bool {
        let visible = self.visible_positions().count();
        if visible + copy_len > self.maskset().settings.max_length {
            debug!("Repeat group {} is at the maximum length.", group);
            return false;
        }
        true
    }

    /// Grows an unbounded repeat when the cursor sits at the end of its full last copy,
    /// the next editable position is absent or behind a literal, and the new copy
    /// accepts `ch`.
    fn try_grow(&mut self, at: usize, target: Option<usize>, ch: char) -> Option<usize> {
        let groups: Vec<u32> = self.layout.repeats.keys().copied().collect();
        for group in groups {
            let Some(last) = self.layout.last_copy(group) else {
                continue;
            };
            let Some(range) = self.layout.copy_range(group, last) else {
                continue;
            };
            if at < range.start || at > range.end || !self.is_visible(range.start) {
                continue;
            }
            if let Some(t) = target {
                let separated = (range.end..t)
                    .any(|pos| self.is_visible(pos) && self.layout.tokens[pos].is_literal());
                if t < range.end || !separated {
                    continue;
                }
            }
            if !self.copy_is_full(&range) || !self.has_room_for(group, range.len()) {
                continue;
            }

            let mut trial = self.clone();
            let Some(start) = trial.grow(group) else {
                continue;
            };
            let Some(pos) = trial.seek_editable(start) else {
                continue;
            };
            if pos < start + range.len() && trial.try_place(pos, ch) {
                *self = trial;
                return Some(pos);
            }
        }
        None
    }

    /// Grows an unbounded repeat whose full last copy is followed, with no literal in
    /// between, by filled cells up to `at`. Those cells move into the new copy and the
    /// positions after it, then `ch` is placed after them.
    fn try_grow_shifting(&mut self, at: usize, ch: char, strict: bool) -> Option<usize> {
        let groups: Vec<u32> = self.layout.repeats.keys().copied().collect();
        for group in groups {
            let Some(last) = self.layout.last_copy(group) else {
                continue;
            };
            let Some(range) = self.layout.copy_range(group, last) else {
                continue;
            };
            if at < range.end || !self.is_visible(range.start) {
                continue;
            }
            let tail: Vec<usize> = (range.end..at).filter(|pos| self.is_visible(*pos)).collect();
            let mut moved = Vec::with_capacity(tail.len() + 1);
            for pos in &tail {
                match self.cells[*pos] {
                    Cell::Filled(c) if self.is_editable(*pos) => moved.push(c),
                    _ => break,
                }
            }
            if moved.len() != tail.len()
                || !self.copy_is_full(&range)
                || !self.has_room_for(group, range.len())
            {
                continue;
            }
            moved.push(ch);

            let mut trial = self.clone();
            for pos in &tail {
                trial.cells[*pos] = Cell::Empty;
            }
            let Some(start) = trial.grow(group) else {
                continue;
            };
            if let (cursor, None) = trial.place_run(start, strict, &moved) {
                debug!(
                    "Grew repeat group {} and shifted {} cells for '{}'.",
                    group,
                    tail.len(),
                    ch
                );
                *self = trial;
                return Some(cursor);
            }
        }
        None
    }

    /// Activates a variant of an alternator group that has no active variant and lies
    /// between `at` and the next editable position, when that variant accepts `ch`.
    /// Reached when the default variant has no editable position, as in `(|99)`.
    fn try_dormant_variants(&mut self, at: usize, target: Option<usize>, ch: char) -> Option<usize> {
        let limit = target.unwrap_or(self.len());
        let mut tried: Vec<AltRef> = Vec::new();
        for pos in at..limit {
            let token = &self.layout.tokens[pos];
            if !token.is_placeholder() || self.is_visible(pos) {
                continue;
            }
            let compatible = token
                .alternation
                .iter()
                .all(|alt| self.active.get(&alt.group).map_or(true, |v| *v == alt.variant));
            let Some(innermost) = token.alternation.last().copied() else {
                continue;
            };
            if !compatible || tried.contains(&innermost) {
                continue;
            }
            tried.push(innermost);

            let chain = token.alternation.clone();
            let mut trial = self.clone();
            for alt in &chain {
                trial.active.insert(alt.group, alt.variant);
            }
            let Some(next) = trial.place_char(at, ch, true) else {
                continue;
            };
            let entered = trial
                .layout
                .variant_range(innermost.group, innermost.variant)
                .is_some_and(|range| trial.any_filled(range));
            if entered {
                debug!(
                    "Entered variant {} of alternator group {} for '{}'.",
                    innermost.variant, innermost.group, ch
                );
                *self = trial;
                return Some(next);
            }
        }
        None
    }

    /// Tries the sibling variants of the alternator groups enclosing `pos`, innermost
    /// group first. Returns the cursor after the placed character.
    fn try_switch(&mut self, pos: usize, ch: char) -> Option<usize> {
        let chain = self.layout.tokens[pos].alternation.clone();
        for alt in chain.iter().rev() {
            let variants = self.layout.alternators.get(&alt.group).copied().unwrap_or(0);
            for sibling in (0..variants).filter(|v| *v != alt.variant) {
                let mut trial = self.clone();
                if let Some(next) = trial.switch_variant(alt.group, alt.variant, sibling, pos, ch) {
                    debug!(
                        "Switched alternator group {} from variant {} to {} for '{}'.",
                        alt.group, alt.variant, sibling, ch
                    );
                    *self = trial;
                    return Some(next);
                }
            }
        }
        None
    }

    /// Moves the filled prefix of variant `from` (up to `pos`) into variant `to`, then
    /// places `ch` at the matching offset. Fails without side effects on the caller's
    /// copy when the prefix does not validate in `to`.
    fn switch_variant(&mut self, group: u32, from: usize, to: usize, pos: usize, ch: char) -> Option<usize> {
        let source = self.layout.variant_range(group, from)?;
        let destination = self.layout.variant_range(group, to)?;
        let offset = pos - source.start;
        if offset >= destination.len() {
            return None;
        }

        let prefix: Vec<Cell> = self.cells[source.start..pos].to_vec();
        let group_range = self.layout.group_range(group)?;
        let outer: Vec<_> = self.layout.tokens[pos]
            .alternation
            .iter()
            .take_while(|alt| alt.group != group)
            .copied()
            .collect();

        for cell in &mut self.cells[group_range] {
            if cell.is_filled() {
                *cell = Cell::Empty;
            }
        }
        self.release_alternators();
        for alt in &outer {
            self.active.insert(alt.group, alt.variant);
        }
        self.active.insert(group, to);

        for (i, cell) in prefix.into_iter().enumerate() {
            let target = destination.start + i;
            let token = &self.layout.tokens[target];
            match (cell, token.literal()) {
                (Cell::LiteralFixed(a), Some(b)) if a == b => {}
                (Cell::LiteralFixed(_), _) | (_, Some(_)) => return None,
                (Cell::Empty, None) => {}
                (Cell::Filled(c), None) => {
                    if !self.try_place(target, c) {
                        return None;
                    }
                }
            }
        }

        let target = destination.start + offset;
        match self.layout.tokens[target].literal() {
            Some(literal) if literal == ch => Some(target + 1),
            Some(_) => None,
            None if self.try_place(target, ch) => Some(target + 1),
            None => None,
        }
    }
}

/// Copying form of `Buffer::check_val`: validates `input` against a clone of `buffer`
/// and returns the new buffer with the outcome.
pub fn check_val(buffer: &Buffer, start: usize, strict: bool, input: &[char]) -> (Buffer, CheckOutcome) {
    let mut next = buffer.clone();
    let outcome = next.check_val(start, strict, input);
    (next, outcome)
}
