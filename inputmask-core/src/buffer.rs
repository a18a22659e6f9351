// File: inputmask-core/src/buffer.rs
//! The mutable edit state of one masked value.
//!
//! A `Buffer` is a sequence of cells aligned with the tokens of its maskset. Literal
//! positions hold their fixed character; placeholder positions are `Empty` or `Filled`.
//! The buffer owns a copy of the maskset layout so unbounded repeat groups can grow and
//! shrink, and it tracks which variant of every alternator group is active.
//!
//! Position indices are logical and direction-invariant; right-to-left only changes the
//! order in which cells are joined for display.
//!
//! License: MIT OR APACHE 2.0

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::maskset::{AltRef, Layout, MaskToken, Maskset, RepeatRef};

/// Reading direction used when joining cells for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// State of one buffer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Filled(char),
    /// A literal position; never user-editable.
    LiteralFixed(char),
}

impl Cell {
    pub fn is_filled(self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    fn for_token(token: &MaskToken) -> Self {
        match token.literal() {
            Some(ch) => Cell::LiteralFixed(ch),
            None => Cell::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    maskset: Arc<Maskset>,
    pub(crate) layout: Layout,
    pub(crate) cells: Vec<Cell>,
    pub(crate) active: BTreeMap<u32, usize>,
}

impl Buffer {
    /// Creates the template buffer of `maskset`: literals fixed, placeholders empty.
    pub fn new(maskset: Arc<Maskset>) -> Self {
        let layout = maskset.layout.clone();
        let cells = layout.tokens.iter().map(Cell::for_token).collect();
        Self {
            maskset,
            layout,
            cells,
            active: BTreeMap::new(),
        }
    }

    pub fn maskset(&self) -> &Arc<Maskset> {
        &self.maskset
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, pos: usize) -> Option<Cell> {
        self.cells.get(pos).copied()
    }

    pub fn token(&self, pos: usize) -> Option<&MaskToken> {
        self.layout.tokens.get(pos)
    }

    /// Number of positions, visible or not.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.maskset.settings.direction
    }

    /// Active variant of alternator `group`, if one has been chosen.
    pub fn active_variant(&self, group: u32) -> Option<usize> {
        self.active.get(&group).copied()
    }

    /// A position is visible when every alternator variant enclosing it is the active
    /// one (variant 0 when its group has none active).
    pub fn is_visible(&self, pos: usize) -> bool {
        self.layout
            .tokens
            .get(pos)
            .is_some_and(|token| self.variants_visible(&token.alternation))
    }

    fn variants_visible(&self, chain: &[AltRef]) -> bool {
        chain
            .iter()
            .all(|alt| self.active.get(&alt.group).copied().unwrap_or(0) == alt.variant)
    }

    pub fn visible_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|pos| self.is_visible(*pos))
    }

    /// Visible positions that are shown when rendering.
    ///
    /// Entirely empty optional segments that lie before the last filled cell were skipped
    /// over during input and are left out; empty optional segments after it are shown.
    pub fn rendered_positions(&self) -> Vec<usize> {
        let last_filled = self.last_filled();
        self.visible_positions()
            .filter(|pos| match last_filled {
                Some(last) => !self.in_skipped_segment(*pos, last),
                None => true,
            })
            .collect()
    }

    fn in_skipped_segment(&self, pos: usize, last_filled: usize) -> bool {
        self.layout.tokens[pos].optional_groups.iter().any(|id| {
            self.layout
                .optional_range(*id)
                .is_some_and(|range| range.end <= last_filled && !self.any_filled(range))
        })
    }

    /// Last visible `Filled` position.
    pub fn last_filled(&self) -> Option<usize> {
        (0..self.len())
            .rev()
            .find(|pos| self.cells[*pos].is_filled() && self.is_visible(*pos))
    }

    pub fn is_editable(&self, pos: usize) -> bool {
        self.layout
            .tokens
            .get(pos)
            .is_some_and(MaskToken::is_placeholder)
            && self.is_visible(pos)
    }

    /// First visible placeholder position at or after `from`.
    pub fn seek_editable(&self, from: usize) -> Option<usize> {
        (from..self.len()).find(|pos| self.is_editable(*pos))
    }

    /// Caret position after consuming up to `cursor`.
    pub fn caret_from(&self, cursor: usize) -> usize {
        self.seek_editable(cursor).unwrap_or_else(|| cursor.min(self.len()))
    }

    pub(crate) fn any_filled(&self, range: Range<usize>) -> bool {
        self.cells[range].iter().any(|cell| cell.is_filled())
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_filled()).count()
    }

    /// Joins the rendered cells in the maskset's direction.
    pub fn render(&self) -> String {
        self.to_string_with(self.direction())
    }

    /// Joins the rendered cells, empty cells showing their placeholder glyph.
    pub fn to_string_with(&self, direction: Direction) -> String {
        let settings = &self.maskset.settings;
        let glyphs = self
            .rendered_positions()
            .into_iter()
            .enumerate()
            .map(|(visible, pos)| match self.cells[pos] {
                Cell::Filled(ch) | Cell::LiteralFixed(ch) => ch,
                Cell::Empty => self.layout.tokens[pos]
                    .definition()
                    .and_then(|definition| definition.placeholder)
                    .unwrap_or_else(|| settings.placeholder_at(visible)),
            });
        match direction {
            Direction::LeftToRight => glyphs.collect(),
            Direction::RightToLeft => glyphs.collect::<Vec<_>>().into_iter().rev().collect(),
        }
    }

    /// True when `pos` starts a word: it is the first visible position or follows a space.
    pub(crate) fn word_start(&self, pos: usize) -> bool {
        match (0..pos).rev().find(|p| self.is_visible(*p)) {
            None => true,
            Some(prev) => matches!(self.cells[prev], Cell::Filled(' ') | Cell::LiteralFixed(' ')),
        }
    }

    /// Marks every alternator variant enclosing `pos` as active.
    pub(crate) fn activate(&mut self, pos: usize) {
        for alt in &self.layout.tokens[pos].alternation {
            if self.active.insert(alt.group, alt.variant) != Some(alt.variant) {
                debug!("Alternator group {} now uses variant {}.", alt.group, alt.variant);
            }
        }
    }

    /// Empties the filled cells in `range`, then releases alternator groups and grown
    /// repeat copies that no longer hold input.
    pub fn clear(&mut self, range: Range<usize>) {
        let end = range.end.min(self.len());
        for pos in range.start.min(end)..end {
            if self.cells[pos].is_filled() {
                self.cells[pos] = Cell::Empty;
            }
        }
        self.release_alternators();
        self.shrink_repeats();
    }

    /// Returns the buffer to the template state.
    pub fn reset(&mut self) {
        *self = Buffer::new(Arc::clone(&self.maskset));
    }

    /// Forgets the active variant of every group without filled cells.
    pub(crate) fn release_alternators(&mut self) {
        let released: Vec<u32> = self
            .active
            .keys()
            .copied()
            .filter(|group| match self.layout.group_range(*group) {
                Some(range) => !self.any_filled(range),
                None => true,
            })
            .collect();
        for group in released {
            debug!("Releasing alternator group {}.", group);
            self.active.remove(&group);
        }
    }

    /// Removes trailing runtime-grown repeat copies that hold no input.
    pub(crate) fn shrink_repeats(&mut self) {
        let groups: Vec<(u32, usize)> = self
            .layout
            .repeats
            .iter()
            .map(|(group, spec)| (*group, spec.laid))
            .collect();
        for (group, laid) in groups {
            while let Some(last) = self.layout.last_copy(group) {
                if last < laid {
                    break;
                }
                let Some(range) = self.layout.copy_range(group, last) else {
                    break;
                };
                if self.any_filled(range.clone()) {
                    break;
                }
                self.remove_positions(range);
                debug!("Dropped empty copy {} of repeat group {}.", last, group);
            }
        }
    }

    /// Removes positions from layout and cells, dropping alternator groups that no
    /// longer have tokens.
    pub(crate) fn remove_positions(&mut self, range: Range<usize>) {
        self.layout.tokens.drain(range.clone());
        self.cells.drain(range);
        let live: Vec<u32> = self
            .layout
            .alternators
            .keys()
            .copied()
            .filter(|group| self.layout.group_range(*group).is_some())
            .collect();
        self.layout.alternators.retain(|group, _| live.contains(group));
        self.active.retain(|group, _| live.contains(group));
    }

    /// Appends a new copy of repeat `group` after its last copy and returns the start of
    /// the new copy.
    pub(crate) fn grow(&mut self, group: u32) -> Option<usize> {
        let spec = *self.layout.repeats.get(&group)?;
        let last = self.layout.last_copy(group)?;
        let range = self.layout.copy_range(group, last)?;
        let template: Vec<MaskToken> = self.layout.tokens[range.clone()].to_vec();

        let mut remap: HashMap<u32, u32> = HashMap::new();
        let copy_id = if last < spec.min {
            Some(self.layout.allocate_id())
        } else {
            None
        };

        let mut copy = Vec::with_capacity(template.len());
        for token in template {
            let mut optional_groups = token.optional_groups[..spec.optional_depth].to_vec();
            if let Some(id) = copy_id {
                optional_groups.push(id);
            }
            for id in &token.optional_groups[spec.optional_depth..] {
                let fresh = *remap
                    .entry(*id)
                    .or_insert_with(|| self.layout.allocate_id());
                optional_groups.push(fresh);
            }

            let mut alternation = token.alternation[..spec.alternation_depth].to_vec();
            for alt in &token.alternation[spec.alternation_depth..] {
                let fresh = *remap
                    .entry(alt.group)
                    .or_insert_with(|| self.layout.allocate_id());
                let variants = self.layout.alternators.get(&alt.group).copied().unwrap_or(1);
                self.layout.alternators.insert(fresh, variants);
                alternation.push(AltRef {
                    group: fresh,
                    variant: alt.variant,
                });
            }

            copy.push(MaskToken {
                kind: token.kind,
                optional_groups,
                alternation,
                repeat: Some(RepeatRef {
                    group,
                    copy: last + 1,
                }),
            });
        }

        let start = range.end;
        let cells: Vec<Cell> = copy.iter().map(Cell::for_token).collect();
        self.layout.tokens.splice(start..start, copy);
        self.cells.splice(start..start, cells);
        debug!("Grew repeat group {} to {} copies.", group, last + 2);
        Some(start)
    }
}

/// Creates the template buffer of `maskset`.
pub fn template(maskset: Arc<Maskset>) -> Buffer {
    Buffer::new(maskset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::compile;
    use crate::config::{MaskConfig, MaskOptions};

    fn buffer(options: MaskOptions) -> Buffer {
        let table = MaskConfig::load_default().unwrap().definition_table().unwrap();
        Buffer::new(Arc::new(compile(&options, &table).unwrap()))
    }

    #[test]
    fn test_template_renders_placeholders_and_literals() {
        let buf = buffer(MaskOptions::with_mask("99/99"));
        assert_eq!(buf.render(), "__/__");
        assert_eq!(buf.cell(2), Some(Cell::LiteralFixed('/')));
        assert_eq!(buf.seek_editable(2), Some(3));
    }

    #[test]
    fn test_placeholder_cycles_by_visible_index() {
        let mut options = MaskOptions::with_mask("99/99");
        options.placeholder = "dm".to_string();
        assert_eq!(buffer(options).render(), "dm/dm");
    }

    #[test]
    fn test_right_to_left_reverses_rendering_only() {
        let mut options = MaskOptions::with_mask("9-a");
        options.right_to_left = true;
        options.placeholder = "x".to_string();
        let mut buf = buffer(options);
        buf.cells[0] = Cell::Filled('1');
        assert_eq!(buf.render(), "x-1");
        assert_eq!(buf.to_string_with(Direction::LeftToRight), "1-x");
        assert_eq!(buf.cell(0), Some(Cell::Filled('1')));
    }

    #[test]
    fn test_only_first_variant_visible_by_default() {
        let buf = buffer(MaskOptions::with_mask("(aa|999)"));
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.visible_positions().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(buf.render(), "__");
    }

    #[test]
    fn test_clear_releases_alternator() {
        let mut buf = buffer(MaskOptions::with_mask("(aa|999)"));
        buf.cells[2] = Cell::Filled('1');
        buf.activate(2);
        assert_eq!(buf.render(), "1__");
        buf.clear(0..buf.len());
        assert_eq!(buf.active_variant(0), None);
        assert_eq!(buf.render(), "__");
    }

    #[test]
    fn test_grow_and_shrink_unbounded_repeat() {
        let mut buf = buffer(MaskOptions::with_mask("(9-){+}"));
        assert_eq!(buf.len(), 2);
        let start = buf.grow(0).unwrap();
        assert_eq!(start, 2);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.token(2).unwrap().repeat.map(|r| r.copy), Some(1));
        assert!(buf.token(2).unwrap().optional());
        buf.shrink_repeats();
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_reset_returns_to_template() {
        let mut buf = buffer(MaskOptions::with_mask("99"));
        buf.cells[0] = Cell::Filled('4');
        buf.reset();
        assert_eq!(buf, buffer(MaskOptions::with_mask("99")));
    }
}
