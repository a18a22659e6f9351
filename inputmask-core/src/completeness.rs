// File: inputmask-core/src/completeness.rs
//! Completeness checks and value extraction.
//!
//! License: MIT OR APACHE 2.0

use log::debug;

use crate::buffer::{Buffer, Cell};
use crate::config::MaskOptions;

impl Buffer {
    /// True when every visible required placeholder is filled.
    ///
    /// Only the active variant of an alternator group is visible, so a group with no
    /// input is acceptable only when its first variant is entirely optional.
    pub fn is_complete(&self) -> bool {
        self.visible_positions().all(|pos| {
            let token = &self.layout.tokens[pos];
            token.is_literal() || token.optional() || self.cells[pos].is_filled()
        })
    }

    /// Returns a copy with trailing unfilled optional positions removed, so an untouched
    /// optional tail does not show up as placeholder noise.
    pub fn clear_optional_tail(&self) -> Buffer {
        let mut trimmed = self.clone();
        trimmed.shrink_repeats();
        let mut end = trimmed.len();
        while end > 0 {
            let pos = end - 1;
            let token = &trimmed.layout.tokens[pos];
            let removable =
                !trimmed.is_visible(pos) || (token.optional() && !trimmed.cells[pos].is_filled());
            if !removable {
                break;
            }
            end = pos;
        }
        if end < trimmed.len() {
            debug!("Trimmed optional tail {}..{}.", end, trimmed.len());
            let len = trimmed.len();
            trimmed.remove_positions(end..len);
        }
        trimmed
    }

    /// The value without placeholders: visible cells up to the last filled one, empty
    /// cells omitted and literals kept unless `remove_literals` is set. A literal run
    /// after the last filled cell is kept when no placeholder follows it.
    pub fn unmask(&self, options: &MaskOptions) -> String {
        let Some(last) = self.last_filled() else {
            return String::new();
        };
        let rendered = self.rendered_positions();
        let literal_tail = rendered
            .iter()
            .filter(|pos| **pos > last)
            .all(|pos| self.layout.tokens[*pos].is_literal());
        rendered
            .into_iter()
            .take_while(|pos| literal_tail || *pos <= last)
            .filter_map(|pos| match self.cells[pos] {
                Cell::Filled(ch) => Some(ch),
                Cell::LiteralFixed(ch) if !options.remove_literals => Some(ch),
                _ => None,
            })
            .collect()
    }
}
