// File: inputmask-core/src/maskset.rs
//! The compiled, immutable form of a mask.
//!
//! A `Maskset` is a flat `Layout` of tokens, one per buffer position, plus the tables
//! describing the alternator groups and unbounded repeat groups that span those tokens.
//! Every token records the optional segments, alternation variants and repeat copy it
//! belongs to, outermost first, so the buffer can answer visibility and grouping
//! questions without walking a tree.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::MetadataEntry;
use crate::definitions::{Casing, Definition, DefinitionTable};
use crate::buffer::Direction;

/// What occupies one buffer position.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A fixed character.
    Literal(char),
    /// An editable position. `chunk` is the index of this position within a
    /// multi-character definition occurrence (always 0 for cardinality 1).
    Placeholder {
        definition: Arc<Definition>,
        chunk: usize,
    },
}

/// Membership of a token in one variant of an alternator group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AltRef {
    pub group: u32,
    pub variant: usize,
}

/// Membership of a token in one copy of an unbounded repeat group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepeatRef {
    pub group: u32,
    pub copy: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaskToken {
    pub kind: TokenKind,
    /// Enclosing optional segments, outermost first.
    pub optional_groups: Vec<u32>,
    /// Enclosing alternation variants, outermost first.
    pub alternation: Vec<AltRef>,
    pub repeat: Option<RepeatRef>,
}

impl MaskToken {
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TokenKind::Literal(_))
    }

    pub fn is_placeholder(&self) -> bool {
        !self.is_literal()
    }

    pub fn literal(&self) -> Option<char> {
        match self.kind {
            TokenKind::Literal(ch) => Some(ch),
            TokenKind::Placeholder { .. } => None,
        }
    }

    pub fn definition(&self) -> Option<&Arc<Definition>> {
        match &self.kind {
            TokenKind::Placeholder { definition, .. } => Some(definition),
            TokenKind::Literal(_) => None,
        }
    }

    /// Position of this token inside its definition chunk.
    pub fn chunk(&self) -> usize {
        match self.kind {
            TokenKind::Placeholder { chunk, .. } => chunk,
            TokenKind::Literal(_) => 0,
        }
    }

    pub fn optional(&self) -> bool {
        !self.optional_groups.is_empty()
    }

    /// The variant of `group` this token belongs to, if it is inside that group.
    pub fn variant_of(&self, group: u32) -> Option<usize> {
        self.alternation
            .iter()
            .find(|alt| alt.group == group)
            .map(|alt| alt.variant)
    }
}

/// Compile-time description of an unbounded repeat group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatSpec {
    /// Required copies.
    pub min: usize,
    /// Copies laid out by the compiler; copies beyond this were grown at runtime.
    pub laid: usize,
    /// Number of `optional_groups` entries that belong to constructs enclosing the repeat.
    pub optional_depth: usize,
    /// Number of `alternation` entries that belong to constructs enclosing the repeat.
    pub alternation_depth: usize,
}

/// Token sequence plus group tables. The buffer owns a mutable copy of this so that
/// unbounded repeat groups can grow and shrink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub tokens: Vec<MaskToken>,
    /// Alternator group id to number of variants.
    pub alternators: BTreeMap<u32, usize>,
    pub repeats: BTreeMap<u32, RepeatSpec>,
    /// Next unused group id.
    pub next_id: u32,
}

impl Layout {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Range of the positions belonging to `copy` of repeat `group`.
    pub fn copy_range(&self, group: u32, copy: usize) -> Option<std::ops::Range<usize>> {
        let wanted = Some(RepeatRef { group, copy });
        let start = self.tokens.iter().position(|t| t.repeat == wanted)?;
        let len = self.tokens[start..]
            .iter()
            .take_while(|t| t.repeat == wanted)
            .count();
        Some(start..start + len)
    }

    /// Highest copy index currently laid out for `group`.
    pub fn last_copy(&self, group: u32) -> Option<usize> {
        self.tokens
            .iter()
            .filter_map(|t| t.repeat)
            .filter(|r| r.group == group)
            .map(|r| r.copy)
            .max()
    }

    /// Range of positions belonging to optional segment `id`.
    pub fn optional_range(&self, id: u32) -> Option<std::ops::Range<usize>> {
        let start = self
            .tokens
            .iter()
            .position(|t| t.optional_groups.contains(&id))?;
        let len = self.tokens[start..]
            .iter()
            .take_while(|t| t.optional_groups.contains(&id))
            .count();
        Some(start..start + len)
    }

    /// Range of positions belonging to `variant` of alternator `group`.
    pub fn variant_range(&self, group: u32, variant: usize) -> Option<std::ops::Range<usize>> {
        let start = self
            .tokens
            .iter()
            .position(|t| t.variant_of(group) == Some(variant))?;
        let len = self.tokens[start..]
            .iter()
            .take_while(|t| t.variant_of(group) == Some(variant))
            .count();
        Some(start..start + len)
    }

    /// Range of every position of alternator `group`, across all its variants.
    pub fn group_range(&self, group: u32) -> Option<std::ops::Range<usize>> {
        let start = self
            .tokens
            .iter()
            .position(|t| t.variant_of(group).is_some())?;
        let len = self.tokens[start..]
            .iter()
            .take_while(|t| t.variant_of(group).is_some())
            .count();
        Some(start..start + len)
    }
}

/// Settings the buffer needs at runtime, fixed at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub placeholder: Vec<char>,
    pub casing: Option<Casing>,
    pub max_length: usize,
    pub direction: Direction,
}

impl RenderSettings {
    /// Placeholder glyph for the empty position with visible index `visible`.
    pub fn placeholder_at(&self, visible: usize) -> char {
        if self.placeholder.is_empty() {
            ' '
        } else {
            self.placeholder[visible % self.placeholder.len()]
        }
    }
}

/// A compiled mask. Immutable once built; shared between buffers through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Maskset {
    /// Human-readable source, the patterns joined with the alternator marker.
    pub source: String,
    pub layout: Layout,
    pub definitions: DefinitionTable,
    pub settings: RenderSettings,
    /// Metadata entries of a multi-pattern mask, in variant order.
    pub metadata: Option<Vec<MetadataEntry>>,
    /// Alternator group holding the patterns of a multi-pattern mask.
    pub root_alternator: Option<u32>,
}

impl Maskset {
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn tokens(&self) -> &[MaskToken] {
        &self.layout.tokens
    }
}
