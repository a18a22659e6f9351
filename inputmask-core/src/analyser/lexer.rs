//! lexer.rs - Parses mask pattern strings into a syntax tree.
//!
//! The grammar is small: placeholders (symbols present in the definition table),
//! literals, escaped literals, optional segments, groups, alternation and quantifiers.
//! Alternation binds loosest, like in regular expressions: `(AAA|999)` alternates the two
//! three-token runs and a top-level `aa|99` alternates the whole pattern. The syntax
//! markers come from `MaskOptions`, so the defaults (`[ ]`, `( )`, `{ }`, `|`, `\`) can be
//! replaced per mask.
//!
//! License: MIT OR APACHE 2.0

use log::debug;

use crate::config::{MaskOptions, MAX_PATTERN_LENGTH};
use crate::definitions::DefinitionTable;
use crate::errors::MaskError;

/// One node of a parsed mask pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A symbol from the definition table.
    Placeholder(char),
    Literal(char),
    Group { children: Vec<Node>, optional: bool },
    /// Alternative sequences; each variant is a full run of nodes.
    Alternation(Vec<Vec<Node>>),
    /// `max == None` means unbounded.
    Repeat {
        body: Box<Node>,
        min: usize,
        max: Option<usize>,
    },
}

struct Lexer<'a> {
    pattern: &'a str,
    chars: Vec<char>,
    pos: usize,
    options: &'a MaskOptions,
    table: &'a DefinitionTable,
}

/// Parses `pattern` into a sequence of nodes.
pub fn parse(
    pattern: &str,
    options: &MaskOptions,
    table: &DefinitionTable,
) -> Result<Vec<Node>, MaskError> {
    let length = pattern.chars().count();
    if length > MAX_PATTERN_LENGTH {
        return Err(MaskError::PatternLengthExceeded(length, MAX_PATTERN_LENGTH));
    }

    let mut lexer = Lexer {
        pattern,
        chars: pattern.chars().collect(),
        pos: 0,
        options,
        table,
    };
    let nodes = lexer.parse_sequence(None)?;
    debug!("Parsed mask '{}' into {} top-level nodes.", pattern, nodes.len());
    Ok(nodes)
}

impl Lexer<'_> {
    /// Parses until `closer` (the expected closing marker and the position of its opener)
    /// or the end of the pattern.
    fn parse_sequence(&mut self, closer: Option<(char, char, usize)>) -> Result<Vec<Node>, MaskError> {
        let optional = self.options.optional_marker;
        let group = self.options.group_marker;
        let quantifier = self.options.quantifier_marker;
        let alternator = self.options.alternator_marker;
        let escape = self.options.escape_char;

        let mut variants: Vec<Vec<Node>> = Vec::new();
        let mut current: Vec<Node> = Vec::new();

        loop {
            let Some(ch) = self.chars.get(self.pos).copied() else {
                if let Some((_, opener, position)) = closer {
                    return Err(self.unmatched(opener, position));
                }
                break;
            };
            let position = self.pos;
            self.pos += 1;

            if closer.map(|(close, _, _)| close) == Some(ch) {
                break;
            } else if ch == escape {
                let escaped = self.chars.get(self.pos).copied().ok_or_else(|| {
                    MaskError::DanglingEscape {
                        pattern: self.pattern.to_string(),
                    }
                })?;
                self.pos += 1;
                current.push(Node::Literal(escaped));
            } else if ch == alternator {
                variants.push(std::mem::take(&mut current));
            } else if ch == optional.open {
                let children = self.parse_sequence(Some((optional.close, ch, position)))?;
                current.push(Node::Group {
                    children,
                    optional: true,
                });
            } else if ch == group.open {
                let children = self.parse_sequence(Some((group.close, ch, position)))?;
                current.push(Node::Group {
                    children,
                    optional: false,
                });
            } else if ch == quantifier.open {
                let (min, max) = self.parse_quantifier(position)?;
                let body = current.pop().ok_or_else(|| MaskError::InvalidQuantifier {
                    pattern: self.pattern.to_string(),
                    quantifier: self.quantifier_text(position),
                    position,
                })?;
                current.push(Node::Repeat {
                    body: Box::new(body),
                    min,
                    max,
                });
            } else if ch == optional.close || ch == group.close || ch == quantifier.close {
                return Err(self.unmatched(ch, position));
            } else if self.table.contains(ch) {
                current.push(Node::Placeholder(ch));
            } else {
                current.push(Node::Literal(ch));
            }
        }

        if variants.is_empty() {
            Ok(current)
        } else {
            variants.push(current);
            Ok(vec![Node::Alternation(variants)])
        }
    }

    /// Reads the quantifier body after the opening marker at `open`.
    fn parse_quantifier(&mut self, open: usize) -> Result<(usize, Option<usize>), MaskError> {
        let close = self.options.quantifier_marker.close;
        let end = self.chars[self.pos..]
            .iter()
            .position(|c| *c == close)
            .map(|offset| self.pos + offset)
            .ok_or_else(|| self.unmatched(self.options.quantifier_marker.open, open))?;
        let body: String = self.chars[self.pos..end].iter().collect();
        self.pos = end + 1;

        let invalid = || MaskError::InvalidQuantifier {
            pattern: self.pattern.to_string(),
            quantifier: body.clone(),
            position: open,
        };
        let number = |text: &str| text.trim().parse::<usize>().map_err(|_| invalid());

        let bounds = match body.trim() {
            "*" => (0, None),
            "+" => (1, None),
            text => match text.split_once(',') {
                None => {
                    let n = number(text)?;
                    (n, Some(n))
                }
                Some((min, max)) if max.trim() == "*" => (number(min)?, None),
                Some((min, max)) => {
                    let (min, max) = (number(min)?, number(max)?);
                    if max < min {
                        return Err(invalid());
                    }
                    (min, Some(max))
                }
            },
        };
        Ok(bounds)
    }

    fn quantifier_text(&self, open: usize) -> String {
        self.chars[open..self.pos].iter().collect()
    }

    fn unmatched(&self, delimiter: char, position: usize) -> MaskError {
        MaskError::UnmatchedDelimiter {
            pattern: self.pattern.to_string(),
            delimiter,
            position,
        }
    }
}
