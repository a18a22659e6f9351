// File: inputmask-core/src/definitions.rs
//! Character-acceptance rules for mask tokens.
//!
//! A `Definition` maps one mask symbol (e.g. `9`, `a`, `*`) to the test an input
//! character must pass to occupy a placeholder position, plus an optional casing
//! transform. Definitions are described in configuration as `DefinitionSpec`s (regex
//! sources) and compiled once into a `DefinitionTable`.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::MaskError;

/// Case transform applied to a character after it passed its definition test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Casing {
    Upper,
    Lower,
    /// Upper case at the start of a word, lower case elsewhere.
    Title,
}

impl Casing {
    /// Applies the casing. `word_start` only matters for `Title`.
    pub fn apply(self, ch: char, word_start: bool) -> char {
        let upper = match self {
            Casing::Upper => true,
            Casing::Lower => false,
            Casing::Title => word_start,
        };
        if upper {
            ch.to_uppercase().next().unwrap_or(ch)
        } else {
            ch.to_lowercase().next().unwrap_or(ch)
        }
    }
}

/// Serializable description of a definition, as found in YAML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionSpec {
    /// Regex source the complete chunk must match. Implicitly anchored.
    pub validator: String,
    /// Number of buffer positions one occurrence of the symbol occupies.
    pub cardinality: usize,
    /// Regex sources for the partial chunks (`prevalidators[k]` tests the first `k + 1` chars).
    pub prevalidators: Vec<String>,
    pub casing: Option<Casing>,
    /// Placeholder glyph shown for empty positions of this definition.
    pub placeholder: Option<char>,
}

impl Default for DefinitionSpec {
    fn default() -> Self {
        Self {
            validator: String::new(),
            cardinality: 1,
            prevalidators: Vec::new(),
            casing: None,
            placeholder: None,
        }
    }
}

/// The test behind a definition.
#[derive(Clone)]
pub enum Validator {
    /// Anchored regular expression, compiled from a `DefinitionSpec`.
    Pattern(Regex),
    /// Arbitrary predicate supplied in code. Never cacheable.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Validator {
    fn is_match(&self, chunk: &str) -> bool {
        match self {
            Validator::Pattern(regex) => regex.is_match(chunk),
            Validator::Predicate(test) => test(chunk),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Pattern(regex) => write!(f, "Pattern({})", regex.as_str()),
            Validator::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Validator::Pattern(a), Validator::Pattern(b)) => a.as_str() == b.as_str(),
            (Validator::Predicate(a), Validator::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A compiled character-acceptance rule.
#[derive(Debug, Clone)]
pub struct Definition {
    pub symbol: char,
    validator: Validator,
    prevalidators: Vec<Regex>,
    pub cardinality: usize,
    pub casing: Option<Casing>,
    pub placeholder: Option<char>,
    /// The spec this definition was compiled from. `None` for predicate definitions.
    spec: Option<DefinitionSpec>,
}

impl PartialEq for Definition {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.validator == other.validator
            && self.cardinality == other.cardinality
            && self.casing == other.casing
            && self.placeholder == other.placeholder
            && self.prevalidators.len() == other.prevalidators.len()
            && self
                .prevalidators
                .iter()
                .zip(&other.prevalidators)
                .all(|(a, b)| a.as_str() == b.as_str())
    }
}

fn anchored(symbol: char, source: &str) -> Result<Regex, MaskError> {
    Regex::new(&format!("^(?:{})$", source))
        .map_err(|e| MaskError::DefinitionCompilationError(symbol, e))
}

impl Definition {
    /// Compiles a `DefinitionSpec` for `symbol`.
    pub fn from_spec(symbol: char, spec: &DefinitionSpec) -> Result<Self, MaskError> {
        if spec.cardinality == 0 {
            return Err(MaskError::InvalidDefinition {
                symbol,
                reason: "cardinality must be at least 1".to_string(),
            });
        }
        if spec.prevalidators.len() >= spec.cardinality {
            return Err(MaskError::InvalidDefinition {
                symbol,
                reason: format!(
                    "{} prevalidators given for cardinality {}",
                    spec.prevalidators.len(),
                    spec.cardinality
                ),
            });
        }
        if spec.validator.is_empty() {
            return Err(MaskError::InvalidDefinition {
                symbol,
                reason: "validator is empty".to_string(),
            });
        }

        let validator = anchored(symbol, &spec.validator)?;
        let prevalidators = spec
            .prevalidators
            .iter()
            .map(|source| anchored(symbol, source))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Compiled definition '{}' with validator '{}'", symbol, spec.validator);
        Ok(Self {
            symbol,
            validator: Validator::Pattern(validator),
            prevalidators,
            cardinality: spec.cardinality,
            casing: spec.casing,
            placeholder: spec.placeholder,
            spec: Some(spec.clone()),
        })
    }

    /// Builds a single-position definition backed by an arbitrary predicate.
    pub fn predicate<F>(symbol: char, test: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            symbol,
            validator: Validator::Predicate(Arc::new(test)),
            prevalidators: Vec::new(),
            cardinality: 1,
            casing: None,
            placeholder: None,
            spec: None,
        }
    }

    pub fn with_casing(mut self, casing: Casing) -> Self {
        self.casing = Some(casing);
        if let Some(spec) = self.spec.as_mut() {
            spec.casing = Some(casing);
        }
        self
    }

    pub fn with_placeholder(mut self, placeholder: char) -> Self {
        self.placeholder = Some(placeholder);
        if let Some(spec) = self.spec.as_mut() {
            spec.placeholder = Some(placeholder);
        }
        self
    }

    /// Tests `chunk` (the already filled chars of this occurrence plus the candidate)
    /// for chunk position `index`.
    pub fn test(&self, chunk: &str, index: usize) -> bool {
        if index + 1 >= self.cardinality {
            return self.validator.is_match(chunk);
        }
        match self.prevalidators.get(index) {
            Some(prevalidator) => prevalidator.is_match(chunk),
            None => true,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn spec(&self) -> Option<&DefinitionSpec> {
        self.spec.as_ref()
    }

    pub fn is_cacheable(&self) -> bool {
        self.spec.is_some()
    }
}

/// Mapping from mask symbol to its definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionTable {
    entries: BTreeMap<char, Arc<Definition>>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every spec of a configuration section.
    pub fn from_specs(specs: &BTreeMap<char, DefinitionSpec>) -> Result<Self, MaskError> {
        let mut table = Self::new();
        for (symbol, spec) in specs {
            table.insert(Definition::from_spec(*symbol, spec)?);
        }
        Ok(table)
    }

    /// Inserts a definition, replacing any previous one for the same symbol.
    pub fn insert(&mut self, definition: Definition) {
        if self.entries.contains_key(&definition.symbol) {
            debug!("Overriding definition '{}'", definition.symbol);
        }
        self.entries.insert(definition.symbol, Arc::new(definition));
    }

    /// Overlays `other` onto this table; entries of `other` win.
    pub fn extend(&mut self, other: &DefinitionTable) {
        for (symbol, definition) in &other.entries {
            if self.entries.contains_key(symbol) {
                warn!("Definition '{}' overrides an existing definition.", symbol);
            }
            self.entries.insert(*symbol, Arc::clone(definition));
        }
    }

    pub fn get(&self, symbol: char) -> Option<&Arc<Definition>> {
        self.entries.get(&symbol)
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.entries.contains_key(&symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A table is cacheable when every entry is fully described by its spec.
    pub fn is_cacheable(&self) -> bool {
        self.entries.values().all(|definition| definition.is_cacheable())
    }
}

impl Hash for DefinitionTable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (symbol, definition) in &self.entries {
            symbol.hash(state);
            definition.spec.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit() -> Definition {
        Definition::from_spec(
            '9',
            &DefinitionSpec {
                validator: "[0-9]".to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_validator_is_anchored() {
        let def = digit();
        assert!(def.test("7", 0));
        assert!(!def.test("77", 0));
        assert!(!def.test("x", 0));
    }

    #[test]
    fn test_multi_char_definition_uses_prevalidators() {
        let hour = Definition::from_spec(
            'h',
            &DefinitionSpec {
                validator: "[01][0-9]|2[0-3]".to_string(),
                cardinality: 2,
                prevalidators: vec!["[0-2]".to_string()],
                ..Default::default()
            },
        )
        .unwrap();
        assert!(hour.test("2", 0));
        assert!(!hour.test("3", 0));
        assert!(hour.test("23", 1));
        assert!(!hour.test("24", 1));
    }

    #[test]
    fn test_invalid_specs_are_rejected() {
        let zero = DefinitionSpec {
            validator: "[0-9]".to_string(),
            cardinality: 0,
            ..Default::default()
        };
        assert!(matches!(
            Definition::from_spec('x', &zero),
            Err(MaskError::InvalidDefinition { symbol: 'x', .. })
        ));

        let broken = DefinitionSpec {
            validator: "[0-9".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Definition::from_spec('x', &broken),
            Err(MaskError::DefinitionCompilationError('x', _))
        ));
    }

    #[test]
    fn test_casing() {
        assert_eq!(Casing::Upper.apply('b', false), 'B');
        assert_eq!(Casing::Lower.apply('B', true), 'b');
        assert_eq!(Casing::Title.apply('b', true), 'B');
        assert_eq!(Casing::Title.apply('B', false), 'b');
    }

    #[test]
    fn test_predicate_definitions_are_not_cacheable() {
        let mut table = DefinitionTable::new();
        table.insert(digit());
        assert!(table.is_cacheable());
        table.insert(Definition::predicate('v', |chunk| "aeiou".contains(chunk)));
        assert!(!table.is_cacheable());
        assert!(table.get('v').unwrap().test("e", 0));
    }

    #[test]
    fn test_builtin_character_classes() {
        let table = crate::config::MaskConfig::load_default()
            .unwrap()
            .definition_table()
            .unwrap();
        let digit = table.get('9').unwrap();
        assert!(digit.test("０", 0));
        assert!(digit.test("９", 0));
        for symbol in ['a', '*'] {
            let letter = table.get(symbol).unwrap();
            assert!(letter.test("é", 0));
            assert!(letter.test("Ø", 0));
            assert!(!letter.test("×", 0));
            assert!(!letter.test("÷", 0));
        }
    }
}
