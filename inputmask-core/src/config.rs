//! Configuration management for `inputmask-core`.
//!
//! This module defines the option structures that drive mask compilation and input
//! validation, and the YAML document (`MaskConfig`) that carries definitions, aliases and
//! default options. It handles serialization/deserialization of YAML configurations and
//! provides utilities for loading, merging and validating them.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::aliases::AliasRegistry;
use crate::buffer::Direction;
use crate::definitions::{Casing, Definition, DefinitionSpec, DefinitionTable};
use crate::errors::MaskError;

/// Maximum allowed length for a single mask pattern string.
pub const MAX_PATTERN_LENGTH: usize = 1024;

/// Default cap on the number of buffer positions, used to bound unbounded repeats.
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// An opening/closing syntax marker pair, e.g. `[` and `]` for optional segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerPair {
    pub open: char,
    pub close: char,
}

impl MarkerPair {
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }
}

/// One entry of a multi-pattern mask. Everything besides `mask` is opaque metadata
/// handed back to the caller when that variant is the active one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub mask: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MetadataEntry {
    pub fn new(mask: impl Into<String>) -> Self {
        Self {
            mask: mask.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// The mask as written in configuration: a single pattern, a list of alternative
/// patterns, or a list of patterns carrying metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaskSource {
    Pattern(String),
    Patterns(Vec<String>),
    Variants(Vec<MetadataEntry>),
}

impl MaskSource {
    /// The raw pattern strings, in declaration order.
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            MaskSource::Pattern(p) => vec![p.as_str()],
            MaskSource::Patterns(list) => list.iter().map(String::as_str).collect(),
            MaskSource::Variants(entries) => entries.iter().map(|e| e.mask.as_str()).collect(),
        }
    }

    /// Metadata entries, present only for `Variants`.
    pub fn metadata(&self) -> Option<&[MetadataEntry]> {
        match self {
            MaskSource::Variants(entries) => Some(entries),
            _ => None,
        }
    }

    /// True when the source holds more than one alternative pattern.
    pub fn is_multi(&self) -> bool {
        !matches!(self, MaskSource::Pattern(_))
    }
}

impl From<&str> for MaskSource {
    fn from(pattern: &str) -> Self {
        MaskSource::Pattern(pattern.to_string())
    }
}

impl From<String> for MaskSource {
    fn from(pattern: String) -> Self {
        MaskSource::Pattern(pattern)
    }
}

/// The fully resolved configuration of one mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskOptions {
    pub mask: Option<MaskSource>,
    /// Alias this configuration was resolved from, if any.
    pub alias: Option<String>,
    /// Glyphs shown for empty positions; cycled by visible index.
    pub placeholder: String,
    pub optional_marker: MarkerPair,
    pub group_marker: MarkerPair,
    pub quantifier_marker: MarkerPair,
    pub alternator_marker: char,
    pub escape_char: char,
    pub right_to_left: bool,
    /// Numeric input implies right-to-left rendering.
    pub numeric_input: bool,
    /// Global casing, overridden by a definition's own casing.
    pub casing: Option<Casing>,
    /// Default strictness for incremental input.
    pub strict: bool,
    pub remove_literals: bool,
    pub max_length: usize,
    /// Definition specs layered over the configured definition table.
    pub definitions: BTreeMap<char, DefinitionSpec>,
    /// Set when `definitions` were supplied inline by a caller. Such masksets are never cached.
    #[serde(skip)]
    pub inline_definitions: bool,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            mask: None,
            alias: None,
            placeholder: "_".to_string(),
            optional_marker: MarkerPair::new('[', ']'),
            group_marker: MarkerPair::new('(', ')'),
            quantifier_marker: MarkerPair::new('{', '}'),
            alternator_marker: '|',
            escape_char: '\\',
            right_to_left: false,
            numeric_input: false,
            casing: None,
            strict: false,
            remove_literals: false,
            max_length: DEFAULT_MAX_LENGTH,
            definitions: BTreeMap::new(),
            inline_definitions: false,
        }
    }
}

impl MaskOptions {
    /// Options for a single pattern with every other setting at its default.
    pub fn with_mask(mask: impl Into<MaskSource>) -> Self {
        Self {
            mask: Some(mask.into()),
            ..Self::default()
        }
    }

    pub fn direction(&self) -> Direction {
        if self.right_to_left || self.numeric_input {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        }
    }

    /// Every character with a syntactic meaning in mask patterns.
    pub fn syntax_chars(&self) -> [char; 8] {
        [
            self.optional_marker.open,
            self.optional_marker.close,
            self.group_marker.open,
            self.group_marker.close,
            self.quantifier_marker.open,
            self.quantifier_marker.close,
            self.alternator_marker,
            self.escape_char,
        ]
    }

    /// Deep-merges `overrides` into these options. Set fields win; definitions are
    /// overlaid by symbol.
    pub fn apply(&mut self, overrides: &MaskOverrides) {
        if let Some(mask) = &overrides.mask {
            self.mask = Some(mask.clone());
        }
        if let Some(alias) = &overrides.alias {
            self.alias = Some(alias.clone());
        }
        if let Some(placeholder) = &overrides.placeholder {
            self.placeholder = placeholder.clone();
        }
        if let Some(marker) = overrides.optional_marker {
            self.optional_marker = marker;
        }
        if let Some(marker) = overrides.group_marker {
            self.group_marker = marker;
        }
        if let Some(marker) = overrides.quantifier_marker {
            self.quantifier_marker = marker;
        }
        if let Some(marker) = overrides.alternator_marker {
            self.alternator_marker = marker;
        }
        if let Some(escape) = overrides.escape_char {
            self.escape_char = escape;
        }
        if let Some(rtl) = overrides.right_to_left {
            self.right_to_left = rtl;
        }
        if let Some(numeric) = overrides.numeric_input {
            self.numeric_input = numeric;
        }
        if let Some(casing) = overrides.casing {
            self.casing = Some(casing);
        }
        if let Some(strict) = overrides.strict {
            self.strict = strict;
        }
        if let Some(remove) = overrides.remove_literals {
            self.remove_literals = remove;
        }
        if let Some(max) = overrides.max_length {
            self.max_length = max;
        }
        for (symbol, spec) in &overrides.definitions {
            self.definitions.insert(*symbol, spec.clone());
        }
    }
}

/// Partial options: every field optional. Used for aliases, the `defaults` section of
/// a configuration file and caller-supplied settings.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskOverrides {
    pub mask: Option<MaskSource>,
    pub alias: Option<String>,
    pub placeholder: Option<String>,
    pub optional_marker: Option<MarkerPair>,
    pub group_marker: Option<MarkerPair>,
    pub quantifier_marker: Option<MarkerPair>,
    pub alternator_marker: Option<char>,
    pub escape_char: Option<char>,
    pub right_to_left: Option<bool>,
    pub numeric_input: Option<bool>,
    pub casing: Option<Casing>,
    pub strict: Option<bool>,
    pub remove_literals: Option<bool>,
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<char, DefinitionSpec>,
}

impl MaskOverrides {
    /// Overrides that only set the mask.
    pub fn mask(mask: impl Into<MaskSource>) -> Self {
        Self {
            mask: Some(mask.into()),
            ..Self::default()
        }
    }

    /// Overlays `other` onto `self`; fields set in `other` win.
    pub fn merge(&mut self, other: &MaskOverrides) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field.clone(); })*
            };
        }
        take!(
            mask,
            alias,
            placeholder,
            optional_marker,
            group_marker,
            quantifier_marker,
            alternator_marker,
            escape_char,
            right_to_left,
            numeric_input,
            casing,
            strict,
            remove_literals,
            max_length
        );
        for (symbol, spec) in &other.definitions {
            self.definitions.insert(*symbol, spec.clone());
        }
    }
}

/// The top-level YAML configuration document.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Definition table, keyed by mask symbol.
    pub definitions: BTreeMap<char, DefinitionSpec>,
    /// Named option presets.
    pub aliases: BTreeMap<String, MaskOverrides>,
    /// Options applied before any alias or caller override.
    pub defaults: MaskOverrides,
}

impl MaskConfig {
    /// Loads a configuration from a YAML file and validates it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading mask configuration from: {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: MaskConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        info!(
            "Loaded {} definitions and {} aliases from file {}.",
            config.definitions.len(),
            config.aliases.len(),
            path.display()
        );
        Ok(config)
    }

    /// Loads the built-in definitions and aliases from the embedded configuration.
    pub fn load_default() -> Result<Self> {
        debug!("Loading default mask configuration from embedded string...");
        let default_yaml = include_str!("../config/defaults.yaml");
        let config: MaskConfig =
            serde_yml::from_str(default_yaml).context("Failed to parse default configuration")?;

        debug!(
            "Loaded {} default definitions and {} default aliases.",
            config.definitions.len(),
            config.aliases.len()
        );
        Ok(config)
    }

    /// Compiles the `definitions` section.
    pub fn definition_table(&self) -> Result<DefinitionTable, MaskError> {
        DefinitionTable::from_specs(&self.definitions)
    }

    /// `MaskOptions::default()` with the `defaults` section applied.
    pub fn base_options(&self) -> MaskOptions {
        let mut options = MaskOptions::default();
        options.apply(&self.defaults);
        options
    }

    pub fn alias_registry(&self) -> AliasRegistry {
        AliasRegistry::from_map(self.aliases.clone())
    }
}

/// Merges a user configuration over the defaults. User definitions and aliases replace
/// default entries with the same key; user defaults are overlaid field by field.
pub fn merge_configs(default_config: MaskConfig, user_config: Option<MaskConfig>) -> MaskConfig {
    debug!(
        "merge_configs called. Default definitions: {}, default aliases: {}",
        default_config.definitions.len(),
        default_config.aliases.len()
    );

    let mut merged = default_config;

    if let Some(user_cfg) = user_config {
        debug!(
            "User config provided. Merging {} definitions and {} aliases.",
            user_cfg.definitions.len(),
            user_cfg.aliases.len()
        );
        for (symbol, spec) in user_cfg.definitions {
            if merged.definitions.contains_key(&symbol) {
                debug!("User definition '{}' replaces the built-in one.", symbol);
            }
            merged.definitions.insert(symbol, spec);
        }
        for (name, alias) in user_cfg.aliases {
            merged.aliases.insert(name, alias);
        }
        merged.defaults.merge(&user_cfg.defaults);
    }

    debug!(
        "Final configuration after merge: {} definitions, {} aliases.",
        merged.definitions.len(),
        merged.aliases.len()
    );
    merged
}

/// Validates definition specs and aliases, collecting every problem found.
pub fn validate_config(config: &MaskConfig) -> Result<()> {
    let mut errors = Vec::new();
    let syntax = config.base_options().syntax_chars();

    let mut check_definitions = |owner: &str, specs: &BTreeMap<char, DefinitionSpec>| {
        for (symbol, spec) in specs {
            if syntax.contains(symbol) {
                errors.push(format!(
                    "{}: definition symbol '{}' collides with a syntax marker.",
                    owner, symbol
                ));
                continue;
            }
            if let Err(e) = Definition::from_spec(*symbol, spec) {
                errors.push(format!("{}: {}", owner, e));
            }
        }
    };

    check_definitions("definitions", &config.definitions);
    for (name, alias) in &config.aliases {
        check_definitions(&format!("alias '{}'", name), &alias.definitions);
    }

    for (name, alias) in &config.aliases {
        if name.trim().is_empty() {
            errors.push("An alias has an empty name.".to_string());
        }
        if alias.placeholder.as_deref() == Some("") {
            errors.push(format!("Alias '{}' has an empty `placeholder`.", name));
        }
        if name.chars().count() == 1 {
            if let Some(symbol) = name.chars().next() {
                if config.definitions.contains_key(&symbol) {
                    warn!("Alias '{}' shadows the definition with the same symbol.", name);
                }
            }
        }
    }

    if config.defaults.placeholder.as_deref() == Some("") {
        errors.push("`defaults.placeholder` must not be empty.".to_string());
    }

    if !errors.is_empty() {
        let full_error_message = format!("Configuration validation failed:\n{}", errors.join("\n"));
        Err(anyhow!(full_error_message))
    } else {
        Ok(())
    }
}

/// Locations searched for a configuration named `name` (without extension).
pub fn config_candidate_paths(name: &str) -> Vec<PathBuf> {
    let base_dirs = vec![
        dirs::home_dir().map(|p| p.join(".inputmask")),
        dirs::config_dir().map(|p| p.join("inputmask")),
        Some(PathBuf::from("./config")),
    ];

    base_dirs
        .into_iter()
        .flatten()
        .map(|dir| dir.join(format!("{}.yaml", name)))
        .collect()
}

/// Loads a configuration given either a file path or a name looked up in
/// `config_candidate_paths`.
pub fn load_config_by_name(name_or_path: &str) -> Result<MaskConfig> {
    debug!("Attempting to load configuration from: '{}'", name_or_path);

    let path_to_load = {
        let path = Path::new(name_or_path);
        if path.is_file() {
            debug!("Input is a valid file path. Loading directly from: {}", path.display());
            Some(path.to_path_buf())
        } else {
            config_candidate_paths(name_or_path)
                .into_iter()
                .find(|p| p.exists())
        }
    }
    .context("Configuration not found. It is not a valid file path, and was not found in expected locations.")?;

    MaskConfig::load_from_file(path_to_load)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses_and_validates() -> Result<()> {
        let config = MaskConfig::load_default()?;
        validate_config(&config)?;
        assert!(config.definitions.contains_key(&'9'));
        assert!(config.definitions.contains_key(&'a'));
        assert!(config.definitions.contains_key(&'*'));
        assert!(config.aliases.contains_key("date"));
        let table = config.definition_table()?;
        assert!(table.get('9').unwrap().test("5", 0));
        assert!(table.get('9').unwrap().test("１", 0));
        assert!(table.get('a').unwrap().test("ж", 0));
        assert!(!table.get('a').unwrap().test("5", 0));
        Ok(())
    }

    #[test]
    fn test_metadata_variants_deserialize() -> Result<()> {
        let config = MaskConfig::load_default()?;
        let alias = &config.aliases["date-iso-or-dmy"];
        let source = alias.mask.as_ref().context("mask missing")?;
        assert_eq!(source.patterns(), vec!["9999-99-99", "99/99/9999"]);
        let metadata = source.metadata().context("metadata missing")?;
        assert_eq!(metadata[0].extra["format"], serde_json::json!("iso"));
        Ok(())
    }

    #[test]
    fn test_apply_overrides() {
        let mut options = MaskOptions::default();
        let mut definitions = BTreeMap::new();
        definitions.insert(
            'x',
            DefinitionSpec {
                validator: "[xX]".to_string(),
                ..Default::default()
            },
        );
        options.apply(&MaskOverrides {
            mask: Some("99-x".into()),
            placeholder: Some("#".to_string()),
            numeric_input: Some(true),
            definitions,
            ..Default::default()
        });
        assert_eq!(options.placeholder, "#");
        assert_eq!(options.direction(), Direction::RightToLeft);
        assert!(options.definitions.contains_key(&'x'));
        assert_eq!(options.mask, Some(MaskSource::Pattern("99-x".to_string())));
        assert_eq!(options.escape_char, '\\');
    }

    #[test]
    fn test_merge_configs_user_wins() {
        let mut default_config = MaskConfig::default();
        default_config
            .aliases
            .insert("phone".to_string(), MaskOverrides::mask("999-9999"));
        default_config.defaults.placeholder = Some("_".to_string());

        let mut user = MaskConfig::default();
        user.aliases
            .insert("phone".to_string(), MaskOverrides::mask("9999-9999"));
        user.defaults.strict = Some(true);

        let merged = merge_configs(default_config, Some(user));
        assert_eq!(
            merged.aliases["phone"].mask,
            Some(MaskSource::Pattern("9999-9999".to_string()))
        );
        assert_eq!(merged.defaults.placeholder.as_deref(), Some("_"));
        assert_eq!(merged.defaults.strict, Some(true));
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut config = MaskConfig::default();
        config.definitions.insert(
            '[',
            DefinitionSpec {
                validator: "x".to_string(),
                ..Default::default()
            },
        );
        config.definitions.insert(
            'q',
            DefinitionSpec {
                validator: "(".to_string(),
                ..Default::default()
            },
        );
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("collides with a syntax marker"));
        assert!(err.contains("Failed to compile definition 'q'"));
    }
}
