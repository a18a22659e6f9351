// File: inputmask-core/src/aliases.rs
//! Named option presets.
//!
//! An alias is a `MaskOverrides` registered under a name (`date`, `phone-us`, ...). An
//! alias may itself name a parent alias; resolution applies the chain from the root
//! down, then the caller's own overrides. The registry is an ordinary value owned by the
//! application, so there is no process-wide mutable alias table.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;

use log::debug;

use crate::config::{MaskOptions, MaskOverrides};
use crate::errors::MaskError;

/// How a caller names the mask it wants.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSpec {
    /// An alias name, or a raw pattern when no alias of that name exists.
    Name(String),
    /// Explicit options, optionally based on an alias via `alias`.
    Inline(MaskOverrides),
}

impl From<&str> for PatternSpec {
    fn from(name: &str) -> Self {
        PatternSpec::Name(name.to_string())
    }
}

impl From<MaskOverrides> for PatternSpec {
    fn from(overrides: MaskOverrides) -> Self {
        PatternSpec::Inline(overrides)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasRegistry {
    aliases: BTreeMap<String, MaskOverrides>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(aliases: BTreeMap<String, MaskOverrides>) -> Self {
        Self { aliases }
    }

    /// Registers `overrides` under `name`, replacing any previous alias.
    pub fn register(&mut self, name: impl Into<String>, overrides: MaskOverrides) {
        let name = name.into();
        if self.aliases.insert(name.clone(), overrides).is_some() {
            debug!("Alias '{}' re-registered.", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&MaskOverrides> {
        self.aliases.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaskOverrides)> {
        self.aliases.iter().map(|(name, alias)| (name.as_str(), alias))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Resolves `spec` on top of `base` into final options.
    pub fn resolve(&self, spec: &PatternSpec, base: &MaskOptions) -> Result<MaskOptions, MaskError> {
        let mut options = base.clone();
        match spec {
            PatternSpec::Name(name) => {
                if self.aliases.contains_key(name) {
                    self.expand(name, &mut options, &mut Vec::new())?;
                    options.alias = Some(name.clone());
                } else {
                    debug!("'{}' is not an alias; using it as the mask pattern.", name);
                    options.mask = Some(name.as_str().into());
                }
            }
            PatternSpec::Inline(overrides) => {
                if let Some(name) = &overrides.alias {
                    if !self.aliases.contains_key(name) {
                        return Err(MaskError::UnknownAlias(name.clone()));
                    }
                    self.expand(name, &mut options, &mut Vec::new())?;
                }
                options.apply(overrides);
                if !overrides.definitions.is_empty() {
                    options.inline_definitions = true;
                }
            }
        }

        if options.mask.is_none() {
            return Err(MaskError::MissingMask);
        }
        Ok(options)
    }

    fn expand(
        &self,
        name: &str,
        options: &mut MaskOptions,
        chain: &mut Vec<String>,
    ) -> Result<(), MaskError> {
        if chain.iter().any(|seen| seen == name) {
            return Err(MaskError::AliasCycle(name.to_string()));
        }
        let alias = self
            .aliases
            .get(name)
            .ok_or_else(|| MaskError::UnknownAlias(name.to_string()))?;
        chain.push(name.to_string());

        if let Some(parent) = &alias.alias {
            self.expand(parent, options, chain)?;
        }
        debug!("Applying alias '{}'.", name);
        options.apply(alias);
        options.alias = Some(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaskSource;
    use crate::definitions::DefinitionSpec;

    fn registry() -> AliasRegistry {
        let mut registry = AliasRegistry::new();
        registry.register(
            "date",
            MaskOverrides {
                mask: Some("99/99/9999".into()),
                placeholder: Some("dd/mm/yyyy".to_string()),
                ..Default::default()
            },
        );
        registry.register(
            "strict-date",
            MaskOverrides {
                alias: Some("date".to_string()),
                strict: Some(true),
                ..Default::default()
            },
        );
        registry
    }

    #[test]
    fn test_alias_chain_resolves_parent_first() {
        let options = registry()
            .resolve(&"strict-date".into(), &MaskOptions::default())
            .unwrap();
        assert_eq!(options.mask, Some(MaskSource::Pattern("99/99/9999".to_string())));
        assert_eq!(options.placeholder, "dd/mm/yyyy");
        assert!(options.strict);
        assert_eq!(options.alias.as_deref(), Some("strict-date"));
    }

    #[test]
    fn test_unknown_name_becomes_the_pattern() {
        let options = registry()
            .resolve(&"(999) 999".into(), &MaskOptions::default())
            .unwrap();
        assert_eq!(options.mask, Some(MaskSource::Pattern("(999) 999".to_string())));
        assert_eq!(options.alias, None);
    }

    #[test]
    fn test_inline_overrides_win_over_alias() {
        let spec = PatternSpec::Inline(MaskOverrides {
            alias: Some("date".to_string()),
            placeholder: Some("_".to_string()),
            ..Default::default()
        });
        let options = registry().resolve(&spec, &MaskOptions::default()).unwrap();
        assert_eq!(options.placeholder, "_");
        assert!(!options.inline_definitions);
    }

    #[test]
    fn test_inline_definitions_mark_options_uncacheable() {
        let mut overrides = MaskOverrides::mask("xx");
        overrides.definitions.insert(
            'x',
            DefinitionSpec {
                validator: "[xy]".to_string(),
                ..Default::default()
            },
        );
        let options = registry()
            .resolve(&PatternSpec::Inline(overrides), &MaskOptions::default())
            .unwrap();
        assert!(options.inline_definitions);
    }

    #[test]
    fn test_cycles_and_unknown_aliases() {
        let mut registry = registry();
        registry.register(
            "loop-a",
            MaskOverrides {
                alias: Some("loop-b".to_string()),
                ..Default::default()
            },
        );
        registry.register(
            "loop-b",
            MaskOverrides {
                alias: Some("loop-a".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(
            registry.resolve(&"loop-a".into(), &MaskOptions::default()),
            Err(MaskError::AliasCycle(_))
        ));

        let spec = PatternSpec::Inline(MaskOverrides {
            alias: Some("nope".to_string()),
            ..Default::default()
        });
        assert!(matches!(
            registry.resolve(&spec, &MaskOptions::default()),
            Err(MaskError::UnknownAlias(name)) if name == "nope"
        ));

        assert!(matches!(
            registry.resolve(&PatternSpec::Inline(MaskOverrides::default()), &MaskOptions::default()),
            Err(MaskError::MissingMask)
        ));
    }
}
