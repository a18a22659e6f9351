//! compiler.rs - Lowers parsed masks into masksets and caches the results.
//!
//! This module turns the syntax tree produced by the lexer into the flat `Layout` used
//! at runtime, and provides a thread-safe, cached mechanism to go from `MaskOptions` to a
//! shared `Arc<Maskset>`. Equal configurations compile to equal masksets; the cache is
//! keyed by a fingerprint of everything that influences compilation.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use super::lexer::{self, Node};
use crate::config::MaskOptions;
use crate::definitions::DefinitionTable;
use crate::errors::MaskError;
use crate::maskset::{AltRef, Layout, MaskToken, Maskset, RenderSettings, RepeatRef, RepeatSpec, TokenKind};

/// Walks a syntax tree, emitting tokens and allocating group ids in order.
struct Lowering<'a> {
    pattern: &'a str,
    table: &'a DefinitionTable,
    max_length: usize,
    layout: Layout,
    optional_stack: Vec<u32>,
    alternation_stack: Vec<AltRef>,
    repeat: Option<RepeatRef>,
}

impl<'a> Lowering<'a> {
    fn new(pattern: &'a str, table: &'a DefinitionTable, max_length: usize) -> Self {
        Self {
            pattern,
            table,
            max_length,
            layout: Layout::default(),
            optional_stack: Vec::new(),
            alternation_stack: Vec::new(),
            repeat: None,
        }
    }

    fn push(&mut self, kind: TokenKind) -> Result<(), MaskError> {
        if self.layout.tokens.len() >= self.max_length {
            return Err(MaskError::MaskTooLong {
                pattern: self.pattern.to_string(),
                positions: self.layout.tokens.len() + 1,
                max: self.max_length,
            });
        }
        self.layout.tokens.push(MaskToken {
            kind,
            optional_groups: self.optional_stack.clone(),
            alternation: self.alternation_stack.clone(),
            repeat: self.repeat,
        });
        Ok(())
    }

    fn lower_all(&mut self, nodes: &[Node]) -> Result<(), MaskError> {
        nodes.iter().try_for_each(|node| self.lower(node))
    }

    /// Lowers `variants` as one alternator group and returns its id.
    fn lower_alternation(&mut self, variants: &[Vec<Node>]) -> Result<u32, MaskError> {
        let id = self.layout.allocate_id();
        self.layout.alternators.insert(id, variants.len());
        for (variant, nodes) in variants.iter().enumerate() {
            self.alternation_stack.push(AltRef { group: id, variant });
            self.lower_all(nodes)?;
            self.alternation_stack.pop();
        }
        Ok(id)
    }

    fn lower_optional(&mut self, node: &Node) -> Result<(), MaskError> {
        let id = self.layout.allocate_id();
        self.optional_stack.push(id);
        self.lower(node)?;
        self.optional_stack.pop();
        Ok(())
    }

    fn lower(&mut self, node: &Node) -> Result<(), MaskError> {
        match node {
            Node::Literal(ch) => self.push(TokenKind::Literal(*ch)),
            Node::Placeholder(symbol) => {
                let definition = match self.table.get(*symbol) {
                    Some(definition) => Arc::clone(definition),
                    None => return self.push(TokenKind::Literal(*symbol)),
                };
                for chunk in 0..definition.cardinality {
                    self.push(TokenKind::Placeholder {
                        definition: Arc::clone(&definition),
                        chunk,
                    })?;
                }
                Ok(())
            }
            Node::Group { children, optional } => {
                if *optional {
                    let id = self.layout.allocate_id();
                    self.optional_stack.push(id);
                    self.lower_all(children)?;
                    self.optional_stack.pop();
                    Ok(())
                } else {
                    self.lower_all(children)
                }
            }
            Node::Alternation(variants) => self.lower_alternation(variants).map(|_| ()),
            Node::Repeat {
                body,
                min,
                max: Some(max),
            } => {
                for copy in 0..*max {
                    if copy < *min {
                        self.lower(body)?;
                    } else {
                        self.lower_optional(body)?;
                    }
                }
                Ok(())
            }
            Node::Repeat { body, min, max: None } => {
                if self.repeat.is_some() {
                    return Err(MaskError::NestedUnboundedRepeat(self.pattern.to_string()));
                }
                let id = self.layout.allocate_id();
                let laid = (*min).max(1);
                self.layout.repeats.insert(
                    id,
                    RepeatSpec {
                        min: *min,
                        laid,
                        optional_depth: self.optional_stack.len(),
                        alternation_depth: self.alternation_stack.len(),
                    },
                );
                for copy in 0..laid {
                    self.repeat = Some(RepeatRef { group: id, copy });
                    let lowered = if copy < *min {
                        self.lower(body)
                    } else {
                        self.lower_optional(body)
                    };
                    self.repeat = None;
                    lowered?;
                }
                debug!("Repeat group {} lays out {} copies (min {}).", id, laid, min);
                Ok(())
            }
        }
    }
}

/// Compiles `options` against `base` (the configured definition table) into a maskset.
///
/// Inline definition specs from `options.definitions` are layered over `base`.
pub fn compile(options: &MaskOptions, base: &DefinitionTable) -> Result<Maskset, MaskError> {
    let source = options.mask.as_ref().ok_or(MaskError::MissingMask)?;
    let table = effective_table(options, base)?;
    let patterns = source.patterns();
    let joined = patterns.join(&options.alternator_marker.to_string());

    debug!("Compiling mask '{}' ({} pattern(s)).", joined, patterns.len());

    let parsed = patterns
        .iter()
        .map(|pattern| lexer::parse(pattern, options, &table))
        .collect::<Result<Vec<_>, _>>()?;

    let mut lowering = Lowering::new(&joined, &table, options.max_length);
    let mut root_alternator = None;
    if source.is_multi() {
        root_alternator = Some(lowering.lower_alternation(&parsed)?);
    } else if let Some(nodes) = parsed.first() {
        lowering.lower_all(nodes)?;
    }
    let layout = lowering.layout;

    debug!(
        "Mask '{}' compiled to {} positions, {} alternator group(s), {} repeat group(s).",
        joined,
        layout.len(),
        layout.alternators.len(),
        layout.repeats.len()
    );

    Ok(Maskset {
        source: joined,
        layout,
        definitions: table,
        settings: RenderSettings {
            placeholder: options.placeholder.chars().collect(),
            casing: options.casing,
            max_length: options.max_length,
            direction: options.direction(),
        },
        metadata: source.metadata().map(<[_]>::to_vec),
        root_alternator,
    })
}

fn effective_table(options: &MaskOptions, base: &DefinitionTable) -> Result<DefinitionTable, MaskError> {
    if options.definitions.is_empty() {
        return Ok(base.clone());
    }
    let mut table = base.clone();
    table.extend(&DefinitionTable::from_specs(&options.definitions)?);
    Ok(table)
}

/// Hashes everything that influences compilation into a cache key.
pub fn fingerprint(options: &MaskOptions, base: &DefinitionTable) -> Result<u64, MaskError> {
    let mut hasher = DefaultHasher::new();
    let source = serde_json::to_string(&options.mask)
        .map_err(|e| MaskError::SerializationError(e.to_string()))?;
    source.hash(&mut hasher);
    base.hash(&mut hasher);
    options.definitions.hash(&mut hasher);
    options.placeholder.hash(&mut hasher);
    options.syntax_chars().hash(&mut hasher);
    options.casing.hash(&mut hasher);
    options.max_length.hash(&mut hasher);
    options.direction().hash(&mut hasher);
    Ok(hasher.finish())
}

/// A thread-safe cache of compiled masksets.
#[derive(Debug, Default)]
pub struct MasksetCache {
    entries: RwLock<HashMap<u64, Arc<Maskset>>>,
}

lazy_static! {
    /// Process-wide cache used by the convenience constructors.
    static ref DEFAULT_CACHE: MasksetCache = MasksetCache::new();
}

/// The process-wide default cache.
pub fn default_cache() -> &'static MasksetCache {
    &DEFAULT_CACHE
}

impl MasksetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached maskset for `options`, compiling it on a miss.
    ///
    /// Configurations with inline or predicate definitions are compiled every time and
    /// never stored. Failed compilations are never stored.
    pub fn get_or_compile(
        &self,
        options: &MaskOptions,
        base: &DefinitionTable,
    ) -> Result<Arc<Maskset>, MaskError> {
        if options.inline_definitions || !base.is_cacheable() {
            debug!("Configuration is not cacheable; compiling without the cache.");
            return compile(options, base).map(Arc::new);
        }

        let cache_key = fingerprint(options, base)?;
        {
            let cache = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(maskset) = cache.get(&cache_key) {
                debug!("Serving maskset from cache for key: {}", cache_key);
                return Ok(Arc::clone(maskset));
            }
        }

        debug!("Maskset not found in cache. Compiling now.");
        let compiled = Arc::new(compile(options, base)?);

        let mut cache = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let published = cache.entry(cache_key).or_insert(compiled);
        debug!("Cached maskset for key: {}", cache_key);
        Ok(Arc::clone(published))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MaskConfig, MaskSource, MetadataEntry};
    use crate::definitions::DefinitionSpec;

    fn table() -> DefinitionTable {
        MaskConfig::load_default().unwrap().definition_table().unwrap()
    }

    fn compile_pattern(pattern: &str) -> Result<Maskset, MaskError> {
        compile(&MaskOptions::with_mask(pattern), &table())
    }

    #[test]
    fn test_literals_and_placeholders() {
        let maskset = compile_pattern("99/99").unwrap();
        assert_eq!(maskset.len(), 5);
        assert!(maskset.tokens()[2].is_literal());
        assert_eq!(maskset.tokens()[2].literal(), Some('/'));
        assert!(maskset.tokens().iter().all(|t| !t.optional()));
    }

    #[test]
    fn test_bounded_repeat_expands_optional_copies() {
        let maskset = compile_pattern("9{1,3}").unwrap();
        let tokens = maskset.tokens();
        assert_eq!(tokens.len(), 3);
        assert!(!tokens[0].optional());
        assert!(tokens[1].optional() && tokens[2].optional());
        assert_ne!(tokens[1].optional_groups, tokens[2].optional_groups);
        assert!(maskset.layout.repeats.is_empty());
    }

    #[test]
    fn test_unbounded_repeat_registers_group() {
        let maskset = compile_pattern("9{+}").unwrap();
        assert_eq!(maskset.len(), 1);
        let (id, spec) = maskset.layout.repeats.iter().next().unwrap();
        assert_eq!(spec.min, 1);
        assert_eq!(spec.laid, 1);
        assert_eq!(maskset.tokens()[0].repeat, Some(RepeatRef { group: *id, copy: 0 }));

        let star = compile_pattern("9{*}").unwrap();
        assert!(star.tokens()[0].optional());
    }

    #[test]
    fn test_nested_unbounded_repeat_is_rejected() {
        assert!(matches!(
            compile_pattern("(9{*}-){*}"),
            Err(MaskError::NestedUnboundedRepeat(_))
        ));
        assert!(compile_pattern("(9{1,2}-){*}").is_ok());
    }

    #[test]
    fn test_mask_too_long() {
        let mut options = MaskOptions::with_mask("9{300}");
        assert!(matches!(
            compile(&options, &table()),
            Err(MaskError::MaskTooLong { max: 256, .. })
        ));
        options.max_length = 400;
        assert_eq!(compile(&options, &table()).unwrap().len(), 300);
    }

    #[test]
    fn test_multi_pattern_root_alternator() {
        let options = MaskOptions::with_mask(MaskSource::Variants(vec![
            MetadataEntry::new("999"),
            MetadataEntry::new("aa-aa"),
        ]));
        let maskset = compile(&options, &table()).unwrap();
        let root = maskset.root_alternator.unwrap();
        assert_eq!(maskset.layout.alternators[&root], 2);
        assert_eq!(maskset.layout.variant_range(root, 0), Some(0..3));
        assert_eq!(maskset.layout.variant_range(root, 1), Some(3..8));
        assert_eq!(maskset.metadata.as_ref().map(Vec::len), Some(2));
        assert_eq!(maskset.source, "999|aa-aa");
    }

    #[test]
    fn test_multi_char_definition_occupies_cardinality_positions() {
        let mut options = MaskOptions::with_mask("h:9");
        options.definitions.insert(
            'h',
            DefinitionSpec {
                validator: "[01][0-9]|2[0-3]".to_string(),
                cardinality: 2,
                ..Default::default()
            },
        );
        let maskset = compile(&options, &table()).unwrap();
        assert_eq!(maskset.len(), 4);
        assert_eq!(maskset.tokens()[0].chunk(), 0);
        assert_eq!(maskset.tokens()[1].chunk(), 1);
        assert!(maskset.tokens()[2].is_literal());
    }

    #[test]
    fn test_empty_pattern_compiles_to_empty_maskset() {
        assert!(compile_pattern("").unwrap().is_empty());
        assert!(matches!(
            compile(&MaskOptions::default(), &table()),
            Err(MaskError::MissingMask)
        ));
    }

    #[test]
    fn test_cache_shares_equal_configurations() {
        let cache = MasksetCache::new();
        let table = table();
        let a = cache.get_or_compile(&MaskOptions::with_mask("99-99"), &table).unwrap();
        let b = cache.get_or_compile(&MaskOptions::with_mask("99-99"), &table).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        let mut inline = MaskOptions::with_mask("99-99");
        inline.inline_definitions = true;
        let c = cache.get_or_compile(&inline, &table).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*a, *c);
        assert_eq!(cache.len(), 1);

        assert!(cache.get_or_compile(&MaskOptions::with_mask("9)"), &table).is_err());
        assert_eq!(cache.len(), 1);
    }
}
