// File: inputmask-core/src/engine.rs
//! The mask handle used by applications.
//!
//! A `Mask` bundles a compiled maskset, the options it was resolved from and the host
//! hooks. It exposes the operations a UI binding or a batch tool needs: templates,
//! incremental input, formatting, validity checks and unmasking. The `MaskHooks` trait is
//! the seam through which a host pre-processes raw input and post-processes buffers.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::aliases::PatternSpec;
use crate::analyser::compiler::{default_cache, MasksetCache};
use crate::buffer::{Buffer, Direction};
use crate::config::{MaskConfig, MaskOptions, MetadataEntry};
use crate::definitions::DefinitionTable;
use crate::errors::MaskError;
use crate::maskset::Maskset;
use crate::validation::CheckOutcome;

/// Host callbacks around validation.
///
/// Both methods have no-op defaults, so implementors only override what they need.
pub trait MaskHooks: Send + Sync {
    /// Rewrites raw input before it is validated. `None` keeps the input unchanged.
    fn before_mask(&self, _value: &str, _options: &MaskOptions) -> Option<String> {
        None
    }

    /// Adjusts a buffer after validation, before it is handed back to the host.
    fn before_write(&self, _buffer: &mut Buffer, _options: &MaskOptions) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl MaskHooks for NoHooks {}

/// A formatted value and, for multi-pattern masks, the metadata of the pattern it matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Formatted {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataEntry>,
}

#[derive(Clone)]
pub struct Mask {
    maskset: Arc<Maskset>,
    options: MaskOptions,
    hooks: Arc<dyn MaskHooks>,
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mask")
            .field("mask", &self.maskset.source)
            .field("positions", &self.maskset.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Mask {
    /// Compiles `options` through the process-wide maskset cache.
    pub fn new(options: MaskOptions, definitions: &DefinitionTable) -> Result<Self, MaskError> {
        Self::with_cache(options, definitions, default_cache())
    }

    /// Compiles `options` through an explicitly provided cache.
    pub fn with_cache(
        options: MaskOptions,
        definitions: &DefinitionTable,
        cache: &MasksetCache,
    ) -> Result<Self, MaskError> {
        let maskset = cache.get_or_compile(&options, definitions)?;
        Ok(Self {
            maskset,
            options,
            hooks: Arc::new(NoHooks),
        })
    }

    /// Resolves `spec` against the aliases and defaults of `config`, then compiles it.
    pub fn from_config(spec: &PatternSpec, config: &MaskConfig) -> Result<Self, MaskError> {
        let options = config
            .alias_registry()
            .resolve(spec, &config.base_options())?;
        Self::new(options, &config.definition_table()?)
    }

    pub fn with_hooks<H: MaskHooks + 'static>(mut self, hooks: H) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn maskset(&self) -> &Arc<Maskset> {
        &self.maskset
    }

    pub fn options(&self) -> &MaskOptions {
        &self.options
    }

    /// A fresh template buffer.
    pub fn buffer(&self) -> Buffer {
        Buffer::new(Arc::clone(&self.maskset))
    }

    /// The rendered template.
    pub fn empty_mask(&self) -> String {
        self.buffer().render()
    }

    fn prepare(&self, value: &str) -> Vec<char> {
        match self.hooks.before_mask(value, &self.options) {
            Some(rewritten) => {
                debug!("before_mask rewrote '{}' to '{}'.", value, rewritten);
                rewritten.chars().collect()
            }
            None => value.chars().collect(),
        }
    }

    /// Applies typed or pasted `text` at `caret`, using the configured strictness.
    pub fn input(&self, buffer: &mut Buffer, caret: usize, text: &str) -> CheckOutcome {
        let chars = self.prepare(text);
        let outcome = buffer.check_val(caret, self.options.strict, &chars);
        self.hooks.before_write(buffer, &self.options);
        outcome
    }

    /// Validates `value` strictly into a fresh buffer.
    fn fill_strict(&self, value: &str) -> (Buffer, CheckOutcome) {
        let mut buffer = self.buffer();
        let chars = self.prepare(value);
        let outcome = buffer.check_val(0, true, &chars);
        (buffer, outcome)
    }

    /// Formats `value` into the mask's shape, in logical order. Right-to-left masks only
    /// reverse `render()` and `empty_mask()`.
    pub fn format(&self, value: &str) -> Formatted {
        let (filled, _) = self.fill_strict(value);
        let mut buffer = filled.clear_optional_tail();
        self.hooks.before_write(&mut buffer, &self.options);
        Formatted {
            value: buffer.to_string_with(Direction::LeftToRight),
            metadata: self.metadata(&buffer),
        }
    }

    /// True when `value` fills the mask completely and is already in its formatted shape.
    pub fn is_valid(&self, value: &str) -> bool {
        let (filled, outcome) = self.fill_strict(value);
        if !outcome.success {
            return false;
        }
        let trimmed = filled.clear_optional_tail();
        trimmed.is_complete() && trimmed.to_string_with(Direction::LeftToRight) == value
    }

    /// The unmasked form of `value`, validated leniently.
    pub fn unmask_value(&self, value: &str) -> String {
        let mut buffer = self.buffer();
        let chars = self.prepare(value);
        buffer.check_val(0, false, &chars);
        buffer.unmask(&self.options)
    }

    /// The unmasked form of an existing buffer.
    pub fn unmask(&self, buffer: &Buffer) -> String {
        buffer.unmask(&self.options)
    }

    /// Metadata of the pattern `buffer` currently uses; the first entry when no
    /// pattern has been chosen yet.
    pub fn metadata(&self, buffer: &Buffer) -> Option<MetadataEntry> {
        let entries = self.maskset.metadata.as_ref()?;
        let variant = self
            .maskset
            .root_alternator
            .and_then(|group| buffer.active_variant(group))
            .unwrap_or(0);
        entries.get(variant).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MaskOverrides, MaskSource};

    fn config() -> MaskConfig {
        MaskConfig::load_default().unwrap()
    }

    #[test]
    fn test_format_and_validate_alias() {
        let mask = Mask::from_config(&"date".into(), &config()).unwrap();
        assert_eq!(mask.empty_mask(), "dd/mm/yyyy");
        assert_eq!(mask.format("01022024").value, "01/02/2024");
        assert!(mask.is_valid("01/02/2024"));
        assert!(!mask.is_valid("01022024"));
        assert!(!mask.is_valid("01/02/20"));
        assert_eq!(mask.unmask_value("01/02/2024"), "01/02/2024");
    }

    #[test]
    fn test_right_to_left_values_stay_in_logical_order() {
        let mut options = MaskOptions::with_mask("99-99");
        options.right_to_left = true;
        let mask = Mask::new(options, &config().definition_table().unwrap()).unwrap();

        let formatted = mask.format("1234").value;
        assert_eq!(formatted, "12-34");
        assert!(mask.is_valid(&formatted));
        assert!(!mask.is_valid("43-21"));
        assert_eq!(mask.empty_mask(), "__-__");

        let mut buffer = mask.buffer();
        mask.input(&mut buffer, 0, "1234");
        assert_eq!(buffer.render(), "43-21");
    }

    #[test]
    fn test_repeat_before_required_digit_validates() {
        let mask = Mask::from_config(&"9{+}9".into(), &config()).unwrap();
        assert!(mask.is_valid("123"));
        assert!(mask.is_valid("12"));
        assert!(!mask.is_valid("1"));
        assert_eq!(mask.format("12345").value, "12345");
    }

    #[test]
    fn test_metadata_follows_matched_pattern() {
        let mask = Mask::from_config(&"date-iso-or-dmy".into(), &config()).unwrap();
        let iso = mask.format("2024-02-01");
        assert_eq!(iso.value, "2024-02-01");
        assert_eq!(iso.metadata.unwrap().extra["format"], "iso");

        let dmy = mask.format("01/02/2024");
        assert_eq!(dmy.value, "01/02/2024");
        assert_eq!(dmy.metadata.unwrap().extra["format"], "dmy");
    }

    struct DigitsOnly;

    impl MaskHooks for DigitsOnly {
        fn before_mask(&self, value: &str, _options: &MaskOptions) -> Option<String> {
            Some(value.chars().filter(char::is_ascii_digit).collect())
        }
    }

    #[test]
    fn test_before_mask_hook() {
        let options = MaskOptions::with_mask(MaskSource::Pattern("999-9999".to_string()));
        let mask = Mask::from_config(&PatternSpec::Inline(MaskOverrides::mask("999-9999")), &config())
            .unwrap()
            .with_hooks(DigitsOnly);
        assert_eq!(mask.options().mask, options.mask);
        assert_eq!(mask.format("55 5 12x34").value, "555-1234");
    }

    #[test]
    fn test_input_uses_configured_strictness() {
        let strict = MaskOverrides {
            mask: Some("9a9".into()),
            strict: Some(true),
            ..Default::default()
        };
        let mask = Mask::from_config(&PatternSpec::Inline(strict), &config()).unwrap();
        let mut buffer = mask.buffer();
        assert!(!mask.input(&mut buffer, 0, "12").success);

        let lenient = Mask::from_config(&"9a9".into(), &config()).unwrap();
        let mut buffer = lenient.buffer();
        assert!(lenient.input(&mut buffer, 0, "12").success);
        assert_eq!(buffer.render(), "1_2");
    }
}
