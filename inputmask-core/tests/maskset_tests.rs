// inputmask-core/tests/maskset_tests.rs
//! Compilation determinism and maskset cache behaviour.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use anyhow::Result;

use inputmask_core::analyser::fingerprint;
use inputmask_core::{
    compile, Definition, DefinitionSpec, DefinitionTable, MaskConfig, MaskError, MaskOptions, MasksetCache,
};

fn table() -> Result<DefinitionTable> {
    Ok(MaskConfig::load_default()?.definition_table()?)
}

#[test]
fn test_compilation_is_deterministic() -> Result<()> {
    let table = table()?;
    for pattern in ["99/99/9999", "(aa|99)[-9{1,3}]", "(9-){+}a", "\\(999\\) 999-9999"] {
        let options = MaskOptions::with_mask(pattern);
        assert_eq!(compile(&options, &table)?, compile(&options, &table)?);
        assert_eq!(fingerprint(&options, &table)?, fingerprint(&options, &table)?);
    }
    Ok(())
}

#[test]
fn test_fingerprint_tracks_compile_relevant_options() -> Result<()> {
    let table = table()?;
    let base = MaskOptions::with_mask("99-99");
    let key = fingerprint(&base, &table)?;

    let mut placeholder = base.clone();
    placeholder.placeholder = "#".to_string();
    assert_ne!(fingerprint(&placeholder, &table)?, key);

    let mut rtl = base.clone();
    rtl.right_to_left = true;
    assert_ne!(fingerprint(&rtl, &table)?, key);

    let mut strict = base.clone();
    strict.strict = true;
    assert_eq!(fingerprint(&strict, &table)?, key);
    Ok(())
}

#[test]
fn test_cache_is_shared_across_threads() -> Result<()> {
    let cache = Arc::new(MasksetCache::new());
    let table = Arc::new(table()?);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let table = Arc::clone(&table);
            thread::spawn(move || cache.get_or_compile(&MaskOptions::with_mask("999-99-9999"), &table))
        })
        .collect();

    let masksets = handles
        .into_iter()
        .map(|handle| handle.join().expect("compile thread panicked"))
        .collect::<Result<Vec<_>, MaskError>>()?;

    assert_eq!(cache.len(), 1);
    let first = &masksets[0];
    assert!(masksets.iter().all(|m| m == first));
    assert!(masksets.iter().all(|m| m.len() == 11));
    Ok(())
}

#[test]
fn test_predicate_definitions_bypass_the_cache() -> Result<()> {
    let cache = MasksetCache::new();
    let mut table = table()?;
    table.insert(Definition::predicate('v', |chunk| "aeiou".contains(chunk)));

    let a = cache.get_or_compile(&MaskOptions::with_mask("v9"), &table)?;
    let b = cache.get_or_compile(&MaskOptions::with_mask("v9"), &table)?;
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(cache.is_empty());
    Ok(())
}

#[test]
fn test_inline_definitions_compile_fresh() -> Result<()> {
    let cache = MasksetCache::new();
    let table = table()?;
    let mut definitions = BTreeMap::new();
    definitions.insert(
        'x',
        DefinitionSpec {
            validator: "[xX]".to_string(),
            ..Default::default()
        },
    );
    let mut options = MaskOptions::with_mask("x9");
    options.definitions = definitions;
    options.inline_definitions = true;

    let maskset = cache.get_or_compile(&options, &table)?;
    assert!(maskset.tokens()[0].is_placeholder());
    assert!(cache.is_empty());

    cache.get_or_compile(&MaskOptions::with_mask("x9"), &table)?;
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
    Ok(())
}

#[test]
fn test_compile_errors_are_not_cached() -> Result<()> {
    let cache = MasksetCache::new();
    let table = table()?;
    for pattern in ["[99", "99\\", "9{2,1}", "(9{*}){+}"] {
        assert!(cache.get_or_compile(&MaskOptions::with_mask(pattern), &table).is_err());
    }
    assert!(cache.is_empty());
    Ok(())
}
