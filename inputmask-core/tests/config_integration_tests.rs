// inputmask-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use inputmask_core::config::{self, MaskConfig, MaskSource};
use inputmask_core::{Mask, PatternSpec};

#[test]
fn test_load_default_config() {
    let config = MaskConfig::load_default().unwrap();
    assert_eq!(config.definitions.len(), 3);
    assert!(config.aliases.contains_key("phone-us"));
    assert_eq!(config.defaults.placeholder.as_deref(), Some("_"));
}

#[test]
fn test_load_from_file() -> Result<()> {
    let yaml_content = r#"
definitions:
  "h":
    validator: "[0-9A-Fa-f]"
    casing: upper
aliases:
  mac:
    mask: "hh:hh:hh:hh:hh:hh"
  order-id:
    mask: ["AA-9999", "9999"]
defaults:
  placeholder: "-"
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let user = MaskConfig::load_from_file(file.path())?;
    assert_eq!(user.definitions.len(), 1);
    assert_eq!(
        user.aliases["order-id"].mask,
        Some(MaskSource::Patterns(vec!["AA-9999".to_string(), "9999".to_string()]))
    );

    let merged = config::merge_configs(MaskConfig::load_default()?, Some(user));
    assert_eq!(merged.definitions.len(), 4);
    assert!(merged.aliases.contains_key("date"));
    assert!(merged.aliases.contains_key("mac"));

    let mask = Mask::from_config(&PatternSpec::from("mac"), &merged)?;
    assert_eq!(mask.empty_mask(), "--:--:--:--:--:--");
    assert_eq!(mask.format("a1b2c3d4e5f6").value, "A1:B2:C3:D4:E5:F6");
    Ok(())
}

#[test]
fn test_load_from_file_rejects_invalid_definitions() -> Result<()> {
    let yaml_content = r#"
definitions:
  "x":
    validator: "[0-9"
  "y":
    validator: "[0-9]{2}"
    cardinality: 2
    prevalidators: ["[0-9]", "[0-9]"]
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let err = MaskConfig::load_from_file(file.path()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Configuration validation failed"));
    assert!(message.contains("definition 'x'"));
    assert!(message.contains("Invalid definition 'y'"));
    Ok(())
}

#[test]
fn test_load_from_missing_file_has_context() {
    let err = MaskConfig::load_from_file("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_load_config_by_path() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"aliases:\n  pin:\n    mask: \"9999\"\n")?;
    let path = file.path().to_string_lossy().to_string();
    let config = config::load_config_by_name(&path)?;
    assert!(config.aliases.contains_key("pin"));
    assert!(config::load_config_by_name("no-such-inputmask-config").is_err());
    Ok(())
}

#[test]
fn test_candidate_paths_end_with_yaml_name() {
    let paths = config::config_candidate_paths("masks");
    assert!(!paths.is_empty());
    assert!(paths.iter().all(|p| p.ends_with("masks.yaml")));
}
