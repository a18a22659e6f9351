// inputmask/src/commands/aliases.rs
//! `inputmask aliases`: lists the aliases known to the active configuration.
//! License: MIT OR APACHE 2.0

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use inputmask_core::{MaskConfig, MaskOverrides};

use crate::cli::AliasesCommand;

#[derive(Serialize)]
struct AliasSummary<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    patterns: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    definitions: Vec<char>,
}

fn summarize<'a>(name: &'a str, overrides: &'a MaskOverrides) -> AliasSummary<'a> {
    AliasSummary {
        name,
        patterns: overrides.mask.as_ref().map(|m| m.patterns()).unwrap_or_default(),
        alias: overrides.alias.as_deref(),
        definitions: overrides.definitions.keys().copied().collect(),
    }
}

pub fn run_aliases<W: Write>(cmd: &AliasesCommand, config: &MaskConfig, out: &mut W) -> Result<()> {
    let registry = config.alias_registry();
    let summaries: Vec<_> = registry.iter().map(|(name, o)| summarize(name, o)).collect();

    if cmd.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summaries)?)?;
        return Ok(());
    }

    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for summary in &summaries {
        let mut description = summary.patterns.join(" | ");
        if let Some(base) = summary.alias {
            if !description.is_empty() {
                description.push(' ');
            }
            description.push_str(&format!("(extends {})", base));
        }
        writeln!(out, "{:width$}  {}", summary.name, description, width = width)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_builtin_aliases() {
        let config = MaskConfig::load_default().unwrap();
        let mut out = Vec::new();
        run_aliases(&AliasesCommand { json: false }, &config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().any(|l| l.starts_with("date ") && l.ends_with("99/99/9999")));
        assert!(text.contains("ipv4"));
    }

    #[test]
    fn test_json_lists_extends() {
        let mut config = MaskConfig::load_default().unwrap();
        config.aliases.insert(
            "birthday".to_string(),
            MaskOverrides {
                alias: Some("date".to_string()),
                ..Default::default()
            },
        );
        let mut out = Vec::new();
        run_aliases(&AliasesCommand { json: true }, &config, &mut out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let birthday = parsed
            .as_array()
            .unwrap()
            .iter()
            .find(|entry| entry["name"] == "birthday")
            .unwrap();
        assert_eq!(birthday["alias"], "date");
        assert!(birthday.get("patterns").is_none());
    }
}
