//! Configuration transformation utilities
//!
//! This module provides the document edits both pipelines are built from:
//! - Overlaying the canonical sections onto an existing document
//! - Merging decoded proxies by name
//! - Ensuring the canonical proxy groups, rules and rule providers exist
//! - Country code to flag emoji conversion

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use serde_yaml::Value;
use tracing::{debug, info};

use crate::config::proxy::Proxy;
use crate::config::util::entry_name;
use crate::config::{
    ClashConfig, DNS, PROXIES, PROXY_GROUPS, PROXY_PROVIDERS, RULE_PROVIDERS, RULES,
};
use crate::preset;

// ============================================================================
// Overlay
// ============================================================================

/// Replace the DNS, proxy-group, rule-provider and rule sections with the
/// canonical ones, leaving every other key untouched.
///
/// Fails before touching the document if it declares no upstream nodes.
pub fn apply_overlay(config: &mut ClashConfig) -> Result<()> {
    if !config.has_upstream() {
        bail!(
            "No proxies found in configuration: both '{}' and '{}' are missing or empty",
            PROXIES,
            PROXY_PROVIDERS
        );
    }

    config.set(DNS, &preset::dns())?;
    config.set(PROXY_GROUPS, &preset::proxy_groups())?;
    config.set(RULE_PROVIDERS, &preset::rule_providers())?;
    config.set(RULES, &preset::rules())?;

    info!(
        "Overlaid {}, {}, {} and {}",
        DNS, PROXY_GROUPS, RULE_PROVIDERS, RULES
    );
    Ok(())
}

// ============================================================================
// Proxy Merge
// ============================================================================

/// Outcome of merging decoded proxies into a document
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Names appended to the proxy list
    pub added: Vec<String>,
    /// Names dropped because a proxy of that name already existed
    pub skipped: Vec<String>,
    /// Length of the proxy list after the merge
    pub total: usize,
}

impl MergeReport {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }

    /// Log the merge outcome
    pub fn log(&self) {
        info!(
            "Proxies: +{} added, {} skipped as duplicates, {} total",
            self.added.len(),
            self.skipped.len(),
            self.total
        );
        for name in &self.added {
            debug!("  + {}", name);
        }
        for name in &self.skipped {
            debug!("  = {} (already present)", name);
        }
    }
}

/// Append `proxies` to the document's proxy list, skipping any whose name is
/// already taken. Existing entries always win, as do earlier entries of the
/// same batch.
pub fn merge_proxies(config: &mut ClashConfig, proxies: Vec<Proxy>) -> Result<MergeReport> {
    let mut merged: Vec<Value> = config.proxies().to_vec();
    let mut names: HashSet<String> = merged
        .iter()
        .filter_map(entry_name)
        .map(str::to_string)
        .collect();

    let mut report = MergeReport::default();
    for proxy in proxies {
        if !names.insert(proxy.name.clone()) {
            report.skipped.push(proxy.name);
            continue;
        }
        let value = proxy
            .to_value()
            .with_context(|| format!("Failed to serialize proxy '{}'", proxy.name))?;
        merged.push(value);
        report.added.push(proxy.name);
    }

    report.total = merged.len();
    config.insert_value(PROXIES, Value::Sequence(merged));
    Ok(report)
}

// ============================================================================
// Group and Default Sections
// ============================================================================

/// Which canonical groups were refreshed in place and which were appended
#[derive(Debug, Clone, Default)]
pub struct GroupReport {
    pub updated: Vec<String>,
    pub appended: Vec<String>,
}

/// Make sure every canonical proxy group is present.
///
/// A group that already exists by name keeps its other settings but has its
/// `proxies` and `include-all` replaced wherever the canonical group sets
/// them. Missing groups are appended in canonical order.
pub fn ensure_groups(config: &mut ClashConfig) -> Result<GroupReport> {
    let mut groups: Vec<Value> = config.proxy_groups().to_vec();
    let mut report = GroupReport::default();

    for canonical in preset::proxy_groups() {
        let name = canonical.name.clone();
        let canonical = serde_yaml::to_value(&canonical)
            .with_context(|| format!("Failed to serialize proxy group '{}'", name))?;

        let existing = groups.iter_mut().find_map(|group| match group {
            Value::Mapping(map)
                if map.get("name").and_then(Value::as_str) == Some(name.as_str()) =>
            {
                Some(map)
            }
            _ => None,
        });

        match existing {
            Some(group) => {
                for key in ["proxies", "include-all"] {
                    if let Some(value) = canonical.get(key) {
                        group.insert(Value::from(key), value.clone());
                    }
                }
                report.updated.push(name);
            }
            None => {
                groups.push(canonical);
                report.appended.push(name);
            }
        }
    }

    info!(
        "Proxy groups: {} refreshed, {} appended",
        report.updated.len(),
        report.appended.len()
    );
    config.insert_value(PROXY_GROUPS, Value::Sequence(groups));
    Ok(report)
}

/// Install the canonical rules and rule providers, but only where the
/// document has no such key at all. Existing lists are never merged into.
pub fn ensure_defaults(config: &mut ClashConfig) -> Result<()> {
    if config.contains_key(RULES) {
        debug!("Keeping existing {}", RULES);
    } else {
        config.set(RULES, &preset::rules())?;
        info!("Added default {}", RULES);
    }

    if config.contains_key(RULE_PROVIDERS) {
        debug!("Keeping existing {}", RULE_PROVIDERS);
    } else {
        config.set(RULE_PROVIDERS, &preset::rule_providers())?;
        info!("Added default {}", RULE_PROVIDERS);
    }

    Ok(())
}

// ============================================================================
// Country Flags
// ============================================================================

/// Convert an ASCII letter (A-Z) to its corresponding Regional Indicator Symbol.
fn letter_to_regional_indicator(c: char) -> Option<char> {
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        // 'A' corresponds to U+1F1E6
        char::from_u32(0x1F1E6 + (upper as u32 - 'A' as u32))
    } else {
        None
    }
}

/// Convert a two-letter country code to a flag emoji.
///
/// For example, "US" becomes "🇺🇸", "JP" becomes "🇯🇵".
pub fn country_code_to_flag(code: &str) -> Option<String> {
    let mut chars = code.chars();
    let (Some(first), Some(second), None) = (chars.next(), chars.next(), chars.next()) else {
        return None;
    };

    let ri1 = letter_to_regional_indicator(first)?;
    let ri2 = letter_to_regional_indicator(second)?;

    Some(format!("{}{}", ri1, ri2))
}

// ============================================================================
// Tests
// ============================================================================
