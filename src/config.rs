use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::config::util::{as_slice, entry_name, is_truthy};

pub mod dns;
pub mod proxy;
pub mod proxy_group;
pub mod rule;
pub mod rule_provider;
pub mod util;
pub mod validation;

// ============================================================================
// Top-level Keys
// ============================================================================

pub const PROXIES: &str = "proxies";
pub const PROXY_PROVIDERS: &str = "proxy-providers";
pub const PROXY_GROUPS: &str = "proxy-groups";
pub const RULES: &str = "rules";
pub const RULE_PROVIDERS: &str = "rule-providers";
pub const DNS: &str = "dns";

/// Clash configuration document
///
/// The document is held as an insertion-ordered YAML mapping rather than a
/// typed struct so that keys this crate knows nothing about are written back
/// unchanged and in their original position. Sections the pipelines generate
/// are built from the typed structs in the submodules and inserted as values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClashConfig {
    root: Mapping,
}

impl ClashConfig {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document builder
    pub fn builder() -> ClashConfigBuilder {
        ClashConfigBuilder::new()
    }

    /// Parse a document from YAML text
    ///
    /// An empty file (or a bare `null`) yields an empty document. Anything
    /// other than a mapping at the top level is rejected.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml).context("Failed to parse YAML document")?;
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(root) => Ok(Self { root }),
            other => bail!(
                "Expected a mapping at the top level of the document, found {}",
                value_kind(&other)
            ),
        }
    }

    /// Serialize the document to YAML, keeping key order and non-ASCII text as is
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.root)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Set a top-level key. An existing key keeps its position.
    pub fn insert_value(&mut self, key: &str, value: Value) {
        self.root.insert(Value::String(key.to_string()), value);
    }

    /// Serialize `value` and set it under `key`
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_yaml::to_value(value)
            .with_context(|| format!("Failed to serialize section '{}'", key))?;
        self.insert_value(key, value);
        Ok(())
    }

    /// Top-level keys in document order
    pub fn keys(&self) -> Vec<&str> {
        self.root.keys().filter_map(Value::as_str).collect()
    }

    /// Whether the document declares at least one upstream node, either
    /// inline under `proxies` or through `proxy-providers`
    pub fn has_upstream(&self) -> bool {
        [PROXIES, PROXY_PROVIDERS]
            .iter()
            .any(|key| self.get(key).is_some_and(is_truthy))
    }

    /// Entries of the `proxies` list; empty when absent or not a list
    pub fn proxies(&self) -> &[Value] {
        as_slice(self.get(PROXIES))
    }

    /// Entries of the `proxy-groups` list; empty when absent or not a list
    pub fn proxy_groups(&self) -> &[Value] {
        as_slice(self.get(PROXY_GROUPS))
    }

    /// Names of all proxies, in list order
    pub fn proxy_names(&self) -> Vec<&str> {
        self.proxies().iter().filter_map(entry_name).collect()
    }

    /// Names of all proxy groups, in list order
    pub fn group_names(&self) -> Vec<&str> {
        self.proxy_groups().iter().filter_map(entry_name).collect()
    }

    /// Names declared under `rule-providers`
    pub fn rule_provider_names(&self) -> Vec<&str> {
        match self.get(RULE_PROVIDERS) {
            Some(Value::Mapping(map)) => map.keys().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Names declared under `proxy-providers`
    pub fn proxy_provider_names(&self) -> Vec<&str> {
        match self.get(PROXY_PROVIDERS) {
            Some(Value::Mapping(map)) => map.keys().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Builder for ClashConfig
#[derive(Default)]
pub struct ClashConfigBuilder {
    config: ClashConfig,
}

impl ClashConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar or pre-built value
    pub fn value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert_value(key, value.into());
        self
    }

    /// Set a typed section
    pub fn section<T: Serialize>(mut self, key: &str, section: &T) -> Result<Self> {
        self.config.set(key, section)?;
        Ok(self)
    }

    /// Build the document
    pub fn build(self) -> ClashConfig {
        self.config
    }
}
