//! Rule provider declarations.
//!
//! A rule provider names an externally maintained rule list that the proxy
//! client downloads and refreshes on its own. This crate only declares them.

use serde::{Deserialize, Serialize};

/// A `rule-providers` entry
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RuleProvider {
    /// Where the rule list comes from
    #[serde(rename = "type")]
    pub provider_type: ProviderType,

    /// On-disk format of the rule list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<RuleFormat>,

    /// Refresh interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,

    /// How each payload line is interpreted
    pub behavior: ProviderBehavior,

    /// Source URL, required for `http` providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local cache path
    pub path: String,
}

impl RuleProvider {
    /// Create an HTTP provider refreshed every `interval` seconds
    pub fn http(behavior: ProviderBehavior, url: &str, path: &str, interval: u32) -> Self {
        Self {
            provider_type: ProviderType::Http,
            format: Some(RuleFormat::Yaml),
            interval: Some(interval),
            behavior,
            url: Some(url.to_string()),
            path: path.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Http,
    File,
    Inline,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleFormat {
    Yaml,
    Text,
    Mrs,
}

/// Interpretation of a provider's payload
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBehavior {
    /// Plain domains and `+.` wildcards
    Domain,
    /// CIDR blocks
    IpCidr,
    /// Full rule lines such as `DOMAIN-SUFFIX,example.com`
    Classical,
}
