//! Proxy group definitions.

use serde::{Deserialize, Serialize};

/// A `proxy-groups` entry
///
/// Field order follows the layout Clash Verge writes: health-check block
/// first, then identity, then membership.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyGroup {
    #[serde(flatten)]
    pub health_check: HealthCheck,

    /// HTTP status the probe must return, e.g. `"200"` or `"200-299"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<String>,

    pub name: String,

    #[serde(rename = "type")]
    pub group_type: GroupType,

    /// Latency difference (ms) below which `url-test` keeps its current pick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<LoadBalanceStrategy>,

    /// Explicit members: proxy names, group names, or built-ins like `DIRECT`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxies: Option<Vec<String>>,

    /// Pull in every proxy and provider of the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_all: Option<bool>,

    /// Regex applied to proxy names pulled in by `include-all`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ProxyGroup {
    /// Create a group with the given health check and no members
    pub fn new(name: &str, group_type: GroupType, health_check: HealthCheck) -> Self {
        Self {
            health_check,
            expected_status: None,
            name: name.to_string(),
            group_type,
            tolerance: None,
            strategy: None,
            proxies: None,
            include_all: None,
            filter: None,
            icon: None,
        }
    }

    pub fn with_proxies(mut self, proxies: &[&str]) -> Self {
        self.proxies = Some(proxies.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn include_all(mut self) -> Self {
        self.include_all = Some(true);
        self
    }

    pub fn with_strategy(mut self, strategy: LoadBalanceStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_filter(mut self, filter: String) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_expected_status(mut self, status: &str) -> Self {
        self.expected_status = Some(status.to_string());
        self
    }

    pub fn with_icon(mut self, icon: String) -> Self {
        self.icon = Some(icon);
        self
    }
}

/// Health-check parameters shared by every group
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HealthCheck {
    /// Probe interval in seconds
    pub interval: u32,

    /// Probe timeout in milliseconds
    pub timeout: u32,

    /// Probe URL
    pub url: String,

    /// Only probe while the group is in use
    pub lazy: bool,

    /// Failures before a member is marked down
    pub max_failed_times: u32,

    /// Hide the group from the dashboard
    pub hidden: bool,
}

/// Selection strategy of a group
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GroupType {
    /// Manual choice
    Select,
    /// Lowest latency
    UrlTest,
    /// First healthy member
    Fallback,
    LoadBalance,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalanceStrategy {
    ConsistentHashing,
    RoundRobin,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health_check() -> HealthCheck {
        HealthCheck {
            interval: 300,
            timeout: 3000,
            url: "https://www.google.com/generate_204".to_string(),
            lazy: true,
            max_failed_times: 3,
            hidden: false,
        }
    }

    #[test]
    fn test_group_serializes_health_check_first() {
        let group = ProxyGroup::new("auto", GroupType::UrlTest, health_check())
            .with_tolerance(100)
            .include_all();
        let yaml = serde_yaml::to_string(&group).unwrap();
        let keys: Vec<&str> = yaml
            .lines()
            .filter_map(|line| line.split(':').next())
            .collect();
        assert_eq!(
            keys,
            vec![
                "interval",
                "timeout",
                "url",
                "lazy",
                "max-failed-times",
                "hidden",
                "name",
                "type",
                "tolerance",
                "include-all"
            ]
        );
        assert!(yaml.contains("type: url-test"));
    }

    #[test]
    fn test_load_balance_strategy_names() {
        let group = ProxyGroup::new("lb", GroupType::LoadBalance, health_check())
            .with_strategy(LoadBalanceStrategy::ConsistentHashing);
        let yaml = serde_yaml::to_string(&group).unwrap();
        assert!(yaml.contains("type: load-balance"));
        assert!(yaml.contains("strategy: consistent-hashing"));
    }

    #[test]
    fn test_group_roundtrip_from_yaml() {
        let yaml = r#"
interval: 300
timeout: 3000
url: https://www.google.com/generate_204
lazy: true
max-failed-times: 3
hidden: false
name: blocker
type: select
proxies: [REJECT, DIRECT]
"#;
        let group: ProxyGroup = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(group.name, "blocker");
        assert_eq!(group.group_type, GroupType::Select);
        assert_eq!(
            group.proxies,
            Some(vec!["REJECT".to_string(), "DIRECT".to_string()])
        );
        assert!(group.include_all.is_none());
        assert_eq!(group.health_check, health_check());
    }
}
