use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// DNS section of a Clash configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Dns {
    /// Enable the built-in DNS server
    pub enable: bool,

    /// Listen address of the DNS server, e.g. `0.0.0.0:1053`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,

    /// Answer AAAA queries
    #[serde(default)]
    pub ipv6: bool,

    /// Consult the system hosts file
    #[serde(default)]
    pub use_system_hosts: bool,

    /// Cache eviction algorithm, `lru` or `arc`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_algorithm: Option<String>,

    /// `fake-ip` or `redir-host`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_mode: Option<EnhancedMode>,

    /// Address pool handed out in fake-ip mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fake_ip_range: Option<String>,

    /// Domains that always get real addresses in fake-ip mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fake_ip_filter: Vec<String>,

    /// Plain resolvers used to bootstrap the DoH servers below
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_nameserver: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameserver: Vec<String>,

    /// Resolvers used for proxy server hostnames
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxy_server_nameserver: Vec<String>,

    /// Per-domain-set resolver overrides, in match order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub nameserver_policy: IndexMap<String, Vec<String>>,
}

/// DNS enhanced mode
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EnhancedMode {
    FakeIp,
    RedirHost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_kebab_case_keys() {
        let dns = Dns {
            enable: true,
            listen: Some("0.0.0.0:1053".to_string()),
            ipv6: false,
            use_system_hosts: false,
            cache_algorithm: None,
            enhanced_mode: Some(EnhancedMode::FakeIp),
            fake_ip_range: Some("198.18.0.1/16".to_string()),
            fake_ip_filter: vec!["+.lan".to_string()],
            default_nameserver: vec![],
            nameserver: vec!["223.5.5.5".to_string()],
            proxy_server_nameserver: vec![],
            nameserver_policy: IndexMap::new(),
        };
        let yaml = serde_yaml::to_string(&dns).unwrap();
        assert!(yaml.contains("use-system-hosts: false"));
        assert!(yaml.contains("enhanced-mode: fake-ip"));
        assert!(yaml.contains("fake-ip-range: 198.18.0.1/16"));
        assert!(!yaml.contains("cache-algorithm"));
        assert!(!yaml.contains("nameserver-policy"));
    }

    #[test]
    fn test_dns_policy_keeps_order() {
        let yaml = r#"
enable: true
nameserver-policy:
  "geosite:private": [a]
  "geosite:gfw": [b]
"#;
        let dns: Dns = serde_yaml::from_str(yaml).unwrap();
        let keys: Vec<&String> = dns.nameserver_policy.keys().collect();
        assert_eq!(keys, vec!["geosite:private", "geosite:gfw"]);
    }
}
