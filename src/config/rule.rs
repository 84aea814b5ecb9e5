//! Routing rules in their comma-separated Clash form.
//!
//! Rules are evaluated top to bottom by the proxy client. Here they are only
//! built, parsed back for linting, and written out.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const NO_RESOLVE: &str = "no-resolve";

// ============================================================================
// Rule Types
// ============================================================================

/// Matcher kind of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Domain,
    DomainSuffix,
    DomainKeyword,
    RuleSet,
    GeoIp,
    IpCidr,
    IpCidr6,
    /// Catch-all, takes no payload
    Match,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Domain => "DOMAIN",
            RuleKind::DomainSuffix => "DOMAIN-SUFFIX",
            RuleKind::DomainKeyword => "DOMAIN-KEYWORD",
            RuleKind::RuleSet => "RULE-SET",
            RuleKind::GeoIp => "GEOIP",
            RuleKind::IpCidr => "IP-CIDR",
            RuleKind::IpCidr6 => "IP-CIDR6",
            RuleKind::Match => "MATCH",
        }
    }
}

impl FromStr for RuleKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DOMAIN" => Ok(RuleKind::Domain),
            "DOMAIN-SUFFIX" => Ok(RuleKind::DomainSuffix),
            "DOMAIN-KEYWORD" => Ok(RuleKind::DomainKeyword),
            "RULE-SET" => Ok(RuleKind::RuleSet),
            "GEOIP" => Ok(RuleKind::GeoIp),
            "IP-CIDR" => Ok(RuleKind::IpCidr),
            "IP-CIDR6" => Ok(RuleKind::IpCidr6),
            "MATCH" | "FINAL" => Ok(RuleKind::Match),
            other => Err(anyhow!("Unsupported rule type: {}", other)),
        }
    }
}

/// A single routing rule, e.g. `RULE-SET,cncidr,DIRECT,no-resolve`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    /// Domain, rule-set name, country code or CIDR; `None` for `MATCH`
    pub payload: Option<String>,
    /// Proxy group, proxy, or built-in policy the rule routes to
    pub target: String,
    /// Skip DNS resolution when matching IP-based rules
    pub no_resolve: bool,
}

impl Rule {
    fn with_payload(kind: RuleKind, payload: &str, target: &str) -> Self {
        Self {
            kind,
            payload: Some(payload.to_string()),
            target: target.to_string(),
            no_resolve: false,
        }
    }

    pub fn domain(domain: &str, target: &str) -> Self {
        Self::with_payload(RuleKind::Domain, domain, target)
    }

    pub fn domain_suffix(suffix: &str, target: &str) -> Self {
        Self::with_payload(RuleKind::DomainSuffix, suffix, target)
    }

    pub fn rule_set(provider: &str, target: &str) -> Self {
        Self::with_payload(RuleKind::RuleSet, provider, target)
    }

    pub fn geoip(code: &str, target: &str) -> Self {
        Self::with_payload(RuleKind::GeoIp, code, target)
    }

    pub fn catch_all(target: &str) -> Self {
        Self {
            kind: RuleKind::Match,
            payload: None,
            target: target.to_string(),
            no_resolve: false,
        }
    }

    /// Mark the rule `no-resolve`
    pub fn no_resolve(mut self) -> Self {
        self.no_resolve = true;
        self
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())?;
        if let Some(payload) = &self.payload {
            write!(f, ",{}", payload)?;
        }
        write!(f, ",{}", self.target)?;
        if self.no_resolve {
            write!(f, ",{}", NO_RESOLVE)?;
        }
        Ok(())
    }
}

impl FromStr for Rule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let kind: RuleKind = parts[0].parse()?;

        let (payload, rest) = if kind == RuleKind::Match {
            (None, &parts[1..])
        } else {
            let payload = parts
                .get(1)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| anyhow!("Rule '{}' is missing its payload", s))?;
            (Some(payload.to_string()), parts.get(2..).unwrap_or_default())
        };

        let target = rest
            .first()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("Rule '{}' is missing its target", s))?;

        let mut no_resolve = false;
        for option in &rest[1..] {
            if option.eq_ignore_ascii_case(NO_RESOLVE) {
                no_resolve = true;
            } else {
                bail!("Unknown option '{}' in rule '{}'", option, s);
            }
        }

        Ok(Self {
            kind,
            payload,
            target: target.to_string(),
            no_resolve,
        })
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(
            Rule::domain_suffix("github.io", "Proxy").to_string(),
            "DOMAIN-SUFFIX,github.io,Proxy"
        );
        assert_eq!(
            Rule::rule_set("cncidr", "DIRECT").no_resolve().to_string(),
            "RULE-SET,cncidr,DIRECT,no-resolve"
        );
        assert_eq!(Rule::catch_all("Final").to_string(), "MATCH,Final");
    }

    #[test]
    fn test_parse_with_no_resolve() {
        let rule: Rule = "GEOIP,CN,DIRECT,no-resolve".parse().unwrap();
        assert_eq!(rule.kind, RuleKind::GeoIp);
        assert_eq!(rule.payload.as_deref(), Some("CN"));
        assert_eq!(rule.target, "DIRECT");
        assert!(rule.no_resolve);
    }

    #[test]
    fn test_parse_match() {
        let rule: Rule = "MATCH,漏网之鱼".parse().unwrap();
        assert_eq!(rule.kind, RuleKind::Match);
        assert!(rule.payload.is_none());
        assert_eq!(rule.target, "漏网之鱼");
    }

    #[test]
    fn test_parse_lowercase_kind() {
        let rule: Rule = "domain-suffix,example.com,Proxy".parse().unwrap();
        assert_eq!(rule.kind, RuleKind::DomainSuffix);
    }

    #[test]
    fn test_parse_rejects_incomplete_rules() {
        assert!("DOMAIN,example.com".parse::<Rule>().is_err());
        assert!("MATCH".parse::<Rule>().is_err());
        assert!("RULE-SET,,Proxy".parse::<Rule>().is_err());
    }

    #[test]
    fn test_parse_rejects_logical_rules() {
        assert!("AND,((DOMAIN,a.com),(NETWORK,UDP)),REJECT".parse::<Rule>().is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_option() {
        assert!("IP-CIDR,10.0.0.0/8,DIRECT,src".parse::<Rule>().is_err());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let rules = vec![Rule::geoip("LAN", "DIRECT").no_resolve()];
        let yaml = serde_yaml::to_string(&rules).unwrap();
        assert_eq!(yaml, "- GEOIP,LAN,DIRECT,no-resolve\n");
        let back: Vec<Rule> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, rules);
    }
}
