//! Configuration linting module.
//!
//! This module checks a generated Clash document for dangling references
//! and duplicate names before it is written. Findings are reported as
//! warnings; the proxy client itself is the final judge.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use crate::config::rule::{Rule, RuleKind};
use crate::config::util::{as_slice, entry_name, string_items};
use crate::config::{ClashConfig, RULES};

/// Policies every Clash core understands without a declaration.
pub const BUILTIN_TARGETS: &[&str] = &["DIRECT", "REJECT", "REJECT-DROP", "PASS", "COMPATIBLE"];

// ============================================================================
// Error Types
// ============================================================================

/// Configuration lint finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintError {
    /// Two proxies share a name; only the first is reachable.
    DuplicateProxyName {
        /// The duplicated name.
        name: String,
    },

    /// Two proxy groups share a name.
    DuplicateGroupName {
        /// The duplicated name.
        name: String,
    },

    /// A rule routes to a policy that is neither a proxy, a group nor a built-in.
    UnknownRuleTarget {
        /// The rule index (0-based).
        rule_index: usize,
        /// The referenced target.
        target: String,
    },

    /// A `RULE-SET` rule names a provider missing from `rule-providers`.
    RuleProviderNotFound {
        /// The rule index (0-based).
        rule_index: usize,
        /// The referenced provider name.
        provider: String,
    },

    /// A group lists a member that is neither a proxy, a group nor a built-in.
    UnknownGroupMember {
        /// The group holding the reference.
        group: String,
        /// The referenced member.
        member: String,
    },

    /// A group's `use` list names a provider missing from `proxy-providers`.
    ProxyProviderNotFound {
        /// The group holding the reference.
        group: String,
        /// The referenced provider name.
        provider: String,
    },
}

impl fmt::Display for LintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateProxyName { name } => write!(f, "duplicate proxy name '{name}'"),
            Self::DuplicateGroupName { name } => write!(f, "duplicate proxy group name '{name}'"),
            Self::UnknownRuleTarget { rule_index, target } => {
                let rule_num = rule_index + 1;
                write!(f, "rule #{rule_num} routes to unknown policy '{target}'")
            }
            Self::RuleProviderNotFound {
                rule_index,
                provider,
            } => {
                let rule_num = rule_index + 1;
                write!(
                    f,
                    "rule #{rule_num} references undeclared rule provider '{provider}'"
                )
            }
            Self::UnknownGroupMember { group, member } => {
                write!(f, "proxy group '{group}' lists unknown member '{member}'")
            }
            Self::ProxyProviderNotFound { group, provider } => {
                write!(
                    f,
                    "proxy group '{group}' uses undeclared proxy provider '{provider}'"
                )
            }
        }
    }
}

impl std::error::Error for LintError {}

// ============================================================================
// Validation Result
// ============================================================================

/// Result of linting a document.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Findings in discovery order.
    pub errors: Vec<LintError>,
}

impl ValidationResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if linting found nothing.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn add_error(&mut self, error: LintError) {
        self.errors.push(error);
    }

    /// Log all findings as warnings.
    pub fn log_warnings(&self) {
        for error in &self.errors {
            warn!(error = %error, "configuration lint");
        }
    }
}

// ============================================================================
// Validation Implementation
// ============================================================================

impl ClashConfig {
    /// Lint the document.
    ///
    /// Checks performed:
    /// - proxy and group name uniqueness
    /// - rule targets resolve to a proxy, group or built-in policy
    /// - `RULE-SET` rules name a declared rule provider
    /// - explicit group members resolve
    /// - providers in a group's `use` list are declared
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        debug!("starting configuration lint");

        let proxies = collect_unique(self.proxy_names(), &mut result, |name| {
            LintError::DuplicateProxyName { name }
        });
        let groups = collect_unique(self.group_names(), &mut result, |name| {
            LintError::DuplicateGroupName { name }
        });
        let providers: HashSet<&str> = self.rule_provider_names().into_iter().collect();
        let proxy_providers: HashSet<&str> = self.proxy_provider_names().into_iter().collect();
        debug!(
            proxies = proxies.len(),
            groups = groups.len(),
            providers = providers.len(),
            proxy_providers = proxy_providers.len(),
            "collected names"
        );

        let known = |name: &str| {
            BUILTIN_TARGETS.contains(&name) || proxies.contains(name) || groups.contains(name)
        };

        for group in self.proxy_groups() {
            let Some(group_name) = entry_name(group) else {
                continue;
            };
            for member in string_items(group.get("proxies")) {
                if !known(member.as_str()) {
                    result.add_error(LintError::UnknownGroupMember {
                        group: group_name.to_string(),
                        member,
                    });
                }
            }
            for provider in string_items(group.get("use")) {
                if !proxy_providers.contains(provider.as_str()) {
                    result.add_error(LintError::ProxyProviderNotFound {
                        group: group_name.to_string(),
                        provider,
                    });
                }
            }
        }

        for (index, entry) in as_slice(self.get(RULES)).iter().enumerate() {
            let Some(text) = entry.as_str() else {
                continue;
            };
            let rule: Rule = match text.parse() {
                Ok(rule) => rule,
                Err(e) => {
                    debug!(rule = text, error = %e, "skipping rule the linter cannot read");
                    continue;
                }
            };

            if !known(rule.target.as_str()) {
                result.add_error(LintError::UnknownRuleTarget {
                    rule_index: index,
                    target: rule.target.clone(),
                });
            }

            if rule.kind == RuleKind::RuleSet
                && let Some(provider) = &rule.payload
                && !providers.contains(provider.as_str())
            {
                result.add_error(LintError::RuleProviderNotFound {
                    rule_index: index,
                    provider: provider.clone(),
                });
            }
        }

        if result.is_ok() {
            debug!("configuration lint passed");
        } else {
            warn!(
                finding_count = result.error_count(),
                "configuration lint found problems"
            );
            result.log_warnings();
        }

        result
    }
}

/// Collect names into a set, reporting each repeat.
fn collect_unique<'a>(
    names: Vec<&'a str>,
    result: &mut ValidationResult,
    duplicate: impl Fn(String) -> LintError,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            result.add_error(duplicate(name.to_string()));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lint(yaml: &str) -> ValidationResult {
        ClashConfig::from_yaml(yaml).unwrap().validate()
    }

    #[test]
    fn test_valid_config_passes_validation() {
        let result = lint(
            r#"
proxies:
  - {name: hk, type: vmess}
proxy-groups:
  - {name: Proxy, type: select, proxies: [hk, DIRECT]}
rule-providers:
  cncidr: {type: http, behavior: ipcidr, path: ./cncidr.yaml}
rules:
  - RULE-SET,cncidr,DIRECT,no-resolve
  - DOMAIN,example.com,hk
  - MATCH,Proxy
"#,
        );
        assert!(result.is_ok(), "{:?}", result.errors);
    }

    #[test]
    fn test_empty_config_passes_validation() {
        assert!(lint("").is_ok());
    }

    #[test]
    fn test_duplicate_proxy_name() {
        let result = lint("proxies:\n  - {name: a}\n  - {name: a}\n");
        assert_eq!(
            result.errors,
            vec![LintError::DuplicateProxyName {
                name: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_group_name() {
        let result = lint(
            "proxy-groups:\n  - {name: g, type: select}\n  - {name: g, type: select}\n",
        );
        assert!(result.errors.iter().any(
            |e| matches!(e, LintError::DuplicateGroupName { name } if name == "g")
        ));
    }

    #[test]
    fn test_unknown_rule_target() {
        let result = lint("rules:\n  - MATCH,DIRECT\n  - DOMAIN,a.com,Missing\n");
        assert_eq!(
            result.errors,
            vec![LintError::UnknownRuleTarget {
                rule_index: 1,
                target: "Missing".to_string()
            }]
        );
        assert_eq!(
            result.errors[0].to_string(),
            "rule #2 routes to unknown policy 'Missing'"
        );
    }

    #[test]
    fn test_rule_provider_not_found() {
        let result = lint("rules:\n  - RULE-SET,openai,REJECT\n");
        assert!(result.errors.iter().any(|e| matches!(
            e,
            LintError::RuleProviderNotFound { provider, .. } if provider == "openai"
        )));
    }

    #[test]
    fn test_unknown_group_member() {
        let result = lint("proxy-groups:\n  - {name: g, type: select, proxies: [ghost, REJECT]}\n");
        assert_eq!(
            result.errors,
            vec![LintError::UnknownGroupMember {
                group: "g".to_string(),
                member: "ghost".to_string()
            }]
        );
    }

    #[test]
    fn test_unreadable_rules_are_skipped() {
        let result = lint(concat!(
            "rules:\n",
            "  - AND,((DOMAIN,a.com),(NETWORK,UDP)),REJECT\n",
            "  - PROCESS-NAME,curl,DIRECT\n",
        ));
        assert!(result.is_ok());
    }

    #[test]
    fn test_group_uses_declared_proxy_provider() {
        let result = lint(
            r#"
proxy-providers:
  airport: {type: http, url: "https://example.com/sub", path: ./airport.yaml}
proxy-groups:
  - {name: ok, type: select, use: [airport]}
  - {name: broken, type: select, use: [airport, missing]}
"#,
        );
        assert_eq!(
            result.errors,
            vec![LintError::ProxyProviderNotFound {
                group: "broken".to_string(),
                provider: "missing".to_string()
            }]
        );
        assert_eq!(
            result.errors[0].to_string(),
            "proxy group 'broken' uses undeclared proxy provider 'missing'"
        );
    }
}
