//! Canonical sections written by both pipelines
//!
//! Everything here is fixed data: the fake-ip DNS block, the rule-provider
//! declarations, the proxy groups and the ordered rule list. Each call builds
//! a fresh copy.

use indexmap::IndexMap;

use crate::config::ClashConfig;
use crate::config::dns::{Dns, EnhancedMode};
use crate::config::proxy_group::{GroupType, HealthCheck, LoadBalanceStrategy, ProxyGroup};
use crate::config::rule::Rule;
use crate::config::rule_provider::{ProviderBehavior, RuleProvider};
use crate::transform::country_code_to_flag;

// ============================================================================
// Group Names
// ============================================================================

pub const NODE_SELECT: &str = "节点选择";
pub const LOWEST_LATENCY: &str = "延迟选优";
pub const FAILOVER: &str = "故障转移";
pub const BALANCE_HASHING: &str = "负载均衡(散列)";
pub const BALANCE_ROUND_ROBIN: &str = "负载均衡(轮询)";
pub const GOOGLE: &str = "谷歌服务";
pub const FOREIGN_MEDIA: &str = "国外媒体";
pub const TELEGRAM: &str = "电报消息";
pub const CHATGPT: &str = "ChatGPT";
pub const MICROSOFT: &str = "微软服务";
pub const APPLE: &str = "苹果服务";
pub const AD_BLOCK: &str = "广告过滤";
pub const GLOBAL_DIRECT: &str = "全局直连";
pub const GLOBAL_REJECT: &str = "全局拦截";
pub const FINAL: &str = "漏网之鱼";

/// Automatic groups, in the order selectors list them.
const AUTO_GROUPS: [&str; 4] = [LOWEST_LATENCY, FAILOVER, BALANCE_HASHING, BALANCE_ROUND_ROBIN];

// ============================================================================
// Constants
// ============================================================================

const PROBE_URL: &str = "https://www.google.com/generate_204";
const CHATGPT_PROBE_URL: &str = "https://chatgpt.com";
const ICON_BASE: &str =
    "https://fastly.jsdelivr.net/gh/clash-verge-rev/clash-verge-rev.github.io@main/docs/assets/icons";

const LOYALSOLDIER_BASE: &str = "https://fastly.jsdelivr.net/gh/Loyalsoldier/clash-rules@release";
const OPENAI_RULES_URL: &str =
    "https://fastly.jsdelivr.net/gh/blackmatrix7/ios_rule_script@master/rule/Clash/OpenAI/OpenAI.yaml";
const RULE_REFRESH_SECS: u32 = 86400;

const DOMESTIC_DOH: &[&str] = &[
    "https://dns.alidns.com/dns-query",
    "https://doh.pub/dns-query",
    "https://doh.360.cn/dns-query",
];

const FOREIGN_DOH: &[&str] = &[
    "https://1.1.1.1/dns-query",
    "https://1.0.0.1/dns-query",
    "https://208.67.222.222/dns-query",
    "https://208.67.220.220/dns-query",
    "https://194.242.2.2/dns-query",
    "https://194.242.2.3/dns-query",
];

/// Regions where ChatGPT is served; nodes elsewhere are filtered out of its group.
const CHATGPT_REGIONS: &[&str] = &[
    "AD", "AE", "AF", "AG", "AL", "AM", "AO", "AR", "AT", "AU", "AZ", "BA", "BB", "BD", "BE", "BF",
    "BG", "BH", "BI", "BJ", "BN", "BO", "BR", "BS", "BT", "BW", "BZ", "CA", "CD", "CF", "CG", "CH",
    "CI", "CL", "CM", "CO", "CR", "CV", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC", "EE",
    "EG", "ER", "ES", "ET", "FI", "FJ", "FM", "FR", "GA", "GB", "GD", "GE", "GH", "GM", "GN", "GQ",
    "GR", "GT", "GW", "GY", "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IN", "IQ", "IS", "IT", "JM",
    "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KR", "KW", "KZ", "LA", "LB", "LC", "LI", "LK",
    "LR", "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME", "MG", "MH", "MK", "ML", "MM", "MN",
    "MR", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA", "NE", "NG", "NI", "NL", "NO", "NP", "NR",
    "NZ", "OM", "PA", "PE", "PG", "PH", "PK", "PL", "PS", "PT", "PW", "PY", "QA", "RO", "RS", "RW",
    "SA", "SB", "SC", "SD", "SE", "SG", "SI", "SK", "SL", "SM", "SN", "SO", "SR", "SS", "ST", "SV",
    "SZ", "TD", "TG", "TH", "TJ", "TL", "TM", "TN", "TO", "TR", "TT", "TV", "TW", "TZ", "UA", "UG",
    "US", "UY", "UZ", "VA", "VC", "VN", "VU", "WS", "YE", "ZA", "ZM", "ZW",
];

// ============================================================================
// DNS
// ============================================================================

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fake-ip DNS with split domestic/foreign DoH resolution
pub fn dns() -> Dns {
    let all_doh: Vec<String> = DOMESTIC_DOH
        .iter()
        .chain(FOREIGN_DOH)
        .map(|s| s.to_string())
        .collect();

    let mut policy = IndexMap::new();
    policy.insert("geosite:private,cn,geolocation-cn".to_string(), owned(DOMESTIC_DOH));
    policy.insert(
        "geosite:google,youtube,telegram,gfw,geolocation-!cn".to_string(),
        owned(FOREIGN_DOH),
    );

    Dns {
        enable: true,
        listen: Some("0.0.0.0:1053".to_string()),
        ipv6: true,
        use_system_hosts: false,
        cache_algorithm: Some("arc".to_string()),
        enhanced_mode: Some(EnhancedMode::FakeIp),
        fake_ip_range: Some("198.18.0.1/16".to_string()),
        fake_ip_filter: owned(&[
            "+.lan",
            "+.local",
            "+.msftconnecttest.com",
            "+.msftncsi.com",
            "localhost.ptlogin2.qq.com",
            "localhost.sec.qq.com",
            "localhost.work.weixin.qq.com",
        ]),
        default_nameserver: owned(&["223.5.5.5", "119.29.29.29", "1.1.1.1", "8.8.8.8"]),
        nameserver: all_doh.clone(),
        proxy_server_nameserver: all_doh,
        nameserver_policy: policy,
    }
}

// ============================================================================
// Rule Providers
// ============================================================================

fn loyalsoldier(behavior: ProviderBehavior, name: &str) -> RuleProvider {
    RuleProvider::http(
        behavior,
        &format!("{LOYALSOLDIER_BASE}/{name}.txt"),
        &format!("./ruleset/loyalsoldier/{name}.yaml"),
        RULE_REFRESH_SECS,
    )
}

/// Rule-provider declarations keyed by name, in declaration order
pub fn rule_providers() -> IndexMap<String, RuleProvider> {
    let mut providers = IndexMap::new();

    for name in [
        "reject",
        "icloud",
        "apple",
        "google",
        "proxy",
        "direct",
        "private",
        "gfw",
        "tld-not-cn",
    ] {
        providers.insert(name.to_string(), loyalsoldier(ProviderBehavior::Domain, name));
    }
    for name in ["telegramcidr", "cncidr", "lancidr"] {
        providers.insert(name.to_string(), loyalsoldier(ProviderBehavior::IpCidr, name));
    }
    providers.insert(
        "applications".to_string(),
        loyalsoldier(ProviderBehavior::Classical, "applications"),
    );
    providers.insert(
        "openai".to_string(),
        RuleProvider::http(
            ProviderBehavior::Classical,
            OPENAI_RULES_URL,
            "./ruleset/blackmatrix7/openai.yaml",
            RULE_REFRESH_SECS,
        ),
    );

    providers
}

// ============================================================================
// Proxy Groups
// ============================================================================

fn health_check() -> HealthCheck {
    HealthCheck {
        interval: 300,
        timeout: 3000,
        url: PROBE_URL.to_string(),
        lazy: true,
        max_failed_times: 3,
        hidden: false,
    }
}

fn icon(name: &str) -> String {
    format!("{ICON_BASE}/{name}.svg")
}

fn group(name: &str, group_type: GroupType, icon_name: &str) -> ProxyGroup {
    ProxyGroup::new(name, group_type, health_check()).with_icon(icon(icon_name))
}

/// Selector offering the node picker, every automatic group, then direct
fn service_selector(name: &str, icon_name: &str) -> ProxyGroup {
    let mut members = vec![NODE_SELECT];
    members.extend(AUTO_GROUPS);
    members.push(GLOBAL_DIRECT);
    group(name, GroupType::Select, icon_name)
        .with_proxies(&members)
        .include_all()
}

/// Selector preferring direct connections
fn direct_first_selector(name: &str, first: &str, icon_name: &str) -> ProxyGroup {
    let mut members = vec![first, NODE_SELECT];
    members.extend(AUTO_GROUPS);
    group(name, GroupType::Select, icon_name)
        .with_proxies(&members)
        .include_all()
}

/// `CODE|FLAG|CODE|FLAG...` regex matching node names tagged with a served region
pub fn chatgpt_filter() -> String {
    CHATGPT_REGIONS
        .iter()
        .flat_map(|code| [code.to_string(), country_code_to_flag(code).unwrap_or_default()])
        .collect::<Vec<_>>()
        .join("|")
}

/// The fifteen canonical proxy groups, in order
pub fn proxy_groups() -> Vec<ProxyGroup> {
    let mut chatgpt = group(CHATGPT, GroupType::Select, "chatgpt")
        .with_expected_status("200")
        .include_all()
        .with_filter(chatgpt_filter());
    chatgpt.health_check.url = CHATGPT_PROBE_URL.to_string();

    vec![
        group(NODE_SELECT, GroupType::Select, "adjust")
            .with_proxies(&AUTO_GROUPS)
            .include_all(),
        group(LOWEST_LATENCY, GroupType::UrlTest, "speed")
            .with_tolerance(100)
            .include_all(),
        group(FAILOVER, GroupType::Fallback, "ambulance").include_all(),
        group(BALANCE_HASHING, GroupType::LoadBalance, "merry_go")
            .with_strategy(LoadBalanceStrategy::ConsistentHashing)
            .include_all(),
        group(BALANCE_ROUND_ROBIN, GroupType::LoadBalance, "balance")
            .with_strategy(LoadBalanceStrategy::RoundRobin)
            .include_all(),
        service_selector(GOOGLE, "google"),
        service_selector(FOREIGN_MEDIA, "youtube"),
        service_selector(TELEGRAM, "telegram"),
        chatgpt,
        direct_first_selector(MICROSOFT, GLOBAL_DIRECT, "microsoft"),
        service_selector(APPLE, "apple"),
        group(AD_BLOCK, GroupType::Select, "bug").with_proxies(&["REJECT", "DIRECT"]),
        direct_first_selector(GLOBAL_DIRECT, "DIRECT", "link"),
        group(GLOBAL_REJECT, GroupType::Select, "block").with_proxies(&["REJECT", "DIRECT"]),
        service_selector(FINAL, "fish"),
    ]
}

// ============================================================================
// Rules
// ============================================================================

/// Ordered routing rules ending in the catch-all
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::domain_suffix("googleapis.cn", NODE_SELECT),
        Rule::domain_suffix("gstatic.com", NODE_SELECT),
        Rule::domain_suffix("xn--ngstr-lra8j.com", NODE_SELECT),
        Rule::domain_suffix("github.io", NODE_SELECT),
        Rule::domain("v2rayse.com", NODE_SELECT),
        Rule::rule_set("openai", CHATGPT),
        Rule::rule_set("applications", GLOBAL_DIRECT),
        Rule::rule_set("private", GLOBAL_DIRECT),
        Rule::rule_set("reject", AD_BLOCK),
        Rule::rule_set("icloud", MICROSOFT),
        Rule::rule_set("apple", APPLE),
        Rule::rule_set("google", GOOGLE),
        Rule::rule_set("proxy", NODE_SELECT),
        Rule::rule_set("gfw", NODE_SELECT),
        Rule::rule_set("tld-not-cn", NODE_SELECT),
        Rule::rule_set("direct", GLOBAL_DIRECT),
        Rule::rule_set("lancidr", GLOBAL_DIRECT).no_resolve(),
        Rule::rule_set("cncidr", GLOBAL_DIRECT).no_resolve(),
        Rule::rule_set("telegramcidr", TELEGRAM).no_resolve(),
        Rule::geoip("LAN", GLOBAL_DIRECT).no_resolve(),
        Rule::geoip("CN", GLOBAL_DIRECT).no_resolve(),
        Rule::catch_all(FINAL),
    ]
}

// ============================================================================
// Skeleton
// ============================================================================

/// Base document used when the importer has no template to start from
pub fn skeleton() -> anyhow::Result<ClashConfig> {
    ClashConfig::builder()
        .value("mixed-port", 7890)
        .value("allow-lan", true)
        .value("log-level", "info")
        .value("external-controller", "0.0.0.0:9090")
        .section(crate::config::DNS, &dns())
        .map(|builder| builder.build())
}
