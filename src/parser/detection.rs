//! Link detection
//!
//! Links are picked out of free-form text: one per line, several per line,
//! or embedded in surrounding prose all work.

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::debug;

/// A Base64 payload in either alphabet; `=` padding ends it
const PAYLOAD_PATTERN: &str = "[A-Za-z0-9+/_-]+=*";

/// Finds `<scheme>://<base64>` links for a fixed set of schemes
#[derive(Debug, Clone)]
pub struct LinkScanner {
    pattern: Regex,
}

impl LinkScanner {
    /// Build a scanner matching any of `schemes`
    pub fn new<'a>(schemes: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let alternatives: Vec<String> = schemes.into_iter().map(regex::escape).collect();
        if alternatives.is_empty() {
            bail!("Cannot scan for links without any schemes");
        }

        let source = format!("(?:{})://{}", alternatives.join("|"), PAYLOAD_PATTERN);
        let pattern = Regex::new(&source)
            .with_context(|| format!("Failed to compile link pattern '{}'", source))?;
        Ok(Self { pattern })
    }

    /// Every matching link in `text`, in order of appearance
    pub fn find_links<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let links: Vec<&str> = self.pattern.find_iter(text).map(|m| m.as_str()).collect();
        debug!(
            "Found {} link(s) in {} bytes of input",
            links.len(),
            text.len()
        );
        links
    }
}

/// Returns the scheme of a `scheme://...` link
pub fn link_scheme(link: &str) -> Option<&str> {
    link.split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vmess_scanner() -> LinkScanner {
        LinkScanner::new(["vmess"]).unwrap()
    }

    #[test]
    fn test_find_links_one_per_line() {
        let text = "vmess://YWJj\nvmess://ZGVm==\n";
        assert_eq!(
            vmess_scanner().find_links(text),
            vec!["vmess://YWJj", "vmess://ZGVm=="]
        );
    }

    #[test]
    fn test_find_links_shared_line_and_prose() {
        let text = "nodes: vmess://YWJj, vmess://ZGVm and done";
        assert_eq!(
            vmess_scanner().find_links(text),
            vec!["vmess://YWJj", "vmess://ZGVm"]
        );
    }

    #[test]
    fn test_find_links_url_safe_payload() {
        let text = "vmess://ab-_cd";
        assert_eq!(vmess_scanner().find_links(text), vec!["vmess://ab-_cd"]);
    }

    #[test]
    fn test_find_links_stops_after_padding() {
        let text = "_vmess://YWJj==_ vmess://ZGVm=-tail";
        assert_eq!(
            vmess_scanner().find_links(text),
            vec!["vmess://YWJj==", "vmess://ZGVm="]
        );
    }

    #[test]
    fn test_find_links_ignores_other_schemes() {
        let text = "ss://YWJj trojan://pass@host vmess://";
        assert!(vmess_scanner().find_links(text).is_empty());
    }

    #[test]
    fn test_scanner_requires_schemes() {
        assert!(LinkScanner::new(std::iter::empty()).is_err());
    }

    #[test]
    fn test_link_scheme() {
        assert_eq!(link_scheme("vmess://abc"), Some("vmess"));
        assert_eq!(link_scheme("://abc"), None);
        assert_eq!(link_scheme("vmess"), None);
    }
}
