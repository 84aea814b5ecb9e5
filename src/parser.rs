//! Descriptor link parsing module
//!
//! This module provides functionality for:
//! - Finding `scheme://<base64>` links anywhere in free-form text
//! - Decoding Base64 payloads in any alphabet or padding variant
//! - Dispatching each link to the decoder registered for its scheme

use std::fmt;

pub mod base64;
pub mod detection;
pub mod protocols;

pub use protocols::{DecoderRegistry, LinkDecoder, VMessDecoder};

use anyhow::Result;

use crate::config::proxy::Proxy;

/// Longest link prefix kept in a failure report
const LINK_PREVIEW_CHARS: usize = 48;

// ============================================================================
// Link Batch
// ============================================================================

/// A link that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFailure {
    /// The link as matched in the input
    pub link: String,
    /// Error chain, outermost first
    pub reason: String,
}

impl LinkFailure {
    pub fn new(link: &str, error: &anyhow::Error) -> Self {
        Self {
            link: link.to_string(),
            reason: format!("{:#}", error),
        }
    }

    /// Shortened link for log output
    pub fn preview(&self) -> String {
        let mut chars = self.link.chars();
        let head: String = chars.by_ref().take(LINK_PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.preview(), self.reason)
    }
}

/// Outcome of decoding every link found in a piece of text
///
/// Every matched link ends up in exactly one of the two lists.
#[derive(Debug, Clone, Default)]
pub struct LinkBatch {
    /// Decoded records in input order
    pub proxies: Vec<Proxy>,
    /// Links that failed to decode, in input order
    pub failures: Vec<LinkFailure>,
}

impl LinkBatch {
    /// Number of links found in the input
    pub fn matched(&self) -> usize {
        self.proxies.len() + self.failures.len()
    }

    /// Whether no link decoded; failed links do not count
    pub fn has_no_proxies(&self) -> bool {
        self.proxies.is_empty()
    }
}

/// Decodes every link in `text` with the built-in decoders
pub fn decode_links(text: &str, skip_cert_verify: bool) -> Result<LinkBatch> {
    DecoderRegistry::with_builtin_decoders(skip_cert_verify).decode_all(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::base64::Engine;
    use ::base64::engine::general_purpose::STANDARD;

    fn vmess(json: &str) -> String {
        format!("vmess://{}", STANDARD.encode(json))
    }

    #[test]
    fn test_decode_links_mixed_batch() {
        let text = format!(
            "{}\n{} {}\nss://ignored",
            vmess(r#"{"ps":"a","add":"a.example.com","port":443}"#),
            vmess("not json"),
            vmess(r#"{"ps":"b","add":"b.example.com","port":"80"}"#),
        );
        let batch = decode_links(&text, true).unwrap();
        let names: Vec<&str> = batch.proxies.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.matched(), 3);
        assert!(batch.failures[0].reason.contains("VMess JSON"));
    }

    #[test]
    fn test_decode_links_no_matches() {
        let batch = decode_links("nothing to see here", true).unwrap();
        assert!(batch.has_no_proxies());
        assert_eq!(batch.matched(), 0);
    }

    #[test]
    fn test_failures_only_batch_has_no_proxies() {
        let batch = decode_links(&vmess("not json"), true).unwrap();
        assert!(batch.has_no_proxies());
        assert_eq!(batch.matched(), 1);
    }

    #[test]
    fn test_failure_preview_truncates() {
        let link = format!("vmess://{}", "A".repeat(100));
        let failure = LinkFailure::new(&link, &anyhow::anyhow!("boom"));
        assert_eq!(failure.preview().chars().count(), LINK_PREVIEW_CHARS + 3);
        assert!(failure.to_string().ends_with("...: boom"));

        let short = LinkFailure::new("vmess://AA", &anyhow::anyhow!("boom"));
        assert_eq!(short.to_string(), "vmess://AA: boom");
    }
}
