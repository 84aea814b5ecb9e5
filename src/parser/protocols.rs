//! Link decoders module
//!
//! Each decoder implements the `LinkDecoder` trait and turns one
//! `scheme://...` link into a proxy record. The registry dispatches links to
//! decoders by scheme.

mod vmess;

pub use vmess::VMessDecoder;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::config::proxy::Proxy;
use crate::parser::detection::{LinkScanner, link_scheme};
use crate::parser::{LinkBatch, LinkFailure};

// ============================================================================
// Link Decoder Trait
// ============================================================================

/// Trait for decoding individual descriptor links
pub trait LinkDecoder: Send + Sync {
    /// Returns the scheme this decoder handles (e.g., "vmess")
    fn scheme(&self) -> &str;

    /// Decodes a link into a proxy record
    fn decode(&self, link: &str) -> Result<Proxy>;
}

// ============================================================================
// Decoder Registry
// ============================================================================

/// Registry for link decoders with dynamic dispatch
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<String, Arc<dyn LinkDecoder>>,
}

impl DecoderRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with all built-in decoders registered
    pub fn with_builtin_decoders(skip_cert_verify: bool) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(VMessDecoder::new(skip_cert_verify)));
        registry
    }

    /// Registers a decoder, replacing any previous one for the same scheme
    pub fn register(&mut self, decoder: Arc<dyn LinkDecoder>) {
        self.decoders.insert(decoder.scheme().to_string(), decoder);
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    /// Decodes a single link using the decoder for its scheme
    pub fn decode_link(&self, link: &str) -> Result<Proxy> {
        let scheme = link_scheme(link).ok_or_else(|| anyhow!("Invalid link: missing scheme"))?;
        let decoder = self
            .decoders
            .get(scheme)
            .ok_or_else(|| anyhow!("No decoder registered for scheme: {}", scheme))?;

        let result = decoder.decode(link);
        match &result {
            Ok(proxy) => debug!("Decoded {} link -> proxy '{}'", scheme, proxy.name),
            Err(e) => debug!("Failed to decode {} link: {:#}", scheme, e),
        }
        result
    }

    /// Finds every registered-scheme link in `text` and decodes each one
    ///
    /// A link that fails to decode is recorded in the batch's failures and
    /// the rest of the batch carries on.
    pub fn decode_all(&self, text: &str) -> Result<LinkBatch> {
        let scanner = LinkScanner::new(self.schemes())?;
        let mut batch = LinkBatch::default();

        for link in scanner.find_links(text) {
            match self.decode_link(link) {
                Ok(proxy) => {
                    info!("Converted node: {}", proxy.name);
                    batch.proxies.push(proxy);
                }
                Err(e) => {
                    let failure = LinkFailure::new(link, &e);
                    warn!("Skipping link {}", failure);
                    batch.failures.push(failure);
                }
            }
        }

        debug!(
            "Link decoding complete: {} matched, {} decoded, {} failed",
            batch.matched(),
            batch.proxies.len(),
            batch.failures.len()
        );
        Ok(batch)
    }
}
