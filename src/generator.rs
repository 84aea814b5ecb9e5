//! Configuration generator module
//!
//! This module orchestrates the two pipelines: rebuilding an existing Clash
//! configuration around the canonical sections, and importing descriptor
//! links into a configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::ClashConfig;
use crate::parser::{DecoderRegistry, LinkBatch};
use crate::preset;
use crate::transform::{apply_overlay, ensure_defaults, ensure_groups, merge_proxies};

// Sub-modules
pub mod helpers;
pub mod settings;

// Re-exports
pub use helpers::{
    expand_tilde, fetch_text, read_stdin, read_text, read_text_if_exists, write_text,
};
pub use settings::Settings;

// ============================================================================
// Rebuilder
// ============================================================================

/// Rebuilds an existing configuration around the canonical sections
pub struct Rebuilder {
    settings: Settings,
}

impl Rebuilder {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Load the source document and overlay the canonical sections
    ///
    /// `source` overrides the `source` setting.
    pub async fn rebuild(&self, source: Option<&str>) -> Result<ClashConfig> {
        let source = source.unwrap_or(&self.settings.source);
        info!("Loading configuration from {}", source);

        let content = read_text(source).await.with_context(|| {
            format!(
                "Cannot load the configuration to rebuild; pass its path as INPUT or set 'source' in the settings file ({})",
                source
            )
        })?;
        let mut config = ClashConfig::from_yaml(&content)
            .with_context(|| format!("Failed to parse {} as a Clash configuration", source))?;
        debug!(
            "Loaded {} top-level keys, {} proxies",
            config.keys().len(),
            config.proxies().len()
        );

        apply_overlay(&mut config)?;
        Ok(config)
    }

    /// Rebuild and write to the output file
    pub async fn rebuild_to_file(
        &self,
        source: Option<&str>,
        output: Option<&str>,
    ) -> Result<PathBuf> {
        let config = self.rebuild(source).await?;
        let output = output.unwrap_or(&self.settings.output);
        write_config(&config, output, self.settings.validate).await
    }
}

// ============================================================================
// Importer
// ============================================================================

/// Imports descriptor links into a configuration
pub struct Importer {
    settings: Settings,
    registry: DecoderRegistry,
}

impl Importer {
    pub fn new(settings: Settings) -> Self {
        let registry = DecoderRegistry::with_builtin_decoders(settings.skip_cert_verify);
        Self { settings, registry }
    }

    /// Read link text from a file, or from standard input when `input` is `None`
    pub async fn read_links(&self, input: Option<&str>) -> Result<String> {
        match input {
            Some(path) => {
                info!("Reading links from {}", path);
                read_text(path).await.with_context(|| {
                    format!(
                        "Cannot read links from {}; pass an existing file as INPUT, or omit INPUT to paste links on standard input",
                        path
                    )
                })
            }
            None => read_stdin().await,
        }
    }

    /// Decode every link in `text`
    pub fn decode(&self, text: &str) -> Result<LinkBatch> {
        let batch = self.registry.decode_all(text)?;
        info!(
            "Converted {} of {} link(s), {} failed",
            batch.proxies.len(),
            batch.matched(),
            batch.failures.len()
        );
        Ok(batch)
    }

    /// Load the base document, or build the skeleton when the template file
    /// does not exist
    pub async fn load_base(&self) -> Result<ClashConfig> {
        let template = &self.settings.template;
        match read_text_if_exists(template).await? {
            Some(content) => {
                info!("Loading base configuration from {}", template);
                ClashConfig::from_yaml(&content).with_context(|| {
                    format!("Failed to parse {} as a Clash configuration", template)
                })
            }
            None => {
                info!("{} not found, starting from a new configuration", template);
                preset::skeleton()
            }
        }
    }

    /// Merge decoded proxies into `base` and make sure the canonical groups,
    /// rules and rule providers are present
    pub fn merge(&self, mut base: ClashConfig, batch: LinkBatch) -> Result<ClashConfig> {
        let report = merge_proxies(&mut base, batch.proxies)?;
        report.log();
        ensure_groups(&mut base)?;
        ensure_defaults(&mut base)?;
        Ok(base)
    }

    /// Decode `text` and merge the result into the base document
    ///
    /// Returns `None` when no link decodes; nothing should be written then.
    pub async fn import(&self, text: &str) -> Result<Option<ClashConfig>> {
        let batch = self.decode(text)?;
        if batch.has_no_proxies() {
            warn!(
                "No link could be converted ({} found), nothing to write",
                batch.matched()
            );
            return Ok(None);
        }

        let base = self.load_base().await?;
        self.merge(base, batch).map(Some)
    }

    /// Read, decode, merge and write to the output file
    ///
    /// Returns the written path, or `None` if nothing was written.
    pub async fn import_to_file(
        &self,
        input: Option<&str>,
        output: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        let text = self.read_links(input).await?;
        let Some(config) = self.import(&text).await? else {
            return Ok(None);
        };

        let output = output.unwrap_or(&self.settings.output);
        write_config(&config, output, self.settings.validate)
            .await
            .map(Some)
    }
}

// ============================================================================
// Output
// ============================================================================

/// Lint (when enabled), serialize and write a document
pub async fn write_config(config: &ClashConfig, output: &str, validate: bool) -> Result<PathBuf> {
    if validate {
        let result = config.validate();
        if !result.is_ok() {
            warn!(
                "Configuration has {} lint finding(s), writing anyway",
                result.error_count()
            );
        }
    }

    let yaml = config
        .to_yaml()
        .context("Failed to serialize config to YAML")?;
    write_text(output, &yaml).await
}

// ============================================================================
// Tests
// ============================================================================
