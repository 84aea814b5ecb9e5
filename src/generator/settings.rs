use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::helpers::{expand_tilde, fetch_text, is_remote};

// ============================================================================
// Settings Types
// ============================================================================

/// Pipeline settings parsed from an optional TOML file
///
/// Every key is optional; a missing file behaves like an empty one.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Rebuild input, file path or URL. Default "original_config.yaml"
    pub source: String,

    /// Import base document, file path or URL. A missing local file means
    /// "start from the built-in skeleton". Default "modified_config.yaml"
    pub template: String,

    /// Output file path for both pipelines. Default "modified_config.yaml"
    pub output: String,

    /// `skip-cert-verify` written into every imported proxy
    pub skip_cert_verify: bool,

    /// Lint the generated document before writing it
    pub validate: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: "original_config.yaml".to_string(),
            template: "modified_config.yaml".to_string(),
            output: "modified_config.yaml".to_string(),
            skip_cert_verify: true,
            validate: true,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Settings {
    /// Parse settings from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).context("Failed to parse settings TOML")?;

        for (key, value) in [
            ("source", &settings.source),
            ("template", &settings.template),
            ("output", &settings.output),
        ] {
            if value.trim().is_empty() {
                bail!("Setting '{}' must not be empty", key);
            }
        }
        if is_remote(&settings.output) {
            bail!("Setting 'output' must be a local path, got {}", settings.output);
        }

        Ok(settings)
    }

    /// Load settings from file path
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        Self::from_toml(&content)
    }

    /// Load settings from URL
    pub async fn from_url(url: &str) -> Result<Self> {
        let content = fetch_text(url).await?;
        Self::from_toml(&content)
    }

    /// Load settings from file path or URL
    pub async fn load(path_or_url: &str) -> Result<Self> {
        if is_remote(path_or_url) {
            Self::from_url(path_or_url).await
        } else {
            let expanded = expand_tilde(path_or_url);
            Self::from_file(Path::new(&expanded)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let settings = Settings::from_toml(
            r#"
            source = "~/clash/original.yaml"
            template = "https://example.com/base.yaml"
            output = "./out/clash.yaml"
            skip_cert_verify = false
            validate = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.source, "~/clash/original.yaml");
        assert_eq!(settings.template, "https://example.com/base.yaml");
        assert_eq!(settings.output, "./out/clash.yaml");
        assert!(!settings.skip_cert_verify);
        assert!(!settings.validate);
    }

    #[test]
    fn test_parse_empty_settings_uses_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.source, "original_config.yaml");
        assert_eq!(settings.template, "modified_config.yaml");
        assert_eq!(settings.output, "modified_config.yaml");
        assert!(settings.skip_cert_verify);
        assert!(settings.validate);
    }

    #[test]
    fn test_parse_partial_settings() {
        let settings = Settings::from_toml(r#"output = "merged.yaml""#).unwrap();
        assert_eq!(settings.output, "merged.yaml");
        assert_eq!(settings.template, "modified_config.yaml");
    }

    #[test]
    fn test_empty_path_rejected() {
        let err = Settings::from_toml(r#"source = """#).unwrap_err();
        assert!(err.to_string().contains("source"));
    }

    #[test]
    fn test_remote_output_rejected() {
        assert!(Settings::from_toml(r#"output = "https://example.com/out.yaml""#).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Settings::from_toml("templat = \"typo.yaml\"").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clashforge.toml");
        std::fs::write(&path, "validate = false\n").unwrap();

        let settings = Settings::load(path.to_str().unwrap()).await.unwrap();
        assert!(!settings.validate);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = Settings::load("/nonexistent/clashforge.toml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read settings"));
    }
}
