//! Site configuration management for `polysite.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                      |
//! |-------------|----------------------------------------------|
//! | `[build]`   | Project paths and the site URL override      |
//! | `[extra]`   | User-defined custom fields                   |
//!
//! Feature toggles do not live here: they come from the content tree
//! (`<content>/polysite.json`, see `features.rs`) because they describe
//! the site, not the tool invocation.
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"
//! output = "output"
//! assets = "assets/output"
//! site_url = "https://example.org"
//!
//! [extra]
//! deploy_target = "pages"
//! ```

mod build;
pub mod defaults;
mod error;
mod features;

// Re-export public types used by other modules
pub use build::BuildConfig;
pub use features::Features;

use error::ConfigError;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing polysite.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Parsed CLI arguments, attached after loading
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path of the loaded config file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Environment name for feature-toggle overrides
    /// (from `--env` or `POLYSITE_ENV`)
    #[serde(skip)]
    pub environment: Option<String>,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse a configuration from its TOML text.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let config =
            toml::from_str(&content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;
        Ok(config)
    }

    /// Project root directory, `./` unless set.
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// CLI arguments, available once `update_with_cli` ran.
    pub fn get_cli(&self) -> &'static Cli {
        self.cli.unwrap()
    }

    /// Load the feature toggles for the configured environment.
    ///
    /// Reads `<content>/polysite.json` when present; a malformed file is
    /// fatal, an absent one leaves the built-in defaults.
    pub fn load_features(&self) -> Result<Features> {
        Features::load(&self.build.content, self.environment.as_deref())
    }

    /// Fold the CLI arguments into the configuration.
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        let root = cli.root.clone().unwrap_or_else(|| self.get_root().to_owned());
        self.set_root(&root);
        self.update_path_with_root(&root);

        let Commands::Build { env, site_url } = &cli.command;
        self.environment = env.clone().or_else(|| std::env::var("POLYSITE_ENV").ok());
        if site_url.is_some() {
            self.build.site_url = site_url.clone();
        }
    }

    /// Overwrite a config field when the CLI carries a value for it.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Apply the CLI path overrides, then anchor every path at the root
    /// directory as an absolute path.
    fn update_path_with_root(&mut self, root: &Path) {
        let cli = self.get_cli();

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.assets, cli.assets.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        let root = Self::normalize_path(root);
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.set_root(&root);

        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.assets = Self::normalize_path(&root.join(&self.build.assets));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
    }

    /// Absolute form of `path`, canonicalized when it exists.
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        if !self.config_path.exists() {
            bail!(ConfigError::NotFound(self.config_path.clone()));
        }

        if let Some(site_url) = &self.build.site_url
            && !site_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[build.site_url] must start with http:// or https://".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let config_str = r#"
            [build]
            content = "content"
            output = "dist"
            site_url = "https://example.org"
        "#;
        let result = SiteConfig::from_str(config_str);

        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.site_url.as_deref(), Some("https://example.org"));
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let invalid_config = r#"
            [build
            content = "content"
        "#;
        let result = SiteConfig::from_str(invalid_config);

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SiteConfig::from_str("").unwrap();

        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.output, PathBuf::from("output"));
        assert_eq!(config.build.assets, PathBuf::from("assets/output"));
        assert!(config.build.site_url.is_none());
    }

    #[test]
    fn test_get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_set_root() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/custom/path"));
        assert_eq!(config.get_root(), Path::new("/custom/path"));
    }

    #[test]
    fn test_extra_fields() {
        let config = r#"
            [extra]
            custom_field = "custom_value"
            number_field = 42
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(
            config.extra.get("custom_field").and_then(|v| v.as_str()),
            Some("custom_value")
        );
        assert_eq!(
            config.extra.get("number_field").and_then(|v| v.as_integer()),
            Some(42)
        );
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let config = r#"
            [unknown_section]
            field = "value"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_site_url() {
        let mut config = SiteConfig::from_str(
            r#"
            [build]
            site_url = "example.org"
        "#,
        )
        .unwrap();
        config.config_path = std::env::temp_dir();

        assert!(config.validate().is_err());
    }
}
