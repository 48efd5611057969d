//! Feature toggles from `<content>/polysite.json`.
//!
//! The toggle file lives in the content root because it describes the
//! site build, not the tool invocation. It carries an `all` section plus
//! optional per-environment sections:
//!
//! ```json
//! {
//!   "all": { "generateSearchIndex": true },
//!   "dev": { "generateWebp": false }
//! }
//! ```
//!
//! The effective set is layered in order: built-in defaults, built-in
//! environment overrides, the file's `all` section, the file's section
//! for the active environment. Later layers win.

use anyhow::{Context, Result};
use educe::Educe;
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// File name of the feature-toggle descriptor inside the content root.
const FEATURES_FILE: &str = "polysite.json";

// ============================================================================
// Effective Toggles
// ============================================================================

/// Effective feature toggles after layering.
///
/// `generate_search_index` is consumed by the generation driver; the
/// remaining toggles govern the external asset pipeline and are only
/// surfaced in the startup summary.
#[derive(Debug, Clone, Educe)]
#[educe(Default)]
pub struct Features {
    #[educe(Default = true)]
    pub generate_search_index: bool,

    #[educe(Default = true)]
    pub generate_webp: bool,

    #[educe(Default = true)]
    pub minify_css: bool,

    #[educe(Default = true)]
    pub minify_js: bool,

    #[educe(Default = true)]
    pub optimize_images: bool,

    #[educe(Default = true)]
    pub webp_high_compression: bool,
}

impl Features {
    /// Load the effective toggles for `environment`.
    ///
    /// A missing file leaves the built-in layering; a malformed one is
    /// fatal. Unknown toggle names in the file are ignored (they may
    /// belong to external pipeline steps).
    pub fn load(content_dir: &Path, environment: Option<&str>) -> Result<Self> {
        let mut features = Self::default();
        if let Some(env) = environment {
            features.apply(&Self::builtin_env_overrides(env));
        }

        let path = content_dir.join(FEATURES_FILE);
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file: FeatureFile = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;

            features.apply(&file.all);
            if let Some(env) = environment
                && let Some(overrides) = file.environments.get(env)
            {
                features.apply(overrides);
            }
        }

        Ok(features)
    }

    /// Built-in per-environment overrides.
    ///
    /// `dev` turns the slow asset optimizations off; other environment
    /// names add nothing on top of the defaults.
    fn builtin_env_overrides(environment: &str) -> FeatureOverrides {
        match environment {
            "dev" => FeatureOverrides {
                minify_css: Some(false),
                minify_js: Some(false),
                optimize_images: Some(false),
                webp_high_compression: Some(false),
                ..FeatureOverrides::default()
            },
            _ => FeatureOverrides::default(),
        }
    }

    /// Overlay one layer of overrides.
    fn apply(&mut self, overrides: &FeatureOverrides) {
        if let Some(value) = overrides.generate_search_index {
            self.generate_search_index = value;
        }
        if let Some(value) = overrides.generate_webp {
            self.generate_webp = value;
        }
        if let Some(value) = overrides.minify_css {
            self.minify_css = value;
        }
        if let Some(value) = overrides.minify_js {
            self.minify_js = value;
        }
        if let Some(value) = overrides.optimize_images {
            self.optimize_images = value;
        }
        if let Some(value) = overrides.webp_high_compression {
            self.webp_high_compression = value;
        }
    }

    /// One-line state summary for the startup log.
    pub fn summary(&self) -> String {
        let state = |on: bool| if on { "on" } else { "off" };
        format!(
            "searchIndex {}, webp {} (high compression {}), minifyCss {}, minifyJs {}, optimizeImages {}",
            state(self.generate_search_index),
            state(self.generate_webp),
            state(self.webp_high_compression),
            state(self.minify_css),
            state(self.minify_js),
            state(self.optimize_images),
        )
    }
}

// ============================================================================
// File Shape
// ============================================================================

/// One layer of overrides (camelCase keys as written in the JSON file).
/// Unknown keys pass through untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureOverrides {
    generate_search_index: Option<bool>,
    generate_webp: Option<bool>,
    minify_css: Option<bool>,
    minify_js: Option<bool>,
    optimize_images: Option<bool>,
    webp_high_compression: Option<bool>,
}

/// Raw file shape: an `all` section plus arbitrary environment sections.
#[derive(Debug, Default, Deserialize)]
struct FeatureFile {
    #[serde(default)]
    all: FeatureOverrides,

    #[serde(flatten)]
    environments: HashMap<String, FeatureOverrides>,
}

// ============================================================================
// Tests
// ============================================================================
