//! `[build]` section configuration.
//!
//! Project paths consumed by the generation pipeline.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in polysite.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"        # Content root (language trees live below it)
/// output = "output"          # Generated site
/// assets = "assets/output"   # Prebuilt static assets, copied verbatim
/// site_url = "https://example.org"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content root directory (site.json plus one subdirectory per language).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory. Cleaned at the start of every build.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Prebuilt static assets directory, copied into the output verbatim.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Site URL override. Takes precedence over the `SITE_URL` environment
    /// variable and the content tree's `site.url`.
    #[serde(default = "defaults::build::site_url")]
    #[educe(Default = defaults::build::site_url())]
    pub site_url: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
