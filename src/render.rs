//! Page rendering.
//!
//! Layouts are plain HTML files in `<content>/layouts/` with
//! `{{ dotted.path }}` placeholders. Placeholders resolve against the
//! page's render data; a path that leads nowhere renders as an empty
//! string. Pages flagged with `_extraRendering` go through a second
//! placeholder pass over their own output, so ingested content may
//! itself contain placeholders.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::{Captures, Regex};
use serde_json::Value;

use crate::content::context::PageContext;

/// Directory under the content root holding the layout files.
const LAYOUTS_DIR: &str = "layouts";

// =============================================================================
// Renderer
// =============================================================================

/// Renders pages to their final HTML.
pub trait Renderer {
    /// Render the page through its layout.
    fn render_page(&self, ctx: &PageContext, data: &Value) -> Result<String>;

    /// Resolve placeholders inside already rendered output. Used for the
    /// second pass of pages with `_extraRendering`.
    fn render_inline(&self, html: &str, data: &Value) -> Result<String>;
}

/// File-based renderer reading `<content>/layouts/<name>.html`.
#[derive(Debug, Clone)]
pub struct LayoutRenderer {
    layouts_dir: PathBuf,
}

impl LayoutRenderer {
    pub fn new(content_dir: &Path) -> Self {
        Self { layouts_dir: content_dir.join(LAYOUTS_DIR) }
    }
}

impl Renderer for LayoutRenderer {
    fn render_page(&self, ctx: &PageContext, data: &Value) -> Result<String> {
        let Some(layout) = ctx.record().layout.as_deref() else {
            bail!("Page `{}` has no `_layout`", ctx.page_id());
        };
        let layout_path = self.layouts_dir.join(format!("{layout}.html"));
        let template = fs::read_to_string(&layout_path)
            .with_context(|| format!("Failed to read layout {}", layout_path.display()))?;
        Ok(interpolate(&template, data))
    }

    fn render_inline(&self, html: &str, data: &Value) -> Result<String> {
        Ok(interpolate(html, data))
    }
}

// =============================================================================
// Placeholder Interpolation
// =============================================================================

/// Replace every `{{ dotted.path }}` with the matching value from `data`.
fn interpolate(template: &str, data: &Value) -> String {
    static RE_PLACEHOLDER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").unwrap());

    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            lookup(data, &caps[1]).map(value_text).unwrap_or_default()
        })
        .into_owned()
}

/// Walk a dotted path through nested objects.
fn lookup<'v>(data: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(data, |value, segment| value.get(segment))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
