//! Page records.
//!
//! A page is described in the tree descriptor by a handful of reserved
//! underscore-prefixed properties and an open set of free-form ones.
//! Content files ingested from the page's directory land in the free-form
//! set as well, keyed by file stem.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Page Record
// =============================================================================

/// One page of a content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Site-relative output path of the rendered page.
    #[serde(rename = "_path")]
    pub path: String,

    /// Name of the layout the page is rendered through.
    #[serde(rename = "_layout", skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Sitemap priority, copied verbatim into `<priority>`.
    #[serde(rename = "_priority", skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,

    /// Sitemap membership. Absent counts as `true`.
    #[serde(rename = "_sitemap", skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<bool>,

    /// When `true` the rendered output is passed through the renderer a
    /// second time, so content files may themselves contain placeholders.
    #[serde(rename = "_extraRendering", skip_serializing_if = "Option::is_none")]
    pub extra_rendering: Option<bool>,

    /// Free-form properties: whatever else the descriptor declares plus
    /// the ingested content files.
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl PageRecord {
    /// Whether `name` is defined on this page, reserved or free-form.
    pub fn has(&self, name: &str) -> bool {
        match name {
            "_path" => true,
            "_layout" => self.layout.is_some(),
            "_priority" => self.priority.is_some(),
            "_sitemap" => self.sitemap.is_some(),
            "_extraRendering" => self.extra_rendering.is_some(),
            _ => self.content.contains_key(name),
        }
    }

    /// Free-form property lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.content.get(name)
    }

    /// Store an ingested content property. Returns `true` when a value of
    /// the same name was already present and has been overwritten.
    pub fn insert(&mut self, name: String, value: Value) -> bool {
        self.content.insert(name, value).is_some()
    }

    /// Pages take part in the sitemap unless `_sitemap` is `false`.
    pub fn in_sitemap(&self) -> bool {
        self.sitemap.unwrap_or(true)
    }

    /// The full record, reserved and free-form properties alike, as a
    /// JSON map.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.content.clone();
        map.insert("_path".into(), Value::String(self.path.clone()));
        if let Some(layout) = &self.layout {
            map.insert("_layout".into(), Value::String(layout.clone()));
        }
        if let Some(priority) = self.priority {
            map.insert("_priority".into(), Value::from(priority));
        }
        if let Some(sitemap) = self.sitemap {
            map.insert("_sitemap".into(), Value::Bool(sitemap));
        }
        if let Some(extra) = self.extra_rendering {
            map.insert("_extraRendering".into(), Value::Bool(extra));
        }
        map
    }
}

// =============================================================================
// Tests
// =============================================================================
