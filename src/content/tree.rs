//! Content tree loading.
//!
//! Every language directory under the content root holds a `tree.json`
//! descriptor plus a `pages/` directory with one sub-directory per page.
//! Loading a tree merges the global site data with the descriptor,
//! ingests the content files into their page records and registers the
//! pages with the sitemap.
//!
//! | Descriptor section | Meaning                                    |
//! |--------------------|--------------------------------------------|
//! | `site`             | Site-wide properties (title, url, ...)     |
//! | `menus`            | Named menu trees                           |
//! | `pages`            | Page records keyed by identifier           |
//! | `redirects`        | Extra redirect pages pointing into `pages` |

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::context::PageContext;
use crate::content::menu::MenuItem;
use crate::content::page::PageRecord;
use crate::generator::sitemap::Sitemap;
use crate::i18n::Translations;
use crate::log;
use crate::utils::markdown;
use crate::utils::url::resolve_url;

/// Tree descriptor file expected in every language directory.
pub const TREE_FILE: &str = "tree.json";

/// Directory with one sub-directory of content files per page.
const PAGES_DIR: &str = "pages";

const IGNORED_FILES: &[&str] = &[".DS_Store"];

// =============================================================================
// Descriptor Data
// =============================================================================

/// The merged tree descriptor of one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeData {
    /// Site-wide properties.
    #[serde(default)]
    pub site: Map<String, Value>,

    /// Named menu trees.
    #[serde(default)]
    pub menus: BTreeMap<String, Vec<MenuItem>>,

    /// Page records keyed by page identifier.
    #[serde(default)]
    pub pages: BTreeMap<String, PageRecord>,

    /// Redirect declarations, validated lazily by [`ContentTree::redirects`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirects: Vec<RedirectSpec>,

    /// Any further top-level descriptor sections, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A redirect as declared in the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectSpec {
    /// Identifier of the page the redirect leads to.
    #[serde(rename = "_page")]
    pub page: String,

    /// Site-relative path the redirect is served from.
    pub source: String,
}

/// A validated redirect, ready for generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    /// Resolved `_path` of the target page.
    pub path: String,

    /// Site-relative path the redirect is served from.
    pub source: String,
}

/// Recursively merge `overlay` onto `base`. Objects merge key by key,
/// everything else (arrays included) replaces the base value wholesale.
pub(crate) fn deep_merge(base: &mut Value, overlay: Value) {
    if let Value::Object(overlay_map) = overlay {
        if let Value::Object(base_map) = base {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        } else {
            *base = Value::Object(overlay_map);
        }
    } else {
        *base = overlay;
    }
}

// =============================================================================
// Content Tree
// =============================================================================

/// The fully loaded content tree of one language.
#[derive(Debug)]
pub struct ContentTree {
    lang: String,
    data: TreeData,
    translations: Translations,
    site_url: Option<String>,
    alternates: BTreeMap<String, BTreeMap<String, String>>,
    relative_alternates: BTreeMap<String, BTreeMap<String, String>>,
}

impl ContentTree {
    /// Load the tree of `lang` from `content_root`.
    ///
    /// `site_data` is the shared site descriptor merged under the
    /// language's own `tree.json`. The site URL is taken from
    /// `site_url_override` when given, then from the `SITE_URL`
    /// environment variable, then from the merged `site.url` property.
    pub fn load(
        lang: &str,
        content_root: &Path,
        site_data: &Map<String, Value>,
        site_url_override: Option<&str>,
        sitemap: &Sitemap,
    ) -> Result<Self> {
        let lang_path = content_root.join(lang);
        let translations = Translations::load(&lang_path)?;

        let tree_path = lang_path.join(TREE_FILE);
        let raw = fs::read_to_string(&tree_path)
            .with_context(|| format!("Failed to read {}", tree_path.display()))?;
        let tree_value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", tree_path.display()))?;

        let mut merged = Value::Object(site_data.clone());
        if tree_value.is_object() {
            deep_merge(&mut merged, tree_value);
        } else {
            // Only the shared site data remains for this language
            log!("warn"; "Failed to load tree json file {}", tree_path.display());
        }
        let data: TreeData = serde_json::from_value(merged)
            .with_context(|| format!("Failed to interpret tree descriptor {}", tree_path.display()))?;

        let site_url = site_url_override
            .map(str::to_owned)
            .or_else(|| std::env::var("SITE_URL").ok())
            .or_else(|| data.site.get("url").and_then(Value::as_str).map(str::to_owned));

        let mut tree = Self {
            lang: lang.to_owned(),
            data,
            translations,
            site_url,
            alternates: BTreeMap::new(),
            relative_alternates: BTreeMap::new(),
        };
        tree.ingest_pages(&lang_path, sitemap)?;
        tree.register_sitemap_pages(sitemap);
        Ok(tree)
    }

    /// Walk `pages/` and attach the content files to their page records.
    fn ingest_pages(&mut self, lang_path: &Path, sitemap: &Sitemap) -> Result<()> {
        let pages_path = lang_path.join(PAGES_DIR);
        if !pages_path.exists() {
            return Ok(());
        }
        if !pages_path.is_dir() {
            log!("warn"; "{} is not a directory, skipping content files", pages_path.display());
            return Ok(());
        }

        for page_path in sorted_entries(&pages_path)? {
            let Some(page_name) = page_path.file_name().and_then(OsStr::to_str) else {
                continue;
            };
            if IGNORED_FILES.contains(&page_name) {
                continue;
            }
            if !page_path.is_dir() {
                log!("warn"; "Ignoring stray file {} in the pages directory", page_path.display());
                continue;
            }
            if !self.data.pages.contains_key(page_name) {
                log!("warn"; "Content directory {} has no page in the tree descriptor", page_path.display());
                continue;
            }
            self.ingest_page_dir(page_name.to_owned(), &page_path, sitemap)?;
        }
        Ok(())
    }

    /// Load every content file of one page directory.
    ///
    /// Markdown files are converted to HTML, JSON files are parsed, both
    /// end up as a free-form property named after the file stem. The
    /// modification time of every considered file feeds the sitemap's
    /// `lastmod`.
    fn ingest_page_dir(&mut self, page_name: String, page_path: &Path, sitemap: &Sitemap) -> Result<()> {
        let sitemap_key = format!("{}/{}", self.lang, page_name);
        let files = sorted_entries(page_path)?;

        let Some(record) = self.data.pages.get_mut(&page_name) else {
            return Ok(());
        };

        for file_path in files {
            let Some(file_name) = file_path.file_name().and_then(OsStr::to_str) else {
                continue;
            };
            if IGNORED_FILES.contains(&file_name) {
                continue;
            }
            if file_path.is_dir() {
                log!("warn"; "Ignoring nested directory {}", file_path.display());
                continue;
            }

            let modified = fs::metadata(&file_path)
                .and_then(|meta| meta.modified())
                .with_context(|| format!("Failed to read metadata of {}", file_path.display()))?;
            let timestamp =
                DateTime::<Utc>::from(modified).to_rfc3339_opts(SecondsFormat::Millis, true);
            sitemap.record_file_timestamp(&sitemap_key, timestamp);

            let Some(stem) = file_path.file_stem().and_then(OsStr::to_str) else {
                continue;
            };
            if stem.starts_with('_') {
                log!("warn"; "Ignoring {}, underscore properties are reserved", file_path.display());
                continue;
            }

            let value = match file_path.extension().and_then(OsStr::to_str) {
                Some("md") => {
                    let text = fs::read_to_string(&file_path)
                        .with_context(|| format!("Failed to read {}", file_path.display()))?;
                    let html = markdown::to_html(&text);
                    if html.trim().is_empty() {
                        log!("warn"; "Failed to load file {}", file_path.display());
                    }
                    Value::String(html)
                }
                Some("json") => {
                    let text = fs::read_to_string(&file_path)
                        .with_context(|| format!("Failed to read {}", file_path.display()))?;
                    let value: Value = serde_json::from_str(&text)
                        .with_context(|| format!("Failed to parse {}", file_path.display()))?;
                    if value.is_null() {
                        log!("warn"; "Failed to load file {}", file_path.display());
                    }
                    value
                }
                _ => {
                    log!("warn"; "Unknown file extension for file {}", file_path.display());
                    continue;
                }
            };

            if record.insert(stem.to_owned(), value) {
                log!("warn"; "Property {} for page {} overloaded!", stem, page_name);
            }
        }
        Ok(())
    }

    /// Register every sitemap-visible page with its absolute URL.
    fn register_sitemap_pages(&self, sitemap: &Sitemap) {
        let base = self.site_url.as_deref().unwrap_or("/");
        for (name, record) in &self.data.pages {
            if record.in_sitemap() {
                let loc = resolve_url(base, &record.path);
                sitemap.record_page(name, &self.lang, loc, record.priority);
            }
        }
    }

    /// Validated redirects. Declarations pointing at unknown pages or
    /// shadowing an existing page path are dropped with a warning.
    pub fn redirects(&self) -> Vec<Redirect> {
        self.data
            .redirects
            .iter()
            .filter_map(|spec| {
                let Some(record) = self.data.pages.get(&spec.page) else {
                    log!("warn"; "Redirect _page {} does not exist!", spec.page);
                    return None;
                };
                if self.data.pages.values().any(|page| page.path == spec.source) {
                    log!("warn"; "Redirect source {} clashes with an existing page!", spec.source);
                    return None;
                }
                Some(Redirect { path: record.path.clone(), source: spec.source.clone() })
            })
            .collect()
    }

    /// Record the counterpart of `page` in another language's tree.
    pub fn add_alternate(&mut self, page: &str, lang: &str, relative: String, absolute: String) {
        self.alternates
            .entry(page.to_owned())
            .or_default()
            .insert(lang.to_owned(), absolute);
        self.relative_alternates
            .entry(page.to_owned())
            .or_default()
            .insert(lang.to_owned(), relative);
    }

    /// Rendering context for one page of this tree.
    pub fn context<'t>(&'t self, page_id: &'t str) -> Result<PageContext<'t>> {
        PageContext::new(self, page_id)
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn data(&self) -> &TreeData {
        &self.data
    }

    pub fn pages(&self) -> &BTreeMap<String, PageRecord> {
        &self.data.pages
    }

    pub fn site_url(&self) -> Option<&str> {
        self.site_url.as_deref()
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    pub fn alternates_for(&self, page: &str) -> Option<&BTreeMap<String, String>> {
        self.alternates.get(page)
    }

    pub fn relative_alternates_for(&self, page: &str) -> Option<&BTreeMap<String, String>> {
        self.relative_alternates.get(page)
    }
}

/// Directory entries sorted by path for deterministic processing.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let entry =
            entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_tree(root: &Path, lang: &str, tree: &Value) {
        let lang_path = root.join(lang);
        fs::create_dir_all(&lang_path).unwrap();
        fs::write(lang_path.join(TREE_FILE), serde_json::to_string(tree).unwrap()).unwrap();
    }

    fn write_page_file(root: &Path, lang: &str, page: &str, file: &str, content: &str) {
        let dir = root.join(lang).join(PAGES_DIR).join(page);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    fn load(root: &Path, lang: &str) -> (ContentTree, Sitemap) {
        let sitemap = Sitemap::new();
        let tree =
            ContentTree::load(lang, root, &Map::new(), None, &sitemap).unwrap();
        (tree, sitemap)
    }

    #[test]
    fn deep_merge_merges_objects_and_replaces_arrays() {
        let mut base = json!({
            "site": {"title": "Site", "langs": ["en"]},
            "kept": true
        });
        deep_merge(
            &mut base,
            json!({"site": {"title": "Override", "langs": ["en", "fr"]}}),
        );
        assert_eq!(base["site"]["title"], "Override");
        assert_eq!(base["site"]["langs"], json!(["en", "fr"]));
        assert_eq!(base["kept"], true);
    }

    #[test]
    fn deep_merge_replaces_scalars_with_objects_and_back() {
        let mut base = json!({"a": 1});
        deep_merge(&mut base, json!({"a": {"b": 2}}));
        assert_eq!(base["a"]["b"], 2);
        deep_merge(&mut base, json!({"a": 3}));
        assert_eq!(base["a"], 3);
    }

    #[test]
    fn descriptor_sections_default_to_empty() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({}));
        let (tree, _) = load(tmp.path(), "en");
        assert!(tree.pages().is_empty());
        assert!(tree.data().menus.is_empty());
        assert!(tree.redirects().is_empty());
    }

    #[test]
    fn malformed_descriptor_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let lang_path = tmp.path().join("en");
        fs::create_dir_all(&lang_path).unwrap();
        fs::write(lang_path.join(TREE_FILE), "{not json").unwrap();
        let sitemap = Sitemap::new();
        let result = ContentTree::load("en", tmp.path(), &Map::new(), None, &sitemap);
        assert!(result.is_err());
    }

    #[test]
    fn non_object_descriptor_keeps_the_site_data() {
        let tmp = TempDir::new().unwrap();
        let lang_path = tmp.path().join("en");
        fs::create_dir_all(&lang_path).unwrap();
        fs::write(lang_path.join(TREE_FILE), "null").unwrap();

        let mut site_data = Map::new();
        site_data.insert("site".into(), json!({"title": "Shared"}));
        let sitemap = Sitemap::new();
        let tree = ContentTree::load("en", tmp.path(), &site_data, None, &sitemap).unwrap();

        assert_eq!(tree.data().site["title"], "Shared");
        assert!(tree.pages().is_empty());
    }

    #[test]
    fn page_without_path_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({"pages": {"broken": {"_layout": "page"}}}));
        let sitemap = Sitemap::new();
        let result = ContentTree::load("en", tmp.path(), &Map::new(), None, &sitemap);
        assert!(result.is_err());
    }

    #[test]
    fn site_data_merges_under_the_descriptor() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({"site": {"title": "English"}}));
        let mut site_data = Map::new();
        site_data.insert(
            "site".into(),
            json!({"title": "Shared", "author": "Team"}),
        );
        let sitemap = Sitemap::new();
        let tree =
            ContentTree::load("en", tmp.path(), &site_data, None, &sitemap).unwrap();
        assert_eq!(tree.data().site["title"], "English");
        assert_eq!(tree.data().site["author"], "Team");
    }

    #[test]
    fn markdown_files_become_html_properties() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({"pages": {"about": {"_path": "/about"}}}));
        write_page_file(tmp.path(), "en", "about", "body.md", "# Hello");
        let (tree, _) = load(tmp.path(), "en");
        let body = tree.pages()["about"].get("body").unwrap();
        assert!(body.as_str().unwrap().contains("<h1>Hello</h1>"));
    }

    #[test]
    fn json_files_become_structured_properties() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({"pages": {"about": {"_path": "/about"}}}));
        write_page_file(tmp.path(), "en", "about", "meta.json", r#"{"title": "About"}"#);
        let (tree, _) = load(tmp.path(), "en");
        assert_eq!(tree.pages()["about"].get("meta").unwrap()["title"], "About");
    }

    #[test]
    fn malformed_json_content_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({"pages": {"about": {"_path": "/about"}}}));
        write_page_file(tmp.path(), "en", "about", "meta.json", "{broken");
        let sitemap = Sitemap::new();
        let result = ContentTree::load("en", tmp.path(), &Map::new(), None, &sitemap);
        assert!(result.is_err());
    }

    #[test]
    fn content_files_overwrite_descriptor_properties() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            "en",
            &json!({"pages": {"about": {"_path": "/about", "body": "from tree"}}}),
        );
        write_page_file(tmp.path(), "en", "about", "body.md", "from file");
        let (tree, _) = load(tmp.path(), "en");
        let body = tree.pages()["about"].get("body").unwrap();
        assert!(body.as_str().unwrap().contains("from file"));
    }

    #[test]
    fn unknown_extensions_and_reserved_stems_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({"pages": {"about": {"_path": "/about"}}}));
        write_page_file(tmp.path(), "en", "about", "notes.txt", "plain");
        write_page_file(tmp.path(), "en", "about", "_path.md", "# nope");
        let (tree, _) = load(tmp.path(), "en");
        let page = &tree.pages()["about"];
        assert!(!page.has("notes"));
        assert_eq!(page.path, "/about");
    }

    #[test]
    fn site_url_override_beats_descriptor() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({"site": {"url": "https://tree.example"}}));
        let sitemap = Sitemap::new();
        let tree = ContentTree::load(
            "en",
            tmp.path(),
            &Map::new(),
            Some("https://cli.example"),
            &sitemap,
        )
        .unwrap();
        assert_eq!(tree.site_url(), Some("https://cli.example"));
    }

    #[test]
    fn redirects_are_validated_against_pages() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            "en",
            &json!({
                "pages": {"about": {"_path": "/about"}},
                "redirects": [
                    {"_page": "about", "source": "/about-us"},
                    {"_page": "missing", "source": "/gone"},
                    {"_page": "about", "source": "/about"}
                ]
            }),
        );
        let (tree, _) = load(tmp.path(), "en");
        let redirects = tree.redirects();
        assert_eq!(redirects.len(), 1);
        assert_eq!(redirects[0].source, "/about-us");
        assert_eq!(redirects[0].path, "/about");
    }
}
