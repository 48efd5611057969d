//! Per-page rendering context.
//!
//! A [`PageContext`] bundles one page of a loaded tree with every lookup
//! a renderer needs: path resolution, menu resolution, breadcrumbs, site
//! properties, translations and cross-language alternates. It borrows
//! the tree, so contexts are cheap to create per page.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use serde_json::{Map, Value};

use crate::content::menu::{self, MenuEntry, MenuItem, MenuTarget};
use crate::content::page::PageRecord;
use crate::content::tree::{ContentTree, TreeData};
use crate::utils::url::join_site_path;

static EMPTY_ALTERNATES: BTreeMap<String, String> = BTreeMap::new();

/// Rendering view of a single page.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'t> {
    tree: &'t ContentTree,
    page_id: &'t str,
    record: &'t PageRecord,
}

impl<'t> PageContext<'t> {
    /// Create the context for `page_id`, which must exist in the tree.
    pub fn new(tree: &'t ContentTree, page_id: &'t str) -> Result<Self> {
        let Some(record) = tree.pages().get(page_id) else {
            bail!("Unknown page `{page_id}`");
        };
        Ok(Self { tree, page_id, record })
    }

    // =========================================================================
    // Path Resolution
    // =========================================================================

    /// Resolve the path of the page `id`, optionally with a fragment.
    ///
    /// Relative resolution returns the page's `_path` as declared.
    /// Absolute resolution prefixes the site URL, joined with exactly one
    /// separator; without a configured site URL the path stays
    /// site-relative.
    pub fn path(&self, id: &str, absolute: bool, anchor: Option<&str>) -> Result<String> {
        let Some(record) = self.tree.pages().get(id) else {
            bail!("Unknown page `{id}`");
        };
        let mut path = self.transform(&record.path, absolute);
        if let Some(anchor) = anchor {
            path.push('#');
            path.push_str(anchor);
        }
        Ok(path)
    }

    /// Resolve a literal asset path the same way page paths resolve.
    pub fn asset(&self, path: &str, absolute: bool) -> String {
        self.transform(path, absolute)
    }

    /// The current page's own resolved path.
    pub fn url(&self, absolute: bool) -> String {
        self.transform(&self.record.path, absolute)
    }

    fn transform(&self, path: &str, absolute: bool) -> String {
        if absolute {
            join_site_path(self.tree.site_url().unwrap_or(""), path)
        } else {
            path.to_owned()
        }
    }

    // =========================================================================
    // Menus and Breadcrumbs
    // =========================================================================

    /// Resolve the menu `name` against the current page. An unknown menu
    /// name yields an empty menu.
    pub fn menu(&self, name: &str) -> Result<Vec<MenuEntry>> {
        let Some(items) = self.tree.data().menus.get(name) else {
            return Ok(Vec::new());
        };
        items.iter().map(|item| self.resolve_menu_item(item)).collect()
    }

    fn resolve_menu_item(&self, item: &MenuItem) -> Result<MenuEntry> {
        let path = match item.target()? {
            MenuTarget::Page { id, anchor } => self.path(id, false, anchor)?,
            MenuTarget::Literal(path) => path.to_owned(),
        };
        let subs = item
            .subs
            .iter()
            .map(|sub| self.resolve_menu_item(sub))
            .collect::<Result<Vec<_>>>()?;
        Ok(MenuEntry {
            is_external: path.starts_with("http"),
            is_current: item.is_current(self.page_id),
            is_active: item.is_active(self.page_id),
            page: item.page.clone(),
            anchor: item.anchor.clone(),
            extra: item.extra.clone(),
            path,
            subs,
        })
    }

    /// Breadcrumb trail for the current page in the menu `name`, from the
    /// menu root down to the first item linking here. `None` when no item
    /// of the menu links to the page.
    pub fn bread_crumbs(&self, name: &str) -> Option<Vec<&'t MenuItem>> {
        let items = self.tree.data().menus.get(name)?;
        menu::find_page(items, self.page_id)
    }

    // =========================================================================
    // Data Lookups
    // =========================================================================

    /// Site-wide property lookup.
    pub fn site(&self, property: &str) -> Option<&'t Value> {
        self.tree.data().site.get(property)
    }

    /// Whether the current page defines `property`.
    pub fn is_defined(&self, property: &str) -> bool {
        self.record.has(property)
    }

    /// Translate `key`, falling back to the key itself.
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.tree.translations().resolve(key)
    }

    /// Any other page of the tree.
    pub fn page(&self, id: &str) -> Option<&'t PageRecord> {
        self.tree.pages().get(id)
    }

    /// The whole merged tree descriptor.
    pub fn tree(&self) -> &'t TreeData {
        self.tree.data()
    }

    /// Absolute URLs of this page in the other languages, keyed by
    /// language.
    pub fn alternates(&self) -> &'t BTreeMap<String, String> {
        self.tree.alternates_for(self.page_id).unwrap_or(&EMPTY_ALTERNATES)
    }

    /// Site-relative paths of this page in the other languages.
    pub fn relative_alternates(&self) -> &'t BTreeMap<String, String> {
        self.tree.relative_alternates_for(self.page_id).unwrap_or(&EMPTY_ALTERNATES)
    }

    pub fn page_id(&self) -> &'t str {
        self.page_id
    }

    pub fn record(&self) -> &'t PageRecord {
        self.record
    }

    pub fn lang(&self) -> &'t str {
        self.tree.lang()
    }

    // =========================================================================
    // Placeholder Data
    // =========================================================================

    /// Flat JSON view handed to placeholder interpolation: the page's own
    /// properties plus `_page` and the `f.alternates` maps.
    pub fn render_data(&self) -> Value {
        let mut map = self.record.to_map();
        map.insert("_page".into(), Value::String(self.page_id.to_owned()));
        let mut f = Map::new();
        f.insert("alternates".into(), string_map_value(self.alternates()));
        f.insert("relativeAlternates".into(), string_map_value(self.relative_alternates()));
        map.insert("f".into(), Value::Object(f));
        Value::Object(map)
    }
}

fn string_map_value(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
}

// =============================================================================
// Tests
// =============================================================================
