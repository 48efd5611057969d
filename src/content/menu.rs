//! Menu trees.
//!
//! Menus are declared in the tree descriptor as nested item lists. Every
//! item links either to a page of the same tree (`_page`, optionally with
//! an `_anchor`) or to a literal path (`_path`), and may carry arbitrary
//! extra properties such as labels. Resolution against a concrete page
//! happens in [`crate::content::context`]; this module holds the raw
//! shape, the link-target classification and the breadcrumb search.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Raw Menu Items
// =============================================================================

/// A menu node as written in the tree descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Identifier of the linked page.
    #[serde(rename = "_page", skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Literal link path, used when no `_page` is given.
    #[serde(rename = "_path", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Fragment appended to the resolved page path.
    #[serde(rename = "_anchor", skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    /// Nested submenu items.
    #[serde(rename = "_subs", default, skip_serializing_if = "Vec::is_empty")]
    pub subs: Vec<MenuItem>,

    /// Free-form presentation properties (labels, icons, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where a menu item points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget<'a> {
    /// A page of the same tree, optionally with a fragment.
    Page { id: &'a str, anchor: Option<&'a str> },
    /// A path used verbatim.
    Literal(&'a str),
}

impl MenuItem {
    /// Classify the item's link target. `_page` wins when both are given.
    pub fn target(&self) -> Result<MenuTarget<'_>> {
        if let Some(id) = &self.page {
            Ok(MenuTarget::Page { id, anchor: self.anchor.as_deref() })
        } else if let Some(path) = &self.path {
            Ok(MenuTarget::Literal(path))
        } else {
            bail!("Menu item carries neither `_page` nor `_path`");
        }
    }

    /// Whether the item links to `page` directly.
    pub fn is_current(&self, page: &str) -> bool {
        self.page.as_deref() == Some(page)
    }

    /// Whether the item links to `page` directly or through any
    /// descendant.
    pub fn is_active(&self, page: &str) -> bool {
        self.is_current(page) || self.subs.iter().any(|sub| sub.is_active(page))
    }
}

// =============================================================================
// Resolved Menu Entries
// =============================================================================

/// A menu item resolved against a concrete page.
///
/// Serialization mirrors the raw item with the resolution results added,
/// so templates see both the original properties and the computed state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    /// Resolved link path.
    pub path: String,

    /// The current page is this entry or somewhere below it.
    #[serde(rename = "isActive")]
    pub is_active: bool,

    /// The entry links straight to the current page.
    #[serde(rename = "isCurrent")]
    pub is_current: bool,

    /// The resolved path leaves the site.
    #[serde(rename = "isExternal")]
    pub is_external: bool,

    /// Identifier of the linked page, if the item used `_page`.
    #[serde(rename = "_page", skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Fragment of the original item, if any.
    #[serde(rename = "_anchor", skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    /// Resolved submenu entries.
    #[serde(rename = "_subs", skip_serializing_if = "Vec::is_empty")]
    pub subs: Vec<MenuEntry>,

    /// Free-form properties carried over from the raw item.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Breadcrumb Search
// =============================================================================

/// Find the first item linking to `page`, depth-first in declaration
/// order, and return the raw items leading from the menu root to it.
/// `None` when no item of the menu links to the page.
pub fn find_page<'m>(items: &'m [MenuItem], page: &str) -> Option<Vec<&'m MenuItem>> {
    let mut trail = Vec::new();
    if descend(items, page, &mut trail) { Some(trail) } else { None }
}

fn descend<'m>(items: &'m [MenuItem], page: &str, trail: &mut Vec<&'m MenuItem>) -> bool {
    for item in items {
        trail.push(item);
        if item.is_current(page) || descend(&item.subs, page, trail) {
            return true;
        }
        trail.pop();
    }
    false
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(json: &str) -> Vec<MenuItem> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn page_target_wins_over_path() {
        let items = menu(r#"[{"_page": "home", "_path": "/elsewhere", "_anchor": "top"}]"#);
        match items[0].target().unwrap() {
            MenuTarget::Page { id, anchor } => {
                assert_eq!(id, "home");
                assert_eq!(anchor, Some("top"));
            }
            MenuTarget::Literal(_) => panic!("expected a page target"),
        }
    }

    #[test]
    fn literal_target() {
        let items = menu(r#"[{"_path": "https://example.org", "label": "Docs"}]"#);
        assert_eq!(
            items[0].target().unwrap(),
            MenuTarget::Literal("https://example.org")
        );
    }

    #[test]
    fn item_without_target_is_an_error() {
        let items = menu(r#"[{"label": "Broken"}]"#);
        assert!(items[0].target().is_err());
    }

    #[test]
    fn active_state_propagates_from_descendants() {
        let items = menu(
            r#"[{"_page": "docs", "_subs": [
                {"_page": "install", "_subs": [{"_page": "linux"}]}
            ]}]"#,
        );
        assert!(items[0].is_active("linux"));
        assert!(items[0].is_active("install"));
        assert!(items[0].is_active("docs"));
        assert!(!items[0].is_active("home"));
        assert!(!items[0].is_current("linux"));
    }

    #[test]
    fn literal_items_are_never_current() {
        let items = menu(r#"[{"_path": "/misc"}]"#);
        assert!(!items[0].is_current("misc"));
        assert!(!items[0].is_active("misc"));
    }

    #[test]
    fn breadcrumbs_walk_from_root_to_page() {
        let items = menu(
            r#"[
                {"_page": "home"},
                {"_page": "docs", "_subs": [
                    {"_page": "guide", "_subs": [{"_page": "setup"}]}
                ]}
            ]"#,
        );
        let trail = find_page(&items, "setup").unwrap();
        let pages: Vec<_> = trail.iter().map(|item| item.page.as_deref()).collect();
        assert_eq!(pages, [Some("docs"), Some("guide"), Some("setup")]);
    }

    #[test]
    fn breadcrumbs_prefer_subtrees_over_later_siblings() {
        let items = menu(
            r#"[
                {"_page": "first", "_subs": [{"_page": "shared"}]},
                {"_page": "shared"}
            ]"#,
        );
        let trail = find_page(&items, "shared").unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].page.as_deref(), Some("first"));
    }

    #[test]
    fn breadcrumbs_for_unlisted_page_are_none() {
        let items = menu(r#"[{"_page": "home"}]"#);
        assert!(find_page(&items, "missing").is_none());
    }

    #[test]
    fn root_item_forms_a_single_element_trail() {
        let items = menu(r#"[{"_page": "home"}]"#);
        let trail = find_page(&items, "home").unwrap();
        assert_eq!(trail.len(), 1);
    }
}
