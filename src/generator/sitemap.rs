//! Sitemap and robots.txt generation.
//!
//! Pages from every language tree register themselves while loading; the
//! sitemap renders once at the end of the build. Entries carry the
//! newest content-file modification time as `lastmod` and, for pages
//! existing in more than one language, `xhtml:link` alternate references
//! (including the page itself, as hreflang annotation requires).
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
//!         xmlns:xhtml="http://www.w3.org/1999/xhtml">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01T00:00:00.000Z</lastmod>
//!     <priority>1</priority>
//!     <xhtml:link rel="alternate" hreflang="en" href="https://example.com/"/>
//!     <xhtml:link rel="alternate" hreflang="fr" href="https://example.com/fr"/>
//!   </url>
//! </urlset>
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;

use crate::utils::url::resolve_url;

// =============================================================================
// Constants
// =============================================================================

/// XML namespace for sitemaps.
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// XML namespace for the hreflang alternate links.
const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

// =============================================================================
// Sitemap Registry
// =============================================================================

/// Shared sitemap registry. Trees load in parallel, so all recording
/// goes through a mutex.
#[derive(Debug)]
pub struct Sitemap {
    state: Mutex<SitemapState>,
}

#[derive(Debug)]
struct SitemapState {
    /// Fallback `lastmod` for pages without content files, fixed at
    /// construction time.
    now: String,
    site_url: Option<String>,
    /// Newest content-file timestamp per `lang/page` key.
    timestamps: BTreeMap<String, String>,
    /// Registered pages per `lang/page` key.
    entries: BTreeMap<String, SitemapEntry>,
    /// Absolute URL per language of every registered page.
    langs: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug)]
struct SitemapEntry {
    loc: String,
    page: String,
    priority: Option<f64>,
}

impl Sitemap {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SitemapState {
                now: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                site_url: None,
                timestamps: BTreeMap::new(),
                entries: BTreeMap::new(),
                langs: BTreeMap::new(),
            }),
        }
    }

    /// Record a content-file modification time for `lang/page`. The
    /// newest timestamp wins; timestamps are RFC 3339, so string order
    /// is time order.
    pub fn record_file_timestamp(&self, key: &str, timestamp: String) {
        let mut state = self.state.lock();
        let slot = state.timestamps.entry(key.to_owned()).or_default();
        if *slot < timestamp {
            *slot = timestamp;
        }
    }

    /// Register a page under its absolute URL.
    pub fn record_page(&self, page: &str, lang: &str, loc: String, priority: Option<f64>) {
        let mut state = self.state.lock();
        state
            .langs
            .entry(page.to_owned())
            .or_default()
            .insert(lang.to_owned(), loc.clone());
        state.entries.insert(
            format!("{lang}/{page}"),
            SitemapEntry { loc, page: page.to_owned(), priority },
        );
    }

    /// Site URL used for the `Sitemap:` line of robots.txt.
    pub fn set_site_url(&self, site_url: Option<String>) {
        self.state.lock().site_url = site_url;
    }

    /// Write `sitemap.xml` and `robots.txt` into the output directory.
    pub fn render(&self, output_dir: &Path) -> Result<()> {
        let state = self.state.lock();

        let sitemap_path = output_dir.join("sitemap.xml");
        fs::write(&sitemap_path, state.to_xml())
            .with_context(|| format!("Failed to write sitemap to {}", sitemap_path.display()))?;

        let robots_path = output_dir.join("robots.txt");
        fs::write(&robots_path, robots_txt(state.site_url.as_deref()))
            .with_context(|| format!("Failed to write {}", robots_path.display()))?;

        Ok(())
    }
}

impl Default for Sitemap {
    fn default() -> Self {
        Self::new()
    }
}

impl SitemapState {
    /// Generate the sitemap XML string.
    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<urlset xmlns="{SITEMAP_NS}" xmlns:xhtml="{XHTML_NS}">"#
        ));
        xml.push('\n');

        for (key, entry) in &self.entries {
            let lastmod = self.timestamps.get(key).unwrap_or(&self.now);
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            xml.push_str(&format!(
                "    <priority>{}</priority>\n",
                entry.priority.unwrap_or(1.0)
            ));
            if let Some(langs) = self.langs.get(&entry.page)
                && langs.len() > 1
            {
                for (hreflang, href) in langs {
                    xml.push_str(&format!(
                        r#"    <xhtml:link rel="alternate" hreflang="{hreflang}" href="{}"/>"#,
                        escape_xml(href)
                    ));
                    xml.push('\n');
                }
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn robots_txt(site_url: Option<&str>) -> String {
    let sitemap_url = resolve_url(site_url.unwrap_or("/"), "sitemap.xml");
    format!("User-agent: *\nAllow: /\n\nSitemap: {sitemap_url}\n")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn xml_of(sitemap: &Sitemap) -> String {
        sitemap.state.lock().to_xml()
    }

    #[test]
    fn empty_sitemap_has_no_urls() {
        let xml = xml_of(&Sitemap::new());
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}" xmlns:xhtml="{XHTML_NS}">"#)));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn registered_page_renders_with_defaults() {
        let sitemap = Sitemap::new();
        sitemap.record_page("home", "en", "https://example.com/".into(), None);
        let xml = xml_of(&sitemap);

        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<priority>1</priority>"));
        assert!(xml.contains("<lastmod>"));
    }

    #[test]
    fn priority_zero_is_preserved() {
        let sitemap = Sitemap::new();
        sitemap.record_page("home", "en", "https://example.com/".into(), Some(0.0));
        assert!(xml_of(&sitemap).contains("<priority>0</priority>"));
    }

    #[test]
    fn newest_file_timestamp_wins() {
        let sitemap = Sitemap::new();
        sitemap.record_file_timestamp("en/home", "2025-01-02T00:00:00.000Z".into());
        sitemap.record_file_timestamp("en/home", "2025-01-01T00:00:00.000Z".into());
        sitemap.record_page("home", "en", "https://example.com/".into(), None);

        assert!(xml_of(&sitemap).contains("<lastmod>2025-01-02T00:00:00.000Z</lastmod>"));
    }

    #[test]
    fn timestamps_without_a_registered_page_render_nothing() {
        let sitemap = Sitemap::new();
        sitemap.record_file_timestamp("en/hidden", "2025-01-01T00:00:00.000Z".into());
        assert!(!xml_of(&sitemap).contains("<url>"));
    }

    #[test]
    fn alternates_require_at_least_two_languages() {
        let sitemap = Sitemap::new();
        sitemap.record_page("home", "en", "https://example.com/".into(), None);
        assert!(!xml_of(&sitemap).contains("xhtml:link"));

        sitemap.record_page("home", "fr", "https://example.com/fr".into(), None);
        let xml = xml_of(&sitemap);
        assert!(xml.contains(r#"<xhtml:link rel="alternate" hreflang="en" href="https://example.com/"/>"#));
        assert!(xml.contains(r#"<xhtml:link rel="alternate" hreflang="fr" href="https://example.com/fr"/>"#));
        assert_eq!(xml.matches("<url>").count(), 2);
    }

    #[test]
    fn locs_are_escaped() {
        let sitemap = Sitemap::new();
        sitemap.record_page("search", "en", "https://example.com/?q=a&b=c".into(), None);
        assert!(xml_of(&sitemap).contains("<loc>https://example.com/?q=a&amp;b=c</loc>"));
    }

    #[test]
    fn robots_txt_points_at_the_sitemap() {
        assert_eq!(
            robots_txt(Some("https://example.com")),
            "User-agent: *\nAllow: /\n\nSitemap: https://example.com/sitemap.xml\n"
        );
        assert_eq!(
            robots_txt(None),
            "User-agent: *\nAllow: /\n\nSitemap: /sitemap.xml\n"
        );
    }

    #[test]
    fn render_writes_both_files() {
        let tmp = TempDir::new().unwrap();
        let sitemap = Sitemap::new();
        sitemap.record_page("home", "en", "https://example.com/".into(), None);
        sitemap.set_site_url(Some("https://example.com".into()));
        sitemap.render(tmp.path()).unwrap();

        let xml = std::fs::read_to_string(tmp.path().join("sitemap.xml")).unwrap();
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        let robots = std::fs::read_to_string(tmp.path().join("robots.txt")).unwrap();
        assert!(robots.contains("Sitemap: https://example.com/sitemap.xml"));
    }
}
