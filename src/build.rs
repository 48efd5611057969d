//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── 1. Cleaning the output..     empty the output directory
//!     ├── 2. Copying assets..          copy the asset tree verbatim
//!     ├── 3. Loading data..            site.json + one content tree per
//!     │                                language (parallel), then
//!     │                                cross-language alternate linking
//!     ├── 4. Generating pages..        layouts, redirects and search
//!     │                                indexes, language by language
//!     └── 5. Generating sitemap + robots.txt..
//! ```
//!
//! Languages generate in default-last order, so when two trees declare
//! the same output path the default language wins.

use crate::{
    config::{Features, SiteConfig},
    content::{
        alternates::link_alternates,
        context::PageContext,
        tree::ContentTree,
    },
    generator::{
        search::{IndexDocument, JsonIndexer, SearchIndexer},
        sitemap::Sitemap,
    },
    i18n::discover_languages,
    log,
    logger::ProgressBars,
    render::{LayoutRenderer, Renderer},
    utils::url::resolve_url,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Shared site data file at the content root, merged under every
/// language's tree descriptor.
const SITE_FILE: &str = "site.json";

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Per-page hook. Whatever it returns is merged into the render data as
/// `extra` before the page renders. Receives the context and the output
/// path the page will be written to.
pub type ExtraHook = dyn Fn(&PageContext, &Path) -> Result<Option<Value>> + Sync;

/// Build the entire site with the default hooks.
pub fn build_site(config: &'static SiteConfig) -> Result<()> {
    build_site_with(config, None)
}

/// Build the entire site.
pub fn build_site_with(config: &'static SiteConfig, extra: Option<&ExtraHook>) -> Result<()> {
    let content = &config.build.content;
    let output = &config.build.output;

    let features = config.load_features()?;
    log!("features"; "{}", features.summary());

    // ========================================================================
    // Clean output and copy assets
    // ========================================================================

    log!("build"; "1. Cleaning the output..");
    clean_output(output)?;

    log!("build"; "2. Copying assets..");
    copy_assets(&config.build.assets, output)?;

    // ========================================================================
    // Load all language trees
    // ========================================================================

    log!("build"; "3. Loading data..");
    let site_data = load_site_data(content)?;
    let default_lang = site_data.get("defaultLang").and_then(Value::as_str);
    let langs = discover_languages(content, default_lang)?;
    if langs.is_empty() {
        log!("warn"; "No language directories found in {}", content.display());
    }

    let sitemap = Sitemap::new();
    let site_url_override = config.build.site_url.as_deref();
    let mut trees = langs
        .par_iter()
        .map(|lang| ContentTree::load(lang, content, &site_data, site_url_override, &sitemap))
        .collect::<Result<Vec<_>>>()?;
    link_alternates(&mut trees);
    sitemap.set_site_url(trees.last().and_then(|tree| tree.site_url().map(str::to_owned)));

    // ========================================================================
    // Generate pages, redirects and search indexes
    // ========================================================================

    log!("build"; "4. Generating pages..");
    let total_pages = trees.iter().map(|tree| tree.pages().len()).sum();
    let progress = ProgressBars::new(&[("render", total_pages)]);
    let renderer = LayoutRenderer::new(content);
    for tree in &trees {
        generate_tree(tree, &renderer, output, &features, extra, &progress)?;
    }
    progress.finish();

    // ========================================================================
    // Generate sitemap and robots.txt
    // ========================================================================

    log!("build"; "5. Generating sitemap + robots.txt..");
    sitemap.render(output)?;

    log!("build"; "DONE");
    Ok(())
}

// =============================================================================
// Page Generation
// =============================================================================

/// Render all pages of one language tree, then its redirects and its
/// search index.
fn generate_tree<R: Renderer>(
    tree: &ContentTree,
    renderer: &R,
    output: &Path,
    features: &Features,
    extra: Option<&ExtraHook>,
    progress: &ProgressBars,
) -> Result<()> {
    let mut indexer = JsonIndexer::new();

    for (doc_id, page_id) in tree.pages().keys().enumerate() {
        let ctx = tree.context(page_id)?;
        let out_path = page_output_path(output, &ctx.record().path);

        let mut data = ctx.render_data();
        if let Some(hook) = extra
            && let Some(value) = hook(&ctx, &out_path)?
            && let Some(map) = data.as_object_mut()
        {
            map.insert("extra".into(), value);
        }

        let mut html = renderer
            .render_page(&ctx, &data)
            .with_context(|| format!("Failed to render page `{page_id}` ({})", tree.lang()))?;
        if ctx.record().extra_rendering.unwrap_or(false) {
            html = renderer.render_inline(&html, &data)?;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&out_path, &html)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;

        if features.generate_search_index {
            indexer.add(IndexDocument::from_page(doc_id, ctx.record(), &html));
        }
        progress.inc_by_name("render");
    }

    generate_redirects(tree, output)?;

    if features.generate_search_index {
        indexer.export(tree.lang(), output)?;
    } else {
        log!("search"; "Skipping search index generation");
    }
    Ok(())
}

/// Output location for a page path: `_path` ending in `.html` maps to
/// that file, anything else becomes a directory with an `index.html`.
fn page_output_path(output: &Path, path: &str) -> PathBuf {
    let relative = path.trim_start_matches('/');
    if relative.ends_with(".html") {
        output.join(relative)
    } else {
        output.join(relative).join("index.html")
    }
}

/// Write a meta-refresh page for every validated redirect of the tree.
fn generate_redirects(tree: &ContentTree, output: &Path) -> Result<()> {
    let base = tree.site_url().unwrap_or("/");
    for redirect in tree.redirects() {
        let url = resolve_url(base, &redirect.path);
        let dir = output.join(redirect.source.trim_start_matches('/'));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        fs::write(dir.join("index.html"), redirect_html(&url))
            .with_context(|| format!("Failed to write redirect {}", redirect.source))?;
        log!("render"; "Redirect {} -> {}", redirect.source, url);
    }
    Ok(())
}

fn redirect_html(url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta http-equiv="refresh" content="0; url={url}">
  </head>
  <body>
    <p>The page has moved to <a href="{url}">this address</a>.</p>
  </body>
</html>
"#
    )
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Empty the output directory, creating it if missing.
fn clean_output(output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    Ok(())
}

/// Copy the asset tree verbatim into the output directory. A missing
/// assets directory is not an error.
fn copy_assets(assets: &Path, output: &Path) -> Result<()> {
    if !assets.is_dir() {
        log!("warn"; "Assets directory {} not found, skipping", assets.display());
        return Ok(());
    }

    let files = collect_all_files(assets);
    let progress = ProgressBars::new_filtered(&[("assets", files.len())]);

    files.par_iter().try_for_each(|path| -> Result<()> {
        let relative = path.strip_prefix(assets)?;
        let dest = output.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(path, &dest)
            .with_context(|| format!("Failed to copy asset {}", path.display()))?;
        if let Some(progress) = &progress {
            progress.inc_by_name("assets");
        }
        Ok(())
    })?;

    if let Some(progress) = progress {
        progress.finish();
    }
    Ok(())
}

/// Collect all files from a directory recursively.
fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Read the shared `site.json`. A missing file means no shared data,
/// non-object contents count as empty, a malformed file aborts the
/// build.
fn load_site_data(content: &Path) -> Result<Map<String, Value>> {
    let path = content.join(SITE_FILE);
    if !path.exists() {
        return Ok(Map::new());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

// =============================================================================
// Tests
// =============================================================================
