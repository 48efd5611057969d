//! Search index generation.
//!
//! Every rendered page contributes one document per language; the index
//! is exported as `index-<lang>.json` next to the generated pages, ready
//! for a client-side search library to consume.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::content::page::PageRecord;
use crate::i18n::short_lang_code;
use crate::utils::text::extract_text;

// =============================================================================
// Index Documents
// =============================================================================

/// One searchable page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDocument {
    pub id: usize,
    pub url: String,
    pub title: String,
    pub desc: String,
    pub body: String,
}

impl IndexDocument {
    /// Build the document for one rendered page.
    ///
    /// Title and description prefer the page's `meta` object; the title
    /// falls back to the page's own `title` property, the description to
    /// an empty string. The body is the visible text of the rendered
    /// HTML.
    pub fn from_page(id: usize, record: &PageRecord, html: &str) -> Self {
        let meta = record.get("meta").and_then(Value::as_object);
        let title = meta
            .and_then(|meta| meta.get("title"))
            .or_else(|| record.get("title"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let desc = meta
            .and_then(|meta| meta.get("description"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        Self { id, url: record.path.clone(), title, desc, body: extract_text(html) }
    }
}

// =============================================================================
// Indexers
// =============================================================================

/// Collects the documents of one language and writes the index file.
pub trait SearchIndexer {
    /// Add one document to the index.
    fn add(&mut self, doc: IndexDocument);

    /// Write the index for `lang` into the output directory.
    fn export(&self, lang: &str, output_dir: &Path) -> Result<()>;
}

/// Default indexer: a plain JSON dump of all documents, with the indexed
/// field names alongside so the consuming side knows what to search.
#[derive(Debug, Default)]
pub struct JsonIndexer {
    documents: Vec<IndexDocument>,
}

#[derive(Serialize)]
struct JsonIndex<'a> {
    version: u32,
    indexed: [&'static str; 3],
    documents: &'a [IndexDocument],
}

impl JsonIndexer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchIndexer for JsonIndexer {
    fn add(&mut self, doc: IndexDocument) {
        self.documents.push(doc);
    }

    fn export(&self, lang: &str, output_dir: &Path) -> Result<()> {
        let index = JsonIndex {
            version: 1,
            indexed: ["title", "desc", "body"],
            documents: &self.documents,
        };
        let json = serde_json::to_string(&index).context("Failed to serialize search index")?;

        let path = output_dir.join(format!("index-{}.json", short_lang_code(lang)));
        fs::write(&path, json)
            .with_context(|| format!("Failed to write search index {}", path.display()))?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
