//! Markdown to HTML conversion for `.md` content files.

use pulldown_cmark::{Options, Parser, html};

/// Render a Markdown document to an HTML fragment.
///
/// GitHub-flavored extensions are enabled so tables, strikethrough and
/// task lists in content files come out as expected.
pub fn to_html(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM;
    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 2);
    html::push_html(&mut out, parser);
    out
}

// ============================================================================
// Tests
// ============================================================================
