//! Plain-text extraction from rendered HTML.
//!
//! Search index documents carry the visible text of a page, not its
//! markup. The extractor prefers the contents of the first `<main>`
//! element and falls back to the whole document; `<head>`, `<script>`
//! and `<style>` contents never count as visible text.

use quick_xml::Reader;
use quick_xml::events::Event;

/// Extract the visible text of an HTML document.
///
/// Lines are trimmed and blank lines dropped, so the result is a compact
/// newline-separated block suitable for indexing.
pub fn extract_text(html: &str) -> String {
    let mut reader = Reader::from_reader(html.as_bytes());
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);

    let mut main_text = String::new();
    let mut all_text = String::new();
    let mut found_main = false;
    let mut main_depth = 0usize;
    let mut skip_depth = 0usize;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            // Malformed markup past this point: keep what we have.
            Err(_) => break,
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"main" => {
                    found_main = true;
                    main_depth += 1;
                }
                b"head" | b"script" | b"style" => skip_depth += 1,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"main" => main_depth = main_depth.saturating_sub(1),
                b"head" | b"script" | b"style" => skip_depth = skip_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"main" {
                    found_main = true;
                }
            }
            Ok(Event::Text(e)) => {
                if skip_depth == 0 {
                    let text = String::from_utf8_lossy(e.as_ref());
                    all_text.push_str(&text);
                    if main_depth > 0 {
                        main_text.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if skip_depth == 0 {
                    let text = String::from_utf8_lossy(e.as_ref());
                    all_text.push_str(&text);
                    if main_depth > 0 {
                        main_text.push_str(&text);
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if skip_depth == 0
                    && let Some(c) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    all_text.push(c);
                    if main_depth > 0 {
                        main_text.push(c);
                    }
                }
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    let picked = if found_main { &main_text } else { &all_text };
    normalize_lines(picked)
}

/// Resolve the entity references that show up in rendered pages.
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                num.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Trim every line and drop the blank ones.
fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Tests
// ============================================================================
