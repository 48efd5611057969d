//! Per-language translations and language-root discovery.
//!
//! A language root is an immediate subdirectory of the content root that
//! carries a `tree.json` descriptor. Its optional `translations.json` maps
//! literal strings to their translated form.

use crate::content::tree::TREE_FILE;
use crate::log;
use anyhow::{Context, Result};
use std::{collections::BTreeMap, fs, path::Path};

/// Translation file name inside a language root.
const TRANSLATIONS_FILE: &str = "translations.json";

// ============================================================================
// Translations
// ============================================================================

/// Flat key -> string mapping for one language.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    map: BTreeMap<String, String>,
}

impl Translations {
    /// Load `translations.json` from a language root.
    ///
    /// A missing file yields the empty mapping; a malformed one is fatal.
    pub fn load(lang_path: &Path) -> Result<Self> {
        let file = lang_path.join(TRANSLATIONS_FILE);
        if !file.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let map = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", file.display()))?;

        Ok(Self { map })
    }

    /// Resolve a translation key, falling back to the key itself.
    ///
    /// A miss is logged unless the mapping is empty, so untranslated
    /// sites stay quiet.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        match self.map.get(key) {
            Some(value) => value,
            None => {
                if !self.map.is_empty() {
                    log!("warn"; "Translation not found for \"{key}\"");
                }
                key
            }
        }
    }
}

// ============================================================================
// Language Discovery
// ============================================================================

/// List the language roots under the content directory.
///
/// Results are sorted for determinism, with the default language moved
/// last: its tree is loaded last, which makes its site URL the
/// authoritative one for the sitemap.
pub fn discover_languages(
    content_root: &Path,
    default_lang: Option<&str>,
) -> Result<Vec<String>> {
    let entries = fs::read_dir(content_root).with_context(|| {
        format!("Failed to read content directory {}", content_root.display())
    })?;

    let mut langs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir()
            && path.join(TREE_FILE).exists()
            && let Some(name) = entry.file_name().to_str()
        {
            langs.push(name.to_owned());
        }
    }

    langs.sort();
    if let Some(default_lang) = default_lang {
        // Stable: non-default languages keep their relative order
        langs.sort_by_key(|lang| lang == default_lang);
    }

    Ok(langs)
}

/// First two characters of a language code ("en-US" -> "en"), used in
/// search-index file names.
pub fn short_lang_code(lang: &str) -> &str {
    match lang.char_indices().nth(2) {
        Some((idx, _)) => &lang[..idx],
        None => lang,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn lang_dir(root: &Path, name: &str, with_tree: bool) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        if with_tree {
            fs::write(dir.join(TREE_FILE), "{}").unwrap();
        }
    }

    #[test]
    fn missing_translations_file_yields_empty_mapping() {
        let dir = TempDir::new().unwrap();
        let translations = Translations::load(dir.path()).unwrap();
        assert_eq!(translations.resolve("Hello"), "Hello");
    }

    #[test]
    fn malformed_translations_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TRANSLATIONS_FILE), "{broken").unwrap();
        assert!(Translations::load(dir.path()).is_err());
    }

    #[test]
    fn resolve_returns_mapped_value() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(TRANSLATIONS_FILE),
            r#"{"Hello": "Bonjour"}"#,
        )
        .unwrap();

        let translations = Translations::load(dir.path()).unwrap();
        assert_eq!(translations.resolve("Hello"), "Bonjour");
        assert_eq!(translations.resolve("Goodbye"), "Goodbye");
    }

    #[test]
    fn discovers_only_directories_with_tree_descriptor() {
        let dir = TempDir::new().unwrap();
        lang_dir(dir.path(), "en", true);
        lang_dir(dir.path(), "fr", true);
        lang_dir(dir.path(), "drafts", false);
        fs::write(dir.path().join("site.json"), "{}").unwrap();

        let langs = discover_languages(dir.path(), None).unwrap();
        assert_eq!(langs, vec!["en", "fr"]);
    }

    #[test]
    fn default_language_sorts_last() {
        let dir = TempDir::new().unwrap();
        lang_dir(dir.path(), "de", true);
        lang_dir(dir.path(), "en", true);
        lang_dir(dir.path(), "fr", true);

        let langs = discover_languages(dir.path(), Some("en")).unwrap();
        assert_eq!(langs, vec!["de", "fr", "en"]);
    }

    #[test]
    fn unknown_default_language_keeps_sorted_order() {
        let dir = TempDir::new().unwrap();
        lang_dir(dir.path(), "fr", true);
        lang_dir(dir.path(), "en", true);

        let langs = discover_languages(dir.path(), Some("es")).unwrap();
        assert_eq!(langs, vec!["en", "fr"]);
    }

    #[test]
    fn short_codes_truncate_to_two_chars() {
        assert_eq!(short_lang_code("en-US"), "en");
        assert_eq!(short_lang_code("fr"), "fr");
        assert_eq!(short_lang_code("f"), "f");
        assert_eq!(short_lang_code(""), "");
    }
}
