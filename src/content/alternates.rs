//! Cross-language alternate linking.
//!
//! After all trees are loaded, every ordered pair of distinct languages
//! is compared: pages sharing an identifier get an alternate entry for
//! the other language, both as the raw `_path` and as an absolute URL
//! under the other tree's site URL.

use crate::content::tree::ContentTree;
use crate::utils::url::resolve_url;

/// Link the alternates of every page across all trees. Symmetric by
/// construction: both directions of every pair are visited.
pub fn link_alternates(trees: &mut [ContentTree]) {
    for index in 0..trees.len() {
        let mut additions = Vec::new();
        for (other_index, other) in trees.iter().enumerate() {
            if other_index == index {
                continue;
            }
            let base = other.site_url().unwrap_or("/");
            for page_id in trees[index].pages().keys() {
                if let Some(record) = other.pages().get(page_id) {
                    let absolute = resolve_url(base, &record.path);
                    additions.push((
                        page_id.clone(),
                        other.lang().to_owned(),
                        record.path.clone(),
                        absolute,
                    ));
                }
            }
        }
        for (page, lang, relative, absolute) in additions {
            trees[index].add_alternate(&page, &lang, relative, absolute);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tree::TREE_FILE;
    use crate::generator::sitemap::Sitemap;
    use serde_json::{Map, Value, json};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_tree(root: &Path, lang: &str, tree: &Value) {
        let lang_path = root.join(lang);
        fs::create_dir_all(&lang_path).unwrap();
        fs::write(lang_path.join(TREE_FILE), serde_json::to_string(tree).unwrap()).unwrap();
    }

    fn load(root: &Path, lang: &str, sitemap: &Sitemap) -> ContentTree {
        ContentTree::load(lang, root, &Map::new(), None, sitemap).unwrap()
    }

    #[test]
    fn shared_pages_link_in_both_directions() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            "en",
            &json!({
                "site": {"url": "https://example.org"},
                "pages": {
                    "home": {"_path": "/"},
                    "only-en": {"_path": "/only"}
                }
            }),
        );
        write_tree(
            tmp.path(),
            "fr",
            &json!({
                "site": {"url": "https://example.fr"},
                "pages": {"home": {"_path": "/accueil"}}
            }),
        );

        let sitemap = Sitemap::new();
        let mut trees = vec![
            load(tmp.path(), "en", &sitemap),
            load(tmp.path(), "fr", &sitemap),
        ];
        link_alternates(&mut trees);

        let en = &trees[0];
        assert_eq!(en.alternates_for("home").unwrap()["fr"], "https://example.fr/accueil");
        assert_eq!(en.relative_alternates_for("home").unwrap()["fr"], "/accueil");
        assert!(en.alternates_for("only-en").is_none());
        assert!(en.alternates_for("home").unwrap().get("en").is_none());

        let fr = &trees[1];
        assert_eq!(fr.alternates_for("home").unwrap()["en"], "https://example.org/");
    }

    #[test]
    fn missing_site_url_falls_back_to_the_root() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), "en", &json!({"pages": {"home": {"_path": "/"}}}));
        write_tree(tmp.path(), "fr", &json!({"pages": {"home": {"_path": "/fr"}}}));

        let sitemap = Sitemap::new();
        let mut trees = vec![
            load(tmp.path(), "en", &sitemap),
            load(tmp.path(), "fr", &sitemap),
        ];
        link_alternates(&mut trees);

        assert_eq!(trees[0].alternates_for("home").unwrap()["fr"], "/fr");
    }

    #[test]
    fn three_languages_link_every_pair() {
        let tmp = TempDir::new().unwrap();
        for lang in ["de", "en", "fr"] {
            write_tree(
                tmp.path(),
                lang,
                &json!({"pages": {"home": {"_path": format!("/{lang}")}}}),
            );
        }

        let sitemap = Sitemap::new();
        let mut trees = vec![
            load(tmp.path(), "de", &sitemap),
            load(tmp.path(), "en", &sitemap),
            load(tmp.path(), "fr", &sitemap),
        ];
        link_alternates(&mut trees);

        for tree in &trees {
            let alternates = tree.alternates_for("home").unwrap();
            assert_eq!(alternates.len(), 2);
            assert!(!alternates.contains_key(tree.lang()));
        }
    }
}
