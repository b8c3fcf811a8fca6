//! # Identity Index
//!
//! Actions reference other widgets by `guid`. ESPHome references them by id,
//! so before any conversion the whole tree is walked once to map every named
//! node's guid to the slug its fragment will carry.

use crate::project::SourceNode;
use std::collections::HashMap;

pub const NAME_TAG: &str = "OBJECT/Name";
pub const TAB_NAME_TAG: &str = "TABPAGE/Name";

/// Make an identifier-safe id: ASCII letters, digits and underscores, lowercase
pub fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Read-only `guid → slug` map for one conversion run
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    slugs: HashMap<String, String>,
}

impl IdentityIndex {
    /// Index every named node under `root`, regardless of its kind
    pub fn build(root: &SourceNode) -> Self {
        let mut index = Self::default();
        index.visit(root);
        tracing::debug!("Identity index holds {} named nodes", index.len());
        index
    }

    fn visit(&mut self, node: &SourceNode) {
        if let Some(guid) = &node.guid {
            for tag in [NAME_TAG, TAB_NAME_TAG] {
                if let Some(name) = node.property(tag).and_then(|p| p.as_str()) {
                    // Duplicate names collide silently; the source tool owns uniqueness.
                    self.slugs.insert(guid.clone(), slugify(name));
                }
            }
        }

        for child in &node.children {
            self.visit(child);
        }
    }

    pub fn resolve(&self, guid: &str) -> Option<&str> {
        self.slugs.get(guid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

impl FromIterator<(String, String)> for IdentityIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            slugs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::PropertyRecord;

    fn named(kind: &str, guid: &str, tag: &str, name: &str, children: Vec<SourceNode>) -> SourceNode {
        SourceNode {
            kind: Some(kind.to_string()),
            guid: Some(guid.to_string()),
            properties: vec![PropertyRecord::text(tag, name)],
            children,
        }
    }

    #[test]
    fn test_slugify_sanitizes_and_lowercases() {
        assert_eq!(slugify("Hello World!"), "hello_world_");
        assert_eq!(slugify("Screen-1"), "screen_1");
        assert_eq!(slugify("ünï"), "_n_");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_idempotent() {
        for name in ["Label 1", "my_script", "A.B/C", "ÄÖÜ", "x"] {
            let once = slugify(name);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn test_index_covers_whole_tree_and_tab_pages() {
        let tab = named("TABPAGE", "t1", TAB_NAME_TAG, "Tab One", vec![]);
        let screen2 = named("SCREEN", "s2", NAME_TAG, "Settings", vec![]);
        let screen1 = named(
            "SCREEN",
            "s1",
            NAME_TAG,
            "Main",
            vec![named("TABVIEW", "tv", NAME_TAG, "Tabs", vec![tab])],
        );
        let root = SourceNode {
            children: vec![screen1, screen2],
            ..SourceNode::default()
        };

        let index = IdentityIndex::build(&root);
        assert_eq!(index.len(), 4);
        assert_eq!(index.resolve("s1"), Some("main"));
        assert_eq!(index.resolve("s2"), Some("settings"));
        assert_eq!(index.resolve("t1"), Some("tab_one"));
        assert_eq!(index.resolve("missing"), None);
    }

    #[test]
    fn test_nameless_or_guidless_nodes_are_skipped() {
        let mut unnamed = named("LABEL", "l1", "LABEL/Text", "hi", vec![]);
        unnamed.guid = Some("l1".into());
        let mut no_guid = named("LABEL", "l2", NAME_TAG, "Label2", vec![]);
        no_guid.guid = None;
        let root = SourceNode {
            children: vec![unnamed, no_guid],
            ..SourceNode::default()
        };

        assert!(IdentityIndex::build(&root).is_empty());
    }
}
