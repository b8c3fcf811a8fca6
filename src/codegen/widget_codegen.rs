//! # Widget Tree Converter
//!
//! Walks a screen's source tree and produces ESPHome widget fragments.

use super::actions::{translate_handlers, ActionContext, EVENT_HANDLER_TAG};
use super::node_handlers::{apply_rules, DecodeContext};
use crate::assets::AssetTable;
use crate::document::{deep_merge, Fragment, Mapping, Value};
use crate::identity::IdentityIndex;
use crate::metadata::{WidgetKind, ARC_KEYWORD, TABVIEW_KEYWORD, TAB_KEYWORD, TEXTAREA_KEYWORD};
use crate::project::SourceNode;

/// Marker opening a textarea text that holds raw widget YAML
pub const CUSTOM_MARKER: &str = ">custom";

/// Per-run widget converter.
///
/// Borrows the identity index built over the whole project and collects the
/// image assets referenced by every widget it converts.
pub struct WidgetCodeGenerator<'a> {
    identities: &'a IdentityIndex,
    assets: AssetTable,
}

impl<'a> WidgetCodeGenerator<'a> {
    pub fn new(identities: &'a IdentityIndex) -> Self {
        Self {
            identities,
            assets: AssetTable::new(),
        }
    }

    /// Convert `node` and its subtree.
    ///
    /// Returns `None` for kinds with no ESPHome counterpart; their subtree is
    /// dropped with them.
    pub fn convert(&mut self, node: &SourceNode) -> Option<Fragment> {
        let source_kind = node.kind.as_deref()?;
        let Some(kind) = WidgetKind::from_source(source_kind) else {
            tracing::debug!("Skipping unsupported widget kind {}", source_kind);
            return None;
        };
        let keyword = kind.keyword();

        let mut body = apply_rules(
            &node.properties,
            &mut DecodeContext {
                assets: &mut self.assets,
            },
        );

        if keyword == ARC_KEYWORD && !body.contains_key("adjustable") {
            body.insert("adjustable".to_string(), Value::Bool(true));
        }

        let events = translate_handlers(
            node.properties_tagged(EVENT_HANDLER_TAG),
            &ActionContext {
                owner_keyword: keyword,
                identities: self.identities,
            },
        );
        deep_merge(&mut body, events);

        let mut fragment = Fragment::new(keyword, body);
        if keyword == TEXTAREA_KEYWORD {
            fragment = apply_custom_text(fragment);
        }

        self.convert_children(&node.children, &mut fragment);
        Some(fragment)
    }

    fn convert_children(&mut self, children: &[SourceNode], fragment: &mut Fragment) {
        let is_tabview = fragment.keyword == TABVIEW_KEYWORD;
        let mut items = Vec::new();

        for child in children {
            let Some(converted) = self.convert(child) else {
                continue;
            };
            if !is_tabview {
                items.push(converted.into_value());
            } else if converted.keyword == TAB_KEYWORD {
                items.push(Value::Map(converted.body));
            } else {
                tracing::debug!("Dropping {} placed directly in a tab view", converted.keyword);
            }
        }

        if !items.is_empty() {
            let key = if is_tabview { "tabs" } else { "widgets" };
            fragment.body.insert(key.to_string(), Value::Seq(items));
        }
    }

    pub fn assets(&self) -> &AssetTable {
        &self.assets
    }

    pub fn into_assets(self) -> AssetTable {
        self.assets
    }
}

/// Replace a textarea with the widget described by its `>custom` text.
///
/// The text is `>custom` followed by YAML lines separated by the escaped
/// newline SquareLine stores (`\n` as two characters). A single-key mapping
/// names the replacement keyword; its value is merged over the textarea body.
pub fn apply_custom_text(mut fragment: Fragment) -> Fragment {
    let Some(text) = fragment.body.get("text").and_then(Value::as_str) else {
        return fragment;
    };
    if !text.starts_with(CUSTOM_MARKER) {
        return fragment;
    }

    let lines: Vec<&str> = text.split("\\n").collect();
    if lines.len() < 2 {
        return fragment;
    }

    let custom = match crate::yaml::from_str(&lines[1..].join("\n")) {
        Ok(Value::Map(custom)) if custom.len() == 1 => custom,
        Ok(_) => {
            tracing::warn!("Custom widget text must hold a single-key mapping, keeping textarea");
            return fragment;
        }
        Err(e) => {
            tracing::warn!("Invalid custom widget YAML, keeping textarea: {}", e);
            return fragment;
        }
    };

    for key in ["text", "placeholder", "placeholder_text"] {
        fragment.body.shift_remove(key);
    }
    for (keyword, value) in custom {
        fragment.keyword = keyword;
        if let Value::Map(extra) = value {
            deep_merge(&mut fragment.body, extra);
        }
    }
    fragment
}

/// Convert a screen into a page mapping; `None` when the node is not a screen
pub fn convert_page(generator: &mut WidgetCodeGenerator<'_>, screen: &SourceNode) -> Option<Mapping> {
    let fragment = generator.convert(screen)?;
    let mut page = fragment.body;
    if !page.contains_key("id") {
        page.shift_insert(0, "id".to_string(), Value::str("page"));
    }
    Some(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;
    use crate::project::PropertyRecord;

    fn node(kind: &str, properties: Vec<PropertyRecord>, children: Vec<SourceNode>) -> SourceNode {
        SourceNode {
            kind: Some(kind.to_string()),
            guid: None,
            properties,
            children,
        }
    }

    fn convert(root: &SourceNode) -> Option<Fragment> {
        let identities = IdentityIndex::build(root);
        WidgetCodeGenerator::new(&identities).convert(root)
    }

    #[test]
    fn test_label_fragment() {
        let label = node(
            "LABEL",
            vec![
                PropertyRecord::text("OBJECT/Name", "hello"),
                PropertyRecord::text("LABEL/Text", "Hi"),
            ],
            vec![],
        );
        let fragment = convert(&label).unwrap();
        assert_eq!(fragment.keyword, "label");
        assert_eq!(fragment.body, mapping! { "id" => "hello", "text" => "Hi" });
    }

    #[test]
    fn test_every_kind_converts_to_its_keyword() {
        for kind in WidgetKind::ALL {
            let widget = node(kind.source_name(), vec![], vec![]);
            let fragment = convert(&widget).unwrap();
            assert_eq!(fragment.keyword, kind.keyword(), "{}", kind.source_name());
        }
    }

    #[test]
    fn test_arc_is_always_adjustable() {
        let arc = node(
            "ARC",
            vec![
                PropertyRecord::int_array("ARC/Range", vec![0, 100]),
                PropertyRecord::integer("ARC/Value", 42),
                PropertyRecord::text("ARC/Mode", "normal"),
            ],
            vec![],
        );
        let fragment = convert(&arc).unwrap();
        assert_eq!(
            fragment.into_value(),
            Value::Map(mapping! {
                "arc" => mapping! {
                    "min_value" => 0i64,
                    "max_value" => 100i64,
                    "value" => 42i64,
                    "mode" => "NORMAL",
                    "adjustable" => true,
                },
            })
        );
    }

    #[test]
    fn test_unknown_kind_drops_subtree() {
        let chart = node(
            "CHART",
            vec![],
            vec![node("LABEL", vec![PropertyRecord::text("LABEL/Text", "lost")], vec![])],
        );
        assert_eq!(convert(&chart), None);

        let panel = node("PANEL", vec![], vec![chart]);
        let fragment = convert(&panel).unwrap();
        assert_eq!(fragment.keyword, "obj");
        assert!(!fragment.body.contains_key("widgets"));
    }

    #[test]
    fn test_children_become_widgets_in_order() {
        let panel = node(
            "CONTAINER",
            vec![],
            vec![
                node("LABEL", vec![PropertyRecord::text("LABEL/Text", "a")], vec![]),
                node("BUTTON", vec![], vec![]),
            ],
        );
        let fragment = convert(&panel).unwrap();
        let widgets = fragment.body["widgets"].as_seq().unwrap();
        assert_eq!(widgets.len(), 2);
        assert!(widgets[0].get("label").is_some());
        assert!(widgets[1].get("button").is_some());
    }

    #[test]
    fn test_tabview_collects_tab_payloads() {
        let tabview = node(
            "TABVIEW",
            vec![PropertyRecord::text("OBJECT/Name", "Tabs")],
            vec![
                node(
                    "TABPAGE",
                    vec![
                        PropertyRecord::text("TABPAGE/Name", "First Tab"),
                        PropertyRecord::text("TABPAGE/Title", "First"),
                    ],
                    vec![node("LABEL", vec![PropertyRecord::text("LABEL/Text", "x")], vec![])],
                ),
                node("LABEL", vec![PropertyRecord::text("LABEL/Text", "stray")], vec![]),
            ],
        );
        let fragment = convert(&tabview).unwrap();
        assert!(!fragment.body.contains_key("widgets"));

        let tabs = fragment.body["tabs"].as_seq().unwrap();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].get("id"), Some(&Value::str("first_tab")));
        assert_eq!(tabs[0].get("name"), Some(&Value::str("First")));
        assert_eq!(tabs[0].get("widgets").and_then(Value::as_seq).map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_custom_text_replaces_textarea() {
        let textarea = node(
            "TEXTAREA",
            vec![
                PropertyRecord::text("OBJECT/Name", "gauge"),
                PropertyRecord::text(
                    "TEXTAREA/Text",
                    ">custom\\nmeter:\\n  scales:\\n    - range_from: 0",
                ),
                PropertyRecord::text("TEXTAREA/Placeholder", "unused"),
            ],
            vec![],
        );
        let fragment = convert(&textarea).unwrap();
        assert_eq!(fragment.keyword, "meter");
        assert_eq!(fragment.body.get("id"), Some(&Value::str("gauge")));
        assert!(!fragment.body.contains_key("text"));
        assert!(!fragment.body.contains_key("placeholder_text"));
        assert_eq!(
            fragment.body.get("scales"),
            Some(&Value::Seq(vec![Value::Map(mapping! { "range_from" => 0i64 })]))
        );
    }

    #[test]
    fn test_custom_text_errors_keep_textarea() {
        for text in [">custom", ">custom\\n: [unclosed", ">custom\\na: 1\\nb: 2"] {
            let fragment = apply_custom_text(Fragment::new("textarea", mapping! { "text" => text }));
            assert_eq!(fragment.keyword, "textarea");
            assert_eq!(fragment.body.get("text"), Some(&Value::str(text)));
        }
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let fragment = Fragment::new("textarea", mapping! { "text" => "hello\\nworld" });
        assert_eq!(apply_custom_text(fragment.clone()), fragment);
    }

    #[test]
    fn test_page_gets_default_id_first() {
        let screen = node(
            "SCREEN",
            vec![],
            vec![node("LABEL", vec![PropertyRecord::text("LABEL/Text", "Hi")], vec![])],
        );
        let identities = IdentityIndex::build(&screen);
        let mut generator = WidgetCodeGenerator::new(&identities);
        let page = convert_page(&mut generator, &screen).unwrap();
        assert_eq!(page.keys().next().map(String::as_str), Some("id"));
        assert_eq!(page["id"], Value::str("page"));
    }

    #[test]
    fn test_events_resolve_across_tree() {
        let mut button = node(
            "BUTTON",
            vec![PropertyRecord::node_list(
                EVENT_HANDLER_TAG,
                Some("CLICKED"),
                vec![PropertyRecord::node_list(
                    "_event/action",
                    Some("LABEL_PROPERTY"),
                    vec![
                        PropertyRecord::text("LABEL_PROPERTY/Target", "g-status"),
                        PropertyRecord::text("LABEL_PROPERTY/Property", "Text"),
                        PropertyRecord::text("LABEL_PROPERTY/Value", "Clicked"),
                    ],
                )],
            )],
            vec![],
        );
        button.guid = Some("g-button".to_string());
        let mut label = node("LABEL", vec![PropertyRecord::text("OBJECT/Name", "Status")], vec![]);
        label.guid = Some("g-status".to_string());
        let panel = node("PANEL", vec![], vec![button, label]);

        let fragment = convert(&panel).unwrap();
        let widgets = fragment.body["widgets"].as_seq().unwrap();
        let on_click = widgets[0].get("button").unwrap().get("on_click").unwrap();
        assert_eq!(
            on_click,
            &Value::Map(mapping! {
                "then" => vec![Value::Map(mapping! {
                    "lvgl.label.update" => mapping! { "id" => "status", "text" => "Clicked" },
                })],
            })
        );
    }
}
