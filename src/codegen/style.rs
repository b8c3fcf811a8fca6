//! # Style Blocks
//!
//! A SquareLine style property is a small tree: one `_style/StyleState`
//! record per interaction state (DEFAULT, PRESSED, CHECKED, ...), each
//! holding style attribute records. DEFAULT attributes land directly in the
//! widget body; other states nest under the lowercased state name.

use super::node_handlers::{fixed_point_scale, int, int_array, is_true, text, wrong_shape};
use crate::assets::AssetTable;
use crate::document::{deep_merge, Mapping, Value};
use crate::error::DecodeError;
use crate::mapping;
use crate::project::PropertyRecord;

pub const STYLE_STATE_TAG: &str = "_style/StyleState";
const DEFAULT_STATE: &str = "default";
const CURSOR_KEY: &str = "cursor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleVariant {
    /// Merged flat into the widget; padding defaults to 0 on all sides
    Main,
    /// Nested under `cursor:`
    Cursor,
}

/// How one style attribute decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StyleCodec {
    /// Packed color array to `0xRRGGBB` plus opacity in [0, 1]
    ColorOpa(&'static str, &'static str),
    Color(&'static str),
    Int(&'static str),
    IntOr(&'static str, i64),
    Str(&'static str),
    Lower(&'static str),
    Bool(&'static str),
    Pair(&'static str, &'static str),
    Zoom(&'static str),
    ImageSrc(&'static str),
    BorderSide,
    Padding,
    RowColumnPadding,
}

use StyleCodec as S;

static STYLE_ATTRIBUTES: &[(&str, StyleCodec)] = &[
    // Background
    ("_style/Bg_Color", S::ColorOpa("bg_color", "bg_opa")),
    ("_style/Bg_gradiens_Color", S::Color("bg_grad_color")),
    ("_style/Gradient direction", S::Lower("bg_grad_dir")),
    ("_style/Bg_gradient_params", S::Pair("bg_main_stop", "bg_grad_stop")),
    ("_style/Bg_Image", S::ImageSrc("bg_image_src")),
    ("_style/Bg_Image_Opa", S::Int("bg_image_opa")),
    ("_style/Bg_Image_Recolor", S::ColorOpa("bg_image_recolor", "bg_image_recolor_opa")),
    ("_style/Bg_Image_Tiled", S::Bool("bg_image_tiled")),
    // Border
    ("_style/Border_Color", S::ColorOpa("border_color", "border_opa")),
    ("_style/Border width", S::IntOr("border_width", 0)),
    ("_style/Border side", S::BorderSide),
    ("_style/Border post", S::Bool("border_post")),
    // Image
    ("_style/Image_reColor", S::ColorOpa("image_recolor", "image_recolor_opa")),
    // Text
    ("_style/Text_Color", S::ColorOpa("text_color", "text_opa")),
    ("_style/Text_Font", S::Str("text_font")),
    ("_style/Text_Letter_Space", S::Int("text_letter_space")),
    ("_style/Text_Line_Space", S::Int("text_line_space")),
    ("_style/Text_Decor", S::Lower("text_decor")),
    ("_style/Text_Align", S::Lower("text_align")),
    // Outline
    ("_style/Outline_Width", S::Int("outline_width")),
    ("_style/Outline_Color", S::ColorOpa("outline_color", "outline_opa")),
    ("_style/Outline_Pad", S::Int("outline_pad")),
    // Shadow
    ("_style/Shadow_Width", S::Int("shadow_width")),
    ("_style/Shadow_Ofs_X", S::Int("shadow_ofs_x")),
    ("_style/Shadow_Ofs_Y", S::Int("shadow_ofs_y")),
    ("_style/Shadow_Spread", S::Int("shadow_spread")),
    ("_style/Shadow_Color", S::ColorOpa("shadow_color", "shadow_opa")),
    // Padding
    ("_style/Padding", S::Padding),
    ("_style/Pad_Left", S::Int("pad_left")),
    ("_style/Pad_Right", S::Int("pad_right")),
    ("_style/Pad_Top", S::Int("pad_top")),
    ("_style/Pad_Bottom", S::Int("pad_bottom")),
    ("_style/Padding_RowCol", S::RowColumnPadding),
    // Radius
    ("_style/Bg_Radius", S::Int("radius")),
    // Line
    ("_style/Line_Width", S::Int("line_width")),
    ("_style/Line_Dash_Width", S::Int("line_dash_width")),
    ("_style/Line_Dash_Gap", S::Int("line_dash_gap")),
    ("_style/Line_Rounded", S::Bool("line_rounded")),
    ("_style/Line_Color", S::ColorOpa("line_color", "line_opa")),
    // Arc
    ("_style/Arc_Width", S::Int("arc_width")),
    ("_style/Arc_Rounded", S::Bool("arc_rounded")),
    ("_style/Arc_Color", S::ColorOpa("arc_color", "arc_opa")),
    // Blend
    ("_style/Blend_Mode", S::Lower("blend_mode")),
    // Transform
    ("_style/Transform_Width", S::Int("transform_width")),
    ("_style/Transform_Height", S::Int("transform_height")),
    ("_style/Transform_Zoom", S::Zoom("transform_zoom")),
    ("_style/Transform_Angle", S::Int("transform_angle")),
    ("_style/Transform_Pivot_X", S::Int("transform_pivot_x")),
    ("_style/Transform_Pivot_Y", S::Int("transform_pivot_y")),
];

/// `0xrrggbb` from a 3- or 4-component array; the 4th (alpha) is ignored
pub fn hex_color(components: &[i64]) -> String {
    match components {
        [r, g, b] | [r, g, b, _] => format!("0x{:02x}{:02x}{:02x}", r, g, b),
        _ => "0x000000".to_string(),
    }
}

fn color_opa(record: &PropertyRecord, color_key: &str, opa_key: &str) -> Mapping {
    let Some(components) = record.as_int_array() else {
        return Mapping::new();
    };
    let opa = match components {
        [_, _, _, a] => *a as f64 / 255.0,
        _ => 1.0,
    };
    mapping! { color_key => hex_color(components), opa_key => opa }
}

impl StyleCodec {
    fn decode(
        self,
        record: &PropertyRecord,
        assets: &mut AssetTable,
    ) -> Result<Mapping, DecodeError> {
        Ok(match self {
            S::ColorOpa(color, opa) => color_opa(record, color, opa),
            S::Color(key) => mapping! { key => hex_color(int_array(record, 0)?) },
            S::Int(key) => mapping! { key => int(record)? },
            S::IntOr(key, default) => mapping! { key => record.as_int().unwrap_or(default) },
            S::Str(key) => mapping! { key => text(record)? },
            S::Lower(key) => mapping! { key => text(record)?.to_lowercase() },
            S::Bool(key) => mapping! { key => is_true(text(record)?) },
            S::Pair(first, second) => {
                let values = int_array(record, 2)?;
                mapping! { first => values[0], second => values[1] }
            }
            S::Zoom(key) => mapping! { key => fixed_point_scale(int(record)?) },
            S::ImageSrc(key) => mapping! { key => assets.register(text(record)?) },
            S::BorderSide => {
                let side = text(record)?;
                if side == "FULL" {
                    mapping! { "border_side" => vec!["TOP", "BOTTOM", "LEFT", "RIGHT"] }
                } else {
                    mapping! { "border_side" => side }
                }
            }
            S::Padding => {
                let values = int_array(record, 4)?;
                mapping! {
                    "pad_left" => values[0],
                    "pad_right" => values[1],
                    "pad_top" => values[2],
                    "pad_bottom" => values[3],
                }
            }
            S::RowColumnPadding => {
                let values = int_array(record, 2)?;
                mapping! {
                    "layout" => mapping! { "pad_row" => values[0], "pad_column" => values[1] },
                }
            }
        })
    }
}

/// Decode the attributes of one state. Unknown tags are ignored and broken
/// attributes are skipped so their siblings still apply.
fn decode_state(state: &PropertyRecord, assets: &mut AssetTable) -> Mapping {
    let mut styles = Mapping::new();
    for attribute in state.records() {
        let Some((_, codec)) = STYLE_ATTRIBUTES.iter().find(|(tag, _)| *tag == attribute.tag) else {
            tracing::debug!("Unknown style attribute {}", attribute.tag);
            continue;
        };
        match codec.decode(attribute, assets) {
            Ok(decoded) => deep_merge(&mut styles, decoded),
            Err(e) => tracing::warn!("Error processing style {}: {}", attribute.tag, e),
        }
    }
    styles
}

/// Decode a style property. `None` when a cursor block has no content.
pub fn decode_style_block(
    record: &PropertyRecord,
    variant: StyleVariant,
    assets: &mut AssetTable,
) -> Option<Mapping> {
    let mut result = match variant {
        StyleVariant::Main => mapping! {
            "pad_left" => 0i64,
            "pad_right" => 0i64,
            "pad_top" => 0i64,
            "pad_bottom" => 0i64,
        },
        StyleVariant::Cursor => Mapping::new(),
    };

    for state in record.records() {
        if state.tag != STYLE_STATE_TAG {
            continue;
        }
        let Some(name) = state.as_str() else {
            tracing::warn!("{}", wrong_shape(state, "state name"));
            continue;
        };

        let styles = decode_state(state, assets);
        if styles.is_empty() {
            continue;
        }

        let name = name.to_lowercase();
        if name == DEFAULT_STATE {
            deep_merge(&mut result, styles);
        } else {
            result.insert(name, Value::Map(styles));
        }
    }

    match variant {
        StyleVariant::Main => Some(result),
        StyleVariant::Cursor if result.is_empty() => None,
        StyleVariant::Cursor => Some(mapping! { CURSOR_KEY => result }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(name: &str, attributes: Vec<PropertyRecord>) -> PropertyRecord {
        PropertyRecord::node_list(STYLE_STATE_TAG, Some(name), attributes)
    }

    fn style(states: Vec<PropertyRecord>) -> PropertyRecord {
        PropertyRecord::node_list("BUTTON/Style_main", None, states)
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color(&[255, 0, 16, 128]), "0xff0010");
        assert_eq!(hex_color(&[1, 2, 3]), "0x010203");
        assert_eq!(hex_color(&[1, 2]), "0x000000");
    }

    #[test]
    fn test_default_state_merges_flat_with_padding_defaults() {
        let record = style(vec![state(
            "DEFAULT",
            vec![
                PropertyRecord::int_array("_style/Bg_Color", vec![255, 0, 0, 255]),
                PropertyRecord::integer("_style/Bg_Radius", 8),
                PropertyRecord::integer("_style/Pad_Left", 4),
            ],
        )]);
        let mut assets = AssetTable::new();
        let result = decode_style_block(&record, StyleVariant::Main, &mut assets).unwrap();

        assert_eq!(result["bg_color"], Value::str("0xff0000"));
        assert_eq!(result["bg_opa"], Value::Float(1.0));
        assert_eq!(result["radius"], Value::Int(8));
        assert_eq!(result["pad_left"], Value::Int(4));
        assert_eq!(result["pad_right"], Value::Int(0));
        assert_eq!(result["pad_bottom"], Value::Int(0));
    }

    #[test]
    fn test_other_states_nest_under_lowercase_name() {
        let record = style(vec![
            state("DEFAULT", vec![PropertyRecord::integer("_style/Border width", 2)]),
            state(
                "PRESSED",
                vec![PropertyRecord::int_array("_style/Text_Color", vec![0, 0, 255, 51])],
            ),
            state("CHECKED", vec![]),
        ]);
        let mut assets = AssetTable::new();
        let result = decode_style_block(&record, StyleVariant::Main, &mut assets).unwrap();

        assert_eq!(result["border_width"], Value::Int(2));
        let pressed = result["pressed"].as_map().unwrap();
        assert_eq!(pressed["text_color"], Value::str("0x0000ff"));
        assert_eq!(pressed["text_opa"], Value::Float(0.2));
        assert!(!result.contains_key("checked"));
    }

    #[test]
    fn test_broken_attribute_does_not_abort_block() {
        let record = style(vec![state(
            "DEFAULT",
            vec![
                PropertyRecord::text("_style/Outline_Width", "wide"),
                PropertyRecord::int_array("_style/Padding", vec![1, 2]),
                PropertyRecord::text("_style/Border side", "FULL"),
                PropertyRecord::int_array("_style/Padding_RowCol", vec![3, 4]),
            ],
        )]);
        let mut assets = AssetTable::new();
        let result = decode_style_block(&record, StyleVariant::Main, &mut assets).unwrap();

        assert!(!result.contains_key("outline_width"));
        assert_eq!(result["pad_left"], Value::Int(0));
        assert_eq!(
            result["border_side"],
            Value::from(vec!["TOP", "BOTTOM", "LEFT", "RIGHT"])
        );
        assert_eq!(
            result["layout"],
            Value::Map(mapping! { "pad_row" => 3i64, "pad_column" => 4i64 })
        );
    }

    #[test]
    fn test_cursor_variant_nests_or_vanishes() {
        let mut assets = AssetTable::new();
        let empty = PropertyRecord::node_list("TEXTAREA/Style_cursor", None, vec![]);
        assert_eq!(decode_style_block(&empty, StyleVariant::Cursor, &mut assets), None);

        let record = PropertyRecord::node_list(
            "TEXTAREA/Style_cursor",
            None,
            vec![state(
                "DEFAULT",
                vec![PropertyRecord::int_array("_style/Bg_Color", vec![0, 255, 0])],
            )],
        );
        let result = decode_style_block(&record, StyleVariant::Cursor, &mut assets).unwrap();
        let cursor = result["cursor"].as_map().unwrap();
        assert_eq!(cursor["bg_color"], Value::str("0x00ff00"));
        assert!(!cursor.contains_key("pad_left"));
    }

    #[test]
    fn test_background_image_registers_asset() {
        let record = style(vec![state(
            "DEFAULT",
            vec![PropertyRecord::text("_style/Bg_Image", "assets/bg tile.png")],
        )]);
        let mut assets = AssetTable::new();
        let result = decode_style_block(&record, StyleVariant::Main, &mut assets).unwrap();
        assert_eq!(result["bg_image_src"], Value::str("bg_tile_png"));
        assert_eq!(assets.get("bg_tile_png"), Some("assets/bg tile.png"));
    }

    #[test]
    fn test_transform_zoom() {
        let record = style(vec![state(
            "DEFAULT",
            vec![PropertyRecord::integer("_style/Transform_Zoom", 512)],
        )]);
        let mut assets = AssetTable::new();
        let result = decode_style_block(&record, StyleVariant::Main, &mut assets).unwrap();
        assert_eq!(result["transform_zoom"], Value::Float(2.0));
    }
}
