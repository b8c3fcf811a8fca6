//! # Property Handlers
//!
//! The codec table: one rule per SquareLine property tag, saying where the
//! decoded value lands in the widget's ESPHome body and how to decode it.
//! Rules run in table order, so the table also fixes the order of keys in
//! the emitted YAML.

use super::style::{decode_style_block, StyleVariant};
use crate::assets::AssetTable;
use crate::document::{Mapping, Value};
use crate::error::DecodeError;
use crate::identity::slugify;
use crate::mapping;
use crate::project::{LayoutRecord, PropertyRecord, PropertyValue};

/// Where a decoded value goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKey {
    /// Assign under one key
    Field(&'static str),
    /// Destructure a sequence result positionally
    Fields(&'static [&'static str]),
    /// Deep-merge a mapping result into the body
    Merge,
}

/// How a raw record is decoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Identifier-safe slug of the string value
    Slug,
    Text,
    Lower,
    Upper,
    /// Case-insensitive `"true"`
    Bool,
    /// `{state: {<name>: bool}}`
    State(&'static str),
    /// Constant, whatever the record holds
    Always(bool),
    Int,
    IntOr(i64),
    FloatOr(f64),
    /// First two array components
    Pair,
    Size,
    Layout,
    Style,
    CursorStyle,
    /// String split on the literal two-character sequence `\n`
    Options,
    Millis,
    /// Registers an image asset and yields its id
    Asset,
    /// Fixed-point zoom (256 = 1.0)
    Zoom,
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyRule {
    pub tag: &'static str,
    pub key: OutputKey,
    pub transform: Transform,
}

const fn rule(tag: &'static str, key: OutputKey, transform: Transform) -> PropertyRule {
    PropertyRule { tag, key, transform }
}

use OutputKey::{Field, Fields, Merge};
use Transform as T;

pub static PROPERTY_RULES: &[PropertyRule] = &[
    // Common object properties
    rule("OBJECT/Name", Field("id"), T::Slug),
    rule("OBJECT/Align", Field("align"), T::Text),
    rule("OBJECT/Position", Fields(&["x", "y"]), T::Pair),
    rule("OBJECT/Disabled", Merge, T::State("disabled")),
    rule("OBJECT/Checked", Merge, T::State("checked")),
    rule("OBJECT/Checkable", Field("checkable"), T::Bool),
    rule("OBJECT/Edited", Merge, T::State("edited")),
    rule("OBJECT/Focused", Merge, T::State("focused")),
    rule("OBJECT/Pressed", Merge, T::State("pressed")),
    rule("OBJECT/Scrollable", Field("scrollable"), T::Bool),
    rule("OBJECT/Size", Merge, T::Size),
    rule("OBJECT/Layout_type", Merge, T::Layout),
    rule("TABPAGE/Layout_type", Merge, T::Layout),
    rule("TABPAGE/Scrollable", Field("scrollable"), T::Bool),
    // Styles
    rule("ARC/Style_main", Merge, T::Style),
    rule("BAR/Style_main", Merge, T::Style),
    rule("BUTTON/Style_main", Merge, T::Style),
    rule("CHECKBOX/Style_main", Merge, T::Style),
    rule("CONTAINER/Style_main", Merge, T::Style),
    rule("DROPDOWN/Style_main", Merge, T::Style),
    rule("IMAGE/Style_main", Merge, T::Style),
    rule("KEYBOARD/Style_main", Merge, T::Style),
    rule("LABEL/Style_main", Merge, T::Style),
    rule("PANEL/Style_main", Merge, T::Style),
    rule("ROLLER/Style_main", Merge, T::Style),
    rule("SCREEN/Style_main", Merge, T::Style),
    rule("SLIDER/Style_main", Merge, T::Style),
    rule("SPINBOX/Style_cursor", Merge, T::CursorStyle),
    rule("SPINBOX/Style_main", Merge, T::Style),
    rule("SPINNER/Style_main", Merge, T::Style),
    rule("SWITCH/Style_main", Merge, T::Style),
    rule("TABPAGE/Style_main", Merge, T::Style),
    rule("TABVIEW/Style_main", Merge, T::Style),
    rule("TEXTAREA/Style_cursor", Merge, T::CursorStyle),
    rule("TEXTAREA/Style_main", Merge, T::Style),
    // Label
    rule("LABEL/Text", Field("text"), T::Text),
    rule("LABEL/Long_mode", Field("long_mode"), T::Lower),
    rule("LABEL/Recolor", Field("recolor"), T::Bool),
    // Button
    rule("BUTTON/Checkable", Field("checkable"), T::Bool),
    // Dropdown
    rule("DROPDOWN/Options", Field("options"), T::Options),
    // Arc. SquareLine has no "adjustable" setting, ESPHome arcs need it.
    rule("ARC/Arc", Field("adjustable"), T::Always(true)),
    rule("ARC/Range", Fields(&["min_value", "max_value"]), T::Pair),
    rule("ARC/Value", Field("value"), T::Int),
    rule("ARC/Mode", Field("mode"), T::Upper),
    rule("ARC/Rotation", Field("rotation"), T::IntOr(0)),
    rule("ARC/Bg_angles", Fields(&["start_angle", "end_angle"]), T::Pair),
    // Bar
    rule("BAR/Range", Fields(&["min_value", "max_value"]), T::Pair),
    rule("BAR/Value", Field("value"), T::Int),
    rule("BAR/Mode", Field("mode"), T::Upper),
    // Slider
    rule("SLIDER/Range", Fields(&["min_value", "max_value"]), T::Pair),
    rule("SLIDER/Value", Field("value"), T::IntOr(0)),
    rule("SLIDER/Mode", Field("mode"), T::Upper),
    // Roller
    rule("ROLLER/Options", Field("options"), T::Options),
    rule("ROLLER/Selected", Field("selected_index"), T::IntOr(0)),
    rule("ROLLER/Mode", Field("mode"), T::Upper),
    // Spinbox
    rule("SPINBOX/Value", Field("value"), T::IntOr(0)),
    rule("SPINBOX/Range", Fields(&["range_from", "range_to"]), T::Pair),
    rule("SPINBOX/Digit_format", Fields(&["digits", "decimal_places"]), T::Pair),
    // Switch
    rule("SWITCH/Anim_time", Field("anim_time"), T::Millis),
    // Textarea
    rule("TEXTAREA/One_line", Field("one_line"), T::Bool),
    rule("TEXTAREA/Password", Field("password"), T::Bool),
    rule("TEXTAREA/Text", Field("text"), T::Text),
    rule("TEXTAREA/Placeholder", Field("placeholder_text"), T::Text),
    // Image
    rule("IMAGE/Asset", Field("src"), T::Asset),
    rule("IMAGE/Pivot_x", Field("pivot_x"), T::Int),
    rule("IMAGE/Pivot_y", Field("pivot_y"), T::Int),
    rule("IMAGE/Rotation", Field("angle"), T::FloatOr(0.0)),
    rule("IMAGE/Scale", Field("zoom"), T::Zoom),
    // Tabs
    rule("TABVIEW/Tab_position", Field("position"), T::Upper),
    rule("TABVIEW/Tab_size", Field("size"), T::Int),
    rule("TABPAGE/Name", Field("id"), T::Slug),
    rule("TABPAGE/Title", Field("name"), T::Text),
];

/// Per-run state a transform may touch
pub struct DecodeContext<'c> {
    pub assets: &'c mut AssetTable,
}

impl Transform {
    /// Decode `record`; `Ok(None)` means the record contributes nothing
    pub fn apply(
        &self,
        record: &PropertyRecord,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<Value>, DecodeError> {
        let value = match *self {
            T::Slug => Value::Str(slugify(text(record)?)),
            T::Text => Value::str(text(record)?),
            T::Lower => Value::Str(text(record)?.to_lowercase()),
            T::Upper => Value::Str(text(record)?.to_uppercase()),
            T::Bool => Value::Bool(is_true(text(record)?)),
            T::State(name) => Value::Map(mapping! {
                "state" => mapping! { name => is_true(text(record)?) },
            }),
            T::Always(b) => Value::Bool(b),
            T::Int => Value::Int(int(record)?),
            T::IntOr(default) => Value::Int(record.as_int().unwrap_or(default)),
            T::FloatOr(default) => Value::Float(record.as_int().map_or(default, |i| i as f64)),
            T::Pair => {
                let values = int_array(record, 2)?;
                Value::Seq(vec![Value::Int(values[0]), Value::Int(values[1])])
            }
            T::Size => match &record.value {
                PropertyValue::Flags { bits, values } => Value::Map(decode_size(*bits, values)),
                _ => return Err(wrong_shape(record, "size flags")),
            },
            T::Layout => match &record.value {
                PropertyValue::Layout(layout) => match decode_layout(layout, &record.tag)? {
                    Some(map) => Value::Map(map),
                    None => return Ok(None),
                },
                _ => return Err(wrong_shape(record, "layout fields")),
            },
            T::Style => match decode_style_block(record, StyleVariant::Main, ctx.assets) {
                Some(map) => Value::Map(map),
                None => return Ok(None),
            },
            T::CursorStyle => match decode_style_block(record, StyleVariant::Cursor, ctx.assets) {
                Some(map) => Value::Map(map),
                None => return Ok(None),
            },
            T::Options => Value::Seq(
                text(record)?
                    .split("\\n")
                    .map(|option| Value::str(option))
                    .collect(),
            ),
            T::Millis => match (&record.value, record.as_int()) {
                (PropertyValue::Text(ms), _) => Value::Str(format!("{ms}ms")),
                (_, Some(ms)) => Value::Str(format!("{ms}ms")),
                _ => return Err(wrong_shape(record, "string")),
            },
            T::Asset => Value::Str(ctx.assets.register(text(record)?)),
            T::Zoom => Value::Float(fixed_point_scale(int(record)?)),
        };
        Ok(Some(value))
    }
}

impl OutputKey {
    /// Write a decoded value into a widget body
    pub fn assign(&self, body: &mut Mapping, value: Value) {
        match (self, value) {
            (Field(key), value) => {
                body.insert((*key).to_string(), value);
            }
            (Fields(keys), Value::Seq(items)) => {
                for (key, item) in keys.iter().zip(items) {
                    body.insert((*key).to_string(), item);
                }
            }
            (Merge, Value::Map(map)) => crate::document::deep_merge(body, map),
            (key, value) => {
                tracing::debug!("Dropping {:?} for output key {:?}", value, key);
            }
        }
    }
}

/// Apply every rule whose tag is present on the node, in table order
pub fn apply_rules(properties: &[PropertyRecord], ctx: &mut DecodeContext<'_>) -> Mapping {
    let mut body = Mapping::new();
    for rule in PROPERTY_RULES {
        let Some(record) = properties.iter().find(|p| p.tag == rule.tag) else {
            continue;
        };
        match rule.transform.apply(record, ctx) {
            Ok(Some(value)) => rule.key.assign(&mut body, value),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping property: {}", e),
        }
    }
    body
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

const SIZE_CONTENT: &str = "SIZE_CONTENT";
const SIZE_CONTENT_BOTH: i64 = 51;
const AXIS_CONTENT: i64 = 0x3;
const AXIS_PERCENT: i64 = 0x2;

/// Decode a size record.
///
/// Low nibble: width mode. High nibble: height mode. In each nibble `0x3`
/// means fit-to-content, `0x2` percent, anything else pixels.
pub fn decode_size(bits: i64, values: &[i64]) -> Mapping {
    if bits == SIZE_CONTENT_BOTH {
        return mapping! { "width" => SIZE_CONTENT, "height" => SIZE_CONTENT };
    }

    let axis = |mode: i64, value: i64| -> Value {
        if mode & AXIS_CONTENT == AXIS_CONTENT {
            Value::str(SIZE_CONTENT)
        } else if mode & AXIS_PERCENT == AXIS_PERCENT {
            Value::Str(format!("{value}%"))
        } else {
            Value::Int(value)
        }
    };

    let width = values.first().copied().unwrap_or(0);
    let height = values.get(1).copied().unwrap_or(0);
    mapping! {
        "width" => axis(bits & 0x0f, width),
        "height" => axis((bits >> 4) & 0x0f, height),
    }
}

const FLEX_LAYOUT: i64 = 1;
const ALIGNMENTS: [&str; 6] = [
    "START",
    "CENTER",
    "END",
    "SPACE_BETWEEN",
    "SPACE_AROUND",
    "SPACE_EVENLY",
];

/// Decode a `Layout_type` record; only flex layouts produce output
pub fn decode_layout(layout: &LayoutRecord, tag: &str) -> Result<Option<Mapping>, DecodeError> {
    if layout.layout_type != FLEX_LAYOUT {
        return Ok(None);
    }

    let align = |index: i64| -> Result<&'static str, DecodeError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| ALIGNMENTS.get(i).copied())
            .ok_or_else(|| DecodeError::BadAlignment {
                tag: tag.to_string(),
                index,
            })
    };

    let flow = if layout.flow == 0 { "ROW" } else { "COLUMN" };
    let wrap = if layout.wrap { "_WRAP" } else { "" };
    let reverse = if layout.reversed { "_REVERSE" } else { "" };

    Ok(Some(mapping! {
        "layout" => mapping! {
            "type" => "flex",
            "flex_flow" => format!("{flow}{wrap}{reverse}"),
            "flex_align_main" => align(layout.main_alignment)?,
            "flex_align_cross" => align(layout.cross_alignment)?,
            "flex_align_track" => align(layout.track_alignment)?,
        },
    }))
}

/// LVGL fixed-point scale (256 = 1.0), rounded to two decimals
pub fn fixed_point_scale(raw: i64) -> f64 {
    (raw as f64 / 256.0 * 100.0).round() / 100.0
}

pub(crate) fn is_true(s: &str) -> bool {
    s.eq_ignore_ascii_case("true")
}

pub(crate) fn wrong_shape(record: &PropertyRecord, expected: &'static str) -> DecodeError {
    DecodeError::WrongShape {
        tag: record.tag.clone(),
        expected,
    }
}

pub(crate) fn text(record: &PropertyRecord) -> Result<&str, DecodeError> {
    record.as_str().ok_or_else(|| wrong_shape(record, "string"))
}

pub(crate) fn int(record: &PropertyRecord) -> Result<i64, DecodeError> {
    record.as_int().ok_or_else(|| wrong_shape(record, "integer"))
}

pub(crate) fn int_array(record: &PropertyRecord, needed: usize) -> Result<&[i64], DecodeError> {
    let values = record
        .as_int_array()
        .ok_or_else(|| wrong_shape(record, "integer array"))?;
    if values.len() < needed {
        return Err(DecodeError::TooShort {
            tag: record.tag.clone(),
            found: values.len(),
            needed,
        });
    }
    Ok(values)
}
